//! GL Service - General-ledger posting and reporting engine.
//!
//! Journal entries are the single source of truth: the posting engine
//! commits balanced entries atomically, and every report (per-account
//! ledger, trial balance, income statement, balance sheet) is computed
//! from committed lines at query time.

pub mod adapters;
pub mod config;
pub mod models;
pub mod services;
