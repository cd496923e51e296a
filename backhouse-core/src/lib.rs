//! backhouse-core: Shared infrastructure for backhouse back-office services.

pub mod config;
pub mod error;
pub mod observability;
