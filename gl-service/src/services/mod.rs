//! Services for gl-service.

pub mod database;
pub mod metrics;
pub mod posting;
pub mod reports;

pub use database::Database;
