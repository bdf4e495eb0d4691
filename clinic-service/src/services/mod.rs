//! Services module for clinic-service.

pub mod database;
pub mod metrics;
pub mod store;

pub use database::Database;
pub use metrics::{record_appointment_operation, time_query};
pub use store::ClinicStore;
