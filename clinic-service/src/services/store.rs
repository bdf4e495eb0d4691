use async_trait::async_trait;
use chrono::NaiveDateTime;
use service_core::error::AppError;

use crate::models::{Clinic, Doctor, NewAppointment, Slot};

/// Persistence operations behind the HTTP routes.
///
/// Unknown clinics, specialties and doctors yield empty results, never errors.
#[async_trait]
pub trait ClinicStore: Send + Sync {
    /// All clinics, ordered by name descending.
    async fn list_clinics(&self) -> Result<Vec<Clinic>, AppError>;

    /// Distinct specialties of the doctors working at `clinic`.
    async fn list_specialties(&self, clinic: &str) -> Result<Vec<String>, AppError>;

    /// Doctors working at `clinic` with the given specialty.
    async fn list_doctors(&self, clinic: &str, specialty: &str) -> Result<Vec<Doctor>, AppError>;

    /// Up to `limit` appointments of `doctor` strictly after `after`, in any
    /// clinic, ascending by date then time.
    async fn upcoming_slots(
        &self,
        doctor: &str,
        after: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<Slot>, AppError>;

    /// Insert the appointment with id `max(id) + 1` and return that id.
    async fn book_appointment(&self, appointment: &NewAppointment) -> Result<i32, AppError>;

    /// Delete appointments matching every key field; returns how many went away.
    async fn cancel_appointment(&self, appointment: &NewAppointment) -> Result<u64, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}
