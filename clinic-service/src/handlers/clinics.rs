//! Read-only directory routes: clinics, specialties and doctors.

use axum::{
    extract::{Path, State},
    Json,
};
use service_core::error::AppError;

use crate::handlers::local_now;
use crate::models::{Clinic, DoctorAvailability, MAX_SLOTS_PER_DOCTOR};
use crate::startup::AppState;

/// `GET /` — every clinic, by name descending.
pub async fn list_clinics(State(state): State<AppState>) -> Result<Json<Vec<Clinic>>, AppError> {
    let clinics = state.store.list_clinics().await?;
    Ok(Json(clinics))
}

/// `GET /c/{clinica}/` — specialties practiced at a clinic.
pub async fn list_specialties(
    State(state): State<AppState>,
    Path(clinic): Path<String>,
) -> Result<Json<Vec<String>>, AppError> {
    tracing::debug!(clinic = %clinic, "Listing specialties");

    let specialties = state.store.list_specialties(&clinic).await?;
    Ok(Json(specialties))
}

/// `GET /c/{clinica}/{especialidade}/` — doctors with their next slots.
pub async fn list_doctors(
    State(state): State<AppState>,
    Path((clinic, specialty)): Path<(String, String)>,
) -> Result<Json<Vec<DoctorAvailability>>, AppError> {
    tracing::debug!(clinic = %clinic, specialty = %specialty, "Listing doctors");

    let doctors = state.store.list_doctors(&clinic, &specialty).await?;
    let now = local_now();

    let mut result = Vec::with_capacity(doctors.len());
    for doctor in doctors {
        let available_slots = state
            .store
            .upcoming_slots(&doctor.nif, now, MAX_SLOTS_PER_DOCTOR)
            .await?;

        result.push(DoctorAvailability {
            name: doctor.name,
            available_slots,
        });
    }

    Ok(Json(result))
}
