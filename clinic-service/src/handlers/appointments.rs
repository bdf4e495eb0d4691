//! Booking and cancellation routes.
//!
//! Both answer `204 No Content` on success. Cancelling a combination that
//! matches nothing is still a success. An unreadable query string is a JSON
//! `400` like any other missing parameter.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use service_core::error::AppError;

use crate::dtos::AppointmentParams;
use crate::handlers::local_now;
use crate::services::record_appointment_operation;
use crate::startup::AppState;

/// `POST /a/{clinica}/registar/?paciente&medico&data&hora`
pub async fn book_appointment(
    State(state): State<AppState>,
    Path(clinic): Path<String>,
    params: AppointmentParams,
) -> Result<StatusCode, AppError> {
    let appointment = params
        .into_appointment(&clinic, local_now())
        .inspect_err(|e| {
            tracing::info!(clinic = %clinic, error = %e, "Booking rejected");
            record_appointment_operation("book", "rejected");
        })?;

    let id = state.store.book_appointment(&appointment).await?;
    record_appointment_operation("book", "success");

    tracing::info!(
        appointment_id = id,
        clinic = %appointment.clinic,
        doctor = %appointment.doctor,
        date = %appointment.date,
        time = %appointment.time,
        "Consulta inserida com sucesso."
    );

    Ok(StatusCode::NO_CONTENT)
}

/// `POST /a/{clinica}/cancelar/?paciente&medico&data&hora`
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(clinic): Path<String>,
    params: AppointmentParams,
) -> Result<StatusCode, AppError> {
    let appointment = params
        .into_appointment(&clinic, local_now())
        .inspect_err(|e| {
            tracing::info!(clinic = %clinic, error = %e, "Cancellation rejected");
            record_appointment_operation("cancel", "rejected");
        })?;

    let deleted = state.store.cancel_appointment(&appointment).await?;
    record_appointment_operation("cancel", if deleted > 0 { "success" } else { "no_match" });

    tracing::info!(
        deleted = deleted,
        clinic = %appointment.clinic,
        doctor = %appointment.doctor,
        date = %appointment.date,
        time = %appointment.time,
        "Consulta cancelada com sucesso."
    );

    Ok(StatusCode::NO_CONTENT)
}
