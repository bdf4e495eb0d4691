//! Request parameters for the appointment routes.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use service_core::error::{AppError, MISSING_PARAMETERS};
use validator::Validate;

use crate::models::NewAppointment;

pub const INVALID_DATE_TIME: &str = "Formato de data ou hora invalido.";
pub const NOT_IN_FUTURE: &str = "A consulta tem que se realizar no futuro.";

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMATS: [&str; 2] = ["%H:%M:%S", "%H:%M"];

/// Query string shared by `registar` and `cancelar`.
///
/// Extracted from raw key/value pairs so a repeated key keeps its first value
/// instead of failing deserialization.
#[derive(Debug, Default, Clone, Validate)]
pub struct AppointmentParams {
    #[validate(required, length(min = 1))]
    pub paciente: Option<String>,
    #[validate(required, length(min = 1))]
    pub medico: Option<String>,
    #[validate(required, length(min = 1))]
    pub data: Option<String>,
    #[validate(required, length(min = 1))]
    pub hora: Option<String>,
}

impl AppointmentParams {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_str() {
                "paciente" => &mut params.paciente,
                "medico" => &mut params.medico,
                "data" => &mut params.data,
                "hora" => &mut params.hora,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value);
            }
        }
        params
    }

    /// Check presence, parse the date and time, and require the result to be
    /// strictly later than `now`.
    pub fn into_appointment(
        self,
        clinic: &str,
        now: NaiveDateTime,
    ) -> Result<NewAppointment, AppError> {
        self.validate()?;

        let (Some(patient), Some(doctor), Some(data), Some(hora)) =
            (self.paciente, self.medico, self.data, self.hora)
        else {
            return Err(AppError::ValidationError(validator::ValidationErrors::new()));
        };

        let date = parse_date(&data)?;
        let time = parse_time(&hora)?;

        let appointment = NewAppointment {
            patient: patient.trim().to_string(),
            doctor: doctor.trim().to_string(),
            clinic: clinic.to_string(),
            date,
            time,
        };

        if appointment.starts_at() <= now {
            return Err(AppError::BadRequest(anyhow::anyhow!(NOT_IN_FUTURE)));
        }

        Ok(appointment)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AppointmentParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                tracing::info!(error = %rejection, "Unreadable appointment query string");
                AppError::BadRequest(anyhow::anyhow!(MISSING_PARAMETERS))
            })?;

        Ok(Self::from_pairs(pairs))
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!(INVALID_DATE_TIME)))
}

fn parse_time(raw: &str) -> Result<NaiveTime, AppError> {
    let raw = raw.trim();
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!(INVALID_DATE_TIME)))
}
