//! Domain models for clinic-service.
//!
//! Field names are English; serialized names follow the public API.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maximum number of upcoming slots listed per doctor.
pub const MAX_SLOTS_PER_DOCTOR: i64 = 3;

/// A clinic as listed on the index route.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Clinic {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "morada")]
    pub address: String,
}

/// A doctor affiliated with a clinic. The tax id is internal and never serialized.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Doctor {
    pub nif: String,
    pub name: String,
}

/// An upcoming appointment instance shown as availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, FromRow, Serialize, Deserialize)]
pub struct Slot {
    #[serde(rename = "data")]
    pub date: NaiveDate,
    #[serde(rename = "hora", with = "time_format")]
    pub time: NaiveTime,
}

impl Slot {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// A doctor entry on the clinic+specialty listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoctorAvailability {
    #[serde(rename = "nome")]
    pub name: String,
    #[serde(rename = "horarios_disponiveis")]
    pub available_slots: Vec<Slot>,
}

/// A validated appointment request; also the key used to cancel one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAppointment {
    pub patient: String,
    pub doctor: String,
    pub clinic: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl NewAppointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.date.and_time(self.time)
    }
}

/// `HH:MM:SS`, dropping any sub-second part.
mod time_format {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M:%S";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(serde::de::Error::custom)
    }
}
