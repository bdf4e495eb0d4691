//! HTTP handlers for clinic-service.

pub mod appointments;
pub mod clinics;
pub mod health;

pub use appointments::{book_appointment, cancel_appointment};
pub use clinics::{list_clinics, list_doctors, list_specialties};
pub use health::{health_check, metrics_handler, readiness_check};

use chrono::{Local, NaiveDateTime};

/// Wall-clock "now" in the server's local time zone, which is what the
/// appointment dates and times are stored in.
pub(crate) fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}
