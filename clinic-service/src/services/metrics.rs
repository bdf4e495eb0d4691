//! Service-level metrics recorded through the `metrics` facade.

use metrics::{counter, histogram};
use std::time::Instant;

/// Count a booking or cancellation attempt by outcome.
pub fn record_appointment_operation(operation: &'static str, outcome: &'static str) {
    counter!(
        "clinic_appointments_total",
        "operation" => operation,
        "outcome" => outcome
    )
    .increment(1);
}

/// Start timing a database query; the duration is recorded when the guard drops.
pub fn time_query(operation: &'static str) -> QueryTimer {
    QueryTimer {
        operation,
        start: Instant::now(),
    }
}

pub struct QueryTimer {
    operation: &'static str,
    start: Instant,
}

impl Drop for QueryTimer {
    fn drop(&mut self) {
        histogram!("clinic_db_query_duration_seconds", "operation" => self.operation)
            .record(self.start.elapsed().as_secs_f64());
    }
}
