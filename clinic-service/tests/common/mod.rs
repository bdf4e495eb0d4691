//! Common test utilities for clinic-service integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header::LOCATION, Method, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clinic_service::config::{ClinicConfig, DatabaseConfig, DEFAULT_DATABASE_URL};
use clinic_service::models::{Clinic, Doctor, NewAppointment, Slot};
use clinic_service::services::ClinicStore;
use clinic_service::startup::{build_router, AppState};
use serde_json::Value;
use service_core::config::Config as CommonConfig;
use service_core::error::AppError;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex, Once};
use tower::ServiceExt;

static INIT: Once = Once::new();

/// Initialize tracing for tests (only once).
pub fn init_tracing() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("info,clinic_service=debug,sqlx=warn")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub fn test_config(database_url: &str) -> ClinicConfig {
    ClinicConfig {
        common: CommonConfig {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
        },
        service_name: "clinic-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: database_url.to_string(),
            max_connections: 2,
            min_connections: 0,
            run_migrations: false,
        },
    }
}

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

pub fn time(s: &str) -> NaiveTime {
    NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAppointment {
    pub id: i32,
    pub patient: String,
    pub doctor: String,
    pub clinic: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub sns_code: Option<String>,
}

#[derive(Default)]
struct Tables {
    clinics: Vec<Clinic>,
    // (nif, name, specialty)
    doctors: Vec<(String, String, String)>,
    // (nif, clinic)
    works_at: Vec<(String, String)>,
    appointments: Vec<StoredAppointment>,
}

/// `ClinicStore` over plain vectors, mirroring the SQL semantics.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
    failing: bool,
}

impl InMemoryStore {
    /// A store whose every call fails as if the database were down.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn add_clinic(&self, name: &str, address: &str) {
        self.tables.lock().unwrap().clinics.push(Clinic {
            name: name.to_string(),
            address: address.to_string(),
        });
    }

    pub fn add_doctor(&self, nif: &str, name: &str, specialty: &str, clinics: &[&str]) {
        let mut tables = self.tables.lock().unwrap();
        tables
            .doctors
            .push((nif.to_string(), name.to_string(), specialty.to_string()));
        for clinic in clinics {
            tables.works_at.push((nif.to_string(), clinic.to_string()));
        }
    }

    pub fn add_appointment(&self, id: i32, patient: &str, doctor: &str, clinic: &str, day: &str, at: &str) {
        self.tables.lock().unwrap().appointments.push(StoredAppointment {
            id,
            patient: patient.to_string(),
            doctor: doctor.to_string(),
            clinic: clinic.to_string(),
            date: date(day),
            time: time(at),
            sns_code: None,
        });
    }

    pub fn appointments(&self) -> Vec<StoredAppointment> {
        self.tables.lock().unwrap().appointments.clone()
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing {
            Err(AppError::DatabaseError(anyhow::anyhow!("connection refused")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ClinicStore for InMemoryStore {
    async fn list_clinics(&self) -> Result<Vec<Clinic>, AppError> {
        self.check()?;
        let mut clinics = self.tables.lock().unwrap().clinics.clone();
        clinics.sort_by(|a, b| b.name.cmp(&a.name));
        Ok(clinics)
    }

    async fn list_specialties(&self, clinic: &str) -> Result<Vec<String>, AppError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let mut specialties: Vec<String> = tables
            .doctors
            .iter()
            .filter(|(nif, _, _)| tables.works_at.iter().any(|(n, c)| n == nif && c == clinic))
            .map(|(_, _, specialty)| specialty.clone())
            .collect();
        specialties.sort();
        specialties.dedup();
        Ok(specialties)
    }

    async fn list_doctors(&self, clinic: &str, specialty: &str) -> Result<Vec<Doctor>, AppError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let mut doctors: Vec<Doctor> = tables
            .doctors
            .iter()
            .filter(|(nif, _, s)| {
                s == specialty && tables.works_at.iter().any(|(n, c)| n == nif && c == clinic)
            })
            .map(|(nif, name, _)| Doctor {
                nif: nif.clone(),
                name: name.clone(),
            })
            .collect();
        doctors.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.nif.cmp(&b.nif)));
        Ok(doctors)
    }

    async fn upcoming_slots(
        &self,
        doctor: &str,
        after: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<Slot>, AppError> {
        self.check()?;
        let mut slots: Vec<Slot> = self
            .tables
            .lock()
            .unwrap()
            .appointments
            .iter()
            .filter(|a| a.doctor == doctor && a.date.and_time(a.time) > after)
            .map(|a| Slot {
                date: a.date,
                time: a.time,
            })
            .collect();
        slots.sort();
        slots.truncate(limit as usize);
        Ok(slots)
    }

    async fn book_appointment(&self, appointment: &NewAppointment) -> Result<i32, AppError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let id = tables.appointments.iter().map(|a| a.id).max().unwrap_or(0) + 1;
        tables.appointments.push(StoredAppointment {
            id,
            patient: appointment.patient.clone(),
            doctor: appointment.doctor.clone(),
            clinic: appointment.clinic.clone(),
            date: appointment.date,
            time: appointment.time,
            sns_code: None,
        });
        Ok(id)
    }

    async fn cancel_appointment(&self, appointment: &NewAppointment) -> Result<u64, AppError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let before = tables.appointments.len();
        tables.appointments.retain(|a| {
            !(a.patient == appointment.patient
                && a.doctor == appointment.doctor
                && a.clinic == appointment.clinic
                && a.date == appointment.date
                && a.time == appointment.time)
        });
        Ok((before - tables.appointments.len()) as u64)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.check()
    }
}

/// Clinics, doctors and appointments shared by the router tests.
///
/// Ana Silva (123456789) works at ClinicaA and ClinicaB and has four future
/// appointments, one of them at ClinicaB, plus one in the past.
pub fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::default();

    store.add_clinic("ClinicaA", "Rua Augusta 1, 1100-048 Lisboa");
    store.add_clinic("ClinicaC", "Avenida da Liberdade 20, 1250-145 Lisboa");
    store.add_clinic("ClinicaB", "Rua de Santa Catarina 5, 4000-447 Porto");

    store.add_doctor("123456789", "Ana Silva", "Cardiologia", &["ClinicaA", "ClinicaB"]);
    store.add_doctor("111111111", "Bruno Costa", "Cardiologia", &["ClinicaA"]);
    store.add_doctor("222222222", "Carla Dias", "Pediatria", &["ClinicaA"]);
    store.add_doctor("333333333", "Duarte Reis", "Pediatria", &["ClinicaB"]);

    store.add_appointment(1, "555555555", "123456789", "ClinicaA", "2020-01-01", "09:00:00");
    store.add_appointment(2, "555555555", "123456789", "ClinicaA", "2099-01-04", "11:00:00");
    store.add_appointment(3, "666666666", "123456789", "ClinicaB", "2099-01-02", "09:00:00");
    store.add_appointment(4, "777777777", "123456789", "ClinicaA", "2099-01-03", "10:00:00");
    store.add_appointment(7, "888888888", "123456789", "ClinicaA", "2099-01-05", "12:00:00");
    store.add_appointment(5, "555555555", "222222222", "ClinicaA", "2099-02-01", "14:30:00");

    store
}

/// Router wired to an in-memory store; the store handle is returned for assertions.
pub fn test_router(store: InMemoryStore) -> (Router, Arc<InMemoryStore>) {
    init_tracing();
    let store = Arc::new(store);
    let state = AppState::new(test_config(DEFAULT_DATABASE_URL), store.clone());
    (build_router(state), store)
}

/// Send a request and return the status with the JSON body (`Null` when empty).
pub async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

/// Send a request and return the status with the `Location` header, if any.
pub async fn send_for_location(router: &Router, method: Method, uri: &str) -> (StatusCode, Option<String>) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let location = response
        .headers()
        .get(LOCATION)
        .map(|value| value.to_str().unwrap().to_string());
    (response.status(), location)
}

pub fn appointment_uri(action: &str, clinic: &str, patient: &str, doctor: &str, day: &str, at: &str) -> String {
    format!(
        "/a/{}/{}/?paciente={}&medico={}&data={}&hora={}",
        clinic, action, patient, doctor, day, at
    )
}
