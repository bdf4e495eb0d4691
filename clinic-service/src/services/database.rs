//! PostgreSQL-backed store for clinic-service.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use service_core::error::AppError;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{debug, info, instrument};

use crate::config::DatabaseConfig;
use crate::models::{Clinic, Doctor, NewAppointment, Slot};
use crate::services::metrics::time_query;
use crate::services::store::ClinicStore;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(config), fields(service = "clinic-service"))]
    pub async fn new(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            max_connections = config.max_connections,
            min_connections = config.min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = Self::pool_options(config)
            .connect(&config.url)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Create a pool that opens connections on first use.
    pub fn connect_lazy(config: &DatabaseConfig) -> Result<Self, AppError> {
        let pool = Self::pool_options(config)
            .connect_lazy(&config.url)
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Invalid database URL: {}", e)))?;

        Ok(Self { pool })
    }

    fn pool_options(config: &DatabaseConfig) -> PgPoolOptions {
        PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }
}

#[async_trait]
impl ClinicStore for Database {
    #[instrument(skip(self))]
    async fn list_clinics(&self) -> Result<Vec<Clinic>, AppError> {
        let _timer = time_query("list_clinics");

        let clinics = sqlx::query_as::<_, Clinic>(
            r#"
            SELECT nome AS name, morada AS address
            FROM clinica
            ORDER BY nome DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = clinics.len(), "Clinics listed");
        Ok(clinics)
    }

    #[instrument(skip(self))]
    async fn list_specialties(&self, clinic: &str) -> Result<Vec<String>, AppError> {
        let _timer = time_query("list_specialties");

        let specialties = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT m.especialidade
            FROM medico m
            JOIN trabalha t ON t.nif = m.nif
            WHERE t.nome = $1
            ORDER BY m.especialidade
            "#,
        )
        .bind(clinic)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = specialties.len(), "Specialties listed");
        Ok(specialties)
    }

    #[instrument(skip(self))]
    async fn list_doctors(&self, clinic: &str, specialty: &str) -> Result<Vec<Doctor>, AppError> {
        let _timer = time_query("list_doctors");

        let doctors = sqlx::query_as::<_, Doctor>(
            r#"
            SELECT m.nif, m.nome AS name
            FROM medico m
            JOIN trabalha t ON t.nif = m.nif
            WHERE t.nome = $1 AND m.especialidade = $2
            ORDER BY m.nome, m.nif
            "#,
        )
        .bind(clinic)
        .bind(specialty)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = doctors.len(), "Doctors listed");
        Ok(doctors)
    }

    #[instrument(skip(self))]
    async fn upcoming_slots(
        &self,
        doctor: &str,
        after: NaiveDateTime,
        limit: i64,
    ) -> Result<Vec<Slot>, AppError> {
        let _timer = time_query("upcoming_slots");

        let slots = sqlx::query_as::<_, Slot>(
            r#"
            SELECT data AS "date", hora AS "time"
            FROM consulta
            WHERE nif = $1 AND (data, hora) > ($2, $3)
            ORDER BY data, hora
            LIMIT $4
            "#,
        )
        .bind(doctor)
        .bind(after.date())
        .bind(after.time())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(slots)
    }

    #[instrument(skip(self, appointment), fields(clinic = %appointment.clinic, doctor = %appointment.doctor))]
    async fn book_appointment(&self, appointment: &NewAppointment) -> Result<i32, AppError> {
        let _timer = time_query("book_appointment");

        let mut tx = self.pool.begin().await?;

        // Serializes concurrent bookings so MAX(id) + 1 cannot be handed out twice.
        // Readers are not blocked by EXCLUSIVE mode.
        sqlx::query("LOCK TABLE consulta IN EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await?;

        let id = sqlx::query_scalar::<_, i32>("SELECT COALESCE(MAX(id), 0) + 1 FROM consulta")
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO consulta (id, ssn, nif, nome, data, hora, codigo_sns)
            VALUES ($1, $2, $3, $4, $5, $6, NULL)
            "#,
        )
        .bind(id)
        .bind(&appointment.patient)
        .bind(&appointment.doctor)
        .bind(&appointment.clinic)
        .bind(appointment.date)
        .bind(appointment.time)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(appointment_id = id, "Appointment inserted");
        Ok(id)
    }

    #[instrument(skip(self, appointment), fields(clinic = %appointment.clinic, doctor = %appointment.doctor))]
    async fn cancel_appointment(&self, appointment: &NewAppointment) -> Result<u64, AppError> {
        let _timer = time_query("cancel_appointment");

        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            r#"
            DELETE FROM consulta
            WHERE ssn = $1
              AND nif = $2
              AND nome = $3
              AND data = $4
              AND hora = $5
            "#,
        )
        .bind(&appointment.patient)
        .bind(&appointment.doctor)
        .bind(&appointment.clinic)
        .bind(appointment.date)
        .bind(appointment.time)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        tx.commit().await?;

        info!(deleted = deleted, "Appointment cancellation applied");
        Ok(deleted)
    }

    #[instrument(skip(self))]
    async fn health_check(&self) -> Result<(), AppError> {
        let _timer = time_query("health_check");

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        Ok(())
    }
}
