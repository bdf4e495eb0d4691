//! Clinic Service - clinic directory and appointment booking over PostgreSQL.

pub mod config;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod services;
pub mod startup;

pub use startup::AppState;
