// src/config.rs

use std::env;
use std::net::SocketAddr;

use dotenvy::dotenv;

use crate::{engine::TerminationCriteria, error::AppError};

// Termination thresholds.
pub const MAX_QUESTIONS: usize = 25;
pub const MIN_QUESTIONS: usize = 15;
pub const TARGET_STANDARD_ERROR: f64 = 0.30;
pub const MAX_SESSION_MINUTES: i64 = 20;
pub const REQUIRED_STRAND_COVERAGE: f64 = 0.75;
pub const MIN_DISTINCT_STRANDS: usize = 3;

/// Exposures a strand needs before it counts as covered.
pub const MIN_STRAND_EXPOSURES: u32 = 2;

/// Largest grade distance a candidate may have from the session grade.
pub const MAX_GRADE_DEVIATION: usize = 1;

/// How long finished sessions stay readable before they are evicted from memory.
pub const SESSION_RETENTION_MINUTES: i64 = 60;

/// Interval between sweeps for finished sessions.
pub const SESSION_SWEEP_SECONDS: u64 = 60;

pub const DEFAULT_QUESTION_BANK_PATH: &str = "data/questions.json";

#[derive(Debug, Clone)]
pub struct Config {
    /// When set, questions are read from Postgres instead of the JSON bank.
    pub database_url: Option<String>,
    pub question_bank_path: String,
    pub jwt_secret: String,
    pub rust_log: String,
    pub bind_addr: SocketAddr,
    pub max_session_minutes: i64,
    pub session_retention_minutes: i64,
    pub enforce_strand_requirements: bool,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());

        let question_bank_path = env::var("QUESTION_BANK_PATH")
            .unwrap_or_else(|_| DEFAULT_QUESTION_BANK_PATH.to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| AppError::InternalServerError("JWT_SECRET must be set".to_string()))?;

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let bind_addr: SocketAddr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .map_err(|e| AppError::InternalServerError(format!("Invalid BIND_ADDR: {}", e)))?;

        let max_session_minutes: i64 = match env::var("MAX_SESSION_MINUTES") {
            Ok(raw) => raw.parse().map_err(|e| {
                AppError::InternalServerError(format!("Invalid MAX_SESSION_MINUTES: {}", e))
            })?,
            Err(_) => MAX_SESSION_MINUTES,
        };

        let session_retention_minutes: i64 = match env::var("SESSION_RETENTION_MINUTES") {
            Ok(raw) => raw.parse().map_err(|e| {
                AppError::InternalServerError(format!("Invalid SESSION_RETENTION_MINUTES: {}", e))
            })?,
            Err(_) => SESSION_RETENTION_MINUTES,
        };

        let enforce_strand_requirements = env::var("ENFORCE_STRAND_REQUIREMENTS")
            .map(|raw| !matches!(raw.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no" | "off"))
            .unwrap_or(true);

        Ok(Self {
            database_url,
            question_bank_path,
            jwt_secret,
            rust_log,
            bind_addr,
            max_session_minutes,
            session_retention_minutes,
            enforce_strand_requirements,
        })
    }

    /// Default thresholds with the deployment's time cap and strand switch applied.
    pub fn termination_criteria(&self) -> TerminationCriteria {
        TerminationCriteria {
            max_minutes: self.max_session_minutes,
            enforce_strand_requirements: self.enforce_strand_requirements,
            ..TerminationCriteria::default()
        }
    }
}
