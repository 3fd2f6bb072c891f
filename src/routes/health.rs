use actix_web::{get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Liveness report. Does not touch the database.
#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub service: &'static str,
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

impl HealthReport {
    fn now() -> Self {
        Self {
            service: env!("CARGO_PKG_NAME"),
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
            timestamp: Utc::now(),
        }
    }
}

#[get("/health")]
pub async fn health() -> web::Json<HealthReport> {
    web::Json(HealthReport::now())
}
