use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::warn;

use crate::app_state::AppState;
use crate::models::payload::HealthStatus;

/// Always 200; the body says whether the database answered.
pub async fn health(data: web::Data<AppState>) -> HttpResponse {
    let database = match data.store.ping().await {
        Ok(()) => "connected",
        Err(e) => {
            warn!("Health check could not reach the database: {}", e);
            "disconnected"
        }
    };
    HttpResponse::Ok().json(HealthStatus {
        status: "Server is running".to_string(),
        database: database.to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}
