use actix_web::{web, HttpResponse};

use super::{ApiError, AppState};
use crate::actors::{GetSystemHealth, HealthStatus};

/// Aggregated component health. Degraded components still answer 200 so
/// load balancers keep routing; only an unhealthy system answers 503.
pub async fn consultar(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let salud = state
        .health
        .send(GetSystemHealth)
        .await
        .map_err(|e| ApiError::Interna(e.into()))?;

    let respuesta = match salud.overall_status {
        HealthStatus::Unhealthy(_) => HttpResponse::ServiceUnavailable().json(salud),
        _ => HttpResponse::Ok().json(salud),
    };
    Ok(respuesta)
}
