use actix_web::{web, HttpResponse};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use super::{ApiError, AppState};

#[derive(Debug, Deserialize)]
pub struct NuevaTasa {
    pub tasa: Decimal,
}

/// Current rate. Served even while the database is down, in which case the
/// fallback value comes back.
pub async fn obtener_tasa(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let tasa = state.config.obtener_tasa().await;
    Ok(HttpResponse::Ok().json(json!({ "tasa": tasa.valor() })))
}

pub async fn actualizar_tasa(
    state: web::Data<AppState>,
    cuerpo: web::Json<NuevaTasa>,
) -> Result<HttpResponse, ApiError> {
    let tasa = state.config.actualizar_tasa(cuerpo.tasa).await?;
    Ok(HttpResponse::Ok().json(json!({ "tasa": tasa.valor() })))
}
