use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;

use crate::store::StoreError;

// ============================================================================
// API Errors - StoreError to HTTP Mapping
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validacion(String),

    #[error("recurso no encontrado")]
    NoEncontrado,

    #[error("error interno")]
    Interna(#[source] anyhow::Error),
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NoEncontrado => ApiError::NoEncontrado,
            StoreError::Pedido(e) => ApiError::Validacion(e.to_string()),
            StoreError::Platillo(e) => ApiError::Validacion(e.to_string()),
            StoreError::Tasa(e) => ApiError::Validacion(e.to_string()),
            StoreError::Db(e) => ApiError::Interna(e.into()),
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validacion(_) => StatusCode::BAD_REQUEST,
            ApiError::NoEncontrado => StatusCode::NOT_FOUND,
            ApiError::Interna(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Interna(source) = self {
            tracing::error!(error = %source, "error interno en handler");
        }
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pedido::PedidoError;

    #[test]
    fn no_encontrado_es_404() {
        let error: ApiError = StoreError::NoEncontrado.into();
        assert_eq!(error.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn error_de_dominio_es_400() {
        let error: ApiError = StoreError::Pedido(PedidoError::YaCompletado).into();
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn error_de_base_de_datos_es_500_y_no_filtra_detalle() {
        let error: ApiError = StoreError::Db(sqlx::Error::PoolTimedOut).into();
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "error interno");
    }
}
