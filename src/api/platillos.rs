use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::{ApiError, AppState};
use crate::domain::platillo::{ActualizarPlatillo, NuevoPlatillo};

#[derive(Debug, Deserialize)]
pub struct FiltroPlatillos {
    /// Partial name filter; omitted means the full active menu.
    pub buscar: Option<String>,
}

pub async fn listar(
    state: web::Data<AppState>,
    filtro: web::Query<FiltroPlatillos>,
) -> Result<HttpResponse, ApiError> {
    let platillos = match filtro.buscar.as_deref() {
        Some(termino) if !termino.trim().is_empty() => state.platillos.buscar(termino).await?,
        _ => state.platillos.listar_activos().await?,
    };
    Ok(HttpResponse::Ok().json(platillos))
}

pub async fn crear(
    state: web::Data<AppState>,
    cuerpo: web::Json<NuevoPlatillo>,
) -> Result<HttpResponse, ApiError> {
    let platillo = state.platillos.insertar(cuerpo.into_inner()).await?;
    Ok(HttpResponse::Created().json(platillo))
}

pub async fn actualizar(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
    cuerpo: web::Json<ActualizarPlatillo>,
) -> Result<HttpResponse, ApiError> {
    let platillo = state
        .platillos
        .actualizar(id.into_inner(), cuerpo.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(platillo))
}

pub async fn eliminar(
    state: web::Data<AppState>,
    id: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    state.platillos.eliminar(id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
