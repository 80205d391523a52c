use actix::Addr;
use actix_web::web;
use tokio::sync::broadcast;

use crate::actors::{Cambio, HealthMonitorActor};
use crate::store::{ConfigStore, PedidoStore, PlatilloStore};

// ============================================================================
// API Module - REST Surface
// ============================================================================
//
// Routes:
//   /platillos          menu CRUD and search
//   /pedidos            order lifecycle, abonos, completion
//   /configuracion/tasa exchange rate read/update
//   /cambios            SSE change feed
//   /salud              aggregated component health
//
// ============================================================================

pub mod cambios;
pub mod configuracion;
pub mod error;
pub mod pedidos;
pub mod platillos;
pub mod salud;

pub use error::ApiError;

/// Shared handler state, cloned into every worker.
#[derive(Clone)]
pub struct AppState {
    pub platillos: PlatilloStore,
    pub pedidos: PedidoStore,
    pub config: ConfigStore,
    pub cambios: broadcast::Sender<Cambio>,
    pub health: Addr<HealthMonitorActor>,
}

pub fn configurar_rutas(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/platillos")
            .route("", web::get().to(platillos::listar))
            .route("", web::post().to(platillos::crear))
            .route("/{id}", web::put().to(platillos::actualizar))
            .route("/{id}", web::delete().to(platillos::eliminar)),
    )
    .service(
        web::scope("/pedidos")
            .route("", web::get().to(pedidos::listar))
            .route("", web::post().to(pedidos::crear))
            .route("", web::delete().to(pedidos::limpiar))
            .route("/{id}", web::get().to(pedidos::obtener))
            .route("/{id}", web::delete().to(pedidos::eliminar))
            .route("/{id}/items", web::put().to(pedidos::reemplazar_items))
            .route("/{id}/abonos", web::get().to(pedidos::listar_abonos))
            .route("/{id}/abonos", web::post().to(pedidos::registrar_abono))
            .route("/{id}/completar", web::post().to(pedidos::completar)),
    )
    .service(
        web::scope("/configuracion")
            .route("/tasa", web::get().to(configuracion::obtener_tasa))
            .route("/tasa", web::put().to(configuracion::actualizar_tasa)),
    )
    .route("/cambios", web::get().to(cambios::suscribir))
    .route("/salud", web::get().to(salud::consultar));
}
