use std::sync::Arc;

use crate::domain::pedido::PedidoError;
use crate::domain::platillo::PlatilloError;
use crate::domain::pricing::PricingError;
use crate::metrics::Metrics;
use crate::utils::Transient;

// ============================================================================
// Store Layer - Postgres Persistence
// ============================================================================
//
// One store per table, each a thin wrapper over a shared PgPool:
// - platillos:     menu item CRUD and search
// - pedidos:       order lifecycle, abonos, line edits
// - configuracion: exchange rate key-value row
//
// Schema creation lives in `schema`; every store records operation timing
// and outcome in the shared metrics registry.
//
// ============================================================================

pub mod configuracion;
pub mod pedidos;
pub mod platillos;
pub mod schema;

pub use configuracion::ConfigStore;
pub use pedidos::PedidoStore;
pub use platillos::PlatilloStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("registro no encontrado")]
    NoEncontrado,

    #[error(transparent)]
    Pedido(#[from] PedidoError),

    #[error(transparent)]
    Platillo(#[from] PlatilloError),

    #[error(transparent)]
    Tasa(#[from] PricingError),

    #[error("error de base de datos: {0}")]
    Db(#[from] sqlx::Error),
}

impl Transient for sqlx::Error {
    fn is_transient(&self) -> bool {
        matches!(
            self,
            sqlx::Error::Io(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed
        )
    }
}

impl Transient for StoreError {
    fn is_transient(&self) -> bool {
        match self {
            StoreError::Db(error) => error.is_transient(),
            _ => false,
        }
    }
}

/// Run a store operation while recording its duration and outcome.
pub(crate) async fn con_metricas<T, F>(
    metrics: &Arc<Metrics>,
    operacion: &'static str,
    fut: F,
) -> Result<T, StoreError>
where
    F: std::future::Future<Output = Result<T, StoreError>>,
{
    let inicio = std::time::Instant::now();
    let resultado = fut.await;
    metrics.registrar_consulta(
        operacion,
        inicio.elapsed().as_secs_f64(),
        resultado.is_ok(),
    );
    if let Err(error) = &resultado {
        tracing::error!(operacion, error = %error, "operación de base de datos falló");
    }
    resultado
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errores_de_conexion_son_transitorios() {
        assert!(StoreError::Db(sqlx::Error::PoolTimedOut).is_transient());
        assert!(!StoreError::NoEncontrado.is_transient());
        assert!(!StoreError::Pedido(PedidoError::SinItems).is_transient());
    }
}
