use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::pricing::{redondear, Tasa};
use crate::metrics::Metrics;
use crate::utils::{CircuitBreaker, CircuitBreakerConfig, CircuitState};

use super::{con_metricas, StoreError};

// ============================================================================
// ConfigStore - Exchange Rate Row
// ============================================================================
//
// The rate lives in a single key-value row (`tasa_dolar`). Reads fail closed
// to the hardcoded fallback so pricing keeps working while the database is
// down; a circuit breaker makes that degradation immediate instead of
// stalling every price computation behind a dead connection.
//
// ============================================================================

pub const CLAVE_TASA: &str = "tasa_dolar";

#[derive(Clone)]
pub struct ConfigStore {
    pool: PgPool,
    metrics: Arc<Metrics>,
    breaker: CircuitBreaker,
}

impl ConfigStore {
    pub fn new(pool: PgPool, metrics: Arc<Metrics>) -> Self {
        Self {
            pool,
            metrics,
            breaker: CircuitBreaker::new(CircuitBreakerConfig::default()),
        }
    }

    /// Current rate, or the fallback when the row is unreadable. Infallible
    /// on purpose: callers always get a usable rate.
    pub async fn obtener_tasa(&self) -> Tasa {
        let resultado = self.leer_tasa().await;
        self.publicar_estado_breaker().await;

        match resultado {
            Ok(tasa) => tasa,
            Err(error) => {
                tracing::warn!(error = %error, "No se pudo leer la tasa, usando respaldo");
                self.metrics.registrar_tasa_respaldo();
                Tasa::respaldo()
            }
        }
    }

    /// Persist a new rate. Rejects non-positive values; stores two decimals.
    pub async fn actualizar_tasa(&self, valor: Decimal) -> Result<Tasa, StoreError> {
        let tasa = Tasa::nueva(valor)?;

        con_metricas(&self.metrics, "configuracion_actualizar_tasa", async {
            sqlx::query(
                "INSERT INTO configuracion (clave, valor) VALUES ($1, $2) \
                 ON CONFLICT (clave) DO UPDATE SET valor = EXCLUDED.valor",
            )
            .bind(CLAVE_TASA)
            .bind(redondear(tasa.valor()).to_string())
            .execute(&self.pool)
            .await?;

            tracing::info!(tasa = %tasa.valor(), "Tasa de dólar actualizada");
            Ok(tasa)
        })
        .await
    }

    async fn leer_tasa(&self) -> anyhow::Result<Tasa> {
        let fila: Option<(String,)> = self
            .breaker
            .call(
                sqlx::query_as("SELECT valor FROM configuracion WHERE clave = $1")
                    .bind(CLAVE_TASA)
                    .fetch_optional(&self.pool),
            )
            .await
            .map_err(|e| anyhow::anyhow!("{e}"))?;

        let (valor,) = fila.ok_or_else(|| anyhow::anyhow!("fila {CLAVE_TASA} ausente"))?;
        let decimal = valor
            .parse::<Decimal>()
            .map_err(|e| anyhow::anyhow!("tasa almacenada inválida {valor:?}: {e}"))?;

        Ok(Tasa::nueva(decimal)?)
    }

    async fn publicar_estado_breaker(&self) {
        let estado = match self.breaker.state().await {
            CircuitState::Closed => 0,
            CircuitState::Open => 1,
            CircuitState::HalfOpen => 2,
        };
        self.metrics.actualizar_estado_breaker(estado);
    }
}
