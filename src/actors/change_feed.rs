use actix::prelude::*;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgListener;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::health_monitor::{HealthMonitorActor, HealthStatus, UpdateHealth};
use crate::metrics::Metrics;
use crate::store::schema::TABLAS_CON_FEED;
use crate::utils::BackoffPolicy;

// ============================================================================
// Change Feed Actor - Postgres LISTEN/NOTIFY fan-out
// ============================================================================
//
// Responsibilities:
// - Hold a dedicated LISTEN connection on the `*_cambios` channels
// - Decode trigger payloads into Cambio events
// - Fan events out over a broadcast channel to SSE subscribers
// - Reconnect with backoff when the connection drops
//
// Events carry only {tabla, op}. Subscribers reload the affected list
// instead of merging row diffs, so a dropped event costs one stale refresh
// at most.
//
// ============================================================================

/// One change notification, as emitted by the table triggers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cambio {
    pub tabla: String,
    pub op: String,
}

pub struct ChangeFeedActor {
    database_url: String,
    tx: broadcast::Sender<Cambio>,
    metrics: Arc<Metrics>,
    health: Addr<HealthMonitorActor>,
}

impl ChangeFeedActor {
    pub fn new(
        database_url: String,
        tx: broadcast::Sender<Cambio>,
        metrics: Arc<Metrics>,
        health: Addr<HealthMonitorActor>,
    ) -> Self {
        Self {
            database_url,
            tx,
            metrics,
            health,
        }
    }
}

impl Actor for ChangeFeedActor {
    type Context = Context<Self>;

    fn started(&mut self, _ctx: &mut Self::Context) {
        tracing::info!("🔔 ChangeFeedActor started");

        let database_url = self.database_url.clone();
        let tx = self.tx.clone();
        let metrics = self.metrics.clone();
        let health = self.health.clone();

        actix::spawn(async move {
            escuchar(database_url, tx, metrics, health).await;
        });
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        tracing::info!("🛑 ChangeFeedActor stopped");
    }
}

/// Listen loop. Never returns; reconnects forever with backoff, resetting
/// the attempt counter after each successful connection.
async fn escuchar(
    database_url: String,
    tx: broadcast::Sender<Cambio>,
    metrics: Arc<Metrics>,
    health: Addr<HealthMonitorActor>,
) {
    let policy = BackoffPolicy::persistente();
    let mut intento: u32 = 0;

    loop {
        match conectar(&database_url).await {
            Ok(mut listener) => {
                intento = 0;
                tracing::info!(canales = TABLAS_CON_FEED.len(), "Escuchando cambios de Postgres");
                health.do_send(UpdateHealth {
                    component: "change_feed".to_string(),
                    status: HealthStatus::Healthy,
                    details: Some("listening".to_string()),
                });

                loop {
                    match listener.recv().await {
                        Ok(notificacion) => {
                            procesar(notificacion.payload(), &tx, &metrics);
                        }
                        Err(error) => {
                            tracing::warn!(%error, "Conexión del feed de cambios perdida");
                            break;
                        }
                    }
                }
            }
            Err(error) => {
                tracing::warn!(%error, intento, "No se pudo conectar el feed de cambios");
            }
        }

        metrics.registrar_reconexion_feed();
        health.do_send(UpdateHealth {
            component: "change_feed".to_string(),
            status: HealthStatus::Degraded("reconnecting".to_string()),
            details: None,
        });

        let espera = policy.delay_for(intento);
        intento = intento.saturating_add(1);
        tokio::time::sleep(espera).await;
    }
}

async fn conectar(database_url: &str) -> Result<PgListener, sqlx::Error> {
    let mut listener = PgListener::connect(database_url).await?;
    for tabla in TABLAS_CON_FEED {
        let canal = format!("{tabla}_cambios");
        listener.listen(&canal).await?;
    }
    Ok(listener)
}

fn procesar(payload: &str, tx: &broadcast::Sender<Cambio>, metrics: &Arc<Metrics>) {
    let cambio: Cambio = match serde_json::from_str(payload) {
        Ok(cambio) => cambio,
        Err(error) => {
            tracing::error!(%error, payload, "Payload de notificación inválido");
            return;
        }
    };

    tracing::debug!(tabla = %cambio.tabla, op = %cambio.op, "Cambio recibido");
    metrics.registrar_cambio(&cambio.tabla);

    // A send error only means nobody is subscribed right now
    let _ = tx.send(cambio);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn procesa_payload_de_trigger() {
        let (tx, mut rx) = broadcast::channel(8);
        let metrics = Arc::new(Metrics::new().unwrap());

        procesar(r#"{"tabla":"pedidos","op":"INSERT"}"#, &tx, &metrics);

        let cambio = rx.try_recv().unwrap();
        assert_eq!(cambio.tabla, "pedidos");
        assert_eq!(cambio.op, "INSERT");
    }

    #[test]
    fn payload_invalido_no_se_publica() {
        let (tx, mut rx) = broadcast::channel(8);
        let metrics = Arc::new(Metrics::new().unwrap());

        procesar("no es json", &tx, &metrics);

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn enviar_sin_suscriptores_no_falla() {
        let (tx, _) = broadcast::channel(8);
        let metrics = Arc::new(Metrics::new().unwrap());

        procesar(r#"{"tabla":"platillos","op":"DELETE"}"#, &tx, &metrics);
    }
}
