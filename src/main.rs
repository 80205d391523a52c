use actix::prelude::*;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod actors;
mod api;
mod config;
mod domain;
mod metrics;
mod store;
mod utils;

use actors::{CoordinatorActor, GetHealthMonitor};
use api::AppState;
use config::Settings;
use store::{ConfigStore, PedidoStore, PlatilloStore};
use utils::{with_backoff, BackoffPolicy};

#[actix::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,comanda=debug")),
        )
        .init();

    tracing::info!("🚀 Starting comanda order management service");

    let settings = Settings::from_env()?;

    // === 1. Connect to Postgres and prepare the schema ===
    tracing::info!("Connecting to Postgres...");
    let pool = with_backoff(&BackoffPolicy::default(), || {
        PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .connect(&settings.database_url)
    })
    .await?;

    store::schema::inicializar(&pool).await?;

    // === 2. Initialize Prometheus metrics ===
    tracing::info!("Initializing metrics");
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        "📊 Metrics registry created with {} metrics",
        metrics.registry().gather().len()
    );

    // Start metrics HTTP server in background thread
    let metrics_registry = Arc::new(metrics.registry().clone());
    let metrics_port = settings.metrics_port;
    std::thread::spawn(move || {
        let rt = match tokio::runtime::Runtime::new() {
            Ok(rt) => rt,
            Err(e) => {
                tracing::error!("Metrics runtime error: {}", e);
                return;
            }
        };
        rt.block_on(async {
            if let Err(e) = metrics::start_metrics_server(metrics_registry, metrics_port).await {
                tracing::error!("Metrics server error: {}", e);
            }
        });
    });

    // === 3. Start Coordinator Actor (change feed + health monitor) ===
    tracing::info!("Starting coordinator actor with supervision");
    let (cambios_tx, _) = broadcast::channel(256);
    let coordinator = CoordinatorActor::new(
        pool.clone(),
        settings.database_url.clone(),
        cambios_tx.clone(),
        metrics.clone(),
    )
    .start();

    let health = coordinator
        .send(GetHealthMonitor)
        .await?
        .ok_or_else(|| anyhow::anyhow!("el coordinador no inició el monitor de salud"))?;

    // === 4. Build stores and serve the REST API ===
    let state = AppState {
        platillos: PlatilloStore::new(pool.clone(), metrics.clone()),
        pedidos: PedidoStore::new(pool.clone(), metrics.clone()),
        config: ConfigStore::new(pool.clone(), metrics.clone()),
        cambios: cambios_tx,
        health,
    };

    tracing::info!("🌐 Serving API on http://{}", settings.api_addr);
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(api::configurar_rutas)
    })
    .bind(&settings.api_addr)?
    .run()
    .await?;

    Ok(())
}
