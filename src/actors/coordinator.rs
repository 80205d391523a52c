use actix::prelude::*;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::change_feed::{Cambio, ChangeFeedActor};
use super::health_monitor::{GetSystemHealth, HealthMonitorActor, HealthStatus, UpdateHealth};
use crate::metrics::Metrics;

// ============================================================================
// Coordinator Actor - Orchestrates all system actors
// ============================================================================
//
// Responsibilities:
// - Manages lifecycle of child actors (ChangeFeedActor, HealthMonitorActor)
// - Coordinates graceful shutdown
// - Reports system health on a fixed interval
//
// ============================================================================

pub struct CoordinatorActor {
    pool: PgPool,
    database_url: String,
    cambios: broadcast::Sender<Cambio>,
    metrics: Arc<Metrics>,
    change_feed: Option<Addr<ChangeFeedActor>>,
    health_monitor: Option<Addr<HealthMonitorActor>>,
}

impl CoordinatorActor {
    pub fn new(
        pool: PgPool,
        database_url: String,
        cambios: broadcast::Sender<Cambio>,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            pool,
            database_url,
            cambios,
            metrics,
            change_feed: None,
            health_monitor: None,
        }
    }

    fn start_child_actors(&mut self, _ctx: &mut Context<Self>) {
        tracing::info!("Starting supervised child actors");

        let health_monitor =
            HealthMonitorActor::new(self.pool.clone(), self.metrics.clone()).start();
        self.health_monitor = Some(health_monitor.clone());

        let change_feed = ChangeFeedActor::new(
            self.database_url.clone(),
            self.cambios.clone(),
            self.metrics.clone(),
            health_monitor.clone(),
        )
        .start();
        self.change_feed = Some(change_feed);

        health_monitor.do_send(UpdateHealth {
            component: "change_feed".to_string(),
            status: HealthStatus::Healthy,
            details: Some("Change feed actor started".to_string()),
        });

        tracing::info!("✅ All supervised actors started successfully");
    }
}

impl Actor for CoordinatorActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("🎯 CoordinatorActor started");
        self.start_child_actors(ctx);

        // Schedule periodic health checks
        ctx.run_interval(std::time::Duration::from_secs(30), |act, _ctx| {
            if let Some(ref health_monitor) = act.health_monitor {
                let health_monitor = health_monitor.clone();
                actix::spawn(async move {
                    match health_monitor.send(GetSystemHealth).await {
                        Ok(health) => match health.overall_status {
                            HealthStatus::Healthy => {
                                tracing::debug!("System health check: Healthy");
                            }
                            HealthStatus::Degraded(ref msg) => {
                                tracing::warn!("System health check: Degraded - {}", msg);
                            }
                            HealthStatus::Unhealthy(ref msg) => {
                                tracing::error!("System health check: Unhealthy - {}", msg);
                            }
                        },
                        Err(e) => {
                            tracing::error!("Failed to get system health: {}", e);
                        }
                    }
                });
            }
        });
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        tracing::info!("🛑 CoordinatorActor stopping - initiating graceful shutdown");
        Running::Stop
    }

    fn stopped(&mut self, _: &mut Self::Context) {
        tracing::info!("🛑 CoordinatorActor stopped");
    }
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "Result<(), String>")]
pub struct Shutdown;

impl Handler<Shutdown> for CoordinatorActor {
    type Result = Result<(), String>;

    fn handle(&mut self, _msg: Shutdown, ctx: &mut Self::Context) -> Self::Result {
        tracing::info!("Received shutdown signal");

        if let Some(ref change_feed) = self.change_feed {
            change_feed.do_send(StopActor);
        }

        if let Some(ref health_monitor) = self.health_monitor {
            health_monitor.do_send(StopActor);
        }

        ctx.stop();
        Ok(())
    }
}

/// Message to gracefully stop an actor
#[derive(Message)]
#[rtype(result = "()")]
struct StopActor;

impl Handler<StopActor> for ChangeFeedActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("ChangeFeedActor received stop signal");
        ctx.stop();
    }
}

impl Handler<StopActor> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, _: StopActor, ctx: &mut Self::Context) {
        tracing::info!("HealthMonitorActor received stop signal");
        ctx.stop();
    }
}

// ============================================================================
// Public API for accessing child actors
// ============================================================================

#[derive(Message)]
#[rtype(result = "Option<Addr<HealthMonitorActor>>")]
pub struct GetHealthMonitor;

impl Handler<GetHealthMonitor> for CoordinatorActor {
    type Result = Option<Addr<HealthMonitorActor>>;

    fn handle(&mut self, _: GetHealthMonitor, _: &mut Self::Context) -> Self::Result {
        self.health_monitor.clone()
    }
}
