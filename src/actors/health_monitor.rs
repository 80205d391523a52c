use actix::prelude::*;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;

use crate::metrics::Metrics;

// ============================================================================
// Health Monitor Actor - Tracks component health
// ============================================================================
//
// Responsibilities:
// - Track health status of all components
// - Ping the database periodically
// - Aggregate system-wide health for the /salud endpoint
//
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded(String),
    Unhealthy(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub name: String,
    pub status: HealthStatus,
    pub last_check: DateTime<Utc>,
    pub details: Option<String>,
}

// ============================================================================
// Messages
// ============================================================================

#[derive(Message)]
#[rtype(result = "()")]
pub struct UpdateHealth {
    pub component: String,
    pub status: HealthStatus,
    pub details: Option<String>,
}

#[derive(Message)]
#[rtype(result = "SystemHealth")]
pub struct GetSystemHealth;

#[derive(Debug, Clone, Serialize)]
pub struct SystemHealth {
    pub overall_status: HealthStatus,
    pub components: HashMap<String, ComponentHealth>,
    pub check_time: DateTime<Utc>,
}

// ============================================================================
// Health Monitor Actor
// ============================================================================

pub struct HealthMonitorActor {
    components: HashMap<String, ComponentHealth>,
    pool: PgPool,
    metrics: Arc<Metrics>,
}

impl HealthMonitorActor {
    pub fn new(pool: PgPool, metrics: Arc<Metrics>) -> Self {
        Self {
            components: HashMap::new(),
            pool,
            metrics,
        }
    }

    fn compute_overall_status(&self) -> HealthStatus {
        let mut has_degraded = false;
        let mut unhealthy_components = Vec::new();

        for (name, health) in &self.components {
            match &health.status {
                HealthStatus::Unhealthy(msg) => {
                    unhealthy_components.push(format!("{}: {}", name, msg));
                }
                HealthStatus::Degraded(_) => {
                    has_degraded = true;
                }
                HealthStatus::Healthy => {}
            }
        }

        if !unhealthy_components.is_empty() {
            HealthStatus::Unhealthy(unhealthy_components.join(", "))
        } else if has_degraded {
            HealthStatus::Degraded("Some components degraded".to_string())
        } else {
            HealthStatus::Healthy
        }
    }

    fn publish_overall_gauge(&self) {
        let value = match self.compute_overall_status() {
            HealthStatus::Unhealthy(_) => 0,
            HealthStatus::Degraded(_) => 1,
            HealthStatus::Healthy => 2,
        };
        self.metrics.actualizar_salud_actores(value);
    }
}

impl Actor for HealthMonitorActor {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!("HealthMonitorActor started");

        let addr = ctx.address();

        // Ping the database periodically so a dead pool shows up in /salud
        ctx.run_interval(std::time::Duration::from_secs(10), move |act, _ctx| {
            let pool = act.pool.clone();
            let addr = addr.clone();

            actix::spawn(async move {
                let status = match sqlx::query("SELECT 1").execute(&pool).await {
                    Ok(_) => HealthStatus::Healthy,
                    Err(e) => HealthStatus::Unhealthy(format!("database ping failed: {}", e)),
                };

                addr.do_send(UpdateHealth {
                    component: "database".to_string(),
                    status,
                    details: None,
                });
            });
        });
    }
}

impl Handler<UpdateHealth> for HealthMonitorActor {
    type Result = ();

    fn handle(&mut self, msg: UpdateHealth, _: &mut Self::Context) {
        let health = ComponentHealth {
            name: msg.component.clone(),
            status: msg.status.clone(),
            last_check: Utc::now(),
            details: msg.details,
        };

        tracing::debug!(
            component = %msg.component,
            status = ?msg.status,
            "Updated component health"
        );

        self.components.insert(msg.component, health);
        self.publish_overall_gauge();
    }
}

impl Handler<GetSystemHealth> for HealthMonitorActor {
    type Result = MessageResult<GetSystemHealth>;

    fn handle(&mut self, _msg: GetSystemHealth, _: &mut Self::Context) -> Self::Result {
        let overall_status = self.compute_overall_status();

        MessageResult(SystemHealth {
            overall_status,
            components: self.components.clone(),
            check_time: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn component(status: HealthStatus) -> ComponentHealth {
        ComponentHealth {
            name: "x".to_string(),
            status,
            last_check: Utc::now(),
            details: None,
        }
    }

    #[tokio::test]
    async fn estado_general_saludable_sin_componentes_malos() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let pool = PgPool::connect_lazy("postgres://localhost/ignorada").unwrap();
        let mut actor = HealthMonitorActor::new(pool, metrics);
        actor
            .components
            .insert("database".into(), component(HealthStatus::Healthy));

        assert_eq!(actor.compute_overall_status(), HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn un_componente_caido_degrada_todo_el_sistema() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let pool = PgPool::connect_lazy("postgres://localhost/ignorada").unwrap();
        let mut actor = HealthMonitorActor::new(pool, metrics);
        actor
            .components
            .insert("database".into(), component(HealthStatus::Healthy));
        actor.components.insert(
            "change_feed".into(),
            component(HealthStatus::Unhealthy("sin conexión".into())),
        );

        assert!(matches!(
            actor.compute_overall_status(),
            HealthStatus::Unhealthy(_)
        ));
    }
}
