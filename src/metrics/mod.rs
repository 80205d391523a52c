mod server;

use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Store query throughput and latency per operation
// - Orders created and payments recorded (by method)
// - Change-feed events published (by table)
// - Exchange rate fallback usage and circuit breaker state
// - Actor health status
//
// All metrics are registered with Prometheus and scraped via /metrics
// ============================================================================

/// Central metrics registry for the entire application
pub struct Metrics {
    registry: Registry,

    // Store Metrics
    pub store_queries_total: IntCounterVec,
    pub store_query_duration: HistogramVec,

    // Business Metrics
    pub orders_created_total: IntCounter,
    pub payments_recorded_total: IntCounterVec,

    // Change Feed Metrics
    pub change_events_published_total: IntCounterVec,
    pub change_feed_reconnects_total: IntCounter,

    // Exchange Rate Metrics
    pub rate_fallback_total: IntCounter,
    pub circuit_breaker_state: IntGauge,

    // Actor Metrics
    pub actor_health_status: IntGauge,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        // Store Metrics
        let store_queries_total = IntCounterVec::new(
            Opts::new("store_queries_total", "Total store operations"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(store_queries_total.clone()))?;

        let store_query_duration = HistogramVec::new(
            HistogramOpts::new("store_query_duration_seconds", "Store operation duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(store_query_duration.clone()))?;

        // Business Metrics
        let orders_created_total = IntCounter::new(
            "orders_created_total",
            "Total pedidos created",
        )?;
        registry.register(Box::new(orders_created_total.clone()))?;

        let payments_recorded_total = IntCounterVec::new(
            Opts::new("payments_recorded_total", "Total abonos recorded"),
            &["method"],
        )?;
        registry.register(Box::new(payments_recorded_total.clone()))?;

        // Change Feed Metrics
        let change_events_published_total = IntCounterVec::new(
            Opts::new("change_events_published_total", "Change events fanned out to subscribers"),
            &["table"],
        )?;
        registry.register(Box::new(change_events_published_total.clone()))?;

        let change_feed_reconnects_total = IntCounter::new(
            "change_feed_reconnects_total",
            "Times the change feed listener reconnected to Postgres",
        )?;
        registry.register(Box::new(change_feed_reconnects_total.clone()))?;

        // Exchange Rate Metrics
        let rate_fallback_total = IntCounter::new(
            "rate_fallback_total",
            "Times the hardcoded fallback rate was served",
        )?;
        registry.register(Box::new(rate_fallback_total.clone()))?;

        let circuit_breaker_state = IntGauge::new(
            "circuit_breaker_state",
            "Rate read circuit breaker state (0=Closed, 1=Open, 2=HalfOpen)",
        )?;
        registry.register(Box::new(circuit_breaker_state.clone()))?;

        // Actor Metrics
        let actor_health_status = IntGauge::new(
            "actor_health_status",
            "Aggregate actor health (0=Unhealthy, 1=Degraded, 2=Healthy)",
        )?;
        registry.register(Box::new(actor_health_status.clone()))?;

        Ok(Self {
            registry,
            store_queries_total,
            store_query_duration,
            orders_created_total,
            payments_recorded_total,
            change_events_published_total,
            change_feed_reconnects_total,
            rate_fallback_total,
            circuit_breaker_state,
            actor_health_status,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Helper to record a store operation
    pub fn registrar_consulta(&self, operation: &str, duration_secs: f64, success: bool) {
        let outcome = if success { "ok" } else { "error" };
        self.store_queries_total.with_label_values(&[operation, outcome]).inc();
        self.store_query_duration.with_label_values(&[operation]).observe(duration_secs);
    }

    pub fn registrar_pedido_creado(&self) {
        self.orders_created_total.inc();
    }

    pub fn registrar_abono(&self, metodo: &str) {
        self.payments_recorded_total.with_label_values(&[metodo]).inc();
    }

    pub fn registrar_cambio(&self, tabla: &str) {
        self.change_events_published_total.with_label_values(&[tabla]).inc();
    }

    pub fn registrar_reconexion_feed(&self) {
        self.change_feed_reconnects_total.inc();
    }

    pub fn registrar_tasa_respaldo(&self) {
        self.rate_fallback_total.inc();
    }

    /// Helper to update circuit breaker state
    pub fn actualizar_estado_breaker(&self, state: u8) {
        self.circuit_breaker_state.set(state as i64);
    }

    /// Helper to update aggregate actor health
    pub fn actualizar_salud_actores(&self, status: u8) {
        self.actor_health_status.set(status as i64);
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("Failed to create metrics")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new().unwrap();
        assert!(metrics.registry.gather().len() > 0);
    }

    #[test]
    fn test_registrar_consulta() {
        let metrics = Metrics::new().unwrap();
        metrics.registrar_consulta("pedidos_crear", 0.05, true);
        metrics.registrar_consulta("pedidos_crear", 0.02, false);

        let gathered = metrics.registry.gather();
        let queries = gathered.iter().find(|m| m.name() == "store_queries_total").unwrap();
        assert_eq!(queries.metric.len(), 2); // ok and error labels
    }

    #[test]
    fn test_registrar_abono() {
        let metrics = Metrics::new().unwrap();
        metrics.registrar_abono("efectivo");
        metrics.registrar_abono("efectivo");
        metrics.registrar_abono("transferencia");

        let gathered = metrics.registry.gather();
        let payments = gathered.iter().find(|m| m.name() == "payments_recorded_total").unwrap();
        assert_eq!(payments.metric.len(), 2);
    }

    #[test]
    fn test_circuit_breaker_gauge() {
        let metrics = Metrics::new().unwrap();
        metrics.actualizar_estado_breaker(1);

        let gathered = metrics.registry.gather();
        let state = gathered.iter().find(|m| m.name() == "circuit_breaker_state").unwrap();
        assert_eq!(state.metric[0].gauge.value, Some(1.0));
    }
}
