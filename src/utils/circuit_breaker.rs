use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

// ============================================================================
// Circuit Breaker
// ============================================================================
//
// Guards a dependency that can fail hard (here: the configuracion table).
// When the breaker is open, callers fail fast instead of waiting on a dead
// connection; after a cool-down a limited probe decides whether to close.
//
// States: Closed (normal) -> Open (blocking) -> HalfOpen (probing).
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Clone, Debug)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,
    /// Cool-down before a half-open probe is allowed.
    pub cooldown: Duration,
    /// Successes in half-open needed to close again.
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            cooldown: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

#[derive(Debug)]
pub enum CircuitBreakerError<E> {
    CircuitOpen,
    OperationFailed(E),
}

impl<E: std::fmt::Display> std::fmt::Display for CircuitBreakerError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitBreakerError::CircuitOpen => write!(f, "circuito abierto"),
            CircuitBreakerError::OperationFailed(e) => write!(f, "operación fallida: {}", e),
        }
    }
}

impl<E: std::error::Error> std::error::Error for CircuitBreakerError<E> {}

struct Inner {
    state: CircuitState,
    failures: u32,
    successes: u32,
    opened_at: Option<Instant>,
}

#[derive(Clone)]
pub struct CircuitBreaker {
    inner: Arc<Mutex<Inner>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                state: CircuitState::Closed,
                failures: 0,
                successes: 0,
                opened_at: None,
            })),
            config,
        }
    }

    /// Run `operation` if the circuit allows it, recording the outcome.
    pub async fn call<F, T, E>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: std::future::Future<Output = Result<T, E>>,
    {
        {
            let mut inner = self.inner.lock().await;
            if inner.state == CircuitState::Open {
                let elapsed = inner.opened_at.map(|t| t.elapsed()).unwrap_or_default();
                if elapsed < self.config.cooldown {
                    return Err(CircuitBreakerError::CircuitOpen);
                }
                tracing::info!("circuit breaker pasa a half-open");
                inner.state = CircuitState::HalfOpen;
                inner.successes = 0;
            }
        }

        match operation.await {
            Ok(value) => {
                self.on_success().await;
                Ok(value)
            }
            Err(error) => {
                self.on_failure().await;
                Err(CircuitBreakerError::OperationFailed(error))
            }
        }
    }

    pub async fn state(&self) -> CircuitState {
        self.inner.lock().await.state
    }

    pub async fn reset(&self) {
        let mut inner = self.inner.lock().await;
        inner.state = CircuitState::Closed;
        inner.failures = 0;
        inner.successes = 0;
        inner.opened_at = None;
    }

    async fn on_success(&self) {
        let mut inner = self.inner.lock().await;
        match inner.state {
            CircuitState::Closed => inner.failures = 0,
            CircuitState::HalfOpen => {
                inner.successes += 1;
                if inner.successes >= self.config.success_threshold {
                    tracing::info!("circuit breaker cerrado tras recuperación");
                    inner.state = CircuitState::Closed;
                    inner.failures = 0;
                    inner.opened_at = None;
                }
            }
            CircuitState::Open => {}
        }
    }

    async fn on_failure(&self) {
        let mut inner = self.inner.lock().await;
        inner.failures += 1;

        match inner.state {
            CircuitState::Closed if inner.failures >= self.config.failure_threshold => {
                tracing::warn!(failures = inner.failures, "circuit breaker abierto");
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
            }
            CircuitState::HalfOpen => {
                tracing::warn!("fallo durante half-open, se reabre el circuito");
                inner.state = CircuitState::Open;
                inner.opened_at = Some(Instant::now());
                inner.successes = 0;
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_de_prueba() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: 2,
            cooldown: Duration::from_millis(50),
            success_threshold: 1,
        }
    }

    #[tokio::test]
    async fn abre_tras_fallos_consecutivos() {
        let breaker = CircuitBreaker::new(config_de_prueba());

        for _ in 0..2 {
            let _ = breaker.call(async { Err::<(), _>("fallo") }).await;
        }
        assert_eq!(breaker.state().await, CircuitState::Open);

        // Mientras está abierto falla rápido, sin ejecutar la operación
        let resultado = breaker.call(async { Ok::<_, &str>(()) }).await;
        assert!(matches!(resultado, Err(CircuitBreakerError::CircuitOpen)));
    }

    #[tokio::test]
    async fn se_recupera_tras_el_cooldown() {
        let breaker = CircuitBreaker::new(config_de_prueba());

        for _ in 0..2 {
            let _ = breaker.call(async { Err::<(), _>("fallo") }).await;
        }
        assert_eq!(breaker.state().await, CircuitState::Open);

        tokio::time::sleep(Duration::from_millis(80)).await;

        let resultado = breaker.call(async { Ok::<_, &str>(()) }).await;
        assert!(resultado.is_ok());
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn fallo_en_half_open_reabre() {
        let breaker = CircuitBreaker::new(config_de_prueba());

        for _ in 0..2 {
            let _ = breaker.call(async { Err::<(), _>("fallo") }).await;
        }
        tokio::time::sleep(Duration::from_millis(80)).await;

        let _ = breaker.call(async { Err::<(), _>("fallo otra vez") }).await;
        assert_eq!(breaker.state().await, CircuitState::Open);
    }

    #[tokio::test]
    async fn un_exito_no_abre_nada() {
        let breaker = CircuitBreaker::new(config_de_prueba());
        let resultado = breaker.call(async { Ok::<_, &str>(42) }).await;
        assert_eq!(resultado.unwrap(), 42);
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }

    #[tokio::test]
    async fn reset_manual_cierra_el_circuito() {
        let breaker = CircuitBreaker::new(config_de_prueba());
        for _ in 0..2 {
            let _ = breaker.call(async { Err::<(), _>("fallo") }).await;
        }
        breaker.reset().await;
        assert_eq!(breaker.state().await, CircuitState::Closed);
    }
}
