use std::time::Duration;
use tokio::time::sleep;

// ============================================================================
// Exponential Backoff
// ============================================================================
//
// Retry policy for transient failures (connection drops, pool timeouts).
// Errors classify themselves through the `Transient` trait; a permanent
// error aborts the retry loop immediately.
//
// ============================================================================

#[derive(Clone, Debug)]
pub struct BackoffPolicy {
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(10),
            multiplier: 2,
        }
    }
}

impl BackoffPolicy {
    /// Policy for long-lived connections that must come back eventually,
    /// such as the change-feed listener.
    pub fn persistente() -> Self {
        Self {
            max_attempts: u32::MAX,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2,
        }
    }

    /// Delay before the given retry attempt (1-based), capped at max_delay.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let factor = self.multiplier.saturating_pow(exp);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }
}

/// Classifies whether an error is worth retrying.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

/// Run `operation` until it succeeds, the policy is exhausted, or a
/// permanent error occurs.
pub async fn with_backoff<F, Fut, T, E>(policy: &BackoffPolicy, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
    E: std::fmt::Display + Transient,
{
    let mut attempt: u32 = 0;

    loop {
        attempt += 1;

        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(attempt, "operación exitosa tras reintento");
                }
                return Ok(value);
            }
            Err(error) if !error.is_transient() => {
                tracing::error!(error = %error, "fallo permanente, sin reintentos");
                return Err(error);
            }
            Err(error) if attempt >= policy.max_attempts => {
                tracing::error!(attempt, error = %error, "reintentos agotados");
                return Err(error);
            }
            Err(error) => {
                let delay = policy.delay_for(attempt);
                tracing::warn!(
                    attempt,
                    error = %error,
                    delay_ms = delay.as_millis(),
                    "fallo transitorio, reintentando"
                );
                sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[derive(Debug)]
    struct FalloDePrueba {
        transitorio: bool,
    }

    impl std::fmt::Display for FalloDePrueba {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "fallo de prueba")
        }
    }

    impl Transient for FalloDePrueba {
        fn is_transient(&self) -> bool {
            self.transitorio
        }
    }

    fn politica_rapida() -> BackoffPolicy {
        BackoffPolicy {
            max_attempts: 3,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            multiplier: 2,
        }
    }

    #[tokio::test]
    async fn exito_tras_reintentos() {
        let intentos = Arc::new(AtomicU32::new(0));
        let contador = intentos.clone();

        let resultado = with_backoff(&politica_rapida(), || {
            let contador = contador.clone();
            async move {
                if contador.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(FalloDePrueba { transitorio: true })
                } else {
                    Ok("listo")
                }
            }
        })
        .await;

        assert_eq!(resultado.unwrap(), "listo");
        assert_eq!(intentos.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn agota_los_reintentos() {
        let intentos = Arc::new(AtomicU32::new(0));
        let contador = intentos.clone();

        let resultado: Result<(), _> = with_backoff(&politica_rapida(), || {
            let contador = contador.clone();
            async move {
                contador.fetch_add(1, Ordering::SeqCst);
                Err(FalloDePrueba { transitorio: true })
            }
        })
        .await;

        assert!(resultado.is_err());
        assert_eq!(intentos.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn fallo_permanente_no_reintenta() {
        let intentos = Arc::new(AtomicU32::new(0));
        let contador = intentos.clone();

        let resultado: Result<(), _> = with_backoff(&politica_rapida(), || {
            let contador = contador.clone();
            async move {
                contador.fetch_add(1, Ordering::SeqCst);
                Err(FalloDePrueba { transitorio: false })
            }
        })
        .await;

        assert!(resultado.is_err());
        assert_eq!(intentos.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn el_delay_crece_hasta_el_tope() {
        let politica = politica_rapida();
        assert_eq!(politica.delay_for(1), Duration::from_millis(5));
        assert_eq!(politica.delay_for(2), Duration::from_millis(10));
        assert_eq!(politica.delay_for(3), Duration::from_millis(20));
        assert_eq!(politica.delay_for(10), Duration::from_millis(50));
    }
}
