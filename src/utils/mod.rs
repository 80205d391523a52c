pub mod backoff;
pub mod circuit_breaker;

pub use backoff::{with_backoff, BackoffPolicy, Transient};
pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError, CircuitState};
