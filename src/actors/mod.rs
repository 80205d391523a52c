// ============================================================================
// Actors Module - Supervised Infrastructure Actors
// ============================================================================
//
// Actor Hierarchy:
//   CoordinatorActor (Supervisor)
//   ├── ChangeFeedActor    (Postgres LISTEN/NOTIFY -> broadcast fan-out)
//   └── HealthMonitorActor (component health, periodic DB ping)
//
// ============================================================================

pub mod change_feed;
pub mod coordinator;
pub mod health_monitor;

pub use change_feed::{Cambio, ChangeFeedActor};
pub use coordinator::{CoordinatorActor, GetHealthMonitor};
pub use health_monitor::{GetSystemHealth, HealthMonitorActor, HealthStatus, UpdateHealth};
