//! Timer-driven sync scheduling.
//!
//! The driver owns everything the orchestrator must not: the startup delay,
//! the fixed interval between runs, and bounded retry with backoff around a
//! failed run. The next tick never fires while a run is still in flight.

pub mod backoff;
pub mod driver;

pub use backoff::RetryPolicy;
pub use driver::{SchedulerConfig, SyncScheduler};
