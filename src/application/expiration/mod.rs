//! Periodic expiration of file records older than the retention threshold

pub mod batch_processor;
pub mod config;
pub mod record_expirer;
pub mod results;
pub mod scheduler;
pub mod sweeper;

pub use config::SweeperConfig;
pub use record_expirer::{ExpirationOutcome, RecordExpirer};
pub use results::{SweepResult, SweepRun};
pub use scheduler::{PeriodicTaskRunner, SingleFlight, SingleFlightGuard};
pub use sweeper::{ExpirationSweeper, SweeperPhase};
