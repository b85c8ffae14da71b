pub mod app;
pub mod error;
pub mod scheduler;

pub use app::App;
pub use error::{AppError, SchedulerError};
pub use scheduler::{ExpiryScheduler, SchedulerConfig, SchedulerMetrics, SchedulerState, StopOutcome};
