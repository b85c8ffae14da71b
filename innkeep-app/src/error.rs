use crate::scheduler::SchedulerState;

/// Lifecycle misuse. Never produced by a failing sweep.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchedulerError {
    #[error("Cannot {op} expiry scheduler in state {from}")]
    InvalidTransition {
        from: SchedulerState,
        op: &'static str,
    },

    #[error("Expiry scheduler interval must be greater than zero")]
    InvalidInterval,

    #[error("Expiry scheduler must be started from within a Tokio runtime")]
    NoRuntime,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database connection failed: {0}")]
    Connect(String),

    #[error("Database migration failed: {0}")]
    Migrate(String),

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
}
