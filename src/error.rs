//! # Errors

/// Result of a single instance's unit of work.
pub type SystemResult<T> = Result<T, SystemError>;

/// # System Error
///
/// Failure reported by one instance during a dispatch phase. The dispatcher logs it and moves on
/// to the next instance.
#[derive(Debug, thiserror::Error)]
pub enum SystemError {
    /// Instance state contains NaN or infinity.
    #[error("non-finite {0}")]
    NonFinite(&'static str),
    /// Any other instance-specific failure.
    #[error("{0}")]
    Failed(String),
}

/// # Config Error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration text is not valid TOML or has unknown keys.
    #[error("invalid scheduler config: {0}")]
    Parse(#[from] toml::de::Error),
    /// `tick_ms` was zero.
    #[error("tick_ms must be greater than zero")]
    ZeroTickLength,
    /// `max_ticks_per_frame` was zero.
    #[error("max_ticks_per_frame must be greater than zero")]
    ZeroCatchUp,
}

/// # App Error
///
/// Failure of the windowing host.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The event loop could not be created or exited abnormally.
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// The window could not be created.
    #[error("window creation failed: {0}")]
    Window(#[from] winit::error::OsError),
}
