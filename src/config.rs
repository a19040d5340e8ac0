use serde::Deserialize;

use crate::error::ConfigError;
use crate::RemovalPolicy;
use crate::Side;

/// # Scheduler Config
///
/// Settings for a [Scheduler](crate::Scheduler). Can be loaded from TOML:
///
/// ```toml
/// tick_ms = 20
/// max_ticks_per_frame = 4
/// removal = "shift"
/// side = "server"
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchedulerConfig {
    /// Length of one fixed tick in milliseconds.
    pub tick_ms: u32,
    /// Upper bound on catch-up ticks processed in a single frame.
    pub max_ticks_per_frame: u32,
    /// Removal policy for every registry the scheduler creates.
    pub removal: RemovalPolicy,
    /// Side given to instances created through the scheduler.
    pub side: Side,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_ms: 16,
            max_ticks_per_frame: 5,
            removal: RemovalPolicy::SwapRemove,
            side: Side::Client,
        }
    }
}

impl SchedulerConfig {
    /// Parses and validates a TOML document. Missing keys take their default values.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the values can drive a fixed-step clock.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_ms == 0 {
            return Err(ConfigError::ZeroTickLength);
        }
        if self.max_ticks_per_frame == 0 {
            return Err(ConfigError::ZeroCatchUp);
        }
        Ok(())
    }

    /// Set the tick length in milliseconds.
    pub fn with_tick_ms(mut self, tick_ms: u32) -> Self {
        self.tick_ms = tick_ms;
        self
    }

    /// Set the catch-up cap.
    pub fn with_max_ticks_per_frame(mut self, max: u32) -> Self {
        self.max_ticks_per_frame = max;
        self
    }

    /// Set the removal policy.
    pub fn with_removal(mut self, removal: RemovalPolicy) -> Self {
        self.removal = removal;
        self
    }

    /// Set the side of scheduler-created instances.
    pub fn with_side(mut self, side: Side) -> Self {
        self.side = side;
        self
    }
}
