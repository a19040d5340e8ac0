//! # Systems
//!
//! Built-in capabilities.

use glam::Vec3;

use crate::error::SystemError;
use crate::error::SystemResult;
use crate::Context;
use crate::Side;
use crate::System;

/// # Motion
///
/// Constant-velocity movement integrated once per tick. Interpolation blends between the
/// positions of the last two ticks.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Motion {
    previous: Vec3,
    position: Vec3,
    velocity: Vec3,
    tick_ms: u32,
}

impl Motion {
    /// Returns a motion starting at `position` and moving by `velocity` units per second, stepped
    /// in ticks of `tick_ms` milliseconds.
    pub fn new(position: Vec3, velocity: Vec3, tick_ms: u32) -> Self {
        Self {
            previous: position,
            position,
            velocity,
            tick_ms: tick_ms.max(1),
        }
    }

    /// Authoritative position after the last tick.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Velocity in units per second.
    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    /// Replaces the velocity from the next tick on.
    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.velocity = velocity;
    }
}

impl System for Motion {
    type Frame = Vec3;

    fn name(&self) -> &str {
        "motion"
    }

    fn process_tick(&mut self, _ctx: &mut Context<'_, Self>, _tick: u64) -> SystemResult<()> {
        let step = self.tick_ms as f32 / 1000.0;
        let next = self.position + self.velocity * step;
        if !next.is_finite() {
            return Err(SystemError::NonFinite("position"));
        }

        self.previous = self.position;
        self.position = next;
        Ok(())
    }

    fn interpolate(&self, _side: Side, delta_ms: u32) -> SystemResult<Vec3> {
        let alpha = (delta_ms as f32 / self.tick_ms as f32).clamp(0.0, 1.0);
        Ok(self.previous.lerp(self.position, alpha))
    }
}

/// # Countdown
///
/// Real-time timer. Optionally removes its own instance once it runs out.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Countdown {
    remaining_ms: u64,
    despawn_on_expiry: bool,
}

impl Countdown {
    /// Returns a timer that expires after `duration_ms`.
    pub fn new(duration_ms: u64) -> Self {
        Self {
            remaining_ms: duration_ms,
            despawn_on_expiry: false,
        }
    }

    /// Makes the timer destroy its own instance when it expires.
    pub fn despawn_on_expiry(mut self) -> Self {
        self.despawn_on_expiry = true;
        self
    }

    /// Milliseconds left.
    pub fn remaining_ms(&self) -> u64 {
        self.remaining_ms
    }

    /// Returns true once the timer ran out.
    pub fn is_expired(&self) -> bool {
        self.remaining_ms == 0
    }
}

impl System for Countdown {
    /// Milliseconds left once the sub-tick offset is taken off.
    type Frame = u64;

    fn name(&self) -> &str {
        "countdown"
    }

    fn process_tick(&mut self, _ctx: &mut Context<'_, Self>, _tick: u64) -> SystemResult<()> {
        Ok(())
    }

    fn advance_time(
        &mut self,
        ctx: &mut Context<'_, Self>,
        elapsed_ms: u32,
    ) -> SystemResult<()> {
        if self.is_expired() {
            return Ok(());
        }

        self.remaining_ms = self.remaining_ms.saturating_sub(u64::from(elapsed_ms));
        if self.is_expired() && self.despawn_on_expiry {
            ctx.destroy(ctx.handle());
        }
        Ok(())
    }

    fn interpolate(&self, _side: Side, delta_ms: u32) -> SystemResult<u64> {
        Ok(self.remaining_ms.saturating_sub(u64::from(delta_ms)))
    }
}
