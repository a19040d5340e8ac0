#![warn(missing_docs)]

//! # Tempo
//!
//! ![MIT](https://img.shields.io/badge/license-MIT-blue.svg)
//!
//! ## What is Tempo?
//!
//! Tempo keeps gameplay subsystems out of the simulation loop. Each capability (movement, timers,
//! anything implementing [System]) gets its own [Registry] of live instances, and a driver runs
//! three phases over every registry:
//! - [dispatch::process_tick] once per fixed simulation tick
//! - [dispatch::advance_time] once per frame with the elapsed real time
//! - [dispatch::interpolate_tick] once per frame with the offset since the last tick
//!
//! [Scheduler] is a ready-made driver that owns one registry per capability type and turns frame
//! times into fixed ticks. [Application] hosts a scheduler in a window.

pub use crate::app::Application;
pub use crate::app::ApplicationState;
pub use crate::app::Event;
pub use crate::clock::FixedStep;
pub use crate::clock::Steps;
pub use crate::config::SchedulerConfig;
pub use crate::error::AppError;
pub use crate::error::ConfigError;
pub use crate::error::SystemError;
pub use crate::error::SystemResult;
pub use crate::registry::Handle;
pub use crate::registry::Instance;
pub use crate::registry::Registry;
pub use crate::registry::RegistryEvent;
pub use crate::registry::RemovalPolicy;
pub use crate::scheduler::Scheduler;
pub use crate::system::Context;
pub use crate::system::Side;
pub use crate::system::System;

mod app;
mod clock;
mod config;
pub mod dispatch;
mod error;
mod registry;
mod scheduler;
mod system;
pub mod systems;
