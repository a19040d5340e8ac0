//! # Dispatch
//!
//! The three phases of a simulation step. Every phase visits the enabled instances of one
//! registry in enumeration order and skips disabled ones. An instance that returns an error is
//! logged and recorded as [RegistryEvent::Failed]; the remaining instances still run.
//!
//! Instances request structural changes through their [Context]. Those requests are applied
//! after the phase has visited the whole registry, so a phase always runs over the registry as it
//! was when the phase started.

use tracing::trace;
use tracing::warn;

use crate::error::SystemError;
use crate::Context;
use crate::Handle;
use crate::Registry;
use crate::RegistryEvent;
use crate::System;

/// Runs one fixed simulation step on every enabled instance.
pub fn process_tick<T: System>(registry: &mut Registry<T>, tick: u64) {
    run_phase(registry, "process_tick", |system, ctx| {
        system.process_tick(ctx, tick)
    });
}

/// Advances the time accumulators of every enabled instance by `elapsed_ms`.
pub fn advance_time<T: System>(registry: &mut Registry<T>, elapsed_ms: u32) {
    run_phase(registry, "advance_time", |system, ctx| {
        system.advance_time(ctx, elapsed_ms)
    });
}

/// Recomputes the presentation frame of every enabled instance, `delta_ms` after the last tick.
/// A failed interpolation keeps the previous frame.
pub fn interpolate_tick<T: System>(registry: &mut Registry<T>, delta_ms: u32) {
    let mut failed = Vec::new();

    for instance in registry.instances_mut() {
        if !instance.enabled {
            continue;
        }

        match instance.system.interpolate(instance.side, delta_ms) {
            Ok(frame) => instance.frame = Some(frame),
            Err(error) => {
                report(instance.handle, instance.system.name(), "interpolate_tick", &error);
                failed.push(instance.handle);
            }
        }
    }

    for handle in failed {
        registry.record(RegistryEvent::Failed(handle));
    }
}

fn run_phase<T, F>(registry: &mut Registry<T>, phase: &'static str, mut work: F)
where
    T: System,
    F: FnMut(&mut T, &mut Context<'_, T>) -> Result<(), SystemError>,
{
    let mut commands = Vec::new();
    let mut failed = Vec::new();
    let mut visited = 0usize;

    for instance in registry.instances_mut() {
        if !instance.enabled {
            continue;
        }

        visited += 1;
        let mut ctx = Context::new(instance.handle, instance.side, &mut commands);
        if let Err(error) = work(&mut instance.system, &mut ctx) {
            report(instance.handle, instance.system.name(), phase, &error);
            failed.push(instance.handle);
        }
    }

    trace!(phase, visited, queued = commands.len(), "phase finished");

    for handle in failed {
        registry.record(RegistryEvent::Failed(handle));
    }
    registry.apply(commands);
}

fn report(handle: Handle, system: &str, phase: &'static str, error: &SystemError) {
    warn!(?handle, system, phase, %error, "instance failed");
}
