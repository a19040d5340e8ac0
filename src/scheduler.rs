use std::any::Any;
use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use crate::clock::FixedStep;
use crate::clock::Steps;
use crate::dispatch;
use crate::Handle;
use crate::Registry;
use crate::SchedulerConfig;
use crate::Side;
use crate::System;

trait DynamicRegistry {
    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn process_tick(&mut self, tick: u64);

    fn advance_time(&mut self, elapsed_ms: u32);

    fn interpolate_tick(&mut self, delta_ms: u32);

    fn clear_events(&mut self);
}

impl<T: System> DynamicRegistry for Registry<T> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn process_tick(&mut self, tick: u64) {
        dispatch::process_tick(self, tick);
    }

    fn advance_time(&mut self, elapsed_ms: u32) {
        dispatch::advance_time(self, elapsed_ms);
    }

    fn interpolate_tick(&mut self, delta_ms: u32) {
        dispatch::interpolate_tick(self, delta_ms);
    }

    fn clear_events(&mut self) {
        self.clear_events();
    }
}

/// # Scheduler
///
/// Simulation driver owning one [Registry] per capability type. Each call to
/// [Scheduler::frame] runs the catch-up ticks, then one time advance, then one interpolation,
/// every phase across all registries in the order their capability types were first used.
///
/// Registry events are kept for one frame: [Scheduler::frame] clears them before it runs, so
/// [Registry::events] shows what changed since the previous frame started.
pub struct Scheduler {
    config: SchedulerConfig,
    clock: FixedStep,
    tick: u64,
    registry_indexes: BTreeMap<TypeId, usize>,
    registries: Vec<Box<dyn DynamicRegistry>>,
}

impl Scheduler {
    /// Returns a scheduler without registries.
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            clock: FixedStep::new(config.tick_ms, config.max_ticks_per_frame),
            config,
            tick: 0,
            registry_indexes: BTreeMap::new(),
            registries: Vec::new(),
        }
    }

    /// Returns the scheduler configuration.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Returns the number of ticks processed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns the registry for `T`, if any instance of `T` was ever created.
    pub fn registry<T: System>(&self) -> Option<&Registry<T>> {
        let index = self.registry_indexes.get(&TypeId::of::<T>())?;
        self.registries[*index].as_any().downcast_ref::<Registry<T>>()
    }

    /// Returns the registry for `T`, creating it if needed.
    pub fn registry_mut<T: System>(&mut self) -> &mut Registry<T> {
        let index = match self.registry_indexes.get(&TypeId::of::<T>()) {
            Some(index) => *index,
            None => {
                let index = self.registries.len();
                self.registry_indexes.insert(TypeId::of::<T>(), index);
                self.registries
                    .push(Box::new(Registry::<T>::with_removal(self.config.removal)));
                debug!(system = std::any::type_name::<T>(), index, "registry created");
                index
            }
        };

        match self.registries[index].as_any_mut().downcast_mut::<Registry<T>>() {
            Some(registry) => registry,
            None => unreachable!("registry index keyed by its own TypeId"),
        }
    }

    /// Registers an instance on the configured side.
    pub fn create<T: System>(&mut self, system: T) -> Handle {
        let side = self.config.side;
        self.create_on::<T>(system, side)
    }

    /// Registers an instance on the given side.
    pub fn create_on<T: System>(&mut self, system: T, side: Side) -> Handle {
        self.registry_mut::<T>().create(system, side)
    }

    /// Deregisters an instance and returns it.
    pub fn destroy<T: System>(&mut self, handle: Handle) -> Option<T> {
        let index = self.registry_indexes.get(&TypeId::of::<T>())?;
        self.registries[*index]
            .as_any_mut()
            .downcast_mut::<Registry<T>>()?
            .destroy(handle)
    }

    /// Sets the enabled flag of an instance. Returns false if it isn't registered.
    pub fn set_enabled<T: System>(&mut self, handle: Handle, enabled: bool) -> bool {
        match self.registry_indexes.get(&TypeId::of::<T>()) {
            Some(index) => self.registries[*index]
                .as_any_mut()
                .downcast_mut::<Registry<T>>()
                .is_some_and(|registry| registry.set_enabled(handle, enabled)),
            None => false,
        }
    }

    /// Runs one frame worth of simulation for `elapsed_ms` of real time. Events recorded before
    /// this call are discarded.
    pub fn frame(&mut self, elapsed_ms: u32) -> Steps {
        self.clear_events();
        let steps = self.clock.advance(elapsed_ms);

        for _ in 0..steps.ticks {
            self.tick += 1;
            for registry in &mut self.registries {
                registry.process_tick(self.tick);
            }
        }

        for registry in &mut self.registries {
            registry.advance_time(elapsed_ms);
        }

        for registry in &mut self.registries {
            registry.interpolate_tick(steps.interpolation_ms);
        }

        steps
    }

    /// Clears the events of every registry.
    pub fn clear_events(&mut self) {
        for registry in &mut self.registries {
            registry.clear_events();
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("tick", &self.tick)
            .field("registries", &self.registries.len())
            .field("config", &self.config)
            .finish()
    }
}
