use std::fmt;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use nohash::IntMap;
use serde::Deserialize;
use tracing::debug;

use crate::system::Command;
use crate::Side;
use crate::System;

static ALLOCATOR: AtomicUsize = AtomicUsize::new(1);

/// # Handle
///
/// Identifies one instance. Handles are unique for the whole process and never reused, so a stale
/// handle can't alias a newer instance.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Handle {
    id: usize,
}

impl Handle {
    pub(crate) fn new() -> Self {
        Self {
            id: ALLOCATOR.fetch_add(1, Ordering::Relaxed),
        }
    }
}

impl nohash::IsEnabled for Handle {}

/// # Removal Policy
///
/// How a registry closes the gap left by a removed instance.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalPolicy {
    /// Moves the last instance into the gap. Constant time, but registration order is lost from
    /// the first removal on.
    #[default]
    SwapRemove,
    /// Shifts every later instance down by one. Linear time, keeps registration order.
    Shift,
}

/// # Registry Event
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RegistryEvent {
    /// Instance was added to the registry.
    Registered(Handle),
    /// Instance was removed from the registry.
    Deregistered(Handle),
    /// Instance was enabled.
    Enabled(Handle),
    /// Instance was disabled.
    Disabled(Handle),
    /// Instance reported an error during a dispatch phase.
    Failed(Handle),
}

/// # Instance
///
/// A registered capability value together with its flags and last presentation frame.
pub struct Instance<T: System> {
    pub(crate) handle: Handle,
    pub(crate) enabled: bool,
    pub(crate) side: Side,
    pub(crate) system: T,
    pub(crate) frame: Option<T::Frame>,
}

impl<T: System> Instance<T> {
    /// Returns the instance handle.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Returns true if the dispatcher will run this instance.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns the instance side.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Returns the capability value.
    pub fn system(&self) -> &T {
        &self.system
    }

    /// Returns the frame computed by the last successful interpolation, if any.
    pub fn frame(&self) -> Option<&T::Frame> {
        self.frame.as_ref()
    }
}

/// # Registry
///
/// Live instances of one capability. The registry owns its instances; callers keep [Handle]s.
pub struct Registry<T: System> {
    indexes: IntMap<Handle, usize>,
    instances: Vec<Instance<T>>,
    events: Vec<RegistryEvent>,
    removal: RemovalPolicy,
}

impl<T: System> Registry<T> {
    /// Returns an empty registry using [RemovalPolicy::SwapRemove].
    pub fn new() -> Self {
        Self::with_removal(RemovalPolicy::default())
    }

    /// Returns an empty registry using the given removal policy.
    pub fn with_removal(removal: RemovalPolicy) -> Self {
        Self {
            indexes: IntMap::default(),
            instances: Vec::new(),
            events: Vec::new(),
            removal,
        }
    }

    /// Returns the removal policy.
    pub fn removal(&self) -> RemovalPolicy {
        self.removal
    }

    /// Registers a new enabled instance and returns its handle.
    pub fn create(&mut self, system: T, side: Side) -> Handle {
        let handle = Handle::new();
        self.register(handle, system, side);
        handle
    }

    pub(crate) fn register(&mut self, handle: Handle, system: T, side: Side) -> bool {
        if self.indexes.contains_key(&handle) {
            return false;
        }

        let index = self.instances.len();
        self.indexes.insert(handle, index);
        self.instances.push(Instance {
            handle,
            enabled: true,
            side,
            system,
            frame: None,
        });
        self.events.push(RegistryEvent::Registered(handle));
        debug!(?handle, index, "instance registered");
        true
    }

    /// Deregisters the instance and returns it. Returns `None` without touching the registry if
    /// the handle isn't registered.
    pub fn destroy(&mut self, handle: Handle) -> Option<T> {
        let index = self.indexes.remove(&handle)?;

        let instance = match self.removal {
            RemovalPolicy::SwapRemove => {
                let instance = self.instances.swap_remove(index);
                if let Some(moved) = self.instances.get(index) {
                    self.indexes.insert(moved.handle, index);
                }
                instance
            }
            RemovalPolicy::Shift => {
                let instance = self.instances.remove(index);
                for (offset, shifted) in self.instances[index..].iter().enumerate() {
                    self.indexes.insert(shifted.handle, index + offset);
                }
                instance
            }
        };

        self.events.push(RegistryEvent::Deregistered(handle));
        debug!(?handle, "instance deregistered");
        Some(instance.system)
    }

    /// Returns true if the handle is registered.
    pub fn contains(&self, handle: Handle) -> bool {
        self.indexes.contains_key(&handle)
    }

    /// Returns the number of registered instances.
    pub fn len(&self) -> usize {
        self.instances.len()
    }

    /// Returns true if no instance is registered.
    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// Returns the instance for the given handle.
    pub fn instance(&self, handle: Handle) -> Option<&Instance<T>> {
        self.indexes
            .get(&handle)
            .map(|index| &self.instances[*index])
    }

    /// Returns the capability value for the given handle.
    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.instance(handle).map(Instance::system)
    }

    /// Returns the capability value for the given handle mutably.
    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut T> {
        self.indexes
            .get(&handle)
            .map(|index| &mut self.instances[*index].system)
    }

    /// Returns the last interpolated frame for the given handle.
    pub fn frame(&self, handle: Handle) -> Option<&T::Frame> {
        self.instance(handle).and_then(Instance::frame)
    }

    /// Returns the enabled flag, or `None` if the handle isn't registered.
    pub fn is_enabled(&self, handle: Handle) -> Option<bool> {
        self.instance(handle).map(Instance::is_enabled)
    }

    /// Sets the enabled flag. Returns false if the handle isn't registered.
    pub fn set_enabled(&mut self, handle: Handle, enabled: bool) -> bool {
        let Some(index) = self.indexes.get(&handle) else {
            return false;
        };

        let instance = &mut self.instances[*index];
        if instance.enabled != enabled {
            instance.enabled = enabled;
            self.events.push(if enabled {
                RegistryEvent::Enabled(handle)
            } else {
                RegistryEvent::Disabled(handle)
            });
        }

        true
    }

    /// Returns the registered instances in enumeration order.
    pub fn iter(&self) -> impl '_ + Iterator<Item = &Instance<T>> {
        self.instances.iter()
    }

    /// Returns the registered handles in enumeration order.
    pub fn handles(&self) -> impl '_ + Iterator<Item = Handle> {
        self.instances.iter().map(Instance::handle)
    }

    /// Returns the registry events recorded since the last [Registry::clear_events]. The log grows
    /// until it is cleared; [Scheduler::frame](crate::Scheduler::frame) clears it every frame.
    pub fn events(&self) -> &[RegistryEvent] {
        &self.events
    }

    /// Clears the recorded events.
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    pub(crate) fn instances_mut(&mut self) -> &mut [Instance<T>] {
        &mut self.instances
    }

    pub(crate) fn record(&mut self, event: RegistryEvent) {
        self.events.push(event);
    }

    pub(crate) fn apply(&mut self, commands: Vec<Command<T>>) {
        for command in commands {
            match command {
                Command::Create {
                    handle,
                    system,
                    side,
                } => {
                    self.register(handle, system, side);
                }
                Command::Destroy(handle) => {
                    self.destroy(handle);
                }
                Command::SetEnabled(handle, enabled) => {
                    self.set_enabled(handle, enabled);
                }
            }
        }
    }
}

impl<T: System> Default for Registry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: System> fmt::Debug for Registry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("instances", &self.instances.len())
            .field("removal", &self.removal)
            .field("events", &self.events.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::error::SystemResult;
    use crate::Context;

    impl System for u32 {
        type Frame = u32;

        fn process_tick(&mut self, _ctx: &mut Context<'_, Self>, _tick: u64) -> SystemResult<()> {
            *self += 1;
            Ok(())
        }

        fn interpolate(&self, _side: Side, delta_ms: u32) -> SystemResult<u32> {
            Ok(*self + delta_ms)
        }
    }

    fn handles(registry: &Registry<u32>) -> Vec<Handle> {
        registry.handles().collect()
    }

    #[test]
    fn create_contains_returns_true() {
        let mut registry = Registry::new();

        let handle = registry.create(1u32, Side::Client);

        assert!(registry.contains(handle));
    }

    #[test]
    fn create_get_returns_value() {
        let mut registry = Registry::new();

        let handle = registry.create(17u32, Side::Server);

        assert_eq!(registry.get(handle), Some(&17));
        assert_eq!(registry.instance(handle).map(Instance::side), Some(Side::Server));
    }

    #[test]
    fn create_is_enabled_returns_true() {
        let mut registry = Registry::new();

        let handle = registry.create(1u32, Side::Client);

        assert_eq!(registry.is_enabled(handle), Some(true));
    }

    #[test]
    fn create_frame_returns_none() {
        let mut registry = Registry::new();

        let handle = registry.create(1u32, Side::Client);

        assert_eq!(registry.frame(handle), None);
    }

    #[test]
    fn create_events_returns_registered_event() {
        let mut registry = Registry::new();

        let handle = registry.create(1u32, Side::Client);

        assert_eq!(registry.events(), &[RegistryEvent::Registered(handle)]);
    }

    #[test]
    fn register_existing_handle_is_ignored() {
        let mut registry = Registry::new();
        let handle = registry.create(1u32, Side::Client);

        let inserted = registry.register(handle, 2, Side::Client);

        assert!(!inserted);
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(handle), Some(&1));
    }

    #[test]
    fn destroy_returns_value() {
        let mut registry = Registry::new();
        let handle = registry.create(17u32, Side::Client);

        assert_eq!(registry.destroy(handle), Some(17));
        assert!(!registry.contains(handle));
        assert!(registry.is_empty());
    }

    #[test]
    fn destroy_twice_returns_none() {
        let mut registry = Registry::new();
        let handle = registry.create(17u32, Side::Client);
        registry.destroy(handle);

        assert_eq!(registry.destroy(handle), None);
    }

    #[test]
    fn destroy_events_returns_deregistered_event() {
        let mut registry = Registry::new();
        let handle = registry.create(1u32, Side::Client);

        registry.destroy(handle);

        assert_eq!(
            registry.events(),
            &[
                RegistryEvent::Registered(handle),
                RegistryEvent::Deregistered(handle)
            ]
        );
    }

    #[test]
    fn destroy_swap_remove_moves_last_into_gap() {
        let mut registry = Registry::with_removal(RemovalPolicy::SwapRemove);
        let a = registry.create(1u32, Side::Client);
        let b = registry.create(2u32, Side::Client);
        let c = registry.create(3u32, Side::Client);

        registry.destroy(a);

        assert_eq!(handles(&registry), vec![c, b]);
        assert_eq!(registry.get(c), Some(&3));
        assert_eq!(registry.get(b), Some(&2));
    }

    #[test]
    fn destroy_shift_keeps_order() {
        let mut registry = Registry::with_removal(RemovalPolicy::Shift);
        let a = registry.create(1u32, Side::Client);
        let b = registry.create(2u32, Side::Client);
        let c = registry.create(3u32, Side::Client);

        registry.destroy(a);

        assert_eq!(handles(&registry), vec![b, c]);
        assert_eq!(registry.get(c), Some(&3));
    }

    #[test]
    fn set_enabled_false_is_enabled_returns_false() {
        let mut registry = Registry::new();
        let handle = registry.create(1u32, Side::Client);

        assert!(registry.set_enabled(handle, false));

        assert_eq!(registry.is_enabled(handle), Some(false));
        assert!(registry.contains(handle));
    }

    #[test]
    fn set_enabled_same_value_records_nothing() {
        let mut registry = Registry::new();
        let handle = registry.create(1u32, Side::Client);
        registry.clear_events();

        registry.set_enabled(handle, true);

        assert_eq!(registry.events(), &[]);
    }

    #[test]
    fn set_enabled_events_returns_toggle_events() {
        let mut registry = Registry::new();
        let handle = registry.create(1u32, Side::Client);
        registry.clear_events();

        registry.set_enabled(handle, false);
        registry.set_enabled(handle, true);

        assert_eq!(
            registry.events(),
            &[RegistryEvent::Disabled(handle), RegistryEvent::Enabled(handle)]
        );
    }

    #[test]
    fn set_enabled_missing_handle_returns_false() {
        let mut registry = Registry::<u32>::new();

        assert!(!registry.set_enabled(Handle::new(), false));
        assert_eq!(registry.events(), &[]);
    }

    #[test]
    fn clear_events_events_returns_empty() {
        let mut registry = Registry::new();
        registry.create(1u32, Side::Client);

        registry.clear_events();

        assert_eq!(registry.events(), &[]);
    }

    #[test]
    fn apply_runs_commands_in_order() {
        let mut registry = Registry::new();
        let a = registry.create(1u32, Side::Client);
        let b = Handle::new();

        registry.apply(vec![
            Command::Create {
                handle: b,
                system: 2,
                side: Side::Server,
            },
            Command::SetEnabled(b, false),
            Command::Destroy(a),
        ]);

        assert_eq!(handles(&registry), vec![b]);
        assert_eq!(registry.is_enabled(b), Some(false));
    }

    proptest! {
        #[test]
        fn create_n_len_returns_n(n in 0usize..64) {
            let mut registry = Registry::new();
            for value in 0..n {
                registry.create(value as u32, Side::Client);
            }

            prop_assert_eq!(registry.len(), n);
            prop_assert_eq!(registry.iter().count(), n);
        }

        #[test]
        fn create_then_destroy_restores_registry(
            n in 0usize..32,
            shift in any::<bool>(),
        ) {
            let removal = if shift { RemovalPolicy::Shift } else { RemovalPolicy::SwapRemove };
            let mut registry = Registry::with_removal(removal);
            for value in 0..n {
                registry.create(value as u32, Side::Client);
            }
            let before = handles(&registry);

            let handle = registry.create(99, Side::Client);
            registry.destroy(handle);

            prop_assert_eq!(handles(&registry), before);
        }

        #[test]
        fn destroy_unknown_handle_changes_nothing(n in 0usize..32) {
            let mut registry = Registry::new();
            for value in 0..n {
                registry.create(value as u32, Side::Client);
            }
            let before = handles(&registry);

            prop_assert_eq!(registry.destroy(Handle::new()), None);
            prop_assert_eq!(handles(&registry), before);
        }

        #[test]
        fn destroy_any_subset_keeps_remaining_members(
            keep in proptest::collection::vec(any::<bool>(), 0..48),
            shift in any::<bool>(),
        ) {
            let removal = if shift { RemovalPolicy::Shift } else { RemovalPolicy::SwapRemove };
            let mut registry = Registry::with_removal(removal);
            let created: Vec<(Handle, u32)> = (0..keep.len())
                .map(|value| (registry.create(value as u32, Side::Client), value as u32))
                .collect();

            for ((handle, value), keep) in created.iter().zip(&keep) {
                if !keep {
                    prop_assert_eq!(registry.destroy(*handle), Some(*value));
                }
            }

            let expected: Vec<Handle> = created
                .iter()
                .zip(&keep)
                .filter(|(_, keep)| **keep)
                .map(|((handle, _), _)| *handle)
                .collect();
            let mut actual = handles(&registry);
            if !shift {
                actual.sort();
            }
            prop_assert_eq!(actual, expected);

            for ((handle, value), keep) in created.iter().zip(&keep) {
                if *keep {
                    prop_assert_eq!(registry.get(*handle), Some(value));
                }
            }
        }
    }
}
