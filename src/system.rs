use serde::Deserialize;

use crate::error::SystemResult;
use crate::Handle;

/// # System
///
/// A capability that gameplay objects opt into. Every live instance of a capability is kept in a
/// [Registry](crate::Registry) and driven by the functions in [dispatch](crate::dispatch).
pub trait System: Sized + 'static {
    /// Presentation state produced by [System::interpolate].
    type Frame;

    /// Human-readable capability name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Performs one fixed simulation step.
    fn process_tick(&mut self, ctx: &mut Context<'_, Self>, tick: u64) -> SystemResult<()>;

    /// Advances internal time accumulators by the elapsed real time.
    fn advance_time(
        &mut self,
        _ctx: &mut Context<'_, Self>,
        _elapsed_ms: u32,
    ) -> SystemResult<()> {
        Ok(())
    }

    /// Computes the presentation state `delta_ms` after the last processed tick.
    fn interpolate(&self, side: Side, delta_ms: u32) -> SystemResult<Self::Frame>;
}

/// # Side
///
/// Execution context of an instance.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    /// Authoritative simulation.
    Server,
    /// Presentation-only simulation.
    #[default]
    Client,
}

impl Side {
    /// Returns true for the authoritative side.
    pub const fn is_server(self) -> bool {
        matches!(self, Side::Server)
    }
}

pub(crate) enum Command<T> {
    Create { handle: Handle, system: T, side: Side },
    Destroy(Handle),
    SetEnabled(Handle, bool),
}

/// # Context
///
/// Handed to an instance while a dispatch phase runs. Structural changes requested through the
/// context are queued and applied, in request order, once the phase has visited every instance.
pub struct Context<'a, T: System> {
    handle: Handle,
    side: Side,
    commands: &'a mut Vec<Command<T>>,
}

impl<'a, T: System> Context<'a, T> {
    pub(crate) fn new(handle: Handle, side: Side, commands: &'a mut Vec<Command<T>>) -> Self {
        Self {
            handle,
            side,
            commands,
        }
    }

    /// Returns the handle of the instance currently being processed.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    /// Returns the side of the instance currently being processed.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Queues a new instance. The returned handle is valid right away, but the instance is only
    /// enumerated from the next phase on.
    pub fn create(&mut self, system: T, side: Side) -> Handle {
        let handle = Handle::new();
        self.commands.push(Command::Create {
            handle,
            system,
            side,
        });
        handle
    }

    /// Queues the removal of an instance. Queuing the current instance is allowed.
    pub fn destroy(&mut self, handle: Handle) {
        self.commands.push(Command::Destroy(handle));
    }

    /// Queues an enabled flag change.
    pub fn set_enabled(&mut self, handle: Handle, enabled: bool) {
        self.commands.push(Command::SetEnabled(handle, enabled));
    }
}
