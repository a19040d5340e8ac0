use std::time::Duration;
use std::time::Instant;

use tracing::info;
use winit::event::WindowEvent;
use winit::event_loop::ControlFlow;
use winit::event_loop::EventLoop;
use winit::window::WindowBuilder;

use crate::error::AppError;
use crate::Scheduler;

/// # Application
///
/// Entry-point for hosting a simulation in a window.
pub trait Application: Sized {
    /// Returns the title to be displayed in the application window.
    fn title(&self) -> &str;

    /// Returns the current state of the application. The application will exit if this returns
    /// [ApplicationState::Finished] after [Application::handle_event] or [Application::update] is
    /// called.
    fn state(&self) -> ApplicationState;

    /// Handles the incoming event.
    fn handle_event(&mut self, event: Event);

    /// Updates the application after the scheduler ran the current frame.
    fn update(&mut self);

    /// Returns the scheduler driven once per frame.
    fn scheduler_mut(&mut self) -> &mut Scheduler;

    /// Runs the application.
    fn run(self) -> Result<(), AppError> {
        run_application(self)
    }
}

/// # Application State
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ApplicationState {
    /// Application is running.
    Running,
    /// Application has finished running.
    Finished,
}

/// # Event
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Event {
    /// Application window requested to close.
    CloseRequested,
}

/// Measures wall time between frames in whole milliseconds, carrying the sub-millisecond rest
/// into the next frame.
struct FrameTimer {
    last: Instant,
}

impl FrameTimer {
    fn new(now: Instant) -> Self {
        Self { last: now }
    }

    fn elapsed_ms(&mut self, now: Instant) -> u32 {
        let elapsed = now.saturating_duration_since(self.last);
        let ms = u32::try_from(elapsed.as_millis()).unwrap_or(u32::MAX);
        self.last += Duration::from_millis(u64::from(ms));
        ms
    }
}

fn run_application(mut app: impl Application) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    let mut window_title = app.title().to_string();
    let window = WindowBuilder::new()
        .with_title(&window_title)
        .build(&event_loop)?;
    let mut timer = FrameTimer::new(Instant::now());

    info!(title = %window_title, "application started");

    event_loop.set_control_flow(ControlFlow::Poll);
    event_loop.run(|event, event_loop_window_target| {
        match event {
            winit::event::Event::WindowEvent {
                event: WindowEvent::CloseRequested,
                ..
            } => {
                app.handle_event(Event::CloseRequested);
            }
            winit::event::Event::AboutToWait => {
                let elapsed_ms = timer.elapsed_ms(Instant::now());
                app.scheduler_mut().frame(elapsed_ms);
                app.update();

                let title = app.title();
                if title != window_title {
                    window_title = title.to_string();
                    window.set_title(&window_title);
                }
            }
            _ => {}
        }

        if app.state() == ApplicationState::Finished {
            info!("application finished");
            event_loop_window_target.exit();
        }
    })?;

    Ok(())
}
