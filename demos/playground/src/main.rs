use glam::Vec3;
use tempo::systems::Countdown;
use tempo::systems::Motion;
use tempo::Application;
use tempo::ApplicationState;
use tempo::Event;
use tempo::Handle;
use tempo::Scheduler;
use tempo::SchedulerConfig;

const CONFIG: &str = r#"
tick_ms = 20
max_ticks_per_frame = 4
"#;

struct Playground {
    state: ApplicationState,
    scheduler: Scheduler,
    ship: Handle,
    fuse: Handle,
    title: String,
}

impl Playground {
    fn new(config: SchedulerConfig) -> Self {
        let mut scheduler = Scheduler::new(config);
        let tick_ms = scheduler.config().tick_ms;

        let ship = scheduler.create(Motion::new(Vec3::ZERO, Vec3::new(1.0, 0.5, 0.0), tick_ms));
        let fuse = scheduler.create(Countdown::new(10_000).despawn_on_expiry());

        Self {
            state: ApplicationState::Running,
            scheduler,
            ship,
            fuse,
            title: "Tempo Playground".to_string(),
        }
    }
}

impl Application for Playground {
    fn title(&self) -> &str {
        &self.title
    }

    fn state(&self) -> ApplicationState {
        self.state
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::CloseRequested => {
                self.state = ApplicationState::Finished;
            }
        }
    }

    fn update(&mut self) {
        let position = self
            .scheduler
            .registry::<Motion>()
            .and_then(|registry| registry.frame(self.ship))
            .copied()
            .unwrap_or(Vec3::ZERO);
        let fuse = self
            .scheduler
            .registry::<Countdown>()
            .and_then(|registry| registry.get(self.fuse))
            .map(Countdown::remaining_ms);

        self.title = match fuse {
            Some(ms) => format!(
                "Tempo Playground - tick {} - ship ({:.1}, {:.1}) - fuse {}s",
                self.scheduler.tick(),
                position.x,
                position.y,
                ms / 1000
            ),
            None => {
                if self.state == ApplicationState::Running {
                    tracing::info!(tick = self.scheduler.tick(), "fuse burnt out");
                }
                self.state = ApplicationState::Finished;
                self.title.clone()
            }
        };
    }

    fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn main() {
    init_tracing();

    let config = match SchedulerConfig::from_toml_str(CONFIG) {
        Ok(config) => config,
        Err(error) => {
            tracing::error!(%error, "invalid config");
            return;
        }
    };

    if let Err(error) = Playground::new(config).run() {
        tracing::error!(%error, "playground exited with error");
    }
}
