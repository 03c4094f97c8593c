//! Core engine implementation

use std::time::Duration;

use crate::{
    application::{AppEvent, Application},
    config::ConfigError,
    core::{EngineConfig, EngineContext},
    ecs::systems::InputSystem,
    foundation::time::{FrameTime, Timer},
    input::KeyboardDevice,
    scene::{Scene, SceneError},
};
use thiserror::Error;

/// Main engine struct
///
/// The engine owns the time source and the loaded scene, and drives the
/// main loop: one timer step, the application's update, then the scene's
/// update and draw.
pub struct Engine {
    /// Settings shared with scenes
    context: EngineContext,

    /// The scene driven by the main loop
    scene: Option<Scene>,

    /// Frame timing
    timer: Timer,

    /// Whether the engine should continue running
    running: bool,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("scene", &self.scene.as_ref().map(Scene::name))
            .field("frame", &self.timer.frame_count())
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Create a new engine instance
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        log::info!(
            "Initializing engine '{}' ({}x{})",
            config.window.title,
            config.window.width,
            config.window.height
        );

        let timer = Timer::with_max_delta(config.time.max_delta_seconds);
        Ok(Self {
            context: EngineContext::new(config),
            scene: None,
            timer,
            running: true,
        })
    }

    /// Run the engine main loop with the given application
    pub fn run<T: Application>(config: EngineConfig, app: &mut T) -> Result<(), EngineError> {
        let mut engine = Self::new(config)?;

        app.initialize(&mut engine)
            .map_err(|e| EngineError::ApplicationError(format!("App initialization: {e}")))?;

        log::info!("Starting main loop...");

        let result = loop {
            if !engine.running {
                break Ok(());
            }
            if let Err(e) = engine.step(app) {
                break Err(e);
            }
        };

        app.cleanup(&mut engine);
        engine.unload_scene();

        log::info!(
            "Engine shutdown complete after {} frames ({:.1} fps average)",
            engine.timer.frame_count(),
            engine.timer.average_fps()
        );
        result
    }

    /// Advance one frame
    ///
    /// Uses the configured fixed step when there is one, the wall clock
    /// otherwise. Stops the loop once the frame limit is reached or the
    /// application asks to exit.
    pub fn step<T: Application>(&mut self, app: &mut T) -> Result<FrameTime, EngineError> {
        let frame = match self.context.config().time.fixed_step {
            Some(step) => {
                let step = Duration::try_from_secs_f32(step)
                    .map_err(|e| ConfigError::Invalid(format!("time.fixed_step {step}: {e}")))?;
                self.timer.advance(step)
            }
            None => self.timer.update(),
        };
        let delta_time = frame.delta_seconds;

        app.update(self, delta_time)
            .map_err(|e| EngineError::ApplicationError(format!("App update: {e}")))?;

        if let Some(scene) = self.scene.as_mut() {
            scene.update(delta_time);
            scene.draw(delta_time);
        }

        if self
            .context
            .config()
            .max_frames
            .is_some_and(|max| frame.frame >= max)
        {
            log::info!("Frame limit {} reached", frame.frame);
            self.running = false;
        }
        if app.should_exit(self) {
            self.running = false;
        }
        Ok(frame)
    }

    /// Create an empty scene configured from the engine settings
    pub fn create_scene(&self, name: impl Into<String>) -> Scene {
        Scene::new(&self.context, name)
    }

    /// Make `scene` the one driven by the main loop
    ///
    /// A previously loaded scene is disposed.
    pub fn load_scene(&mut self, scene: Scene) {
        log::info!("Loading scene '{}'", scene.name());
        if let Some(mut previous) = self.scene.replace(scene) {
            previous.dispose();
        }
    }

    /// Dispose and drop the loaded scene
    pub fn unload_scene(&mut self) -> bool {
        match self.scene.take() {
            Some(mut scene) => {
                scene.dispose();
                true
            }
            None => false,
        }
    }

    /// The loaded scene
    pub fn scene(&self) -> Option<&Scene> {
        self.scene.as_ref()
    }

    /// The loaded scene, mutably
    pub fn scene_mut(&mut self) -> Result<&mut Scene, EngineError> {
        self.scene.as_mut().ok_or(EngineError::NoScene)
    }

    /// Handle an application event
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::WindowCloseRequested => self.quit(),
            AppEvent::WindowResized { width, height } => {
                if let Some(scene) = self.scene.as_mut() {
                    scene.world_mut().set_viewport(width, height);
                }
            }
            AppEvent::KeyInput { key, pressed } => {
                if let Some(keyboard) = self.keyboard_mut() {
                    keyboard.handle_key_input(key, pressed);
                }
            }
            AppEvent::MouseMoved { dx, dy } => {
                if let Some(keyboard) = self.keyboard_mut() {
                    keyboard.handle_mouse_move(dx, dy);
                }
            }
        }
    }

    fn keyboard_mut(&mut self) -> Option<&mut KeyboardDevice> {
        self.scene
            .as_mut()?
            .system_mut::<InputSystem>()?
            .device_mut::<KeyboardDevice>()
    }

    /// Request engine shutdown
    pub fn quit(&mut self) {
        log::info!("Engine shutdown requested");
        self.running = false;
    }

    /// Whether the main loop keeps going
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Settings shared with scenes
    pub fn context(&self) -> &EngineContext {
        &self.context
    }

    /// The configuration the engine was started with
    pub fn config(&self) -> &EngineConfig {
        self.context.config()
    }

    /// The current frame snapshot
    pub fn frame(&self) -> FrameTime {
        self.timer.frame()
    }

    /// Get the current frame delta time
    pub fn delta_time(&self) -> f32 {
        self.timer.delta_time()
    }
}

/// Engine-level errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Configuration was rejected
    #[error("Configuration error: {0}")]
    ConfigError(#[from] ConfigError),

    /// A scene operation failed
    #[error("Scene error: {0}")]
    SceneError(#[from] SceneError),

    /// An operation needed a loaded scene
    #[error("No scene is loaded")]
    NoScene,

    /// Application error
    #[error("Application error: {0}")]
    ApplicationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::AppError;
    use crate::ecs::components::MovementController;
    use crate::ecs::EntityId;
    use crate::foundation::math::Vec3;
    use crate::input::KeyCode;
    use approx::assert_relative_eq;

    #[derive(Default)]
    struct Counter {
        initialized: bool,
        updates: u32,
        exit_after: Option<u32>,
        cleaned_up: bool,
    }

    impl Application for Counter {
        fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
            self.initialized = true;
            let scene = engine.create_scene("counter");
            engine.load_scene(scene);
            Ok(())
        }

        fn update(&mut self, _engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
            self.updates += 1;
            Ok(())
        }

        fn should_exit(&self, _engine: &Engine) -> bool {
            self.exit_after.is_some_and(|limit| self.updates >= limit)
        }

        fn cleanup(&mut self, engine: &mut Engine) {
            self.cleaned_up = engine.scene().is_some();
        }
    }

    fn fixed(step: f32) -> EngineConfig {
        EngineConfig::default().with_fixed_step(step)
    }

    #[test]
    fn test_run_stops_at_frame_limit() {
        let mut app = Counter::default();
        Engine::run(fixed(0.01).with_max_frames(5), &mut app).unwrap();

        assert!(app.initialized);
        assert_eq!(app.updates, 5);
        assert!(app.cleaned_up);
    }

    #[test]
    fn test_run_stops_when_application_exits() {
        let mut app = Counter {
            exit_after: Some(3),
            ..Default::default()
        };
        Engine::run(fixed(0.01), &mut app).unwrap();
        assert_eq!(app.updates, 3);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = EngineConfig {
            time: crate::core::TimeConfig {
                max_delta_seconds: 0.25,
                fixed_step: Some(-1.0),
            },
            ..EngineConfig::default()
        };
        assert!(matches!(Engine::new(config), Err(EngineError::ConfigError(_))));
    }

    #[test]
    fn test_unrepresentable_fixed_step_is_rejected() {
        for step in [f32::INFINITY, f32::NAN, 1e20] {
            let config = EngineConfig::default().with_fixed_step(step);
            assert!(matches!(Engine::new(config), Err(EngineError::ConfigError(_))));
        }
    }

    #[test]
    fn test_fixed_step_drives_scene_time() {
        let mut engine = Engine::new(fixed(0.05)).unwrap();
        let mut app = Counter::default();
        app.initialize(&mut engine).unwrap();

        let first = engine.step(&mut app).unwrap();
        let second = engine.step(&mut app).unwrap();

        assert_relative_eq!(first.delta_seconds, 0.05);
        assert_relative_eq!(second.total_seconds, 0.1, epsilon = 1e-6);
        assert_eq!(second.frame, 2);
    }

    #[test]
    fn test_scene_access_without_scene() {
        let mut engine = Engine::new(EngineConfig::default()).unwrap();
        assert!(matches!(engine.scene_mut(), Err(EngineError::NoScene)));
        assert!(!engine.unload_scene());
    }

    #[test]
    fn test_events_reach_scene_and_keyboard() {
        let mut engine = Engine::new(fixed(0.1)).unwrap();
        let mut scene = engine.create_scene("input");
        scene.add_system(Box::new(InputSystem::new().with_device(Box::new(KeyboardDevice::new()))));
        let mut player = scene.create_object("player");
        player.add_component(MovementController::default()).unwrap();
        let player: EntityId = scene.add(player).unwrap();
        engine.load_scene(scene);

        engine.handle_event(AppEvent::WindowResized { width: 800, height: 400 });
        engine.handle_event(AppEvent::KeyInput {
            key: KeyCode::W,
            pressed: true,
        });
        engine.step(&mut Counter::default()).unwrap();

        let scene = engine.scene().unwrap();
        assert_eq!(scene.world().viewport(), (800, 400));
        let transform = scene.transform_of(player).unwrap();
        assert_relative_eq!(
            scene.transforms().world_position(transform).unwrap(),
            Vec3::new(0.0, 0.0, -1.5),
            epsilon = 1e-5
        );

        engine.handle_event(AppEvent::WindowCloseRequested);
        assert!(!engine.is_running());
    }
}
