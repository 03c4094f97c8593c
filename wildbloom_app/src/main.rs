//! Wildbloom demo application
//!
//! Runs the demo level headless: a scripted walk through the scene for the
//! configured number of fixed-step frames, with frame submissions logged by
//! the logging render backend.

mod level;

use gd_engine::ecs::systems::RenderSystem;
use gd_engine::prelude::*;

const CONFIG_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/config/wildbloom.toml");

/// How often the camera position is reported, in frames
const REPORT_INTERVAL: u64 = 120;

#[derive(Default)]
struct WildbloomApp {
    level: Option<level::Level>,
}

impl Application for WildbloomApp {
    fn initialize(&mut self, engine: &mut Engine) -> Result<(), AppError> {
        let name = engine.config().scene.name.clone();
        let mut scene = engine.create_scene(name);
        self.level = Some(level::build(&mut scene, engine.context())?);
        engine.load_scene(scene);
        Ok(())
    }

    fn update(&mut self, engine: &mut Engine, _delta_time: f32) -> Result<(), AppError> {
        let frame = engine.frame();
        if frame.frame % REPORT_INTERVAL != 0 {
            return Ok(());
        }
        let Some(level) = self.level else {
            return Ok(());
        };

        let scene = engine.scene_mut()?;
        if let Some(position) = scene
            .transform_of(level.camera)
            .and_then(|transform| scene.transforms().world_position(transform))
        {
            log::info!(
                "t={:.2}s camera at ({:.2}, {:.2}, {:.2})",
                frame.total_seconds,
                position.x,
                position.y,
                position.z
            );
        }
        Ok(())
    }

    fn cleanup(&mut self, engine: &mut Engine) {
        let Some(render) = engine.scene().and_then(Scene::system::<RenderSystem>) else {
            return;
        };
        let stats = render.last_stats();
        log::info!(
            "Rendered {} frames ({} skipped); last frame {} opaque / {} transparent in {} batches",
            render.frames_submitted(),
            render.frames_skipped(),
            stats.opaque,
            stats.transparent,
            stats.batches
        );
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = EngineConfig::load_or_default(CONFIG_PATH)?;

    // Initialize logging
    gd_engine::foundation::logging::init_with_level(&config.log_level);

    log::info!("Starting Wildbloom");

    let mut app = WildbloomApp::default();
    match Engine::run(config, &mut app) {
        Ok(()) => {
            log::info!("Wildbloom completed successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Wildbloom failed: {:?}", e);
            Err(e.into())
        }
    }
}
