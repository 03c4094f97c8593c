//! Wildbloom demo level
//!
//! A first-person camera standing in front of a slowly spinning sky box,
//! a ground plane and a HUD reticle. Everything is built through the public
//! scene API so the level doubles as a usage example.

use gd_engine::ecs::components::{Camera, LookController, MeshRenderer, MovementController, Rotator};
use gd_engine::ecs::systems::{CameraSystem, InputSystem, RenderSystem};
use gd_engine::events::{EventType, SceneEvent};
use gd_engine::foundation::math::{utils, Pose, Vec3};
use gd_engine::input::{Actions, InputState, ScriptedInput};
use gd_engine::prelude::{AppError, EngineContext, EntityId, GameObject, Scene};
use gd_engine::render::LoggingBackend;

/// Name of the default first-person camera
pub const CAMERA_NAME_FIRST_PERSON: &str = "First-Person Camera";

/// Name of the sky root every sky face is parented to
pub const SKY_PARENT_NAME: &str = "SkyParent";

/// Half-extent of the sky box
const SKY_SCALE: f32 = 500.0;

/// Sky spin in radians per second about world up
const SKY_SPIN: f32 = 0.02;

/// Handles to the entities the application keeps an eye on
#[derive(Debug, Clone, Copy)]
pub struct Level {
    /// The first-person camera
    pub camera: EntityId,
    /// The rotating sky root
    pub sky_parent: EntityId,
}

/// Populate `scene` with the demo level
pub fn build(scene: &mut Scene, context: &EngineContext) -> Result<Level, AppError> {
    install_systems(scene, context);

    scene.subscribe(
        EventType::CameraChanged,
        Box::new(|event: &SceneEvent| {
            if let SceneEvent::CameraChanged { name, .. } = event {
                log::info!("Camera manager: now viewing through '{}'", name);
            }
            false
        }),
    );

    let camera = spawn_camera(scene, context)?;
    let sky_parent = scene.add(scene.create_object(SKY_PARENT_NAME).with_component(Rotator::world(Vec3::new(
        0.0, SKY_SPIN, 0.0,
    )))?)?;
    spawn_sky_box(scene, sky_parent)?;
    spawn_ground(scene)?;
    spawn_hud(scene)?;

    // First-person is the default active camera
    scene.set_active_camera(CAMERA_NAME_FIRST_PERSON)?;

    log::info!("Level '{}' ready with {} entities", scene.name(), scene.len());
    Ok(Level { camera, sky_parent })
}

fn install_systems(scene: &mut Scene, context: &EngineContext) {
    let interval = context.config().max_frames.map_or(60, |frames| (frames / 5).max(1));
    scene.add_system(Box::new(InputSystem::new().with_device(Box::new(walk_script()))));
    scene.add_system(Box::new(CameraSystem::new()));
    scene.add_system(Box::new(RenderSystem::new(Box::new(LoggingBackend::new(interval)))));
}

/// Two seconds forward, one second boosted strafe, one second looking around
fn walk_script() -> ScriptedInput {
    let mut frames = Vec::new();
    frames.extend(std::iter::repeat(InputState {
        actions: Actions::MOVE_FORWARD,
        ..Default::default()
    })
    .take(120));
    frames.extend(std::iter::repeat(InputState {
        actions: Actions::STRAFE_RIGHT | Actions::BOOST,
        ..Default::default()
    })
    .take(60));
    for i in 0..60u8 {
        let dx = if i < 30 { 4.0 } else { -4.0 };
        let mut state = InputState::default();
        state.look_delta.x = dx;
        state.look_delta.y = 1.0;
        frames.push(state);
    }
    ScriptedInput::looping(frames)
}

fn spawn_camera(scene: &mut Scene, context: &EngineContext) -> Result<EntityId, AppError> {
    let movement = &context.config().movement;
    let camera = scene
        .create_object(CAMERA_NAME_FIRST_PERSON)
        .with_pose(Pose::from_position(Vec3::new(0.0, 5.0, 25.0)))
        .with_component(Camera::perspective(
            utils::deg_to_rad(60.0),
            context.aspect_ratio(),
            0.1,
            1000.0,
        ))?
        .with_component(MovementController::new(movement.move_speed, movement.boost_multiplier))?
        .with_component(LookController::new(movement.look_sensitivity))?;
    Ok(scene.add(camera)?)
}

fn spawn_sky_box(scene: &mut Scene, sky_parent: EntityId) -> Result<(), AppError> {
    let half = SKY_SCALE / 2.0;
    let quarter = utils::deg_to_rad(90.0);
    let faces = [
        ("skybox_back", Vec3::new(0.0, 0.0, -half), Vec3::zeros()),
        ("skybox_left", Vec3::new(-half, 0.0, 0.0), Vec3::new(0.0, quarter, 0.0)),
        ("skybox_right", Vec3::new(half, 0.0, 0.0), Vec3::new(0.0, -quarter, 0.0)),
        ("skybox_front", Vec3::new(0.0, 0.0, half), Vec3::new(0.0, 2.0 * quarter, 0.0)),
        ("sky", Vec3::new(0.0, half, 0.0), Vec3::new(quarter, 0.0, quarter)),
    ];

    for (name, position, rotation) in faces {
        let mut pose = Pose::from_position(position);
        pose.scale_to(Vec3::new(SKY_SCALE, SKY_SCALE, 1.0)).rotate_euler_by(rotation);

        let face = GameObject::new(name)
            .with_pose(pose)
            .with_component(MeshRenderer::new("quad", name))?;
        let face = scene.add(face)?;
        scene.set_parent(face, Some(sky_parent))?;
    }
    Ok(())
}

fn spawn_ground(scene: &mut Scene) -> Result<(), AppError> {
    let mut pose = Pose::from_position(Vec3::new(0.0, -1.0, 0.0));
    pose.rotate_euler_by(Vec3::new(utils::deg_to_rad(-90.0), 0.0, 0.0))
        .scale_to(Vec3::new(1.0, 1.0, 1.0));

    let ground = scene
        .create_object("GroundPlane")
        .with_pose(pose)
        .with_component(MeshRenderer::new("quad", "ground_grass"))?;
    scene.add(ground)?;
    Ok(())
}

fn spawn_hud(scene: &mut Scene) -> Result<(), AppError> {
    let hud = scene
        .create_object("HUD")
        .with_component(MeshRenderer::new_transparent("quad", "reticle", u8::MAX))?;
    scene.add(hud)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gd_engine::core::EngineConfig;

    #[test]
    fn test_level_builds_with_single_active_camera() {
        let context = EngineContext::new(EngineConfig::default());
        let mut scene = Scene::new(&context, "wildbloom");
        let level = build(&mut scene, &context).unwrap();

        assert_eq!(scene.active_camera(), Some(level.camera));
        assert!(scene.is_active_camera(level.camera));
        assert_eq!(scene.system_order(), vec!["input", "camera", "render"]);

        let sky = scene.transform_of(level.sky_parent).unwrap();
        assert_eq!(scene.transforms().children(sky).len(), 5);
    }

    #[test]
    fn test_camera_walks_forward() {
        let context = EngineContext::new(EngineConfig::default());
        let mut scene = Scene::new(&context, "wildbloom");
        let level = build(&mut scene, &context).unwrap();
        let transform = scene.transform_of(level.camera).unwrap();
        let start = scene.transforms().world_position(transform).unwrap();

        for _ in 0..10 {
            scene.update(1.0 / 60.0);
            scene.draw(1.0 / 60.0);
        }

        let end = scene.transforms().world_position(transform).unwrap();
        assert!(end.z < start.z);
    }
}
