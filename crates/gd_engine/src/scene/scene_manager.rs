//! Scene
//!
//! The scene owns every entity added to it, the systems that run over them
//! and the event bus. One frame is:
//!
//! 1. `update(dt)`: enabled systems in priority order, then enabled
//!    components of each entity (insertion order, then attachment order),
//!    then an event flush
//! 2. `draw(dt)`: enabled systems' draw hooks in priority order
//!
//! Between-frame operations (add, remove, camera switch) flush their events
//! immediately. Disposal tears down entities first, then systems, and runs
//! at most once.

use thiserror::Error;

use crate::core::{EngineContext, SceneConfig};
use crate::ecs::{ComponentError, EntityId, GameObject, SceneWorld, System, SystemId, SystemRegistry};
use crate::events::{EventBus, EventHandler, EventType, SceneEvent};
use crate::scene::scene_graph::{HierarchyError, TransformId, TransformMut, TransformTree};

/// Scene operation failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    /// No entity carries the given name
    #[error("no entity named '{0}'")]
    EntityNotFound(String),

    /// The named entity has no camera component
    #[error("entity '{0}' has no camera component")]
    NotACamera(String),

    /// A handle does not refer to a live entity
    #[error("entity handle is not live in this scene")]
    UnknownEntity,

    /// The scene has been disposed
    #[error("scene '{0}' has been disposed")]
    Disposed(String),

    /// A hierarchy operation was rejected
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),

    /// A component operation was rejected
    #[error(transparent)]
    Component(#[from] ComponentError),
}

/// Container driving entities and systems through the frame
pub struct Scene {
    name: String,
    config: SceneConfig,
    world: SceneWorld,
    systems: SystemRegistry,
    elapsed: f64,
    disposed: bool,
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("entities", &self.world.len())
            .field("systems", &self.systems.order())
            .field("active_camera", &self.world.active_camera())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl Scene {
    /// Create an empty scene using the engine's scene settings and viewport
    pub fn new(context: &EngineContext, name: impl Into<String>) -> Self {
        Self::with_config(context.config().scene.clone(), context.viewport(), name)
    }

    /// Create an empty scene from explicit settings
    pub fn with_config(config: SceneConfig, viewport: (u32, u32), name: impl Into<String>) -> Self {
        let name = name.into();
        log::info!("Scene '{}' created ({:?}, {:?})", name, config.reparent_policy, config.component_policy);
        Self {
            world: SceneWorld::new(config.reparent_policy, viewport),
            systems: SystemRegistry::new(),
            elapsed: 0.0,
            disposed: false,
            config,
            name,
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Settings the scene was created with
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Whether `dispose` has run
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// A detached object using the scene's component policy
    pub fn create_object(&self, name: impl Into<String>) -> GameObject {
        GameObject::with_policy(name, self.config.component_policy)
    }

    /// Take ownership of an object and make it live
    ///
    /// The object's pose moves into the transform arena and its components
    /// are wired to it. It is updated starting with the next `update`.
    pub fn add(&mut self, object: GameObject) -> Result<EntityId, SceneError> {
        self.ensure_live()?;
        if object.is_destroyed() {
            return Err(ComponentError::Destroyed(object.name().to_string()).into());
        }

        let name = object.name().to_string();
        let entity = self.world.insert(object);
        log::debug!("'{}' added to scene '{}'", name, self.name);

        let events = self.world.events_mut();
        events.publish(SceneEvent::EntityAdded { entity, name });
        events.flush();
        Ok(entity)
    }

    /// Tear down and drop an entity
    ///
    /// Children keep their world pose and become roots. Returns whether the
    /// entity was live in this scene.
    pub fn remove(&mut self, entity: EntityId) -> bool {
        let Some(object) = self.world.remove(entity) else {
            return false;
        };
        log::debug!("'{}' removed from scene '{}'", object.name(), self.name);

        let events = self.world.events_mut();
        events.publish(SceneEvent::EntityRemoved {
            entity,
            name: object.name().to_string(),
        });
        events.flush();
        true
    }

    /// First entity, in insertion order, matching `predicate`
    pub fn find<P>(&self, predicate: P) -> Option<EntityId>
    where
        P: FnMut(&GameObject) -> bool,
    {
        self.world.find(predicate)
    }

    /// First entity with the given name
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.world.find_by_name(name)
    }

    /// Entity by handle
    pub fn get(&self, entity: EntityId) -> Option<&GameObject> {
        self.world.get(entity)
    }

    /// Entity by handle, mutably
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut GameObject> {
        self.world.get_mut(entity)
    }

    /// Live entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &GameObject)> {
        self.world.entities()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.world.len()
    }

    /// Whether the scene holds no entities
    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    /// Register a system; it runs in priority order from the next frame
    pub fn add_system(&mut self, system: Box<dyn System>) -> SystemId {
        self.systems.add(system)
    }

    /// Register a system that starts disabled
    pub fn add_system_disabled(&mut self, system: Box<dyn System>) -> SystemId {
        self.systems.add_with_state(system, false)
    }

    /// Unregister a system, running its disposal hook
    pub fn remove_system(&mut self, id: SystemId) -> Option<Box<dyn System>> {
        self.systems.remove(id)
    }

    /// Enable or disable a system without changing its position
    pub fn set_system_enabled(&mut self, id: SystemId, enabled: bool) -> bool {
        self.systems.set_enabled(id, enabled)
    }

    /// First system of concrete type `T`
    pub fn system<T: System>(&self) -> Option<&T> {
        self.systems.get::<T>()
    }

    /// First system of concrete type `T`, mutably
    pub fn system_mut<T: System>(&mut self) -> Option<&mut T> {
        self.systems.get_mut::<T>()
    }

    /// System names in execution order
    pub fn system_order(&self) -> Vec<&str> {
        self.systems.order()
    }

    /// Make the named entity the single active camera
    ///
    /// Fails without side effects if no entity has that name or it carries
    /// no camera component. The previous camera is deactivated.
    pub fn set_active_camera(&mut self, name: &str) -> Result<EntityId, SceneError> {
        let entity = self
            .find_by_name(name)
            .ok_or_else(|| SceneError::EntityNotFound(name.to_string()))?;
        self.activate_camera(entity)
    }

    /// Make the entity the single active camera
    ///
    /// The scene holds the only record of which camera is active, so the
    /// previous one stops being active by construction.
    pub fn activate_camera(&mut self, entity: EntityId) -> Result<EntityId, SceneError> {
        let object = self.world.get(entity).ok_or(SceneError::UnknownEntity)?;
        if object.camera().is_none() {
            return Err(SceneError::NotACamera(object.name().to_string()));
        }
        let name = object.name().to_string();

        let previous = self.world.active_camera();
        self.world.set_active_camera(Some(entity));

        if previous != Some(entity) {
            log::info!("Active camera -> '{}'", name);
            let events = self.world.events_mut();
            events.publish(SceneEvent::CameraChanged {
                previous,
                current: entity,
                name,
            });
            events.flush();
        }
        Ok(entity)
    }

    /// Currently active camera entity
    ///
    /// Cleared when the entity is removed or loses its camera component.
    pub fn active_camera(&self) -> Option<EntityId> {
        self.world.active_camera()
    }

    /// Whether `entity` is the active camera
    pub fn is_active_camera(&self, entity: EntityId) -> bool {
        self.world.active_camera() == Some(entity)
    }

    /// Transform handle of an entity
    pub fn transform_of(&self, entity: EntityId) -> Option<TransformId> {
        self.world.transform_of(entity)
    }

    /// The transform arena
    pub fn transforms(&self) -> &TransformTree {
        self.world.transforms()
    }

    /// Mutable view over an entity's transform
    pub fn transform_mut(&mut self, entity: EntityId) -> Option<TransformMut<'_>> {
        let transform = self.world.transform_of(entity)?;
        self.world.transforms_mut().node_mut(transform)
    }

    /// Parent one entity's transform under another's (or make it a root)
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) -> Result<(), SceneError> {
        let child = self.world.transform_of(child).ok_or(SceneError::UnknownEntity)?;
        let parent = match parent {
            Some(parent) => Some(self.world.transform_of(parent).ok_or(SceneError::UnknownEntity)?),
            None => None,
        };
        self.world.transforms_mut().set_parent(child, parent)?;
        Ok(())
    }

    /// Register an event handler on the scene's bus
    pub fn subscribe(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.world.events_mut().subscribe(event_type, handler);
    }

    /// The scene's event bus
    pub fn events_mut(&mut self) -> &mut EventBus {
        self.world.events_mut()
    }

    /// Shared state handed to systems
    pub fn world(&self) -> &SceneWorld {
        &self.world
    }

    /// Shared state handed to systems, mutably
    pub fn world_mut(&mut self) -> &mut SceneWorld {
        &mut self.world
    }

    /// Advance one frame
    pub fn update(&mut self, delta_time: f32) {
        if self.disposed {
            return;
        }
        self.elapsed += f64::from(delta_time);
        self.world.events_mut().update_time(self.elapsed);

        self.systems.update_all(&mut self.world, delta_time);
        self.world.update_components(delta_time);

        let delivered = self.world.events_mut().flush();
        if delivered > 0 {
            log::trace!("Scene '{}' delivered {} events", self.name, delivered);
        }
    }

    /// Draw one frame
    pub fn draw(&mut self, delta_time: f32) {
        if self.disposed {
            return;
        }
        self.systems.draw_all(&self.world, delta_time);
    }

    /// Tear down every entity, then every system; later calls do nothing
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        let entities = self.world.clear();
        let systems = self.systems.len();
        self.systems.dispose();
        self.world.events_mut().reset();
        log::info!("Scene '{}' disposed ({} entities, {} systems)", self.name, entities, systems);
    }

    fn ensure_live(&self) -> Result<(), SceneError> {
        if self.disposed {
            Err(SceneError::Disposed(self.name.clone()))
        } else {
            Ok(())
        }
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.dispose();
    }
}
