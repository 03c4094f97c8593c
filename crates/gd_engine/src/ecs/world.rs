//! Scene world
//!
//! Everything a scene owns apart from its systems: live entities in
//! insertion order, the transform arena, the frame's input, the event bus
//! and the active camera. Systems receive the world by reference.

use slotmap::SlotMap;

use crate::ecs::component::{Capabilities, ComponentContext};
use crate::ecs::entity::{EntityId, GameObject};
use crate::events::EventBus;
use crate::input::InputState;
use crate::scene::scene_graph::{ReparentPolicy, TransformId, TransformTree};

/// Entities, transforms and per-frame shared state of one scene
#[derive(Debug)]
pub struct SceneWorld {
    entities: SlotMap<EntityId, GameObject>,
    order: Vec<EntityId>,
    transforms: TransformTree,
    input: InputState,
    events: EventBus,
    active_camera: Option<EntityId>,
    viewport: (u32, u32),
}

impl SceneWorld {
    /// Create an empty world
    pub fn new(policy: ReparentPolicy, viewport: (u32, u32)) -> Self {
        Self {
            entities: SlotMap::with_key(),
            order: Vec::new(),
            transforms: TransformTree::new(policy),
            input: InputState::default(),
            events: EventBus::new(),
            active_camera: None,
            viewport,
        }
    }

    /// Make an object live: move its pose into the arena and wire components
    pub(crate) fn insert(&mut self, object: GameObject) -> EntityId {
        let transform = self.transforms.insert(object.take_pose());
        let entity = self.entities.insert(object);
        if let Some(object) = self.entities.get_mut(entity) {
            object.attach(entity, transform);
        }
        self.order.push(entity);
        entity
    }

    /// Tear down an entity and release its transform
    ///
    /// Children of the entity's transform are re-rooted in place. Clears the
    /// active camera if this entity was it.
    pub(crate) fn remove(&mut self, entity: EntityId) -> Option<GameObject> {
        let mut object = self.entities.remove(entity)?;
        self.order.retain(|&id| id != entity);
        if let Some(transform) = object.destroy() {
            self.transforms.remove(transform);
        }
        if self.active_camera == Some(entity) {
            log::info!("Active camera '{}' removed", object.name());
            self.active_camera = None;
        }
        Some(object)
    }

    /// Remove every entity in insertion order
    pub(crate) fn clear(&mut self) -> usize {
        let order = std::mem::take(&mut self.order);
        let count = order.len();
        for entity in order {
            if let Some(mut object) = self.entities.remove(entity) {
                if let Some(transform) = object.destroy() {
                    self.transforms.remove(transform);
                }
            }
        }
        self.active_camera = None;
        count
    }

    /// Entity by handle
    pub fn get(&self, entity: EntityId) -> Option<&GameObject> {
        self.entities.get(entity)
    }

    /// Entity by handle, mutably
    pub fn get_mut(&mut self, entity: EntityId) -> Option<&mut GameObject> {
        self.entities.get_mut(entity)
    }

    /// Whether the handle refers to a live entity
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(entity)
    }

    /// Live entities in insertion order
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &GameObject)> {
        self.order
            .iter()
            .filter_map(|&id| self.entities.get(id).map(|object| (id, object)))
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether the world holds no entities
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// First entity, in insertion order, matching `predicate`
    pub fn find<P>(&self, mut predicate: P) -> Option<EntityId>
    where
        P: FnMut(&GameObject) -> bool,
    {
        self.entities()
            .find(|(_, object)| predicate(object))
            .map(|(id, _)| id)
    }

    /// First entity with the given name
    pub fn find_by_name(&self, name: &str) -> Option<EntityId> {
        self.find(|object| object.name() == name)
    }

    /// Transform handle of an entity
    pub fn transform_of(&self, entity: EntityId) -> Option<TransformId> {
        self.entities.get(entity).and_then(GameObject::transform_id)
    }

    /// The transform arena
    pub fn transforms(&self) -> &TransformTree {
        &self.transforms
    }

    /// The transform arena, mutably
    pub fn transforms_mut(&mut self) -> &mut TransformTree {
        &mut self.transforms
    }

    /// Input sampled for the current frame
    pub fn input(&self) -> &InputState {
        &self.input
    }

    /// Replace the current frame's input
    pub fn set_input(&mut self, input: InputState) {
        self.input = input;
    }

    /// The event bus
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// The event bus, mutably
    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    /// Currently active camera entity
    ///
    /// `None` once the entity no longer carries a camera component.
    pub fn active_camera(&self) -> Option<EntityId> {
        self.active_camera
            .filter(|&entity| self.entities.get(entity).is_some_and(|object| object.camera().is_some()))
    }

    pub(crate) fn set_active_camera(&mut self, camera: Option<EntityId>) {
        self.active_camera = camera;
    }

    /// Viewport size in pixels
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// Resize the viewport (the camera system picks up the new aspect)
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = (width, height);
    }

    /// Viewport width over height, `None` for a degenerate viewport
    #[allow(clippy::cast_precision_loss)]
    pub fn aspect_ratio(&self) -> Option<f32> {
        let (width, height) = self.viewport;
        (width > 0 && height > 0).then(|| width as f32 / height as f32)
    }

    /// Run `update` on every enabled, updatable component
    ///
    /// Entities are visited in insertion order and components in attachment
    /// order. Entities added during this pass are picked up next frame.
    pub(crate) fn update_components(&mut self, delta_time: f32) {
        let Self {
            entities,
            order,
            transforms,
            input,
            events,
            ..
        } = self;

        for &entity in order.iter() {
            let Some(object) = entities.get_mut(entity) else {
                continue;
            };
            let Some(transform) = object.transform_id() else {
                continue;
            };
            for slot in object.slots_mut() {
                if !slot.is_enabled() || !slot.component().capabilities().contains(Capabilities::UPDATABLE) {
                    continue;
                }
                let mut ctx = ComponentContext {
                    entity,
                    transform,
                    transforms: &mut *transforms,
                    input: &*input,
                    events: &mut *events,
                };
                slot.component_mut().update(&mut ctx, delta_time);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::components::Camera;
    use crate::ecs::Component;
    use crate::foundation::math::{Pose, Vec3};
    use std::any::Any;

    struct Counter {
        ticks: u32,
    }

    impl Component for Counter {
        fn update(&mut self, _ctx: &mut ComponentContext<'_>, _delta_time: f32) {
            self.ticks += 1;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn world() -> SceneWorld {
        SceneWorld::new(ReparentPolicy::PreserveWorld, (1280, 720))
    }

    #[test]
    fn test_insert_moves_pose_into_arena() {
        let mut world = world();
        let object = GameObject::new("rock").with_pose(Pose::from_position(Vec3::new(1.0, 2.0, 3.0)));

        let id = world.insert(object);
        let transform = world.transform_of(id).unwrap();

        assert!(world.get(id).unwrap().is_live());
        assert_eq!(world.transforms().local(transform).unwrap().position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_find_on_empty_world_returns_none() {
        let world = world();
        assert!(world.find(|_| true).is_none());
        assert!(world.find_by_name("anything").is_none());
    }

    #[test]
    fn test_entities_iterate_in_insertion_order() {
        let mut world = world();
        for name in ["c", "a", "b"] {
            world.insert(GameObject::new(name));
        }
        let first_a = world.find_by_name("a").unwrap();
        world.remove(first_a);
        world.insert(GameObject::new("a"));

        let names: Vec<&str> = world.entities().map(|(_, object)| object.name()).collect();
        assert_eq!(names, vec!["c", "b", "a"]);
    }

    #[test]
    fn test_disabled_components_are_skipped() {
        let mut world = world();
        let mut object = GameObject::new("ticker");
        object.add_component(Counter { ticks: 0 }).unwrap();
        let id = world.insert(object);

        world.update_components(0.016);
        world.get_mut(id).unwrap().set_component_enabled::<Counter>(false);
        world.update_components(0.016);

        assert_eq!(world.get(id).unwrap().get_component::<Counter>().unwrap().ticks, 1);
    }

    #[test]
    fn test_active_camera_follows_camera_component() {
        let mut world = world();
        let mut object = GameObject::new("eye");
        object.add_component(Camera::default()).unwrap();
        let id = world.insert(object);
        world.set_active_camera(Some(id));
        assert_eq!(world.active_camera(), Some(id));

        assert!(world.get_mut(id).unwrap().remove_component::<Camera>());
        assert_eq!(world.active_camera(), None);
    }

    #[test]
    fn test_aspect_ratio_rejects_degenerate_viewport() {
        let mut world = world();
        assert!(world.aspect_ratio().is_some());
        world.set_viewport(800, 0);
        assert!(world.aspect_ratio().is_none());
    }
}
