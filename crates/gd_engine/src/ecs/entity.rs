//! Entities
//!
//! A [`GameObject`] is a named bag of components with exactly one transform.
//! It starts out detached, holding its local pose by value; once added to a
//! scene the pose moves into the scene's transform arena and the object is
//! addressed by an [`EntityId`].

use std::any::TypeId;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use thiserror::Error;

use crate::ecs::component::{CameraCapability, Capabilities, Component};
use crate::foundation::math::Pose;
use crate::scene::scene_graph::TransformId;

new_key_type! {
    /// Stable handle to a live entity
    pub struct EntityId;
}

/// How many components of one concrete type an object may hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentPolicy {
    /// At most one instance per type; a second add is rejected
    #[default]
    Singleton,
    /// Any number of instances per type
    Multiple,
}

/// Component management failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// A singleton-policy object already has this component type
    #[error("'{entity}' already has a {component}")]
    Duplicate {
        /// Owning object's name
        entity: String,
        /// Component type name
        component: &'static str,
    },

    /// The object has been torn down
    #[error("'{0}' has been destroyed")]
    Destroyed(String),
}

pub(crate) struct ComponentSlot {
    type_id: TypeId,
    enabled: bool,
    component: Box<dyn Component>,
}

impl ComponentSlot {
    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub(crate) fn component(&self) -> &dyn Component {
        self.component.as_ref()
    }

    pub(crate) fn component_mut(&mut self) -> &mut dyn Component {
        self.component.as_mut()
    }
}

#[derive(Debug, Clone, Copy)]
enum TransformSlot {
    Detached(Pose),
    Attached(TransformId),
}

/// Named entity with one transform and an ordered component list
pub struct GameObject {
    name: String,
    policy: ComponentPolicy,
    transform: TransformSlot,
    components: Vec<ComponentSlot>,
    entity: Option<EntityId>,
    disposed: bool,
}

impl std::fmt::Debug for GameObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let components: Vec<&str> = self.components.iter().map(|slot| slot.component.type_name()).collect();
        f.debug_struct("GameObject")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("transform", &self.transform)
            .field("components", &components)
            .field("entity", &self.entity)
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl GameObject {
    /// Create a detached object with an identity pose
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_policy(name, ComponentPolicy::default())
    }

    /// Create a detached object with an explicit component policy
    pub fn with_policy(name: impl Into<String>, policy: ComponentPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            transform: TransformSlot::Detached(Pose::identity()),
            components: Vec::new(),
            entity: None,
            disposed: false,
        }
    }

    /// Builder: set the initial local pose
    #[must_use]
    pub fn with_pose(mut self, pose: Pose) -> Self {
        if let TransformSlot::Detached(current) = &mut self.transform {
            *current = pose;
        }
        self
    }

    /// Object name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Component multiplicity policy
    pub fn policy(&self) -> ComponentPolicy {
        self.policy
    }

    /// Handle assigned by the scene, once live
    pub fn id(&self) -> Option<EntityId> {
        self.entity
    }

    /// Whether the object has been added to a scene and not torn down
    pub fn is_live(&self) -> bool {
        self.entity.is_some() && !self.disposed
    }

    /// Whether teardown has run
    pub fn is_destroyed(&self) -> bool {
        self.disposed
    }

    /// Handle of the scene transform, once live
    pub fn transform_id(&self) -> Option<TransformId> {
        match self.transform {
            TransformSlot::Attached(id) => Some(id),
            TransformSlot::Detached(_) => None,
        }
    }

    /// Local pose while detached; live objects are edited through the scene
    pub fn pose_mut(&mut self) -> Option<&mut Pose> {
        match &mut self.transform {
            TransformSlot::Detached(pose) => Some(pose),
            TransformSlot::Attached(_) => None,
        }
    }

    /// Attach a component, returning a reference to the stored instance
    ///
    /// Under [`ComponentPolicy::Singleton`] a second instance of the same
    /// concrete type is rejected. If the object is already live the
    /// component's transform back-reference is wired immediately.
    pub fn add_component<T: Component>(&mut self, component: T) -> Result<&mut T, ComponentError> {
        if self.disposed {
            return Err(ComponentError::Destroyed(self.name.clone()));
        }

        let type_id = TypeId::of::<T>();
        if self.policy == ComponentPolicy::Singleton && self.components.iter().any(|slot| slot.type_id == type_id) {
            return Err(ComponentError::Duplicate {
                entity: self.name.clone(),
                component: std::any::type_name::<T>(),
            });
        }

        let mut component: Box<dyn Component> = Box::new(component);
        if let (Some(entity), TransformSlot::Attached(transform)) = (self.entity, self.transform) {
            component.on_attach(entity, transform);
        }
        log::trace!("'{}' gained {}", self.name, component.type_name());

        self.components.push(ComponentSlot {
            type_id,
            enabled: true,
            component,
        });

        let stored = self
            .components
            .last_mut()
            .and_then(|slot| slot.component.as_any_mut().downcast_mut::<T>());
        stored.ok_or_else(|| ComponentError::Destroyed(self.name.clone()))
    }

    /// Builder form of [`add_component`](Self::add_component)
    pub fn with_component<T: Component>(mut self, component: T) -> Result<Self, ComponentError> {
        self.add_component(component)?;
        Ok(self)
    }

    /// First component of type `T`
    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|slot| slot.component.as_any().downcast_ref::<T>())
    }

    /// First component of type `T`, mutably
    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|slot| slot.component.as_any_mut().downcast_mut::<T>())
    }

    /// Every component of type `T`, in attachment order
    pub fn components_of<T: Component>(&self) -> impl Iterator<Item = &T> {
        self.components
            .iter()
            .filter_map(|slot| slot.component.as_any().downcast_ref::<T>())
    }

    /// Enabled components of type `T`, in attachment order
    pub fn enabled_components_of<T: Component>(&self) -> impl Iterator<Item = &T> {
        self.components
            .iter()
            .filter(|slot| slot.enabled)
            .filter_map(|slot| slot.component.as_any().downcast_ref::<T>())
    }

    /// Whether at least one component of type `T` is attached
    pub fn has_component<T: Component>(&self) -> bool {
        let type_id = TypeId::of::<T>();
        self.components.iter().any(|slot| slot.type_id == type_id)
    }

    /// Tear down and drop the first component of type `T`
    pub fn remove_component<T: Component>(&mut self) -> bool {
        let type_id = TypeId::of::<T>();
        let Some(index) = self.components.iter().position(|slot| slot.type_id == type_id) else {
            return false;
        };
        let mut slot = self.components.remove(index);
        slot.component.on_destroy();
        true
    }

    /// Enable or disable every component of type `T`
    ///
    /// Disabled components keep their state and position in the list but
    /// are skipped by the frame update. Returns whether any component matched.
    pub fn set_component_enabled<T: Component>(&mut self, enabled: bool) -> bool {
        let type_id = TypeId::of::<T>();
        let mut matched = false;
        for slot in self.components.iter_mut().filter(|slot| slot.type_id == type_id) {
            slot.enabled = enabled;
            matched = true;
        }
        matched
    }

    /// Whether the first component of type `T` is enabled
    pub fn is_component_enabled<T: Component>(&self) -> Option<bool> {
        let type_id = TypeId::of::<T>();
        self.components
            .iter()
            .find(|slot| slot.type_id == type_id)
            .map(|slot| slot.enabled)
    }

    /// Number of attached components
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    /// Union of every attached component's capabilities
    pub fn capabilities(&self) -> Capabilities {
        self.components
            .iter()
            .fold(Capabilities::empty(), |acc, slot| acc | slot.component.capabilities())
    }

    /// First component exposing the camera capability
    pub fn camera(&self) -> Option<&dyn CameraCapability> {
        self.components.iter().find_map(|slot| slot.component.as_camera())
    }

    /// First component exposing the camera capability, mutably
    pub fn camera_mut(&mut self) -> Option<&mut dyn CameraCapability> {
        self.components.iter_mut().find_map(|slot| slot.component.as_camera_mut())
    }

    pub(crate) fn slots_mut(&mut self) -> &mut [ComponentSlot] {
        &mut self.components
    }

    /// Hand the detached pose to the scene, which replaces it with `transform`
    pub(crate) fn take_pose(&self) -> Pose {
        match self.transform {
            TransformSlot::Detached(pose) => pose,
            TransformSlot::Attached(_) => Pose::identity(),
        }
    }

    /// Mark live and wire every component's back-reference
    pub(crate) fn attach(&mut self, entity: EntityId, transform: TransformId) {
        self.entity = Some(entity);
        self.transform = TransformSlot::Attached(transform);
        for slot in &mut self.components {
            slot.component.on_attach(entity, transform);
        }
    }

    /// Tear down every component exactly once
    ///
    /// Returns the transform handle so the scene can release it. Later calls
    /// do nothing and return `None`.
    pub(crate) fn destroy(&mut self) -> Option<TransformId> {
        if self.disposed {
            return None;
        }
        self.disposed = true;
        for slot in &mut self.components {
            slot.component.on_destroy();
        }
        log::debug!("'{}' destroyed ({} components)", self.name, self.components.len());
        self.components.clear();
        self.transform_id()
    }
}

impl Drop for GameObject {
    fn drop(&mut self) {
        self.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Default)]
    struct Health {
        value: i32,
        destroyed: Rc<RefCell<u32>>,
    }

    impl Component for Health {
        fn on_destroy(&mut self) {
            *self.destroyed.borrow_mut() += 1;
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct Tag;

    impl Component for Tag {
        fn capabilities(&self) -> Capabilities {
            Capabilities::DRAWABLE
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_singleton_policy_rejects_duplicates() {
        let mut object = GameObject::new("crate");
        object.add_component(Health::default()).unwrap().value = 10;

        let result = object.add_component(Health::default());
        assert!(matches!(result, Err(ComponentError::Duplicate { .. })));
        assert_eq!(object.component_count(), 1);
        assert_eq!(object.get_component::<Health>().unwrap().value, 10);
    }

    #[test]
    fn test_multiple_policy_keeps_attachment_order() {
        let mut object = GameObject::with_policy("orb", ComponentPolicy::Multiple);
        object.add_component(Health { value: 1, ..Default::default() }).unwrap();
        object.add_component(Tag).unwrap();
        object.add_component(Health { value: 2, ..Default::default() }).unwrap();

        let values: Vec<i32> = object.components_of::<Health>().map(|h| h.value).collect();
        assert_eq!(values, vec![1, 2]);
        assert_eq!(object.capabilities(), Capabilities::UPDATABLE | Capabilities::DRAWABLE);
    }

    #[test]
    fn test_lookup_never_creates() {
        let object = GameObject::new("empty");
        assert!(object.get_component::<Health>().is_none());
        assert!(!object.has_component::<Health>());
        assert_eq!(object.component_count(), 0);
    }

    #[test]
    fn test_remove_component_tears_down_first() {
        let destroyed = Rc::new(RefCell::new(0));
        let mut object = GameObject::new("target");
        object
            .add_component(Health { value: 3, destroyed: Rc::clone(&destroyed) })
            .unwrap();

        assert!(object.remove_component::<Health>());
        assert_eq!(*destroyed.borrow(), 1);
        assert!(!object.remove_component::<Health>());
    }

    #[test]
    fn test_toggle_keeps_state() {
        let mut object = GameObject::new("lamp");
        object.add_component(Health { value: 7, ..Default::default() }).unwrap();

        assert!(object.set_component_enabled::<Health>(false));
        assert_eq!(object.is_component_enabled::<Health>(), Some(false));
        assert_eq!(object.get_component::<Health>().unwrap().value, 7);
        assert!(!object.set_component_enabled::<Tag>(true));
    }

    #[test]
    fn test_destroy_runs_once_and_drop_does_not_repeat() {
        let destroyed = Rc::new(RefCell::new(0));
        {
            let mut object = GameObject::new("temp");
            object
                .add_component(Health { value: 0, destroyed: Rc::clone(&destroyed) })
                .unwrap();
            object.destroy();
            object.destroy();
            assert!(object.add_component(Tag).is_err());
        }
        assert_eq!(*destroyed.borrow(), 1);
    }

    #[test]
    fn test_pose_editable_only_while_detached() {
        let mut object = GameObject::new("rock");
        assert!(object.pose_mut().is_some());
        assert!(object.transform_id().is_none());
        assert!(!object.is_live());
    }
}
