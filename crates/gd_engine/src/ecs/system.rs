//! System trait and registry
//!
//! Systems run once per frame in ascending priority order. Ties keep
//! registration order; toggling a system never moves it.

use std::any::Any;

use slotmap::{new_key_type, SlotMap};

use crate::ecs::world::SceneWorld;

new_key_type! {
    /// Stable handle to a registered system
    pub struct SystemId;
}

/// Priorities used by the built-in systems
pub mod priority {
    /// Input is sampled before anything reads it
    pub const INPUT: i32 = -200;
    /// Camera matrices are refreshed before rendering reads them
    pub const CAMERA: i32 = -100;
    /// Scene rendering
    pub const RENDER: i32 = -100;
    /// Default for systems that do not care
    pub const DEFAULT: i32 = 0;
    /// Overlays drawn on top of the scene
    pub const UI: i32 = 100;
}

/// Per-frame subsystem
pub trait System: Any {
    /// Name used in logs and `Scene::system_order`
    fn name(&self) -> &str;

    /// Execution priority; lower runs first
    fn priority(&self) -> i32 {
        priority::DEFAULT
    }

    /// Per-frame update, before component updates
    fn update(&mut self, _world: &mut SceneWorld, _delta_time: f32) {}

    /// Per-frame draw
    fn draw(&mut self, _world: &SceneWorld, _delta_time: f32) {}

    /// Release resources; called once when the scene is disposed
    fn on_dispose(&mut self) {}

    /// Downcasting support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcasting support
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

struct SystemEntry {
    id: SystemId,
    priority: i32,
    enabled: bool,
    system: Box<dyn System>,
}

/// Priority-ordered collection of systems
#[derive(Default)]
pub struct SystemRegistry {
    entries: Vec<SystemEntry>,
    ids: SlotMap<SystemId, ()>,
    disposed: bool,
}

impl std::fmt::Debug for SystemRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SystemRegistry")
            .field("order", &self.order())
            .field("disposed", &self.disposed)
            .finish()
    }
}

impl SystemRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an enabled system
    pub fn add(&mut self, system: Box<dyn System>) -> SystemId {
        self.add_with_state(system, true)
    }

    /// Register a system, optionally starting disabled
    ///
    /// The priority is sampled once here; equal priorities keep
    /// registration order.
    pub fn add_with_state(&mut self, system: Box<dyn System>, enabled: bool) -> SystemId {
        let id = self.ids.insert(());
        let priority = system.priority();
        let index = self.entries.partition_point(|entry| entry.priority <= priority);
        log::debug!("Registered system '{}' (priority {}) at position {}", system.name(), priority, index);
        self.entries.insert(
            index,
            SystemEntry {
                id,
                priority,
                enabled,
                system,
            },
        );
        id
    }

    /// Unregister a system, running its disposal hook
    pub fn remove(&mut self, id: SystemId) -> Option<Box<dyn System>> {
        self.ids.remove(id)?;
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        let mut entry = self.entries.remove(index);
        entry.system.on_dispose();
        Some(entry.system)
    }

    /// Enable or disable a system in place
    pub fn set_enabled(&mut self, id: SystemId, enabled: bool) -> bool {
        match self.entries.iter_mut().find(|entry| entry.id == id) {
            Some(entry) => {
                entry.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Whether a system is enabled (`None` if unknown)
    pub fn is_enabled(&self, id: SystemId) -> Option<bool> {
        self.entries.iter().find(|entry| entry.id == id).map(|entry| entry.enabled)
    }

    /// First system of concrete type `T`
    pub fn get<T: System>(&self) -> Option<&T> {
        self.entries
            .iter()
            .find_map(|entry| entry.system.as_any().downcast_ref::<T>())
    }

    /// First system of concrete type `T`, mutably
    pub fn get_mut<T: System>(&mut self) -> Option<&mut T> {
        self.entries
            .iter_mut()
            .find_map(|entry| entry.system.as_any_mut().downcast_mut::<T>())
    }

    /// System names in execution order
    pub fn order(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.system.name()).collect()
    }

    /// Number of registered systems
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no systems are registered
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run every enabled system's update in priority order
    pub fn update_all(&mut self, world: &mut SceneWorld, delta_time: f32) {
        for entry in self.entries.iter_mut().filter(|entry| entry.enabled) {
            log::trace!("update '{}'", entry.system.name());
            entry.system.update(world, delta_time);
        }
    }

    /// Run every enabled system's draw in priority order
    pub fn draw_all(&mut self, world: &SceneWorld, delta_time: f32) {
        for entry in self.entries.iter_mut().filter(|entry| entry.enabled) {
            entry.system.draw(world, delta_time);
        }
    }

    /// Dispose every system in execution order; later calls do nothing
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        for entry in &mut self.entries {
            entry.system.on_dispose();
        }
        self.entries.clear();
        self.ids.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::scene_graph::ReparentPolicy;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct Recorder {
        name: &'static str,
        priority: i32,
        log: Rc<RefCell<Vec<&'static str>>>,
    }

    impl System for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn priority(&self) -> i32 {
            self.priority
        }

        fn update(&mut self, _world: &mut SceneWorld, _delta_time: f32) {
            self.log.borrow_mut().push(self.name);
        }

        fn on_dispose(&mut self) {
            self.log.borrow_mut().push("disposed");
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    fn recorder(name: &'static str, priority: i32, log: &Rc<RefCell<Vec<&'static str>>>) -> Box<dyn System> {
        Box::new(Recorder { name, priority, log: Rc::clone(log) })
    }

    #[test]
    fn test_priority_order_with_stable_ties() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SystemRegistry::new();
        registry.add(recorder("ten", 10, &log));
        registry.add(recorder("a", -100, &log));
        registry.add(recorder("b", -100, &log));
        registry.add(recorder("fifty", 50, &log));

        let mut world = SceneWorld::new(ReparentPolicy::default(), (1, 1));
        registry.update_all(&mut world, 0.016);

        assert_eq!(registry.order(), vec!["a", "b", "ten", "fifty"]);
        assert_eq!(*log.borrow(), vec!["a", "b", "ten", "fifty"]);
    }

    #[test]
    fn test_toggle_keeps_position() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SystemRegistry::new();
        let first = registry.add(recorder("first", 0, &log));
        registry.add(recorder("second", 0, &log));
        let mut world = SceneWorld::new(ReparentPolicy::default(), (1, 1));

        assert!(registry.set_enabled(first, false));
        registry.update_all(&mut world, 0.016);
        assert!(registry.set_enabled(first, true));
        registry.update_all(&mut world, 0.016);

        assert_eq!(*log.borrow(), vec!["second", "first", "second"]);
        assert_eq!(registry.order(), vec!["first", "second"]);
    }

    #[test]
    fn test_registered_disabled_does_not_run() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SystemRegistry::new();
        let id = registry.add_with_state(recorder("dormant", 0, &log), false);
        let mut world = SceneWorld::new(ReparentPolicy::default(), (1, 1));

        registry.update_all(&mut world, 0.016);

        assert!(log.borrow().is_empty());
        assert_eq!(registry.is_enabled(id), Some(false));
    }

    #[test]
    fn test_downcast_lookup() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SystemRegistry::new();
        registry.add(recorder("lookup", 0, &log));

        assert_eq!(registry.get::<Recorder>().map(|p| p.priority), Some(0));
        registry.get_mut::<Recorder>().unwrap().priority = 5;
        // Registry order is fixed at registration
        assert_eq!(registry.order(), vec!["lookup"]);
    }

    #[test]
    fn test_dispose_is_idempotent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SystemRegistry::new();
        registry.add(recorder("one", 0, &log));
        registry.add(recorder("two", 1, &log));

        registry.dispose();
        registry.dispose();

        assert_eq!(*log.borrow(), vec!["disposed", "disposed"]);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_remove_runs_dispose_hook() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = SystemRegistry::new();
        let id = registry.add(recorder("gone", 0, &log));

        assert!(registry.remove(id).is_some());
        assert!(registry.remove(id).is_none());
        assert_eq!(*log.borrow(), vec!["disposed"]);
    }
}
