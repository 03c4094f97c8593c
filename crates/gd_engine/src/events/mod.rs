//! Scene event bus
//!
//! - Handlers register for one [`EventType`] and are only notified of that type
//! - Handler returns bool (true = consumed, stops forwarding)
//! - Events published during a frame are queued and delivered on the next
//!   [`EventBus::flush`]; the scene flushes at the end of every update and
//!   right after between-frame operations
//! - Deferred events are held until the bus clock reaches their delivery time

use std::collections::HashMap;

use crate::ecs::EntityId;

/// Event type identification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// An entity went live in the scene
    EntityAdded,
    /// An entity was torn down and removed
    EntityRemoved,
    /// The active camera changed
    CameraChanged,
    /// Application-defined event
    Custom,
}

/// Typed event payload
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEvent {
    /// An entity went live
    EntityAdded {
        /// Handle of the new entity
        entity: EntityId,
        /// Its name
        name: String,
    },
    /// An entity was removed
    EntityRemoved {
        /// Handle the entity had
        entity: EntityId,
        /// Its name
        name: String,
    },
    /// The active camera changed
    CameraChanged {
        /// Camera that was active before, if any
        previous: Option<EntityId>,
        /// Camera that is active now
        current: EntityId,
        /// Name of the new camera entity
        name: String,
    },
    /// Application-defined event
    Custom {
        /// Event name
        name: &'static str,
        /// Entity the event concerns, if any
        entity: Option<EntityId>,
    },
}

impl SceneEvent {
    /// Type used for handler routing
    pub fn event_type(&self) -> EventType {
        match self {
            Self::EntityAdded { .. } => EventType::EntityAdded,
            Self::EntityRemoved { .. } => EventType::EntityRemoved,
            Self::CameraChanged { .. } => EventType::CameraChanged,
            Self::Custom { .. } => EventType::Custom,
        }
    }
}

/// Event handler trait
/// Returns true if event was consumed (stops forwarding)
/// Returns false to allow forwarding to other handlers
pub trait EventHandler {
    /// Handle an event, return true if consumed
    fn on_event(&mut self, event: &SceneEvent) -> bool;
}

impl<F> EventHandler for F
where
    F: FnMut(&SceneEvent) -> bool,
{
    fn on_event(&mut self, event: &SceneEvent) -> bool {
        self(event)
    }
}

/// Event bus with registration and queuing
/// Follows chain of responsibility pattern
#[derive(Default)]
pub struct EventBus {
    immediate_queue: Vec<SceneEvent>,
    deferred_queue: Vec<(f64, SceneEvent)>,
    handlers: HashMap<EventType, Vec<Box<dyn EventHandler>>>,
    current_time: f64,
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("pending", &self.immediate_queue.len())
            .field("deferred", &self.deferred_queue.len())
            .field("handler_types", &self.handlers.len())
            .field("current_time", &self.current_time)
            .finish()
    }
}

impl EventBus {
    /// Create a new empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the bus clock (seconds since start)
    pub fn update_time(&mut self, time: f64) {
        self.current_time = time;
    }

    /// Register a handler for a specific event type
    /// Handlers of one type are notified in registration order
    pub fn subscribe(&mut self, event_type: EventType, handler: Box<dyn EventHandler>) {
        self.handlers.entry(event_type).or_default().push(handler);
    }

    /// Queue an event for delivery on the next flush
    pub fn publish(&mut self, event: SceneEvent) {
        log::trace!("Queued {:?}", event.event_type());
        self.immediate_queue.push(event);
    }

    /// Queue an event for the first flush at or after `delivery_time`
    pub fn post(&mut self, delivery_time: f64, event: SceneEvent) {
        self.deferred_queue.push((delivery_time, event));
    }

    /// Number of events waiting for the next flush (deferred ones excluded)
    pub fn pending(&self) -> usize {
        self.immediate_queue.len()
    }

    /// Deliver all pending events, returning how many were dispatched
    pub fn flush(&mut self) -> usize {
        let mut delivered = 0;

        let mut i = 0;
        while i < self.deferred_queue.len() {
            if self.deferred_queue[i].0 <= self.current_time {
                let (_, event) = self.deferred_queue.remove(i);
                self.immediate_queue.push(event);
            } else {
                i += 1;
            }
        }

        let immediate = std::mem::take(&mut self.immediate_queue);
        for event in immediate {
            self.dispatch_event(&event);
            delivered += 1;
        }

        delivered
    }

    /// Dispatch single event to registered handlers
    /// Stops on first handler that returns true (consumed)
    fn dispatch_event(&mut self, event: &SceneEvent) {
        if let Some(handlers) = self.handlers.get_mut(&event.event_type()) {
            for handler in handlers.iter_mut() {
                if handler.on_event(event) {
                    // Event consumed, stop forwarding
                    break;
                }
            }
        }
    }

    /// Clear all queued events (useful for state transitions)
    pub fn clear(&mut self) {
        self.immediate_queue.clear();
        self.deferred_queue.clear();
    }

    /// Drop every handler and queued event
    pub fn reset(&mut self) {
        self.clear();
        self.handlers.clear();
    }
}
