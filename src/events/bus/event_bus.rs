// events/bus/event_bus.rs
//
// Core event bus implementation.
//
// DESIGN PRINCIPLES:
// 1. Synchronous - handlers execute immediately in subscription order
// 2. Observable - every emission is logged
// 3. Type-safe - events are strongly typed
// 4. Scoped - a subscription lives exactly as long as its handle

use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use crate::events::types::DomainEvent;

/// Type-erased event handler function
type EventHandler = Arc<dyn Fn(&dyn Any) + Send + Sync>;

type HandlerMap = HashMap<TypeId, Vec<(u64, EventHandler)>>;

/// The Event Bus
///
/// Services emit events here; view models and the session provider
/// subscribe without holding references to each other.
pub struct EventBus {
    handlers: Arc<RwLock<HandlerMap>>,
    next_id: Arc<AtomicU64>,

    /// Most recent emissions (for debugging), oldest dropped first
    event_log: Arc<RwLock<VecDeque<EventLogEntry>>>,
    log_capacity: usize,
}

/// Emissions kept in the event log by default
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 256;

/// A logged event for debugging and tracing
#[derive(Debug, Clone)]
pub struct EventLogEntry {
    pub event_type: String,
    pub event_id: String,
    pub occurred_at: String,
    pub handler_count: usize,
}

/// Handle for one registered handler.
///
/// Dropping it (or calling [`Subscription::dispose`]) removes the handler.
/// A subscription that outlives its bus is a no-op on release.
#[must_use = "dropping a Subscription unsubscribes the handler"]
pub struct Subscription {
    handlers: Weak<RwLock<HandlerMap>>,
    type_id: TypeId,
    id: u64,
}

impl Subscription {
    pub fn dispose(self) {
        drop(self)
    }

    fn release(&self) {
        if let Some(handlers) = self.handlers.upgrade() {
            let mut map = write_lock(&handlers);
            if let Some(list) = map.get_mut(&self.type_id) {
                list.retain(|(id, _)| *id != self.id);
                if list.is_empty() {
                    map.remove(&self.type_id);
                }
            }
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

fn read_lock<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl EventBus {
    pub fn new() -> Self {
        Self::with_log_capacity(DEFAULT_EVENT_LOG_CAPACITY)
    }

    /// Bus whose event log keeps at most `capacity` entries (0 disables it)
    pub fn with_log_capacity(capacity: usize) -> Self {
        Self {
            handlers: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
            event_log: Arc::new(RwLock::new(VecDeque::with_capacity(capacity))),
            log_capacity: capacity,
        }
    }

    /// Subscribe to a specific event type
    ///
    /// Handlers are executed in the order they are subscribed. The
    /// returned handle keeps the handler registered.
    ///
    /// ```ignore
    /// let _sub = bus.subscribe::<CommentAdded, _>(|event| {
    ///     log::info!("comment {} added", event.comment_id);
    /// });
    /// ```
    pub fn subscribe<E, F>(&self, handler: F) -> Subscription
    where
        E: DomainEvent + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let type_id = TypeId::of::<E>();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let wrapped: EventHandler = Arc::new(move |event_any: &dyn Any| {
            if let Some(event) = event_any.downcast_ref::<E>() {
                handler(event);
            } else {
                log::error!(
                    "Failed to downcast event in handler for {}",
                    std::any::type_name::<E>()
                );
            }
        });

        write_lock(&self.handlers)
            .entry(type_id)
            .or_default()
            .push((id, wrapped));

        Subscription {
            handlers: Arc::downgrade(&self.handlers),
            type_id,
            id,
        }
    }

    /// Emit an event
    ///
    /// Handlers run synchronously on the caller's thread. A panicking
    /// handler is logged and the remaining handlers still run. Handlers
    /// may subscribe or drop subscriptions while being invoked.
    pub fn emit<E>(&self, event: E)
    where
        E: DomainEvent + 'static,
    {
        let snapshot: Vec<EventHandler> = read_lock(&self.handlers)
            .get(&TypeId::of::<E>())
            .map(|list| list.iter().map(|(_, h)| Arc::clone(h)).collect())
            .unwrap_or_default();

        let entry = EventLogEntry {
            event_type: event.event_type().to_string(),
            event_id: event.event_id().to_string(),
            occurred_at: event.occurred_at().to_rfc3339(),
            handler_count: snapshot.len(),
        };
        log::debug!(
            "[EVENT] {} (id: {}) | {} handlers",
            entry.event_type,
            entry.event_id,
            entry.handler_count
        );
        if self.log_capacity > 0 {
            let mut entries = write_lock(&self.event_log);
            while entries.len() >= self.log_capacity {
                entries.pop_front();
            }
            entries.push_back(entry);
        }

        for (idx, handler) in snapshot.iter().enumerate() {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                handler(&event as &dyn Any);
            }));

            if let Err(e) = result {
                log::error!(
                    "Handler {} for {} panicked: {:?}",
                    idx,
                    event.event_type(),
                    e
                );
            }
        }
    }

    pub fn get_event_log(&self) -> Vec<EventLogEntry> {
        read_lock(&self.event_log).iter().cloned().collect()
    }

    pub fn clear_event_log(&self) {
        write_lock(&self.event_log).clear();
    }

    /// Get the number of live subscribers for a specific event type
    pub fn subscriber_count<E>(&self) -> usize
    where
        E: 'static,
    {
        read_lock(&self.handlers)
            .get(&TypeId::of::<E>())
            .map(Vec::len)
            .unwrap_or(0)
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

// Clones share the same handler table
impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            handlers: Arc::clone(&self.handlers),
            next_id: Arc::clone(&self.next_id),
            event_log: Arc::clone(&self.event_log),
            log_capacity: self.log_capacity,
        }
    }
}
