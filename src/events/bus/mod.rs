// events/bus/mod.rs

mod event_bus;

pub use event_bus::{EventBus, EventLogEntry, Subscription, DEFAULT_EVENT_LOG_CAPACITY};
