//! Event Bus adapter
//!
//! Implements the UpgradeEventSink port by recording published events

use crate::events::ProtocolVersionDecided;
use crate::ports::UpgradeEventSink;

/// In-memory event bus adapter for testing
pub struct InMemoryEventBus {
    events: parking_lot::RwLock<Vec<ProtocolVersionDecided>>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self {
            events: parking_lot::RwLock::new(Vec::new()),
        }
    }

    pub fn get_events(&self) -> Vec<ProtocolVersionDecided> {
        self.events.read().clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.read().len()
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl UpgradeEventSink for InMemoryEventBus {
    fn publish(&self, event: ProtocolVersionDecided) -> Result<(), String> {
        self.events.write().push(event);
        Ok(())
    }
}
