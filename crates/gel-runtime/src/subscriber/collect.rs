use std::sync::{Arc, Mutex};

use gel_core::{Rule, Subscriber, TraceEvent};

/// Keeps every event in memory.
///
/// Clones share the same buffer, so one handle can be given to the expander
/// and another kept for reading.
#[derive(Debug, Clone, Default)]
pub struct CollectingSubscriber {
    events: Arc<Mutex<Vec<TraceEvent>>>,
    completed: Arc<Mutex<bool>>,
}

impl CollectingSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Rules fired, in order.
    pub fn rules(&self) -> Vec<Rule> {
        self.events().into_iter().map(|e| e.rule).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.completed.lock().map(|c| *c).unwrap_or(false)
    }
}

impl Subscriber for CollectingSubscriber {
    fn on_trace(&self, event: TraceEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }

    fn on_complete(&self) {
        if let Ok(mut completed) = self.completed.lock() {
            *completed = true;
        }
    }
}
