//! Event name to handler registry

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use super::event::{EventPayload, FarmEvent};

/// What a handler asks the farm-side shim to do afterwards
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HandlerOutcome {
    /// Job properties to set, e.g. `("JobPreTaskScript", path)`
    pub job_updates: Vec<(String, String)>,
    /// Whether a publish run was started
    pub published: bool,
}

/// Reacts to one or more farm events
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: FarmEvent, payload: &EventPayload) -> Result<HandlerOutcome>;
}

/// Handlers registered per event.
///
/// Handlers are registered when the listener is built and dropped again by
/// [`EventListener::cleanup`]; events without a handler are ignored.
#[derive(Clone, Default)]
pub struct EventListener {
    handlers: HashMap<FarmEvent, Arc<dyn EventHandler>>,
}

impl EventListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener with the same handler registered for every farm event
    pub fn for_all_events(handler: Arc<dyn EventHandler>) -> Self {
        let mut listener = Self::new();
        for event in FarmEvent::ALL {
            listener.register(event, Arc::clone(&handler));
        }
        listener
    }

    pub fn register(&mut self, event: FarmEvent, handler: Arc<dyn EventHandler>) {
        self.handlers.insert(event, handler);
    }

    pub fn deregister(&mut self, event: FarmEvent) {
        self.handlers.remove(&event);
    }

    pub fn is_registered(&self, event: FarmEvent) -> bool {
        self.handlers.contains_key(&event)
    }

    /// Drop every handler
    pub fn cleanup(&mut self) {
        self.handlers.clear();
    }

    /// Run the handler for `event`, if any
    pub async fn dispatch(
        &self,
        event: FarmEvent,
        payload: &EventPayload,
    ) -> Result<Option<HandlerOutcome>> {
        let Some(handler) = self.handlers.get(&event) else {
            tracing::debug!("No handler registered for {}", event);
            return Ok(None);
        };
        handler.handle(event, payload).await.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Recorder {
        seen: Mutex<Vec<FarmEvent>>,
    }

    #[async_trait]
    impl EventHandler for Recorder {
        async fn handle(&self, event: FarmEvent, _payload: &EventPayload) -> Result<HandlerOutcome> {
            self.seen.lock().unwrap().push(event);
            Ok(HandlerOutcome::default())
        }
    }

    #[tokio::test]
    async fn test_dispatch_reaches_registered_handler() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let listener = EventListener::for_all_events(recorder.clone());

        let outcome = listener
            .dispatch(FarmEvent::JobFinished, &EventPayload::default())
            .await
            .unwrap();
        assert!(outcome.is_some());
        assert_eq!(*recorder.seen.lock().unwrap(), vec![FarmEvent::JobFinished]);
    }

    #[tokio::test]
    async fn test_cleanup_deregisters_everything() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let mut listener = EventListener::for_all_events(recorder.clone());
        assert!(listener.is_registered(FarmEvent::SlaveIdle));

        listener.cleanup();
        let outcome = listener
            .dispatch(FarmEvent::SlaveIdle, &EventPayload::default())
            .await
            .unwrap();
        assert!(outcome.is_none());
        assert!(recorder.seen.lock().unwrap().is_empty());
    }
}
