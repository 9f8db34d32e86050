use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::models::EventId;
use crate::storage::EventStore;

/// Shared API state.
///
/// Handlers run read-modify-write cycles against the event store, so each
/// event carries its own async lock serializing mutations to that document
/// while leaving other events untouched.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<EventStore>,
    pub max_retries: u32,
    locks: Arc<Mutex<HashMap<EventId, Arc<Mutex<()>>>>>,
}

impl AppState {
    pub fn new(store: EventStore, max_retries: u32) -> Self {
        Self {
            store: Arc::new(store),
            max_retries,
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// The mutation lock for one event.
    pub async fn event_lock(&self, id: &EventId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(id.clone()).or_default().clone()
    }
}
