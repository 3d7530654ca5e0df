use crate::domain::ports::ExecutionService;
use std::sync::{Arc, RwLock};
use tracing::{error, info};

pub type ClientList = Arc<Vec<Arc<dyn ExecutionService>>>;

/// Hot-replaceable list of exchange clients.
///
/// Readers take a cheap `Arc` snapshot, so replacing the list never waits on
/// in-flight orders and never pauses candle processing.
pub struct ClientSet {
    clients: RwLock<ClientList>,
}

impl std::fmt::Debug for ClientSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSet")
            .field("clients", &self.len())
            .finish()
    }
}

impl ClientSet {
    pub fn new(clients: Vec<Arc<dyn ExecutionService>>) -> Self {
        Self {
            clients: RwLock::new(Arc::new(clients)),
        }
    }

    pub fn snapshot(&self) -> ClientList {
        match self.clients.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    pub fn replace(&self, clients: Vec<Arc<dyn ExecutionService>>) {
        let count = clients.len();
        let clients = Arc::new(clients);
        match self.clients.write() {
            Ok(mut guard) => *guard = clients,
            Err(poisoned) => {
                error!("ClientSet: Lock poisoned during replace, recovering");
                *poisoned.into_inner() = clients;
            }
        }
        info!("ClientSet: Replaced exchange clients ({} active)", count);
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for ClientSet {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
