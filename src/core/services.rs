//! Explicit composition of the long-lived services at startup.

use crate::core::config::{Config, ConfigError};
use crate::core::conversation::ConversationStore;
use crate::core::orchestrator::QueryOrchestrator;
use crate::core::routing::{RoutingDiagnostic, RoutingResolver};
use crate::core::storage::{FileStore, KeyValueStore, MemoryStore};
use crate::mcp::client::ProtocolClient;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::debug;

pub struct AppServices {
    pub config: Config,
    pub client: Arc<ProtocolClient>,
    pub resolver: Arc<RoutingResolver>,
    storage: Option<Arc<dyn KeyValueStore>>,
}

impl AppServices {
    /// Builds the protocol client and resolver. Routing fallbacks are
    /// forwarded to `diagnostics` when given.
    pub fn from_config(
        config: Config,
        diagnostics: Option<mpsc::UnboundedSender<RoutingDiagnostic>>,
    ) -> Result<Self, Box<dyn Error>> {
        let client = ProtocolClient::new(config.tool_timeout_secs.map(Duration::from_secs))?;
        let mut resolver = RoutingResolver::from_config(&config)?;
        if let Some(sender) = diagnostics {
            resolver.set_diagnostic_sender(sender);
        }
        Ok(Self {
            config,
            client: Arc::new(client),
            resolver: Arc::new(resolver),
            storage: None,
        })
    }

    /// The on-disk conversation store, opened on first use.
    pub fn storage(&mut self) -> Result<Arc<dyn KeyValueStore>, ConfigError> {
        if let Some(storage) = &self.storage {
            return Ok(Arc::clone(storage));
        }
        let dir = self.config.conversations_dir()?;
        debug!(dir = %dir.display(), "Using conversation directory");
        let storage: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(dir));
        self.storage = Some(Arc::clone(&storage));
        Ok(storage)
    }

    /// An orchestrator that continues the persisted conversation.
    pub fn orchestrator(&mut self) -> Result<QueryOrchestrator, ConfigError> {
        let store = ConversationStore::resume(self.storage()?);
        Ok(self.orchestrator_with(store))
    }

    /// An orchestrator whose conversation lives only in memory.
    pub fn ephemeral_orchestrator(&self) -> QueryOrchestrator {
        self.orchestrator_with(ConversationStore::new(Arc::new(MemoryStore::new())))
    }

    fn orchestrator_with(&self, store: ConversationStore) -> QueryOrchestrator {
        QueryOrchestrator::new(Arc::clone(&self.resolver), Arc::clone(&self.client), store)
    }
}
