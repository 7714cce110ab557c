use std::collections::HashMap;
use std::sync::Arc;

use voxbridge_schema::Provider;
use voxbridge_store::CallStore;
use voxbridge_sync::SyncOrchestrator;

use crate::signature::SignatureVerifier;

/// Shared application state accessible from all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: CallStore,
    /// Per-provider webhook verifiers; a provider without a configured
    /// secret cannot accept webhooks.
    pub verifiers: HashMap<Provider, SignatureVerifier>,
    /// Per-provider orchestrators for manually triggered syncs.
    pub orchestrators: HashMap<Provider, Arc<SyncOrchestrator>>,
}

impl AppState {
    pub fn new(store: CallStore) -> Self {
        Self {
            store,
            verifiers: HashMap::new(),
            orchestrators: HashMap::new(),
        }
    }

    pub fn with_verifier(mut self, provider: Provider, verifier: SignatureVerifier) -> Self {
        self.verifiers.insert(provider, verifier);
        self
    }

    pub fn with_orchestrator(
        mut self,
        provider: Provider,
        orchestrator: Arc<SyncOrchestrator>,
    ) -> Self {
        self.orchestrators.insert(provider, orchestrator);
        self
    }
}
