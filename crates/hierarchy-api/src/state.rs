use crate::{HealthChecker, HierarchyAssembler, UrlResolver};
use hierarchy_core::Settings;
use hierarchy_graph::{GraphClient, HierarchyStore};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub assembler: Arc<HierarchyAssembler>,
    pub resolver: Arc<UrlResolver>,
    pub health: Arc<HealthChecker>,
}

impl AppState {
    pub fn new(client: Arc<dyn GraphClient>, settings: &Settings) -> Self {
        let store = HierarchyStore::new(client);
        Self {
            assembler: Arc::new(HierarchyAssembler::new(store.clone())),
            resolver: Arc::new(UrlResolver::new(&settings.links)),
            health: Arc::new(HealthChecker::new(store, &settings.health)),
        }
    }

    pub fn store(&self) -> &HierarchyStore {
        self.assembler.store()
    }
}
