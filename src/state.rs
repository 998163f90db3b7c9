use std::sync::Arc;
use std::time::Duration;
use crate::config::Config;
use crate::context::ContextRegistry;
use crate::services::{AuthService, Collaborator, RetryPolicy, SessionStore, SyncService};
use crate::store::CollectionVersions;

// Application state shared between handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ContextRegistry>,
    pub auth: Arc<AuthService>,
    pub sync: Arc<SyncService>,
}

impl AppState {
    pub fn new(config: Config, collaborator: Arc<dyn Collaborator>, sessions: Arc<dyn SessionStore>) -> Self {
        let versions = Arc::new(CollectionVersions::default());
        let retry = RetryPolicy::from_config(&config.retry);

        let auth = AuthService::new(
            collaborator.clone(),
            sessions.clone(),
            versions.clone(),
            config.auth.bcrypt_cost,
        );
        let sync = SyncService::new(collaborator, versions, retry);

        let registry = ContextRegistry::new(
            sessions,
            Duration::from_secs(config.session.ttl_secs),
            config.session.max_contexts,
        );

        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
            auth: Arc::new(auth),
            sync: Arc::new(sync),
        }
    }

    pub fn templates_dir(&self) -> &str {
        &self.config.ui.templates_dir
    }

    pub fn banner_secs(&self) -> u64 {
        self.config.ui.banner_dismiss_secs
    }
}
