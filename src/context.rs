//! Per-browser application context: the signed-in identity plus the local
//! entity caches, replacing ambient global state.
use moka::future::Cache;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use crate::errors::{AppError, AppResult};
use crate::models::{PublicUser, Role, Task, TimesheetEntry};
use crate::services::SessionStore;
use crate::store::EntityStore;

/// Who is using this browser session. Views dispatch on the tag.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    Manager(PublicUser),
    Associate(PublicUser),
}

impl SessionState {
    pub fn from_user(user: Option<PublicUser>) -> Self {
        match user {
            Some(user) if user.role == Role::Manager => SessionState::Manager(user),
            Some(user) => SessionState::Associate(user),
            None => SessionState::Anonymous,
        }
    }

    pub fn user(&self) -> Option<&PublicUser> {
        match self {
            SessionState::Manager(user) | SessionState::Associate(user) => Some(user),
            SessionState::Anonymous => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        !matches!(self, SessionState::Anonymous)
    }

    /// Landing page for this session.
    pub fn home_path(&self) -> &'static str {
        match self {
            SessionState::Manager(_) => "/manager/assign-task",
            SessionState::Associate(_) => "/associate",
            SessionState::Anonymous => "/",
        }
    }
}

pub struct AppContext {
    sid: String,
    session: RwLock<SessionState>,
    pub tasks: RwLock<EntityStore<Task>>,
    pub timesheets: RwLock<EntityStore<TimesheetEntry>>,
    pub users: RwLock<EntityStore<PublicUser>>,
}

impl AppContext {
    pub fn new(sid: impl Into<String>) -> Self {
        Self {
            sid: sid.into(),
            session: RwLock::new(SessionState::Anonymous),
            tasks: RwLock::new(EntityStore::default()),
            timesheets: RwLock::new(EntityStore::default()),
            users: RwLock::new(EntityStore::default()),
        }
    }

    /// Builds a context and restores whatever session was persisted for `sid`.
    pub async fn init(sid: impl Into<String>, sessions: &dyn SessionStore) -> AppResult<Self> {
        let context = Self::new(sid);
        let restored = sessions.load(&context.sid).await?;
        if let Some(user) = &restored {
            tracing::info!("Restored session for user: {}", user.username);
        }
        *context.session.write().await = SessionState::from_user(restored);
        Ok(context)
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub async fn session(&self) -> SessionState {
        self.session.read().await.clone()
    }

    pub async fn current_user(&self) -> Option<PublicUser> {
        self.session.read().await.user().cloned()
    }

    /// Persists `user` and makes it the active session. Caches filled for a
    /// previous identity are dropped.
    pub async fn establish(&self, user: PublicUser, sessions: &dyn SessionStore) -> AppResult<()> {
        sessions.save(&self.sid, &user).await?;
        *self.session.write().await = SessionState::from_user(Some(user));
        self.clear_caches().await;
        Ok(())
    }

    /// Clears the persisted session and every cache. Safe to call repeatedly.
    pub async fn teardown(&self, sessions: &dyn SessionStore) -> AppResult<()> {
        *self.session.write().await = SessionState::Anonymous;
        self.clear_caches().await;
        sessions.clear(&self.sid).await
    }

    async fn clear_caches(&self) {
        self.tasks.write().await.clear();
        self.timesheets.write().await.clear();
        self.users.write().await.clear();
    }

    pub async fn require_manager(&self) -> AppResult<PublicUser> {
        match self.session().await {
            SessionState::Manager(user) => Ok(user),
            _ => Err(AppError::Forbidden),
        }
    }

    pub async fn require_associate(&self) -> AppResult<PublicUser> {
        match self.session().await {
            SessionState::Associate(user) => Ok(user),
            _ => Err(AppError::Forbidden),
        }
    }
}

/// Live contexts of signed-in browsers, keyed by session id. Anonymous
/// contexts are never held; idle ones expire after `idle`.
pub struct ContextRegistry {
    contexts: Cache<String, Arc<AppContext>>,
    sessions: Arc<dyn SessionStore>,
}

impl ContextRegistry {
    pub fn new(sessions: Arc<dyn SessionStore>, idle: Duration, max_contexts: u64) -> Self {
        Self {
            contexts: Cache::builder()
                .max_capacity(max_contexts)
                .time_to_idle(idle)
                .build(),
            sessions,
        }
    }

    /// Returns the live context for `sid`. On first sight it is initialised
    /// from the session store and kept only if that restores a user.
    pub async fn resolve(&self, sid: &str) -> AppResult<Arc<AppContext>> {
        if let Some(context) = self.contexts.get(sid).await {
            return Ok(context);
        }

        let context = Arc::new(AppContext::init(sid, self.sessions.as_ref()).await?);
        if !context.session().await.is_signed_in() {
            return Ok(context);
        }
        Ok(self
            .contexts
            .get_with(sid.to_string(), async move { context })
            .await)
    }

    /// Keeps a context that has just signed in.
    pub async fn register(&self, context: Arc<AppContext>) {
        self.contexts.insert(context.sid().to_string(), context).await;
    }

    pub async fn remove(&self, sid: &str) {
        self.contexts.invalidate(sid).await;
    }

    pub async fn len(&self) -> u64 {
        self.contexts.run_pending_tasks().await;
        self.contexts.entry_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Id;
    use crate::services::MemorySessionStore;

    fn manager() -> PublicUser {
        PublicUser {
            id: Id::from(1),
            username: "manager".into(),
            name: "Morgan".into(),
            role: Role::Manager,
        }
    }

    #[test]
    fn session_state_tags_by_role() {
        assert!(matches!(SessionState::from_user(Some(manager())), SessionState::Manager(_)));
        assert_eq!(SessionState::from_user(None), SessionState::Anonymous);
        assert_eq!(SessionState::Anonymous.home_path(), "/");
    }

    #[tokio::test]
    async fn init_restores_persisted_session() {
        let sessions = MemorySessionStore::new();
        sessions.save("sid-1", &manager()).await.unwrap();

        let context = AppContext::init("sid-1", &sessions).await.unwrap();
        assert_eq!(context.current_user().await, Some(manager()));
        assert!(context.require_manager().await.is_ok());
        assert!(matches!(context.require_associate().await, Err(AppError::Forbidden)));
    }

    #[tokio::test]
    async fn teardown_clears_session_and_caches() {
        let sessions = MemorySessionStore::new();
        let context = AppContext::new("sid-2");
        context.establish(manager(), &sessions).await.unwrap();
        context.users.write().await.replace_all(vec![manager()], 0);

        context.teardown(&sessions).await.unwrap();
        context.teardown(&sessions).await.unwrap();

        assert_eq!(context.session().await, SessionState::Anonymous);
        assert!(!context.users.read().await.is_loaded());
        assert_eq!(sessions.load("sid-2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn switching_identity_drops_caches() {
        let sessions = MemorySessionStore::new();
        let context = AppContext::new("sid-3");
        context.establish(manager(), &sessions).await.unwrap();
        context.users.write().await.replace_all(vec![manager()], 0);

        let associate = PublicUser {
            id: Id::from(2),
            username: "alice".into(),
            name: "Alice".into(),
            role: Role::Associate,
        };
        context.establish(associate.clone(), &sessions).await.unwrap();

        assert!(context.users.read().await.is_empty());
        assert_eq!(context.session().await, SessionState::Associate(associate));
    }

    fn registry(sessions: Arc<MemorySessionStore>) -> ContextRegistry {
        ContextRegistry::new(sessions, Duration::from_secs(3600), 1_000)
    }

    #[tokio::test]
    async fn registry_reuses_signed_in_contexts() {
        let sessions = Arc::new(MemorySessionStore::new());
        sessions.save("abc", &manager()).await.unwrap();
        let registry = registry(sessions);

        let first = registry.resolve("abc").await.unwrap();
        let second = registry.resolve("abc").await.unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn anonymous_visits_hold_no_contexts() {
        let registry = registry(Arc::new(MemorySessionStore::new()));

        for n in 0..1_000 {
            let context = registry.resolve(&format!("bot-{}", n)).await.unwrap();
            assert!(!context.session().await.is_signed_in());
        }

        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn logout_releases_the_context() {
        let sessions = Arc::new(MemorySessionStore::new());
        let registry = registry(sessions.clone());

        let context = registry.resolve("sid-4").await.unwrap();
        context.establish(manager(), sessions.as_ref()).await.unwrap();
        registry.register(context.clone()).await;
        assert!(Arc::ptr_eq(&registry.resolve("sid-4").await.unwrap(), &context));

        context.teardown(sessions.as_ref()).await.unwrap();
        registry.remove("sid-4").await;

        assert_eq!(registry.len().await, 0);
        let fresh = registry.resolve("sid-4").await.unwrap();
        assert!(!Arc::ptr_eq(&fresh, &context));
        assert_eq!(fresh.session().await, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn idle_contexts_expire() {
        let sessions = Arc::new(MemorySessionStore::new());
        sessions.save("idle", &manager()).await.unwrap();
        let registry = ContextRegistry::new(sessions, Duration::from_millis(50), 1_000);

        registry.resolve("idle").await.unwrap();
        assert_eq!(registry.len().await, 1);

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(registry.len().await, 0);
    }
}
