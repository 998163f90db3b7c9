use async_trait::async_trait;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use crate::errors::{AppError, AppResult};
use crate::models::PublicUser;

/// Durable home of the signed-in user, one key per browser.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, sid: &str) -> AppResult<Option<PublicUser>>;

    async fn save(&self, sid: &str, user: &PublicUser) -> AppResult<()>;

    async fn clear(&self, sid: &str) -> AppResult<()>;
}

fn session_key(sid: &str) -> String {
    format!("currentUser:{}", sid)
}

pub struct RedisSessionStore {
    client: Arc<Client>,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub fn new(client: Arc<Client>, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, sid: &str) -> AppResult<Option<PublicUser>> {
        let mut conn = self.client.get_async_connection().await?;
        let data: Option<String> = conn.get(session_key(sid)).await?;
        match data {
            Some(json) => match serde_json::from_str(&json) {
                Ok(user) => Ok(Some(user)),
                Err(e) => {
                    // An unreadable record is treated as signed out.
                    tracing::warn!("Discarding corrupt session {}: {}", sid, e);
                    let _: () = conn.del(session_key(sid)).await?;
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn save(&self, sid: &str, user: &PublicUser) -> AppResult<()> {
        let json = serde_json::to_string(user)
            .map_err(|e| AppError::Session(format!("Failed to encode session: {}", e)))?;
        let mut conn = self.client.get_async_connection().await?;
        let ttl = usize::try_from(self.ttl_secs).unwrap_or(usize::MAX);
        let _: () = conn.set_ex(session_key(sid), json, ttl).await?;
        Ok(())
    }

    async fn clear(&self, sid: &str) -> AppResult<()> {
        let mut conn = self.client.get_async_connection().await?;
        let _: () = conn.del(session_key(sid)).await?;
        Ok(())
    }
}

/// Process-local stand-in; sessions do not survive a restart.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, PublicUser>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, sid: &str) -> AppResult<Option<PublicUser>> {
        Ok(self.sessions.read().await.get(&session_key(sid)).cloned())
    }

    async fn save(&self, sid: &str, user: &PublicUser) -> AppResult<()> {
        self.sessions.write().await.insert(session_key(sid), user.clone());
        Ok(())
    }

    async fn clear(&self, sid: &str) -> AppResult<()> {
        self.sessions.write().await.remove(&session_key(sid));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Id, Role};

    #[tokio::test]
    async fn memory_store_round_trip_and_clear() {
        let store = MemorySessionStore::new();
        let user = PublicUser {
            id: Id::from(1),
            username: "alice".into(),
            name: "Alice".into(),
            role: Role::Associate,
        };

        store.save("abc", &user).await.unwrap();
        assert_eq!(store.load("abc").await.unwrap(), Some(user));
        assert_eq!(store.load("other").await.unwrap(), None);

        store.clear("abc").await.unwrap();
        store.clear("abc").await.unwrap();
        assert_eq!(store.load("abc").await.unwrap(), None);
    }
}
