mod auth;
mod collaborator;
mod locks;
mod memory_collaborator;
mod retry;
mod session_store;
mod sync;

pub use auth::AuthService;
pub use collaborator::{Collaborator, RestCollaborator};
pub use locks::KeyedLocks;
pub use memory_collaborator::MemoryCollaborator;
pub use retry::RetryPolicy;
pub use session_store::{MemorySessionStore, RedisSessionStore, SessionStore};
pub use sync::SyncService;
