use bcrypt::{hash, verify};
use std::sync::Arc;
use crate::context::AppContext;
use crate::errors::{AppError, AppResult, AuthError};
use crate::models::{LoginForm, NewUser, PublicUser, Role, SignupForm, User};
use crate::store::{Collection, CollectionVersions};
use super::{Collaborator, SessionStore};

/// Login, signup and logout against the collaborator's user collection.
pub struct AuthService {
    collaborator: Arc<dyn Collaborator>,
    sessions: Arc<dyn SessionStore>,
    versions: Arc<CollectionVersions>,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        collaborator: Arc<dyn Collaborator>,
        sessions: Arc<dyn SessionStore>,
        versions: Arc<CollectionVersions>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            collaborator,
            sessions,
            versions,
            bcrypt_cost,
        }
    }

    pub async fn login(&self, context: &AppContext, form: &LoginForm) -> AppResult<PublicUser> {
        form.validate().map_err(AppError::Validation)?;
        tracing::info!("Login attempt for user: {}", form.username);

        // Scans the whole collection; fine at the current number of users.
        let users = self.collaborator.list_users(None).await?;
        let user = users
            .into_iter()
            .find(|u| u.username == form.username && password_matches(&u.password, &form.password))
            .ok_or_else(|| {
                tracing::info!("Invalid credentials for user: {}", form.username);
                AuthError::InvalidCredentials
            })?;

        let user = user.into_public();
        context.establish(user.clone(), self.sessions.as_ref()).await?;
        tracing::info!("User {} signed in as {}", user.username, user.role);
        Ok(user)
    }

    /// Registers a new associate and signs them in.
    pub async fn signup(&self, context: &AppContext, form: &SignupForm) -> AppResult<PublicUser> {
        form.validate().map_err(AppError::Validation)?;
        let username = form.username.trim();

        let users = self.collaborator.list_users(None).await?;
        if users.iter().any(|u| u.username == username) {
            tracing::info!("Signup rejected, username taken: {}", username);
            return Err(AuthError::UsernameTaken.into());
        }

        let password_hash = hash(form.password.as_bytes(), self.bcrypt_cost).map_err(|e| {
            tracing::error!("Failed to hash password: {}", e);
            AppError::Session(format!("Failed to hash password: {}", e))
        })?;
        let new_user = NewUser {
            username: username.to_string(),
            password: password_hash,
            name: form.name.trim().to_string(),
            role: Role::Associate,
        };

        let created: User = self.collaborator.create_user(&new_user).await?;
        self.versions.bump(Collection::Users);
        let user = created.into_public();
        context.establish(user.clone(), self.sessions.as_ref()).await?;
        tracing::info!("Registered new associate: {}", user.username);
        Ok(user)
    }

    pub async fn logout(&self, context: &AppContext) -> AppResult<()> {
        if let Some(user) = context.current_user().await {
            tracing::info!("User {} signed out", user.username);
        }
        context.teardown(self.sessions.as_ref()).await
    }
}

/// Seeded users carry plain passwords; users registered here carry bcrypt
/// hashes.
fn password_matches(stored: &str, given: &str) -> bool {
    if is_bcrypt_hash(stored) {
        verify(given, stored).unwrap_or(false)
    } else {
        stored == given
    }
}

/// `$2a$`, `$2b$`, `$2x$` or `$2y$`, a two-digit cost, then 53 characters of
/// salt and digest.
fn is_bcrypt_hash(stored: &str) -> bool {
    let bytes = stored.as_bytes();
    bytes.len() == 60
        && stored.starts_with("$2")
        && matches!(bytes[2], b'a' | b'b' | b'x' | b'y')
        && bytes[3] == b'$'
        && bytes[4].is_ascii_digit()
        && bytes[5].is_ascii_digit()
        && bytes[6] == b'$'
}
