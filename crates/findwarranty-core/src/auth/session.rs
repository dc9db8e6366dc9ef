use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use crate::api::{ApiError, WarrantyApi};
use crate::error::StoreError;
use crate::fence::Fence;
use crate::models::{Credentials, User, UserId};

use super::KeyValueStore;

/// Key the serialized user is persisted under.
pub const SESSION_KEY: &str = "user";

#[derive(Debug, Clone, Copy)]
enum AuthAction {
    Login,
    Register,
}

impl AuthAction {
    fn as_str(&self) -> &'static str {
        match self {
            AuthAction::Login => "login",
            AuthAction::Register => "register",
        }
    }
}

/// Holds the signed-in user and keeps the persisted copy in step with it.
pub struct SessionManager {
    api: Arc<dyn WarrantyApi>,
    store: Arc<dyn KeyValueStore>,
    user: RwLock<Option<User>>,
    fence: Fence,
}

impl SessionManager {
    /// Build a session seeded from the persisted user, if any. A missing,
    /// unreadable or unparsable value starts the session signed out.
    pub fn restore(api: Arc<dyn WarrantyApi>, store: Arc<dyn KeyValueStore>) -> Self {
        let user = Self::load(store.as_ref());
        debug!(signed_in = user.is_some(), "Session restored");
        Self {
            api,
            store,
            user: RwLock::new(user),
            fence: Fence::new(),
        }
    }

    fn load(store: &dyn KeyValueStore) -> Option<User> {
        let raw = match store.get(SESSION_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session");
                return None;
            }
        };
        match serde_json::from_str::<Option<User>>(&raw) {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Discarding unparsable persisted session");
                None
            }
        }
    }

    pub async fn user(&self) -> Option<User> {
        self.user.read().await.clone()
    }

    pub async fn user_id(&self) -> Option<UserId> {
        self.user.read().await.as_ref().map(|u| u.id)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.user.read().await.is_some()
    }

    /// Sign in. On success the response becomes the current user and is
    /// persisted; on failure the current user is left untouched.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, StoreError> {
        self.authenticate(AuthAction::Login, Credentials::new(username, password))
            .await
    }

    /// Create an account and sign in as it. Same contract as [`login`].
    ///
    /// [`login`]: SessionManager::login
    pub async fn register(&self, username: &str, password: &str) -> Result<User, StoreError> {
        self.authenticate(AuthAction::Register, Credentials::new(username, password))
            .await
    }

    async fn authenticate(
        &self,
        action: AuthAction,
        credentials: Credentials,
    ) -> Result<User, StoreError> {
        let ticket = self.fence.issue();

        let result: Result<User, ApiError> = match action {
            AuthAction::Login => self.api.login(&credentials).await,
            AuthAction::Register => self.api.register(&credentials).await,
        };

        let user = match result {
            Ok(user) => user,
            Err(e) => {
                error!(action = action.as_str(), username = %credentials.username, error = %e, "Authentication failed");
                return Err(e.into());
            }
        };

        let mut current = self.user.write().await;
        if !self.fence.is_current(ticket) {
            debug!(action = action.as_str(), "Discarding superseded authentication response");
            return Err(StoreError::Superseded);
        }

        self.persist(&user);
        *current = Some(user.clone());
        info!(action = action.as_str(), user_id = user.id, "Signed in");
        Ok(user)
    }

    fn persist(&self, user: &User) {
        let result = serde_json::to_string(user)
            .map_err(anyhow::Error::from)
            .and_then(|json| self.store.set(SESSION_KEY, &json));
        if let Err(e) = result {
            warn!(error = %e, "Failed to save session");
        }
    }

    /// Sign out locally. Never fails; a failure to remove the persisted
    /// copy is logged.
    pub async fn logout(&self) {
        // Any login still in flight must not resurrect the session
        self.fence.issue();

        let mut current = self.user.write().await;
        *current = None;
        if let Err(e) = self.store.remove(SESSION_KEY) {
            warn!(error = %e, "Failed to remove persisted session");
        }
        info!("Signed out");
    }
}
