//! Application context: the single owner of the session, the receipt
//! store and the navigation guard for one running client.

use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use tracing::debug;

use crate::api::{ApiClient, WarrantyApi};
use crate::auth::{FileStore, KeyValueStore, KeyringStore, MemoryStore, SessionManager};
use crate::config::{Config, SessionBackend, APP_NAME};
use crate::error::StoreError;
use crate::models::{Receipt, ReceiptForm, ReceiptId, User};
use crate::receipts::{ReceiptStats, ReceiptStore};
use crate::router::{NavigationDecision, NavigationGuard};

pub struct AppContext {
    pub config: Config,
    pub session: Arc<SessionManager>,
    pub receipts: ReceiptStore,
    pub guard: NavigationGuard,
}

impl AppContext {
    /// Build the context from config: HTTP client, session store backend,
    /// restored session and default route table.
    pub fn bootstrap(config: Config) -> Result<Self> {
        let api: Arc<dyn WarrantyApi> = Arc::new(ApiClient::with_timeout(
            config.api_base_url.clone(),
            config.request_timeout(),
        )?);
        let store = Self::session_store(&config)?;
        debug!(api = %config.api_base_url, backend = ?config.session_backend, "Bootstrapping context");
        Ok(Self::with_parts(config, api, store, NavigationGuard::default()))
    }

    pub fn with_parts(
        config: Config,
        api: Arc<dyn WarrantyApi>,
        store: Arc<dyn KeyValueStore>,
        guard: NavigationGuard,
    ) -> Self {
        let session = Arc::new(SessionManager::restore(api.clone(), store));
        let receipts = ReceiptStore::new(api, session.clone());
        Self {
            config,
            session,
            receipts,
            guard,
        }
    }

    fn session_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
        Ok(match config.session_backend {
            SessionBackend::File => Arc::new(FileStore::new(config.data_dir()?)),
            SessionBackend::Keyring => Arc::new(KeyringStore::new(APP_NAME)),
            SessionBackend::Memory => Arc::new(MemoryStore::new()),
        })
    }

    pub async fn current_user(&self) -> Option<User> {
        self.session.user().await
    }

    /// Run the navigation guard for a transition to `target`.
    pub async fn navigate(&self, target: &str) -> NavigationDecision {
        let user = self.session.user().await;
        let decision = self.guard.check(target, user.as_ref());
        debug!(path = target, ?decision, "Navigation checked");
        decision
    }

    /// Sign in. The receipt list starts empty for the new session.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, StoreError> {
        let user = self.session.login(username, password).await?;
        self.receipts.clear().await;
        Ok(user)
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<User, StoreError> {
        let user = self.session.register(username, password).await?;
        self.receipts.clear().await;
        Ok(user)
    }

    /// Sign out and forget the previous user's receipts.
    pub async fn logout(&self) {
        self.session.logout().await;
        self.receipts.clear().await;
    }

    pub async fn fetch_receipts(&self) -> Result<usize, StoreError> {
        self.receipts.fetch_receipts().await
    }

    pub async fn create_receipt(&self, form: &ReceiptForm) -> Result<Receipt, StoreError> {
        self.receipts.create_receipt(form).await
    }

    pub async fn update_receipt(&self, id: ReceiptId, form: &ReceiptForm) -> Result<Receipt, StoreError> {
        self.receipts.update_receipt(id, form).await
    }

    pub async fn delete_receipt(&self, id: ReceiptId) -> Result<bool, StoreError> {
        self.receipts.delete_receipt(id).await
    }

    pub async fn stats(&self, today: NaiveDate) -> ReceiptStats {
        self.receipts.stats(today).await
    }
}
