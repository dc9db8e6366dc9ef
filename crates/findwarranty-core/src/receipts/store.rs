use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::api::WarrantyApi;
use crate::auth::SessionManager;
use crate::error::StoreError;
use crate::fence::{Fence, KeyedFence};
use crate::models::{Receipt, ReceiptForm, ReceiptId, UserId};

use super::ReceiptStats;

/// The signed-in user's receipts, kept in step with successful mutations.
///
/// The list is only changed after the server confirms a request; failures
/// leave it as it was. There is no reconciliation after a failure.
pub struct ReceiptStore {
    api: Arc<dyn WarrantyApi>,
    session: Arc<SessionManager>,
    receipts: RwLock<Vec<Receipt>>,
    /// Advanced by `clear()`; responses to requests issued under an
    /// earlier epoch are dropped.
    epoch: Fence,
    fetch_fence: Fence,
    update_fence: KeyedFence<ReceiptId>,
}

impl ReceiptStore {
    pub fn new(api: Arc<dyn WarrantyApi>, session: Arc<SessionManager>) -> Self {
        Self {
            api,
            session,
            receipts: RwLock::new(Vec::new()),
            epoch: Fence::new(),
            fetch_fence: Fence::new(),
            update_fence: KeyedFence::new(),
        }
    }

    // ===== Reads =====

    pub async fn receipts(&self) -> Vec<Receipt> {
        self.receipts.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.receipts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.receipts.read().await.is_empty()
    }

    pub async fn get(&self, id: ReceiptId) -> Option<Receipt> {
        self.receipts.read().await.iter().find(|r| r.id == id).cloned()
    }

    pub async fn stats(&self, today: NaiveDate) -> ReceiptStats {
        ReceiptStats::from_receipts(&self.receipts.read().await, today)
    }

    /// Drop all local receipts, e.g. when the signed-in user changes.
    /// Fetches, creates and updates still in flight will not touch the
    /// emptied list.
    pub async fn clear(&self) {
        self.epoch.issue();
        self.receipts.write().await.clear();
    }

    /// Whether a response to a request issued under `epoch` by `user_id`
    /// may still be applied. Call with the list's write lock held so a
    /// concurrent `clear()` is either seen here or runs after the apply.
    fn same_session(&self, epoch: u64, user_id: Option<UserId>, now: Option<UserId>) -> bool {
        self.epoch.is_current(epoch) && user_id == now
    }

    // ===== Remote operations =====

    /// Replace the local list with the server's receipts for the current
    /// user. Returns the number of receipts loaded.
    ///
    /// Signed out: returns `NotAuthenticated` without issuing a request.
    pub async fn fetch_receipts(&self) -> Result<usize, StoreError> {
        let user_id = self.session.user_id().await.ok_or(StoreError::NotAuthenticated)?;
        let epoch = self.epoch.current();
        let ticket = self.fetch_fence.issue();

        let fetched = match self.api.fetch_receipts(user_id).await {
            Ok(fetched) => fetched,
            Err(e) => {
                error!(user_id, error = %e, "Failed to fetch receipts");
                return Err(e.into());
            }
        };

        let now = self.session.user_id().await;
        let mut receipts = self.receipts.write().await;
        if !self.fetch_fence.is_current(ticket) || !self.same_session(epoch, Some(user_id), now) {
            debug!(user_id, "Discarding superseded receipt list");
            return Err(StoreError::Superseded);
        }
        *receipts = fetched;
        debug!(user_id, count = receipts.len(), "Receipt list replaced");
        Ok(receipts.len())
    }

    /// Create a receipt owned by the current user and append the server's
    /// copy to the local list.
    pub async fn create_receipt(&self, form: &ReceiptForm) -> Result<Receipt, StoreError> {
        let user_id = self.session.user_id().await.ok_or(StoreError::NotAuthenticated)?;
        let epoch = self.epoch.current();

        match self.api.create_receipt(user_id, form).await {
            Ok(created) => {
                let now = self.session.user_id().await;
                let mut receipts = self.receipts.write().await;
                if !self.same_session(epoch, Some(user_id), now) {
                    info!(receipt_id = created.id, user_id, "Receipt created for a session that has ended");
                    return Err(StoreError::Superseded);
                }
                receipts.push(created.clone());
                info!(receipt_id = created.id, "Receipt created");
                Ok(created)
            }
            Err(e) => {
                error!(user_id, error = %e, "Failed to create receipt");
                Err(e.into())
            }
        }
    }

    /// Update a receipt and replace the matching local entry in place.
    /// The owner id is attached when signed in; a receipt missing from the
    /// local list is left missing.
    pub async fn update_receipt(
        &self,
        id: ReceiptId,
        form: &ReceiptForm,
    ) -> Result<Receipt, StoreError> {
        let user_id = self.session.user_id().await;
        let epoch = self.epoch.current();
        let ticket = self.update_fence.issue(id);

        let result = self.api.update_receipt(id, user_id, form).await;
        let outcome = match result {
            Ok(updated) => {
                let now = self.session.user_id().await;
                let mut receipts = self.receipts.write().await;
                if !self.update_fence.is_current(&id, ticket)
                    || !self.same_session(epoch, user_id, now)
                {
                    debug!(receipt_id = id, "Discarding superseded receipt update");
                    Err(StoreError::Superseded)
                } else {
                    if let Some(slot) = receipts.iter_mut().find(|r| r.id == id) {
                        *slot = updated.clone();
                    } else {
                        debug!(receipt_id = id, "Updated receipt is not in the local list");
                    }
                    info!(receipt_id = id, "Receipt updated");
                    Ok(updated)
                }
            }
            Err(e) => {
                error!(receipt_id = id, error = %e, "Failed to update receipt");
                Err(e.into())
            }
        };
        self.update_fence.settle(&id, ticket);
        outcome
    }

    /// Delete a receipt and drop it from the local list. Returns whether a
    /// local entry was removed.
    pub async fn delete_receipt(&self, id: ReceiptId) -> Result<bool, StoreError> {
        if let Err(e) = self.api.delete_receipt(id).await {
            error!(receipt_id = id, error = %e, "Failed to delete receipt");
            return Err(e.into());
        }

        let mut receipts = self.receipts.write().await;
        let before = receipts.len();
        receipts.retain(|r| r.id != id);
        let removed = receipts.len() != before;
        info!(receipt_id = id, removed, "Receipt deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::MemoryStore;
    use crate::testing::{form, receipt, server_error, user, Call, FakeApi, Reply};

    async fn signed_in() -> (Arc<FakeApi>, ReceiptStore) {
        let (api, store) = signed_out();
        api.push(Reply::User(Ok(user(1, "ada"))));
        store.session.login("ada", "pw").await.unwrap();
        (api, store)
    }

    fn signed_out() -> (Arc<FakeApi>, ReceiptStore) {
        let api = Arc::new(FakeApi::new());
        let session = Arc::new(SessionManager::restore(api.clone(), Arc::new(MemoryStore::new())));
        let store = ReceiptStore::new(api.clone(), session);
        (api, store)
    }

    async fn seeded(ids: &[ReceiptId]) -> (Arc<FakeApi>, ReceiptStore) {
        let (api, store) = signed_in().await;
        let list = ids.iter().map(|&id| receipt(id, &format!("store {}", id))).collect();
        api.push(Reply::Receipts(Ok(list)));
        store.fetch_receipts().await.unwrap();
        (api, store)
    }

    fn ids(list: &[Receipt]) -> Vec<ReceiptId> {
        list.iter().map(|r| r.id).collect()
    }

    #[tokio::test]
    async fn test_fetch_signed_out_issues_no_request() {
        let (api, store) = signed_out();
        let result = store.fetch_receipts().await;
        assert!(matches!(result, Err(StoreError::NotAuthenticated)));
        assert!(store.is_empty().await);
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_replaces_list_in_server_order() {
        let (api, store) = seeded(&[1, 2]).await;
        api.push(Reply::Receipts(Ok(vec![receipt(9, "z"), receipt(3, "a")])));

        assert_eq!(store.fetch_receipts().await.unwrap(), 2);
        assert_eq!(ids(&store.receipts().await), vec![9, 3]);
        assert!(api.calls().contains(&Call::Fetch(1)));
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_list() {
        let (api, store) = seeded(&[1, 2]).await;
        api.push(Reply::Receipts(Err(server_error("Error fetching receipts: db down"))));

        let err = store.fetch_receipts().await.unwrap_err();
        assert_eq!(err.detail(), "Error fetching receipts: db down");
        assert_eq!(ids(&store.receipts().await), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_create_then_delete_scenario() {
        let (api, store) = signed_in().await;
        let created: Receipt =
            serde_json::from_str(r#"{"id":7,"merchant":"Acme","userId":1}"#).unwrap();
        api.push(Reply::Receipt(Ok(created.clone())));

        let returned = store.create_receipt(&form("Acme")).await.unwrap();
        assert_eq!(returned, created);
        assert_eq!(store.receipts().await, vec![created]);
        assert!(api.calls().contains(&Call::Create(1)));

        api.push(Reply::Deleted(Ok(())));
        assert!(store.delete_receipt(7).await.unwrap());
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_create_appends_at_end() {
        let (api, store) = seeded(&[1, 2]).await;
        api.push(Reply::Receipt(Ok(receipt(3, "new"))));

        store.create_receipt(&form("new")).await.unwrap();
        let list = store.receipts().await;
        assert_eq!(list.len(), 3);
        assert_eq!(list.last(), Some(&receipt(3, "new")));
    }

    #[tokio::test]
    async fn test_create_failure_reports_server_text() {
        let (api, store) = seeded(&[1]).await;
        api.push(Reply::Receipt(Err(server_error("Error creating receipt: bad date"))));

        let err = store.create_receipt(&form("x")).await.unwrap_err();
        assert_eq!(err.detail(), "Error creating receipt: bad date");
        assert_eq!(ids(&store.receipts().await), vec![1]);
    }

    #[tokio::test]
    async fn test_create_signed_out_is_rejected_locally() {
        let (api, store) = signed_out();
        assert!(matches!(
            store.create_receipt(&form("x")).await,
            Err(StoreError::NotAuthenticated)
        ));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_update_replaces_in_place() {
        let (api, store) = seeded(&[1, 2, 3]).await;
        api.push(Reply::Receipt(Ok(receipt(2, "edited"))));

        store.update_receipt(2, &form("edited")).await.unwrap();
        let list = store.receipts().await;
        assert_eq!(ids(&list), vec![1, 2, 3]);
        assert_eq!(list[1].store_name, "edited");
        assert!(api.calls().contains(&Call::Update(2, Some(1))));
    }

    #[tokio::test]
    async fn test_update_missing_id_leaves_list() {
        let (api, store) = seeded(&[1, 2]).await;
        api.push(Reply::Receipt(Ok(receipt(99, "elsewhere"))));

        let updated = store.update_receipt(99, &form("elsewhere")).await.unwrap();
        assert_eq!(updated.id, 99);
        assert_eq!(ids(&store.receipts().await), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_update_signed_out_sends_no_owner() {
        let (api, store) = signed_out();
        api.push(Reply::Receipt(Ok(receipt(4, "x"))));

        store.update_receipt(4, &form("x")).await.unwrap();
        assert_eq!(api.calls(), vec![Call::Update(4, None)]);
    }

    #[tokio::test]
    async fn test_update_failure_keeps_entry() {
        let (api, store) = seeded(&[1]).await;
        api.push(Reply::Receipt(Err(server_error("Receipt not found"))));

        let err = store.update_receipt(1, &form("x")).await.unwrap_err();
        assert_eq!(err.detail(), "Receipt not found");
        assert_eq!(store.get(1).await.unwrap().store_name, "store 1");
    }

    #[tokio::test]
    async fn test_delete_absent_id_is_ok_and_unchanged() {
        let (api, store) = seeded(&[1, 2]).await;
        api.push(Reply::Deleted(Ok(())));

        assert!(!store.delete_receipt(5).await.unwrap());
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_delete_failure_is_reported() {
        let (api, store) = seeded(&[1, 2]).await;
        api.push(Reply::Deleted(Err(server_error("nope"))));

        assert!(store.delete_receipt(1).await.is_err());
        assert_eq!(ids(&store.receipts().await), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_stale_fetch_is_discarded() {
        let (api, store) = signed_in().await;
        let release = api.push_gated(Reply::Receipts(Ok(vec![receipt(1, "old")])));
        api.push(Reply::Receipts(Ok(vec![receipt(2, "new")])));

        let (first, second) = tokio::join!(store.fetch_receipts(), async {
            let result = store.fetch_receipts().await;
            release.send(()).unwrap();
            result
        });

        assert!(matches!(first, Err(StoreError::Superseded)));
        assert_eq!(second.unwrap(), 1);
        assert_eq!(ids(&store.receipts().await), vec![2]);
    }

    #[tokio::test]
    async fn test_stale_update_is_discarded() {
        let (api, store) = seeded(&[1]).await;
        let release = api.push_gated(Reply::Receipt(Ok(receipt(1, "first edit"))));
        api.push(Reply::Receipt(Ok(receipt(1, "second edit"))));

        let first_form = form("first edit");
        let second_form = form("second edit");
        let (first, second) = tokio::join!(store.update_receipt(1, &first_form), async {
            let result = store.update_receipt(1, &second_form).await;
            release.send(()).unwrap();
            result
        });

        assert!(matches!(first, Err(StoreError::Superseded)));
        assert!(second.is_ok());
        assert_eq!(store.get(1).await.unwrap().store_name, "second edit");
    }

    #[tokio::test]
    async fn test_clear_discards_in_flight_fetch() {
        let (api, store) = signed_in().await;
        let release = api.push_gated(Reply::Receipts(Ok(vec![receipt(1, "late")])));

        let (fetched, ()) = tokio::join!(store.fetch_receipts(), async {
            store.clear().await;
            release.send(()).unwrap();
        });

        assert!(matches!(fetched, Err(StoreError::Superseded)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_discards_in_flight_create() {
        let (api, store) = signed_in().await;
        let release = api.push_gated(Reply::Receipt(Ok(receipt(7, "late"))));
        let late = form("late");

        let (created, ()) = tokio::join!(store.create_receipt(&late), async {
            store.clear().await;
            release.send(()).unwrap();
        });

        assert!(matches!(created, Err(StoreError::Superseded)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_clear_discards_in_flight_update() {
        let (api, store) = seeded(&[1]).await;
        let release = api.push_gated(Reply::Receipt(Ok(receipt(1, "late"))));
        let late = form("late");

        let (updated, ()) = tokio::join!(store.update_receipt(1, &late), async {
            store.clear().await;
            release.send(()).unwrap();
        });

        assert!(matches!(updated, Err(StoreError::Superseded)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_fetch_for_previous_user_is_discarded() {
        let (api, store) = signed_in().await;
        let release = api.push_gated(Reply::Receipts(Ok(vec![receipt(1, "ada's")])));
        api.push(Reply::User(Ok(user(2, "bob"))));

        let (fetched, ()) = tokio::join!(store.fetch_receipts(), async {
            store.session.login("bob", "pw").await.unwrap();
            release.send(()).unwrap();
        });

        assert!(matches!(fetched, Err(StoreError::Superseded)));
        assert!(store.is_empty().await);
        assert_eq!(store.session.user_id().await, Some(2));
    }
}
