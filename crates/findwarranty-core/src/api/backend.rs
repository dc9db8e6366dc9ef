use async_trait::async_trait;

use crate::models::{Credentials, Receipt, ReceiptForm, ReceiptId, User, UserId};

use super::ApiError;

/// The remote endpoints the session and receipt stores depend on.
///
/// `ApiClient` is the HTTP implementation; tests substitute in-memory fakes.
#[async_trait]
pub trait WarrantyApi: Send + Sync {
    /// `POST /api/auth/login`
    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError>;

    /// `POST /api/auth/register`
    async fn register(&self, credentials: &Credentials) -> Result<User, ApiError>;

    /// `GET /api/receipts/user/{userId}`
    async fn fetch_receipts(&self, user_id: UserId) -> Result<Vec<Receipt>, ApiError>;

    /// `POST /api/receipts` (multipart)
    async fn create_receipt(&self, user_id: UserId, form: &ReceiptForm) -> Result<Receipt, ApiError>;

    /// `PUT /api/receipts/{id}` (multipart)
    async fn update_receipt(
        &self,
        id: ReceiptId,
        user_id: Option<UserId>,
        form: &ReceiptForm,
    ) -> Result<Receipt, ApiError>;

    /// `DELETE /api/receipts/{id}`
    async fn delete_receipt(&self, id: ReceiptId) -> Result<(), ApiError>;
}
