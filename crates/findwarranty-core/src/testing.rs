//! Scripted in-memory `WarrantyApi` for store tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::StatusCode;
use tokio::sync::oneshot;

use crate::api::{ApiError, WarrantyApi};
use crate::models::{Credentials, Receipt, ReceiptForm, ReceiptId, User, UserId};

/// A request the fake received, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Login(String),
    Register(String),
    Fetch(UserId),
    Create(UserId),
    Update(ReceiptId, Option<UserId>),
    Delete(ReceiptId),
}

pub enum Reply {
    User(Result<User, ApiError>),
    Receipts(Result<Vec<Receipt>, ApiError>),
    Receipt(Result<Receipt, ApiError>),
    Deleted(Result<(), ApiError>),
    /// Hold the inner reply until the sender fires
    Gated(oneshot::Receiver<()>, Box<Reply>),
}

#[derive(Default)]
pub struct FakeApi {
    calls: Mutex<Vec<Call>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, reply: Reply) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Queue `reply` behind a gate; send on the returned sender to release it.
    pub fn push_gated(&self, reply: Reply) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.push(Reply::Gated(rx, Box::new(reply)));
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn next(&self, call: Call) -> Reply {
        self.calls.lock().unwrap().push(call.clone());
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("no reply queued for {:?}", call));
        match reply {
            Reply::Gated(gate, inner) => {
                let _ = gate.await;
                *inner
            }
            other => other,
        }
    }
}

#[async_trait]
impl WarrantyApi for FakeApi {
    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        match self.next(Call::Login(credentials.username.clone())).await {
            Reply::User(result) => result,
            _ => panic!("expected a user reply for login"),
        }
    }

    async fn register(&self, credentials: &Credentials) -> Result<User, ApiError> {
        match self.next(Call::Register(credentials.username.clone())).await {
            Reply::User(result) => result,
            _ => panic!("expected a user reply for register"),
        }
    }

    async fn fetch_receipts(&self, user_id: UserId) -> Result<Vec<Receipt>, ApiError> {
        match self.next(Call::Fetch(user_id)).await {
            Reply::Receipts(result) => result,
            _ => panic!("expected a receipts reply for fetch"),
        }
    }

    async fn create_receipt(&self, user_id: UserId, _form: &ReceiptForm) -> Result<Receipt, ApiError> {
        match self.next(Call::Create(user_id)).await {
            Reply::Receipt(result) => result,
            _ => panic!("expected a receipt reply for create"),
        }
    }

    async fn update_receipt(
        &self,
        id: ReceiptId,
        user_id: Option<UserId>,
        _form: &ReceiptForm,
    ) -> Result<Receipt, ApiError> {
        match self.next(Call::Update(id, user_id)).await {
            Reply::Receipt(result) => result,
            _ => panic!("expected a receipt reply for update"),
        }
    }

    async fn delete_receipt(&self, id: ReceiptId) -> Result<(), ApiError> {
        match self.next(Call::Delete(id)).await {
            Reply::Deleted(result) => result,
            _ => panic!("expected a delete reply"),
        }
    }
}

pub fn server_error(body: &str) -> ApiError {
    ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, body)
}

pub fn user(id: UserId, username: &str) -> User {
    User::new(id, username)
}

pub fn receipt(id: ReceiptId, store_name: &str) -> Receipt {
    serde_json::from_value(serde_json::json!({ "id": id, "storeName": store_name }))
        .expect("receipt fixture")
}

pub fn form(store_name: &str) -> ReceiptForm {
    ReceiptForm {
        store_name: store_name.to_string(),
        product_name: "Widget".to_string(),
        purchase_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
        price: 10.0,
        category: "General".to_string(),
        warranty_duration: "1 Year".to_string(),
        attachment: None,
    }
}
