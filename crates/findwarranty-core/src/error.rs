use thiserror::Error;

use crate::api::ApiError;

/// Outcome of a failed session or receipt store operation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not signed in")]
    NotAuthenticated,

    /// A later request for the same state was issued before this one
    /// completed, so its response was discarded.
    #[error("Superseded by a newer request")]
    Superseded,

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl StoreError {
    /// Text suitable for showing next to a form: the server's error body
    /// when there is one.
    pub fn detail(&self) -> String {
        match self {
            StoreError::Api(e) => e.detail(),
            other => other.to_string(),
        }
    }
}
