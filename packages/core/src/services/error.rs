//! Service Layer Error Types
//!
//! Every operation on the note engine resolves to one of the error kinds
//! here. Domain errors carry enough detail for the caller to correct the
//! request; storage-level failures collapse to a retryable kind without
//! leaking persistence detail into user-visible messages.

use crate::db::DatabaseError;
use crate::models::ValidationError;
use crate::services::auth::AuthError;
use crate::services::crypto::CipherError;
use thiserror::Error;

/// Note engine operation errors
#[derive(Error, Debug)]
pub enum NoteServiceError {
    /// No record exists for the id
    #[error("Note not found: {id}")]
    NotFound { id: String },

    /// The record exists but belongs to another user
    #[error("Access denied to note {id}")]
    AccessDenied { id: String },

    /// Malformed note id
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// Operation not available for this category
    #[error("Invalid category '{category}': {context}")]
    InvalidCategory { category: String, context: String },

    /// Reorder batch does not exactly match the partition's live membership
    ///
    /// `missing` names requested ids with no live note in the partition
    /// (nonexistent, owned by someone else, or already moved); `unlisted`
    /// names live notes the batch failed to include; `duplicated` names ids
    /// the batch listed more than once.
    #[error("Reorder batch does not match partition contents (missing: {missing:?}, unlisted: {unlisted:?}, duplicated: {duplicated:?})")]
    SetMismatch {
        missing: Vec<String>,
        unlisted: Vec<String>,
        duplicated: Vec<String>,
    },

    /// A required prior state does not hold
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),

    /// Reorder batch exceeds the configured ceiling
    #[error("Reorder batch of {size} notes exceeds the limit of {limit}")]
    BatchTooLarge { size: usize, limit: usize },

    /// The storage layer aborted due to a concurrent modification
    #[error("Concurrent modification detected: {context}")]
    TransactionConflict { context: String },

    /// The storage layer failed for reasons other than contention
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[source] DatabaseError),

    /// Request payload failed validation
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// Token did not resolve to a user
    #[error("Authentication failed: {0}")]
    Unauthenticated(#[from] AuthError),

    /// Content cipher failure
    #[error("Content cipher failure: {0}")]
    Cipher(#[from] CipherError),
}

impl NoteServiceError {
    /// Create a not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    /// Create an access denied error
    pub fn access_denied(id: impl Into<String>) -> Self {
        Self::AccessDenied { id: id.into() }
    }

    /// Create an invalid identifier error
    pub fn invalid_identifier(msg: impl Into<String>) -> Self {
        Self::InvalidIdentifier(msg.into())
    }

    /// Create an invalid category error
    pub fn invalid_category(category: impl Into<String>, context: impl Into<String>) -> Self {
        Self::InvalidCategory {
            category: category.into(),
            context: context.into(),
        }
    }

    /// Create a precondition failed error
    pub fn precondition_failed(msg: impl Into<String>) -> Self {
        Self::PreconditionFailed(msg.into())
    }

    /// Create a batch too large error
    pub fn batch_too_large(size: usize, limit: usize) -> Self {
        Self::BatchTooLarge { size, limit }
    }

    /// Create a transaction conflict error
    pub fn transaction_conflict(context: impl Into<String>) -> Self {
        Self::TransactionConflict {
            context: context.into(),
        }
    }

    /// Stable machine-readable kind for wire surfaces and logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "notFound",
            Self::AccessDenied { .. } => "accessDenied",
            Self::InvalidIdentifier(_) => "invalidIdentifier",
            Self::InvalidCategory { .. } => "invalidCategory",
            Self::SetMismatch { .. } => "setMismatch",
            Self::PreconditionFailed(_) => "preconditionFailed",
            Self::BatchTooLarge { .. } => "batchTooLarge",
            Self::TransactionConflict { .. } => "transactionConflict",
            Self::StorageUnavailable(_) => "storageUnavailable",
            Self::Validation(_) => "validation",
            Self::Unauthenticated(_) => "unauthenticated",
            Self::Cipher(_) => "cipher",
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransactionConflict { .. } | Self::StorageUnavailable(_)
        )
    }

    /// Message safe to show an end user
    ///
    /// Storage-level failures collapse to generic retry text; domain errors
    /// keep their detail so the caller can correct the request.
    pub fn user_message(&self) -> String {
        match self {
            Self::StorageUnavailable(_) | Self::Cipher(_) => {
                "Something went wrong saving your notes, please try again".to_string()
            }
            Self::TransactionConflict { .. } => {
                "Your notes changed while saving, please try again".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Busy and locked storage errors surface as transaction conflicts; the
/// caller owns retry policy for both.
impl From<DatabaseError> for NoteServiceError {
    fn from(err: DatabaseError) -> Self {
        if err.is_busy() {
            Self::TransactionConflict {
                context: err.to_string(),
            }
        } else {
            Self::StorageUnavailable(err)
        }
    }
}
