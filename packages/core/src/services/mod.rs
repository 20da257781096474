//! Business Services
//!
//! This module contains the note engine's business logic:
//!
//! - `NoteService` - the public surface: creation, updates, toggles,
//!   permanent deletion, and reorder
//! - `PartitionRanks` - dense-rank bookkeeping over the bulk shift
//!   primitives
//! - `ContentCipher` / `Authenticator` - injected collaborator seams for
//!   at-rest encryption and token resolution
//!
//! Services coordinate between the database layer and application logic,
//! implementing the transition and ordering rules and orchestrating
//! multi-step transactional operations.

pub mod auth;
pub mod crypto;
pub mod error;
pub mod note_service;
pub mod ranks;

pub use auth::{AuthError, Authenticator, StaticTokenAuthenticator};
pub use crypto::{CipherError, ContentCipher, PassthroughCipher};
pub use error::NoteServiceError;
pub use note_service::{NoteService, NoteServiceConfig};
pub use ranks::PartitionRanks;
