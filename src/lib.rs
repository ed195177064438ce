//! # Document Metadata Service
//!
//! ## Overview
//! This library implements a document-metadata CRUD microservice: it stores
//! records describing uploaded files and exposes HTTP endpoints to create,
//! fetch, search, count, and delete them. Caller identity is derived from an
//! upstream-issued bearer token and threaded through requests as explicit
//! context.
//!
//! ## Architecture
//! The system is composed of several key modules:
//! - `storage`: Persistent document store with id assignment and uniqueness
//! - `search`: Predicate-based query engine layered on the store
//! - `service`: Business rules (uniqueness, date defaulting, not-found)
//! - `identity`: Bearer-token caller identity resolution (fail-open)
//! - `api`: REST API endpoints and response envelope
//! - `config`: Configuration management and settings
//! - `errors`: Centralized error handling and types
//!
//! ## Input/Output Specification
//! - **Input**: Document metadata (JSON), query parameters, bearer tokens
//! - **Output**: Stored records, filtered record lists, counts, statistics
//! - **Guarantees**: Per-user name uniqueness, stable ids, hard deletes
//!
//! ## Usage
//! ```rust,no_run
//! use docmeta_service::{Config, DocumentService, storage::DocumentStore};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.toml")?;
//!     let store = Arc::new(DocumentStore::open(&config.storage)?);
//!     let service = DocumentService::new(store, config.query.clone());
//!     let docs = service.documents_by_user(7)?;
//!     println!("User owns {} documents", docs.len());
//!     Ok(())
//! }
//! ```

// Core modules
pub mod api;
pub mod config;
pub mod errors;
pub mod identity;
pub mod search;
pub mod service;
pub mod storage;

// Utilities
pub mod utils;

// Re-exports for convenience
pub use config::Config;
pub use errors::{DocumentError, Result};
pub use identity::{CallerIdentity, IdentityResolver};
pub use service::DocumentService;

// Core types used throughout the system
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Unique identifier for documents, assigned by the store on insert
pub type DocumentId = u64;

/// Identifier of the user owning a document
pub type UserId = u64;

/// A persisted document-metadata record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Store-assigned identifier; immutable once assigned
    pub id: DocumentId,
    /// Document name; unique per owning user
    pub name: String,
    /// Free-form classification tag
    pub category: String,
    /// File-extension derived label (e.g. PDF, DOCX); may be empty
    #[serde(rename = "type")]
    pub doc_type: String,
    /// Creation date; defaulted to "today" when the caller omits it
    pub date: NaiveDate,
    /// Opaque reference to where the underlying content lives
    pub url: String,
    /// Owning user; every record has exactly one
    pub user_id: UserId,
}

/// A candidate record, everything except the store-assigned id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDraft {
    pub name: String,
    pub category: String,
    pub doc_type: String,
    /// None means "default to the creation date" at insert time
    pub date: Option<NaiveDate>,
    pub url: String,
    pub user_id: UserId,
}

/// A fully-resolved record ready for insertion; the date is always set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDocument {
    pub name: String,
    pub category: String,
    pub doc_type: String,
    pub date: NaiveDate,
    pub url: String,
    pub user_id: UserId,
}

impl DocumentDraft {
    /// Resolve the optional date, falling back to `default_date`
    pub fn resolve_date(self, default_date: NaiveDate) -> NewDocument {
        NewDocument {
            name: self.name,
            category: self.category,
            doc_type: self.doc_type,
            date: self.date.unwrap_or(default_date),
            url: self.url,
            user_id: self.user_id,
        }
    }
}

impl Document {
    /// True if `term` appears verbatim in the name, category, or type
    pub fn matches_term(&self, term: &str) -> bool {
        self.name.contains(term) || self.category.contains(term) || self.doc_type.contains(term)
    }
}

/// Application state shared across request handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Config>,
    pub service: Arc<service::DocumentService>,
    pub identity: Arc<identity::IdentityResolver>,
}
