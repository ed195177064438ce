//! # Document Service Module
//!
//! ## Purpose
//! Business-rule orchestration around the document store: uniqueness before
//! insert, creation-date defaulting, not-found semantics, and the single
//! call surface the API layer depends on.
//!
//! ## Input/Output Specification
//! - **Input**: Document drafts, ids, query parameters, optional caller
//!   identity as explicit audit context
//! - **Output**: Persisted records and query results as domain `Result`s
//! - **Invariants**: (name, user) uniqueness, dates always set, hard deletes
//!
//! ## Key Features
//! - Uniqueness pre-check before insert; the store's compare-and-swap
//!   backstop covers the window between check and insert
//! - Query operations pass through to the engine unchanged, keeping the
//!   store swappable behind one surface
//! - Domain failures are explicit `DocumentError` values, never panics

use crate::config::QueryConfig;
use crate::errors::Result;
use crate::identity::CallerIdentity;
use crate::search::{DocumentStatistics, QueryEngine};
use crate::storage::DocumentStore;
use crate::{Document, DocumentDraft, DocumentId, UserId};
use chrono::{NaiveDate, Utc};
use std::sync::Arc;

/// Orchestrates business rules around the store and query engine
pub struct DocumentService {
    store: Arc<DocumentStore>,
    query: QueryEngine,
}

impl DocumentService {
    /// Create a new service over the given store
    pub fn new(store: Arc<DocumentStore>, query_config: QueryConfig) -> Self {
        let query = QueryEngine::new(store.clone(), query_config);
        Self { store, query }
    }

    /// Create a new document.
    ///
    /// Fails with `AlreadyExists` when the (name, user) pair is taken. A
    /// missing date defaults to the current UTC date. Returns the persisted
    /// record including its assigned id.
    pub fn create_document(
        &self,
        draft: DocumentDraft,
        caller: Option<&CallerIdentity>,
    ) -> Result<Document> {
        if self
            .store
            .exists_by_name_and_user(&draft.name, draft.user_id)?
        {
            return Err(crate::DocumentError::AlreadyExists {
                name: draft.name,
                user_id: draft.user_id,
            });
        }

        let record = draft.resolve_date(Utc::now().date_naive());
        let document = self.store.insert(record)?;

        tracing::info!(
            "Created document {} ('{}') for user {}{}",
            document.id,
            document.name,
            document.user_id,
            caller
                .map(|c| format!(", requested by '{}'", c.username))
                .unwrap_or_default()
        );
        Ok(document)
    }

    /// Get a document by its id; `NotFound` when absent
    pub fn document_by_id(&self, id: DocumentId) -> Result<Document> {
        self.store.get(id)
    }

    /// Delete a document by id; `NotFound` when absent
    pub fn delete_document(&self, id: DocumentId, caller: Option<&CallerIdentity>) -> Result<()> {
        self.store.delete(id)?;
        tracing::info!(
            "Deleted document {}{}",
            id,
            caller
                .map(|c| format!(", requested by '{}'", c.username))
                .unwrap_or_default()
        );
        Ok(())
    }

    /// Delete every document a user owns; returns how many were removed
    pub fn delete_documents_for_user(
        &self,
        user_id: UserId,
        caller: Option<&CallerIdentity>,
    ) -> Result<usize> {
        let removed = self.store.delete_all_for_user(user_id)?;
        if removed > 0 {
            tracing::info!(
                "Deleted {} documents for user {}{}",
                removed,
                user_id,
                caller
                    .map(|c| format!(", requested by '{}'", c.username))
                    .unwrap_or_default()
            );
        }
        Ok(removed)
    }

    // Query surface: pass-throughs to the engine, no extra filtering

    pub fn all_documents(&self) -> Result<Vec<Document>> {
        self.query.all_documents()
    }

    pub fn documents_by_user(&self, user_id: UserId) -> Result<Vec<Document>> {
        self.query.find_by_user(user_id)
    }

    pub fn documents_by_type(&self, doc_type: &str) -> Result<Vec<Document>> {
        self.query.find_by_type(doc_type)
    }

    pub fn documents_by_category(&self, category: &str) -> Result<Vec<Document>> {
        self.query.find_by_category(category)
    }

    pub fn documents_by_name(&self, name: &str) -> Result<Vec<Document>> {
        self.query.find_by_name(name)
    }

    pub fn documents_by_date(&self, date: NaiveDate) -> Result<Vec<Document>> {
        self.query.find_by_date(date)
    }

    pub fn documents_by_date_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Document>> {
        self.query.find_by_date_range(start, end)
    }

    pub fn documents_by_user_and_type(
        &self,
        user_id: UserId,
        doc_type: &str,
    ) -> Result<Vec<Document>> {
        self.query.find_by_user_and_type(user_id, doc_type)
    }

    pub fn documents_by_user_and_category(
        &self,
        user_id: UserId,
        category: &str,
    ) -> Result<Vec<Document>> {
        self.query.find_by_user_and_category(user_id, category)
    }

    pub fn documents_by_user_and_date_range(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Document>> {
        self.query.find_by_user_and_date_range(user_id, start, end)
    }

    pub fn search_documents(&self, term: &str) -> Result<Vec<Document>> {
        self.query.search_all(term)
    }

    pub fn search_documents_by_user(&self, user_id: UserId, term: &str) -> Result<Vec<Document>> {
        self.query.search_by_user(user_id, term)
    }

    pub fn count_documents_by_user(&self, user_id: UserId) -> Result<u64> {
        self.query.count_by_user(user_id)
    }

    pub fn count_documents_by_type(&self, doc_type: &str) -> Result<u64> {
        self.query.count_by_type(doc_type)
    }

    pub fn count_documents_by_category(&self, category: &str) -> Result<u64> {
        self.query.count_by_category(category)
    }

    pub fn statistics(&self) -> Result<DocumentStatistics> {
        self.query.statistics(Utc::now().date_naive())
    }

    pub fn exists_by_id(&self, id: DocumentId) -> Result<bool> {
        self.store.exists_by_id(id)
    }

    pub fn exists_by_name_and_user(&self, name: &str, user_id: UserId) -> Result<bool> {
        self.store.exists_by_name_and_user(name, user_id)
    }

    /// Storage liveness probe for the health endpoint
    pub fn health_check(&self) -> Result<()> {
        self.store.health_check()
    }

    /// Flush pending storage writes, used during shutdown
    pub fn flush(&self) -> Result<()> {
        self.store.flush()
    }
}
