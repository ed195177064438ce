//! # Query Engine Module
//!
//! ## Purpose
//! Implements the read-side query surface over the document store: every
//! filter combination, free-text substring search, counting, and aggregate
//! statistics.
//!
//! ## Input/Output Specification
//! - **Input**: User ids, type/category labels, names, dates, search terms
//! - **Output**: Record lists (unordered beyond storage order), counts,
//!   aggregate statistics
//! - **Semantics**: Exact case-sensitive field matches; substring search
//!   across name OR category OR type; date ranges inclusive on both ends
//!
//! ## Key Features
//! - Each query is a hand-written predicate over store iteration, so the
//!   filtering semantics are explicit and auditable
//! - Empty results are empty sequences, never errors
//! - Search term length is bounded by configuration

use crate::config::QueryConfig;
use crate::errors::{DocumentError, Result};
use crate::storage::DocumentStore;
use crate::{Document, UserId};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Read-side query surface layered on the document store
pub struct QueryEngine {
    store: Arc<DocumentStore>,
    config: QueryConfig,
}

/// Aggregate document statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentStatistics {
    /// Total number of documents in the system
    pub total_documents: u64,
    /// Number of documents dated in the current calendar month
    pub documents_this_month: u64,
    /// Number of documents dated in the current calendar year
    pub documents_this_year: u64,
}

impl QueryEngine {
    /// Create a new query engine over the given store
    pub fn new(store: Arc<DocumentStore>, config: QueryConfig) -> Self {
        Self { store, config }
    }

    /// All documents, in storage order
    pub fn all_documents(&self) -> Result<Vec<Document>> {
        self.store.filter(|_| true)
    }

    /// All documents belonging to a specific user
    pub fn find_by_user(&self, user_id: UserId) -> Result<Vec<Document>> {
        self.store.filter(|d| d.user_id == user_id)
    }

    /// All documents of a specific type
    pub fn find_by_type(&self, doc_type: &str) -> Result<Vec<Document>> {
        self.store.filter(|d| d.doc_type == doc_type)
    }

    /// All documents in a specific category
    pub fn find_by_category(&self, category: &str) -> Result<Vec<Document>> {
        self.store.filter(|d| d.category == category)
    }

    /// Documents by exact name match
    pub fn find_by_name(&self, name: &str) -> Result<Vec<Document>> {
        self.store.filter(|d| d.name == name)
    }

    /// Documents dated on a specific day
    pub fn find_by_date(&self, date: NaiveDate) -> Result<Vec<Document>> {
        self.store.filter(|d| d.date == date)
    }

    /// Documents dated within a range, inclusive on both ends
    pub fn find_by_date_range(&self, start: NaiveDate, end: NaiveDate) -> Result<Vec<Document>> {
        self.store.filter(|d| d.date >= start && d.date <= end)
    }

    /// Documents by user and type
    pub fn find_by_user_and_type(&self, user_id: UserId, doc_type: &str) -> Result<Vec<Document>> {
        self.store
            .filter(|d| d.user_id == user_id && d.doc_type == doc_type)
    }

    /// Documents by user and category
    pub fn find_by_user_and_category(
        &self,
        user_id: UserId,
        category: &str,
    ) -> Result<Vec<Document>> {
        self.store
            .filter(|d| d.user_id == user_id && d.category == category)
    }

    /// Documents by user within a date range, inclusive on both ends
    pub fn find_by_user_and_date_range(
        &self,
        user_id: UserId,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<Document>> {
        self.store
            .filter(|d| d.user_id == user_id && d.date >= start && d.date <= end)
    }

    /// Documents where the term appears in the name, category, or type
    pub fn search_all(&self, term: &str) -> Result<Vec<Document>> {
        self.validate_term(term)?;
        self.store.filter(|d| d.matches_term(term))
    }

    /// Per-user variant of `search_all`
    pub fn search_by_user(&self, user_id: UserId, term: &str) -> Result<Vec<Document>> {
        self.validate_term(term)?;
        self.store
            .filter(|d| d.user_id == user_id && d.matches_term(term))
    }

    /// Number of documents a user owns
    pub fn count_by_user(&self, user_id: UserId) -> Result<u64> {
        self.store.count(|d| d.user_id == user_id)
    }

    /// Number of documents of a specific type
    pub fn count_by_type(&self, doc_type: &str) -> Result<u64> {
        self.store.count(|d| d.doc_type == doc_type)
    }

    /// Number of documents in a specific category
    pub fn count_by_category(&self, category: &str) -> Result<u64> {
        self.store.count(|d| d.category == category)
    }

    /// Aggregate statistics relative to `today`
    pub fn statistics(&self, today: NaiveDate) -> Result<DocumentStatistics> {
        let mut stats = DocumentStatistics {
            total_documents: 0,
            documents_this_month: 0,
            documents_this_year: 0,
        };

        for document in self.all_documents()? {
            stats.total_documents += 1;
            if document.date.year() == today.year() {
                stats.documents_this_year += 1;
                if document.date.month() == today.month() {
                    stats.documents_this_month += 1;
                }
            }
        }

        Ok(stats)
    }

    fn validate_term(&self, term: &str) -> Result<()> {
        if term.len() < self.config.min_term_length {
            return Err(DocumentError::ValidationFailed {
                field: "term".to_string(),
                reason: format!(
                    "Search term too short: minimum {} characters",
                    self.config.min_term_length
                ),
            });
        }
        if term.len() > self.config.max_term_length {
            return Err(DocumentError::ValidationFailed {
                field: "term".to_string(),
                reason: format!(
                    "Search term too long: maximum {} characters",
                    self.config.max_term_length
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageConfig;
    use crate::NewDocument;

    fn engine_with_fixtures() -> (tempfile::TempDir, QueryEngine) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(
            DocumentStore::open(&StorageConfig {
                db_path: dir.path().join("documents.db"),
                flush_on_write: false,
            })
            .unwrap(),
        );

        let fixtures = [
            ("Invoice1", "Finance", "PDF", 7, "2025-01-15"),
            ("Contract", "Legal", "DOCX", 7, "2025-02-20"),
            ("Scan", "Finance", "JPG", 8, "2025-02-28"),
            ("Notes", "Personal", "", 8, "2024-12-31"),
        ];
        for (name, category, doc_type, user_id, date) in fixtures {
            store
                .insert(NewDocument {
                    name: name.to_string(),
                    category: category.to_string(),
                    doc_type: doc_type.to_string(),
                    date: date.parse().unwrap(),
                    url: format!("/api/documents/download/{}", name),
                    user_id,
                })
                .unwrap();
        }

        let engine = QueryEngine::new(
            store,
            QueryConfig {
                min_term_length: 1,
                max_term_length: 256,
            },
        );
        (dir, engine)
    }

    fn names(documents: &[Document]) -> Vec<&str> {
        let mut names: Vec<&str> = documents.iter().map(|d| d.name.as_str()).collect();
        names.sort();
        names
    }

    #[test]
    fn test_find_by_user() {
        let (_dir, engine) = engine_with_fixtures();
        assert_eq!(
            names(&engine.find_by_user(7).unwrap()),
            vec!["Contract", "Invoice1"]
        );
        assert!(engine.find_by_user(99).unwrap().is_empty());
    }

    #[test]
    fn test_find_by_type_and_category() {
        let (_dir, engine) = engine_with_fixtures();
        assert_eq!(names(&engine.find_by_type("PDF").unwrap()), vec!["Invoice1"]);
        assert_eq!(
            names(&engine.find_by_category("Finance").unwrap()),
            vec!["Invoice1", "Scan"]
        );
        // Exact matches are case-sensitive
        assert!(engine.find_by_category("finance").unwrap().is_empty());
    }

    #[test]
    fn test_find_by_name_is_exact() {
        let (_dir, engine) = engine_with_fixtures();
        assert_eq!(engine.find_by_name("Invoice1").unwrap().len(), 1);
        assert!(engine.find_by_name("Invoice").unwrap().is_empty());
    }

    #[test]
    fn test_date_range_inclusive_both_ends() {
        let (_dir, engine) = engine_with_fixtures();
        let start: NaiveDate = "2025-01-15".parse().unwrap();
        let end: NaiveDate = "2025-02-28".parse().unwrap();
        assert_eq!(
            names(&engine.find_by_date_range(start, end).unwrap()),
            vec!["Contract", "Invoice1", "Scan"]
        );

        let date: NaiveDate = "2025-02-20".parse().unwrap();
        assert_eq!(names(&engine.find_by_date(date).unwrap()), vec!["Contract"]);
    }

    #[test]
    fn test_compound_user_filters() {
        let (_dir, engine) = engine_with_fixtures();
        assert_eq!(
            names(&engine.find_by_user_and_type(7, "DOCX").unwrap()),
            vec!["Contract"]
        );
        assert_eq!(
            names(&engine.find_by_user_and_category(8, "Finance").unwrap()),
            vec!["Scan"]
        );
        let start: NaiveDate = "2025-01-01".parse().unwrap();
        let end: NaiveDate = "2025-12-31".parse().unwrap();
        assert_eq!(
            names(&engine.find_by_user_and_date_range(8, start, end).unwrap()),
            vec!["Scan"]
        );
    }

    #[test]
    fn test_search_matches_any_of_three_fields() {
        let (_dir, engine) = engine_with_fixtures();
        // "Fin" hits category Finance only
        assert_eq!(
            names(&engine.search_all("Fin").unwrap()),
            vec!["Invoice1", "Scan"]
        );
        // "DOC" hits the DOCX type label
        assert_eq!(names(&engine.search_all("DOC").unwrap()), vec!["Contract"]);
        // name substring
        assert_eq!(names(&engine.search_all("voice").unwrap()), vec!["Invoice1"]);
        // case-sensitive, no match
        assert!(engine.search_all("finance").unwrap().is_empty());
        assert!(engine.search_all("zzz").unwrap().is_empty());
    }

    #[test]
    fn test_search_by_user_scopes_results() {
        let (_dir, engine) = engine_with_fixtures();
        assert_eq!(
            names(&engine.search_by_user(7, "Fin").unwrap()),
            vec!["Invoice1"]
        );
        assert!(engine.search_by_user(99, "Fin").unwrap().is_empty());
    }

    #[test]
    fn test_counts() {
        let (_dir, engine) = engine_with_fixtures();
        assert_eq!(engine.count_by_user(7).unwrap(), 2);
        assert_eq!(engine.count_by_user(99).unwrap(), 0);
        assert_eq!(engine.count_by_type("PDF").unwrap(), 1);
        assert_eq!(engine.count_by_category("Finance").unwrap(), 2);
    }

    #[test]
    fn test_statistics_buckets_by_month_and_year() {
        let (_dir, engine) = engine_with_fixtures();
        let today: NaiveDate = "2025-02-10".parse().unwrap();
        let stats = engine.statistics(today).unwrap();
        assert_eq!(stats.total_documents, 4);
        assert_eq!(stats.documents_this_year, 3);
        assert_eq!(stats.documents_this_month, 2);
    }

    #[test]
    fn test_oversized_term_rejected() {
        let (_dir, engine) = engine_with_fixtures();
        let term = "x".repeat(300);
        assert!(matches!(
            engine.search_all(&term).unwrap_err(),
            DocumentError::ValidationFailed { .. }
        ));
    }
}
