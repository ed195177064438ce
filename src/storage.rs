//! # Document Store Module
//!
//! ## Purpose
//! Handles persistent storage of document-metadata records using an embedded
//! database, owning id assignment and the per-user name uniqueness backstop.
//!
//! ## Input/Output Specification
//! - **Input**: Resolved document records, ids, existence probes, predicates
//! - **Output**: Persisted records, retrieval operations, bulk deletes
//! - **Storage**: Sled embedded database, bincode-encoded values
//!
//! ## Key Features
//! - Monotonic id assignment, ids are never reused or mutated
//! - A name-index tree materializing the (user, name) uniqueness constraint
//! - Compare-and-swap on the name index closes the check-then-act race
//!   between concurrent creates
//! - Hard deletes with deterministic delete-then-read behavior
//! - Iteration primitives the query engine layers predicates on

use crate::config::StorageConfig;
use crate::errors::{DocumentError, Result};
use crate::{Document, DocumentId, NewDocument, UserId};

/// Persistent store for document-metadata records
pub struct DocumentStore {
    db: sled::Db,
    /// id (big-endian u64) -> bincode-encoded Document
    documents: sled::Tree,
    /// user_id (big-endian u64) + name bytes -> id (big-endian u64)
    name_index: sled::Tree,
    /// scratch tree for health probes, never holds records
    meta: sled::Tree,
    flush_on_write: bool,
}

impl DocumentStore {
    /// Open (or create) the store at the configured path
    pub fn open(config: &StorageConfig) -> Result<Self> {
        if let Some(parent) = config.db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = sled::open(&config.db_path).map_err(|e| DocumentError::StorageFailure {
            reason: format!("Failed to open database at {:?}: {}", config.db_path, e),
        })?;

        let documents = db.open_tree("documents")?;
        let name_index = db.open_tree("name_index")?;
        let meta = db.open_tree("meta")?;

        let store = Self {
            db,
            documents,
            name_index,
            meta,
            flush_on_write: config.flush_on_write,
        };

        tracing::info!("Document store opened with {} records", store.documents.len());
        Ok(store)
    }

    /// Insert a record, assigning a fresh id.
    ///
    /// The (user, name) slot is claimed in the name index with a
    /// compare-and-swap before the record is written, so at most one of two
    /// racing inserts for the same pair can succeed; the loser gets
    /// `AlreadyExists` even if its pre-check passed.
    pub fn insert(&self, record: NewDocument) -> Result<Document> {
        let id = self.db.generate_id()?;

        let key = name_index_key(record.user_id, &record.name);
        let claimed = self.name_index.compare_and_swap(
            key.as_slice(),
            None as Option<&[u8]>,
            Some(&id.to_be_bytes()[..]),
        )?;
        if claimed.is_err() {
            return Err(DocumentError::AlreadyExists {
                name: record.name,
                user_id: record.user_id,
            });
        }

        let document = Document {
            id,
            name: record.name,
            category: record.category,
            doc_type: record.doc_type,
            date: record.date,
            url: record.url,
            user_id: record.user_id,
        };

        let value = bincode::serialize(&document)?;
        self.documents.insert(id.to_be_bytes(), value)?;
        self.maybe_flush()?;

        tracing::debug!(
            "Stored document {} ('{}') for user {}",
            document.id,
            document.name,
            document.user_id
        );
        Ok(document)
    }

    /// Retrieve a record by id
    pub fn get(&self, id: DocumentId) -> Result<Document> {
        match self.documents.get(id.to_be_bytes())? {
            Some(value) => Ok(bincode::deserialize(&value)?),
            None => Err(DocumentError::NotFound { id }),
        }
    }

    /// Check if a record exists by id
    pub fn exists_by_id(&self, id: DocumentId) -> Result<bool> {
        Ok(self.documents.contains_key(id.to_be_bytes())?)
    }

    /// Check if a record with the given name exists for a specific user.
    /// Exact, case-sensitive match on both fields.
    pub fn exists_by_name_and_user(&self, name: &str, user_id: UserId) -> Result<bool> {
        Ok(self
            .name_index
            .contains_key(name_index_key(user_id, name))?)
    }

    /// Permanently remove a record by id.
    ///
    /// The record is removed before its name-index entry: a crash between
    /// the two steps leaves the name blocked rather than ever letting a
    /// duplicate in.
    pub fn delete(&self, id: DocumentId) -> Result<()> {
        let document = self.get(id)?;

        self.documents.remove(id.to_be_bytes())?;
        self.name_index
            .remove(name_index_key(document.user_id, &document.name))?;
        self.maybe_flush()?;

        tracing::debug!("Deleted document {} ('{}')", id, document.name);
        Ok(())
    }

    /// Remove every record a user owns; returns the number removed.
    /// A user owning zero records is a no-op, not an error.
    pub fn delete_all_for_user(&self, user_id: UserId) -> Result<usize> {
        let mut removed = 0;
        for entry in self.name_index.scan_prefix(user_id.to_be_bytes()) {
            let (index_key, id_bytes) = entry?;
            let id = decode_id(&id_bytes)?;
            self.documents.remove(id.to_be_bytes())?;
            self.name_index.remove(index_key)?;
            removed += 1;
        }
        self.maybe_flush()?;

        if removed > 0 {
            tracing::info!("Deleted {} documents for user {}", removed, user_id);
        }
        Ok(removed)
    }

    /// Collect all records matching the predicate, in storage order
    pub fn filter<F>(&self, predicate: F) -> Result<Vec<Document>>
    where
        F: Fn(&Document) -> bool,
    {
        let mut matches = Vec::new();
        for entry in self.documents.iter() {
            let (_, value) = entry?;
            let document: Document = bincode::deserialize(&value)?;
            if predicate(&document) {
                matches.push(document);
            }
        }
        Ok(matches)
    }

    /// Count records matching the predicate
    pub fn count<F>(&self, predicate: F) -> Result<u64>
    where
        F: Fn(&Document) -> bool,
    {
        let mut count = 0;
        for entry in self.documents.iter() {
            let (_, value) = entry?;
            let document: Document = bincode::deserialize(&value)?;
            if predicate(&document) {
                count += 1;
            }
        }
        Ok(count)
    }

    /// Total number of live records
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// True when the store holds no records
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Flush pending writes to disk
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    /// Health check: exercise a write, read, and remove on the meta tree
    pub fn health_check(&self) -> Result<()> {
        let test_key = b"health_check";
        let test_value = b"ok";

        self.meta.insert(test_key, test_value)?;

        let result = self.meta.get(test_key)?;
        if result.is_none() {
            return Err(DocumentError::StorageFailure {
                reason: "Health check value not found after write".to_string(),
            });
        }

        self.meta.remove(test_key)?;
        Ok(())
    }

    fn maybe_flush(&self) -> Result<()> {
        if self.flush_on_write {
            self.db.flush()?;
        }
        Ok(())
    }
}

/// Build the name-index key: fixed-width user id followed by the name bytes.
/// The fixed prefix makes per-user scans a prefix scan.
fn name_index_key(user_id: UserId, name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + name.len());
    key.extend_from_slice(&user_id.to_be_bytes());
    key.extend_from_slice(name.as_bytes());
    key
}

fn decode_id(bytes: &[u8]) -> Result<DocumentId> {
    let array: [u8; 8] = bytes
        .try_into()
        .map_err(|_| DocumentError::StorageFailure {
            reason: "Corrupt id entry in name index".to_string(),
        })?;
    Ok(u64::from_be_bytes(array))
}
