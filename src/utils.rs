//! # Utilities Module
//!
//! ## Purpose
//! Common helpers used throughout the document metadata service for file
//! naming, type-label derivation, and lightweight performance measurement.
//!
//! ## Input/Output Specification
//! - **Input**: File names, operation labels
//! - **Output**: Sanitized names, type labels, timing logs
//! - **Functions**: File utilities, performance helpers

use std::time::Instant;

/// Performance timer for measuring operation duration
pub struct Timer {
    start: Instant,
    name: String,
}

impl Timer {
    /// Start a new timer with a name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Get elapsed time in milliseconds
    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    /// Stop timer and log duration
    pub fn stop(self) -> u64 {
        let elapsed = self.elapsed_ms();
        tracing::debug!("Timer '{}' completed in {}ms", self.name, elapsed);
        elapsed
    }
}

/// File naming utilities
pub struct FileUtils;

impl FileUtils {
    /// Derive the document type label from a file name: the uppercased
    /// suffix after the last `.`, or empty when there is none.
    pub fn type_label(file_name: &str) -> String {
        match file_name.rsplit_once('.') {
            Some((_, ext)) => ext.to_uppercase(),
            None => String::new(),
        }
    }

    /// Sanitize a file name for safe storage references
    pub fn sanitize_filename(filename: &str) -> String {
        filename
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }

    /// Build the stored-file reference: a fresh UUID prefix keeps
    /// same-named uploads from colliding in the blob store.
    pub fn stored_name(original: &str) -> String {
        format!("{}_{}", uuid::Uuid::new_v4(), Self::sanitize_filename(original))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_label() {
        assert_eq!(FileUtils::type_label("report.pdf"), "PDF");
        assert_eq!(FileUtils::type_label("archive.tar.gz"), "GZ");
        assert_eq!(FileUtils::type_label("README"), "");
        assert_eq!(FileUtils::type_label(".gitignore"), "GITIGNORE");
        assert_eq!(FileUtils::type_label("trailing."), "");
        assert_eq!(FileUtils::type_label("photo.JPG"), "JPG");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(FileUtils::sanitize_filename("my report.pdf"), "my_report.pdf");
        assert_eq!(
            FileUtils::sanitize_filename("../../etc/passwd"),
            ".._.._etc_passwd"
        );
        assert_eq!(FileUtils::sanitize_filename("clean-name_1.txt"), "clean-name_1.txt");
    }

    #[test]
    fn test_stored_name_is_unique_per_call() {
        let a = FileUtils::stored_name("report.pdf");
        let b = FileUtils::stored_name("report.pdf");
        assert_ne!(a, b);
        assert!(a.ends_with("_report.pdf"));
    }
}
