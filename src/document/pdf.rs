use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::info;
use lru::LruCache;
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::AppError;

/// Text extracted from a single PDF page.
#[derive(Debug, Clone, Serialize)]
pub struct PageText {
    pub page: usize,
    pub text: String,
    pub length: usize,
}

/// In-memory text snapshot of a PDF document. Page boundaries are kept as
/// `=== PAGE n ===` markers in `full_text`, matching what the prompt
/// assembler feeds to the model.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSnapshot {
    pub file_path: String,
    pub total_pages: usize,
    pub full_text: String,
    pub pages: Vec<PageText>,
    pub total_characters: usize,
}

impl DocumentSnapshot {
    pub fn extract(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Err(AppError::NotFound(format!(
                "PDF file not found: {}",
                path.display()
            )));
        }

        let page_texts = pdf_extract::extract_text_by_pages(path)
            .map_err(|e| AppError::Internal(format!("Failed to extract PDF content: {}", e)))?;

        let mut full_text = String::new();
        let mut pages = Vec::with_capacity(page_texts.len());

        for (idx, text) in page_texts.iter().enumerate() {
            let trimmed = text.trim();
            if !trimmed.is_empty() {
                full_text.push_str(&format!("\n=== PAGE {} ===\n{}\n", idx + 1, text));
            }
            pages.push(PageText {
                page: idx + 1,
                text: trimmed.to_string(),
                length: trimmed.len(),
            });
        }

        let total_characters = full_text.chars().count();
        info!(
            "Extracted {} pages ({} chars) from {}",
            pages.len(),
            total_characters,
            path.display()
        );

        Ok(Self {
            file_path: path.display().to_string(),
            total_pages: pages.len(),
            full_text,
            pages,
            total_characters,
        })
    }

    /// First `limit` characters of the extracted text, for response previews.
    pub fn preview(&self, limit: usize) -> String {
        if self.full_text.chars().count() <= limit {
            return self.full_text.clone();
        }
        let truncated: String = self.full_text.chars().take(limit).collect();
        format!("{}...", truncated)
    }
}

/// Process-lifetime cache of extracted snapshots, keyed by path. Extraction
/// only runs again when `refresh` is called for the same file.
pub struct SnapshotCache {
    inner: Mutex<LruCache<PathBuf, Arc<DocumentSnapshot>>>,
}

impl SnapshotCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity is at least one");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get_or_extract(&self, path: &Path) -> Result<Arc<DocumentSnapshot>, AppError> {
        if let Some(snapshot) = self.inner.lock().get(&path.to_path_buf()) {
            return Ok(snapshot.clone());
        }
        self.refresh(path)
    }

    /// Re-extracts the file and replaces any cached snapshot for it.
    pub fn refresh(&self, path: &Path) -> Result<Arc<DocumentSnapshot>, AppError> {
        let snapshot = Arc::new(DocumentSnapshot::extract(path)?);
        self.inner
            .lock()
            .put(path.to_path_buf(), snapshot.clone());
        Ok(snapshot)
    }

    pub fn peek(&self, path: &Path) -> Option<Arc<DocumentSnapshot>> {
        self.inner.lock().peek(&path.to_path_buf()).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with_text(text: &str) -> DocumentSnapshot {
        DocumentSnapshot {
            file_path: "report.pdf".to_string(),
            total_pages: 1,
            full_text: text.to_string(),
            pages: vec![PageText {
                page: 1,
                text: text.trim().to_string(),
                length: text.trim().len(),
            }],
            total_characters: text.chars().count(),
        }
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = DocumentSnapshot::extract(Path::new("no-such-report.pdf")).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[test]
    fn preview_truncates_long_text() {
        let snapshot = snapshot_with_text(&"a".repeat(600));
        let preview = snapshot.preview(500);
        assert_eq!(preview.chars().count(), 503);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn preview_keeps_short_text_intact() {
        let snapshot = snapshot_with_text("short report");
        assert_eq!(snapshot.preview(500), "short report");
    }

    #[test]
    fn cache_misses_surface_extraction_errors() {
        let cache = SnapshotCache::new(4);
        let err = cache
            .get_or_extract(Path::new("no-such-report.pdf"))
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(cache.peek(Path::new("no-such-report.pdf")).is_none());
    }
}
