//! Maps school canvases onto a keyed store.

use super::{Storage, StorageError, StorageResult};
use crate::access::SchoolId;
use crate::document::StrokeDocument;
use crate::stroke::Timestamp;
use std::sync::Arc;

/// Storage key for a school's canvas.
pub fn school_key(school: SchoolId) -> String {
    format!("school-{}", school)
}

/// Result of loading a school canvas.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Found(StrokeDocument),
    /// Nothing has been saved for this school yet.
    Missing,
    /// Something was stored but it could not be read.
    Malformed { reason: String },
}

impl LoadOutcome {
    /// The document to show: empty unless one was found.
    pub fn into_document(self) -> StrokeDocument {
        match self {
            LoadOutcome::Found(doc) => doc,
            LoadOutcome::Missing | LoadOutcome::Malformed { .. } => StrokeDocument::default(),
        }
    }
}

/// Loads and saves whole stroke documents, one per school.
///
/// Saves are full overwrites with no version check: the last writer wins.
pub struct PersistenceAdapter<S: Storage> {
    storage: Arc<S>,
}

impl<S: Storage> Clone for PersistenceAdapter<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
        }
    }
}

impl<S: Storage> PersistenceAdapter<S> {
    pub fn new(storage: Arc<S>) -> Self {
        Self { storage }
    }

    /// Load a school's canvas. Only transport failures are errors; a missing
    /// or unreadable document is reported through [`LoadOutcome`].
    pub async fn load(&self, school: SchoolId) -> StorageResult<LoadOutcome> {
        let key = school_key(school);
        let json = match self.storage.load(&key).await {
            Ok(json) => json,
            Err(StorageError::NotFound(_)) => {
                log::debug!("No saved canvas for school {}", school);
                return Ok(LoadOutcome::Missing);
            }
            Err(e) => return Err(e),
        };

        match StrokeDocument::from_json(&json) {
            Ok(doc) => {
                log::info!("Loaded {} stroke(s) for school {}", doc.strokes.len(), school);
                Ok(LoadOutcome::Found(doc))
            }
            Err(e) => {
                log::warn!("Canvas for school {} is malformed: {}", school, e);
                Ok(LoadOutcome::Malformed { reason: e.to_string() })
            }
        }
    }

    /// Overwrite a school's canvas, stamping `updated_at` with `now`.
    pub async fn save(
        &self,
        school: SchoolId,
        document: &StrokeDocument,
        now: Timestamp,
    ) -> StorageResult<()> {
        let mut document = document.clone();
        document.updated_at = Some(now);

        let json = document
            .to_json()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.storage.save(&school_key(school), &json).await?;

        log::info!("Saved {} stroke(s) for school {}", document.strokes.len(), school);
        Ok(())
    }

    /// Get a reference to the storage backend.
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }
}
