use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum GalleryError {
    #[error("duplicate gallery label '{0}'")]
    DuplicateLabel(String),
    #[error("gallery entry '{0}' has no reference embeddings")]
    EmptyEntry(String),
    #[error("gallery entry '{label}' has a {actual}-dimensional embedding, expected {expected}")]
    DimensionMismatch {
        label: String,
        expected: usize,
        actual: usize,
    },
}

/// One known identity with one or more enrollment embeddings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub label: String,
    pub embeddings: Vec<Vec<f32>>,
}

impl GalleryEntry {
    pub fn new(label: impl Into<String>, embeddings: Vec<Vec<f32>>) -> Self {
        Self {
            label: label.into(),
            embeddings,
        }
    }
}

/// Validated, read-only set of reference identities.
///
/// Galleries are never edited in place: a roster change builds a new one,
/// which callers share as `Arc<Gallery>` and swap whole.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Gallery {
    entries: Vec<GalleryEntry>,
    dimension: Option<usize>,
}

impl Gallery {
    pub fn new(entries: Vec<GalleryEntry>) -> Result<Self, GalleryError> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut dimension: Option<usize> = None;

        for entry in &entries {
            if !seen.insert(entry.label.as_str()) {
                return Err(GalleryError::DuplicateLabel(entry.label.clone()));
            }
            if entry.embeddings.is_empty() {
                return Err(GalleryError::EmptyEntry(entry.label.clone()));
            }
            for embedding in &entry.embeddings {
                let expected = *dimension.get_or_insert(embedding.len());
                if embedding.len() != expected {
                    return Err(GalleryError::DimensionMismatch {
                        label: entry.label.clone(),
                        expected,
                        actual: embedding.len(),
                    });
                }
            }
        }

        Ok(Self { entries, dimension })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[GalleryEntry] {
        &self.entries
    }

    /// Embedding dimensionality shared by all entries; `None` when empty.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Labels in enumeration order.
    pub fn labels(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.label.as_str()).collect()
    }
}
