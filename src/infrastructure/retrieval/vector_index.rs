//! Flat vector index persisted as a JSON artifact
//!
//! Brute-force cosine search over every entry; sized for a few thousand
//! chunks, not for ANN-scale corpora.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::domain::embedding::cosine_similarity;
use crate::domain::DomainError;

/// One embedded chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub source: BTreeMap<String, String>,
    pub embedding: Vec<f32>,
}

/// A scored hit borrowed from the index
#[derive(Debug, Clone, Copy)]
pub struct ScoredEntry<'a> {
    pub entry: &'a IndexEntry,
    pub score: f32,
}

/// Embedded corpus plus the model that produced the vectors
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorIndex {
    embedding_model: String,
    created_at: DateTime<Utc>,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    pub fn new(embedding_model: impl Into<String>) -> Self {
        Self {
            embedding_model: embedding_model.into(),
            created_at: Utc::now(),
            entries: Vec::new(),
        }
    }

    pub fn embedding_model(&self) -> &str {
        &self.embedding_model
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Vector width shared by all entries, if any exist
    pub fn dimensions(&self) -> Option<usize> {
        self.entries.first().map(|e| e.embedding.len())
    }

    /// Add an entry; all embeddings must share one width
    pub fn insert(&mut self, entry: IndexEntry) -> Result<(), DomainError> {
        if entry.embedding.is_empty() {
            return Err(DomainError::validation(format!(
                "Entry '{}' has an empty embedding",
                entry.id
            )));
        }

        if let Some(dims) = self.dimensions() {
            if dims != entry.embedding.len() {
                return Err(DomainError::validation(format!(
                    "Entry '{}' has {} dimensions, index uses {}",
                    entry.id,
                    entry.embedding.len(),
                    dims
                )));
            }
        }

        self.entries.push(entry);
        Ok(())
    }

    /// Top `k` entries by cosine similarity, best first. Entries scoring
    /// below `threshold` are skipped. Ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize, threshold: Option<f32>) -> Vec<ScoredEntry<'_>> {
        let mut scored: Vec<ScoredEntry<'_>> = self
            .entries
            .iter()
            .map(|entry| ScoredEntry {
                entry,
                score: cosine_similarity(query, &entry.embedding),
            })
            .filter(|hit| threshold.is_none_or(|min| hit.score >= min))
            .collect();

        scored.sort_by(|a, b| b.score.total_cmp(&a.score));
        scored.truncate(k);
        scored
    }

    /// Read an index written by [`VectorIndex::save`]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();

        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DomainError::not_found(format!(
                    "Vector index not found at {}; run `crag index` first",
                    path.display()
                )));
            }
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to read vector index {}: {}",
                    path.display(),
                    e
                )));
            }
        };

        let index: Self = serde_json::from_str(&raw).map_err(|e| {
            DomainError::storage(format!(
                "Corrupt vector index {}: {}",
                path.display(),
                e
            ))
        })?;

        info!(
            path = %path.display(),
            entries = index.len(),
            model = %index.embedding_model,
            "Loaded vector index"
        );

        Ok(index)
    }

    /// Write the index, replacing any previous artifact atomically
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), DomainError> {
        let path = path.as_ref();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DomainError::storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string(self)
            .map_err(|e| DomainError::internal(format!("Failed to serialize index: {}", e)))?;

        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await.map_err(|e| {
            DomainError::storage(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, path).await.map_err(|e| {
            DomainError::storage(format!("Failed to replace {}: {}", path.display(), e))
        })?;

        info!(path = %path.display(), entries = self.len(), "Saved vector index");

        Ok(())
    }
}
