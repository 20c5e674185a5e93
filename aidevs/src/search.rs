use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use tracing::info;

use crate::embed::Embedder;
use crate::error::{Error, Result};
use crate::metadata::DocumentPayload;
use crate::store_qdrant::VectorStore;

#[derive(Clone, Debug, PartialEq)]
pub struct BestMatch {
    pub id: u64,
    pub score: f32,
    pub payload: DocumentPayload,
}

impl BestMatch {
    pub fn date(&self) -> Option<NaiveDate> {
        self.payload.date
    }
}

/// Top-1 lookup over an indexed collection. There is no relevance
/// threshold: any non-empty collection yields a match, however unrelated.
pub struct SimilaritySearch<'a> {
    embedder: &'a dyn Embedder,
    store: &'a dyn VectorStore,
}

impl<'a> SimilaritySearch<'a> {
    pub fn new(embedder: &'a dyn Embedder, store: &'a dyn VectorStore) -> Self {
        Self { embedder, store }
    }

    pub fn search(&self, query: &str, collection: &str) -> Result<Option<BestMatch>> {
        let vector = self.embedder.embed(query)?;
        let hits = self.store.query(collection, &vector, 1)?;
        let Some(best) = hits.into_iter().next() else {
            info!(collection, "no matching documents");
            return Ok(None);
        };
        let payload: DocumentPayload = serde_json::from_value(best.payload)
            .map_err(|e| Error::Parse(format!("point {} payload: {}", best.id, e)))?;
        info!(
            collection,
            score = best.score,
            file = %payload.filename,
            date = ?payload.date,
            "best match"
        );
        Ok(Some(BestMatch {
            id: best.id,
            score: best.score,
            payload,
        }))
    }

    /// Same as [`search`](Self::search) with the query read from a file.
    pub fn search_file(&self, path: &Path, collection: &str) -> Result<Option<BestMatch>> {
        let query = fs::read_to_string(path)?;
        self.search(query.trim(), collection)
    }
}
