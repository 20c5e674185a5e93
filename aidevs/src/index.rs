use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use crate::embed::{check_dimensions, Embedder};
use crate::error::{Error, Result};
use crate::metadata::{point_id, CorpusDocument, MetadataExtractor};
use crate::scan_files::scan_files;
use crate::store_qdrant::{Distance, Point, VectorStore};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IndexingSummary {
    pub processed: usize,
    pub failed: usize,
}

pub struct DocumentIndexer<'a> {
    embedder: &'a dyn Embedder,
    extractor: MetadataExtractor<'a>,
    store: &'a dyn VectorStore,
}

impl<'a> DocumentIndexer<'a> {
    pub fn new(
        embedder: &'a dyn Embedder,
        extractor: MetadataExtractor<'a>,
        store: &'a dyn VectorStore,
    ) -> Self {
        Self {
            embedder,
            extractor,
            store,
        }
    }

    /// Rebuilds `collection` from the `.txt` files directly inside `dir`.
    /// The collection is always dropped first; a failing document is logged
    /// and skipped without affecting the rest.
    pub fn index_folder(&self, dir: &Path, collection: &str) -> Result<IndexingSummary> {
        let files = scan_files(dir, "txt")?;
        info!(dir = %dir.display(), collection, files = files.len(), "indexing documents");

        self.store
            .recreate_collection(collection, self.embedder.dimensions(), Distance::Cosine)?;

        let mut summary = IndexingSummary::default();
        let total = files.len();
        for (idx, path) in files.iter().enumerate() {
            let name = file_name(path);
            info!(file = %name, "processing file {}/{}", idx + 1, total);
            match self.index_file(path, collection) {
                Ok(()) => {
                    summary.processed += 1;
                    info!(file = %name, "indexed");
                }
                Err(err) => {
                    summary.failed += 1;
                    warn!(file = %name, error = %err, "skipping document");
                }
            }
        }

        info!(
            collection,
            processed = summary.processed,
            failed = summary.failed,
            "indexing complete"
        );
        Ok(summary)
    }

    fn index_file(&self, path: &Path, collection: &str) -> Result<()> {
        let content = fs::read_to_string(path)?;
        let mut doc = CorpusDocument::new(file_name(path), content);

        let vector = self.embedder.embed(&doc.content)?;
        check_dimensions(&vector, self.embedder.dimensions())?;

        let analysis = self.extractor.analyze(&doc.content)?;
        doc.apply(analysis);

        let point = Point {
            id: point_id(&doc.filename),
            vector,
            payload: serde_json::to_value(doc.payload()).map_err(Error::from)?,
        };
        self.store.upsert(collection, &[point])
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}
