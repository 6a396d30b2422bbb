//! Recipe index building.
//!
//! Reads the cleaned recipe CSV, turns each row into an embeddable document, and
//! writes the documents to a vector store. The recommendation pipeline only reads
//! what this module writes.

mod csv_source;

pub use csv_source::{parse_steps, read_recipes, RecipeRow, RecipeStep, RowRejection};

use crate::config::IngestSettings;
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::vector_store::{RecipeDocument, VectorStore};
use futures::stream::{self, StreamExt, TryStreamExt};
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Summary of an ingest run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Data rows read from the file.
    pub rows_read: usize,
    /// Documents written to the store.
    pub indexed: usize,
    /// Rows rejected, with the reason for each.
    pub rejected: Vec<RowRejection>,
}

/// Builds the recipe vector index.
pub struct Ingestor {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    settings: IngestSettings,
    progress: Option<ProgressBar>,
}

impl Ingestor {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        store: Arc<dyn VectorStore>,
        settings: IngestSettings,
    ) -> Self {
        Self {
            embedder,
            store,
            settings,
            progress: None,
        }
    }

    /// Report embedding progress on `pb` (one tick per row).
    pub fn with_progress(mut self, pb: ProgressBar) -> Self {
        self.progress = Some(pb);
        self
    }

    /// Ingest a CSV file.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn ingest_path(&self, path: &Path, reset: bool) -> Result<IngestReport> {
        let file = std::fs::File::open(path)
            .map_err(|e| RagError::Ingest(format!("Cannot open {}: {}", path.display(), e)))?;
        self.ingest_reader(file, reset).await
    }

    /// Ingest CSV data from any reader.
    ///
    /// Every row is embedded before the store is touched, so a failed run leaves the
    /// existing index as it was. With `reset` the index is replaced as a whole.
    pub async fn ingest_reader<R: std::io::Read>(
        &self,
        reader: R,
        reset: bool,
    ) -> Result<IngestReport> {
        let parsed = read_recipes(reader, &self.settings.default_category)?;
        for rejection in &parsed.rejected {
            warn!("Skipping CSV line {}: {}", rejection.line, rejection.reason);
        }

        info!(
            "Loaded {} recipes ({} rows read, {} rejected)",
            parsed.rows.len(),
            parsed.rows_read,
            parsed.rejected.len()
        );

        if reset && parsed.rows.is_empty() {
            return Err(RagError::Ingest(
                "No valid rows; refusing to reset the index".to_string(),
            ));
        }

        let documents = self.embed_rows(&parsed.rows).await?;
        let indexed = if reset {
            self.store.replace_all(&documents).await?
        } else if documents.is_empty() {
            0
        } else {
            self.store.upsert_batch(&documents).await?
        };

        Ok(IngestReport {
            rows_read: parsed.rows_read,
            indexed,
            rejected: parsed.rejected,
        })
    }

    /// Embed rows in batches, keeping row order.
    async fn embed_rows(&self, rows: &[RecipeRow]) -> Result<Vec<RecipeDocument>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(pb) = &self.progress {
            pb.set_length(rows.len() as u64);
        }

        let include_steps = self.settings.include_steps;
        let batch_size = self.settings.batch_size.max(1);
        let concurrency = self.settings.max_concurrent_batches.max(1);

        // `buffered` keeps batch order, so documents line up with their rows
        let batches: Vec<Vec<RecipeDocument>> = stream::iter(rows.chunks(batch_size))
            .map(|chunk| async move {
                let texts: Vec<String> =
                    chunk.iter().map(|row| row.document_text(include_steps)).collect();
                let embeddings = self.embedder.embed_batch(&texts).await?;
                if embeddings.len() != chunk.len() {
                    return Err(RagError::Embedding(format!(
                        "Expected {} embeddings, got {}",
                        chunk.len(),
                        embeddings.len()
                    )));
                }

                if let Some(pb) = &self.progress {
                    pb.inc(chunk.len() as u64);
                }

                let docs: Vec<RecipeDocument> = chunk
                    .iter()
                    .zip(texts)
                    .zip(embeddings)
                    .map(|((row, content), embedding)| row.to_document(content, embedding))
                    .collect();
                Ok::<_, RagError>(docs)
            })
            .buffered(concurrency)
            .try_collect()
            .await?;

        Ok(batches.into_iter().flatten().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector_store::MemoryVectorStore;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Records batch sizes and returns one-dimensional embeddings.
    struct CountingEmbedder {
        batches: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for CountingEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Ok(vec![1.0])
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.batches.fetch_add(1, Ordering::SeqCst);
            Ok(texts.iter().map(|t| vec![t.chars().count() as f32]).collect())
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    /// Fails every request, like an embedding API outage.
    struct DownEmbedder;

    #[async_trait]
    impl Embedder for DownEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
            Err(RagError::OpenAI("503 Service Unavailable".to_string()))
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            Err(RagError::OpenAI("503 Service Unavailable".to_string()))
        }

        fn dimensions(&self) -> usize {
            1
        }
    }

    fn seeded(id: i64) -> RecipeDocument {
        RecipeDocument::new(id, "old".into(), None, None, None, "old".into(), vec![1.0])
    }

    const CSV: &str = "\
recipe_video_id,video_title,category_name,item_name,video_url
1,김치찌개,한식,\"김치, 돼지고기, 두부\",https://youtube.com/watch?v=a
2,계란말이,,\"계란, 파\",
abc,잘못된 행,한식,김치,
3,스팸마요덮밥,일식,\"스팸, 계란, 밥\",https://youtube.com/watch?v=c
";

    fn settings(batch_size: usize) -> IngestSettings {
        IngestSettings {
            batch_size,
            ..IngestSettings::default()
        }
    }

    #[tokio::test]
    async fn test_ingest_reader_indexes_valid_rows() {
        let embedder = Arc::new(CountingEmbedder { batches: AtomicUsize::new(0) });
        let store = Arc::new(MemoryVectorStore::new());
        let ingestor = Ingestor::new(embedder.clone(), store.clone(), settings(2));

        let report = ingestor.ingest_reader(CSV.as_bytes(), false).await.unwrap();

        assert_eq!(report.rows_read, 4);
        assert_eq!(report.indexed, 3);
        assert_eq!(report.rejected.len(), 1);
        assert_eq!(embedder.batches.load(Ordering::SeqCst), 2);

        let doc = store.get_by_recipe_id(2).await.unwrap().unwrap();
        assert_eq!(doc.category.as_deref(), Some("기타"));
        assert_eq!(doc.ingredients.as_deref(), Some("계란, 파"));
        assert_eq!(doc.content, "분류: 기타 / 요리명: 계란말이 / 재료: 계란, 파");
        assert_eq!(doc.embedding, vec![doc.content.chars().count() as f32]);
    }

    #[tokio::test]
    async fn test_reset_clears_previous_index() {
        let embedder = Arc::new(CountingEmbedder { batches: AtomicUsize::new(0) });
        let store = Arc::new(MemoryVectorStore::new());
        store.upsert_batch(&[seeded(99)]).await.unwrap();

        let ingestor = Ingestor::new(embedder, store.clone(), settings(100));
        ingestor.ingest_reader(CSV.as_bytes(), true).await.unwrap();

        assert!(store.get_by_recipe_id(99).await.unwrap().is_none());
        assert_eq!(store.document_count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_failed_embedding_keeps_existing_index() {
        let store = Arc::new(MemoryVectorStore::new());
        store.upsert_batch(&[seeded(1), seeded(2), seeded(3)]).await.unwrap();

        let ingestor = Ingestor::new(Arc::new(DownEmbedder), store.clone(), settings(2));
        let result = ingestor.ingest_reader(CSV.as_bytes(), true).await;

        assert!(matches!(result, Err(RagError::OpenAI(_))));
        assert_eq!(store.document_count().await.unwrap(), 3);
        assert_eq!(store.get_by_recipe_id(1).await.unwrap().unwrap().title, "old");
    }

    #[tokio::test]
    async fn test_reset_with_no_valid_rows_is_refused() {
        let embedder = Arc::new(CountingEmbedder { batches: AtomicUsize::new(0) });
        let store = Arc::new(MemoryVectorStore::new());
        store.upsert_batch(&[seeded(1)]).await.unwrap();

        let ingestor = Ingestor::new(embedder, store.clone(), settings(10));
        let csv = "recipe_video_id,video_title,item_name\nabc,x,김치\n";
        let err = ingestor.ingest_reader(csv.as_bytes(), true).await.unwrap_err();

        assert!(matches!(err, RagError::Ingest(_)));
        assert_eq!(store.document_count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_ingest_path_missing_file() {
        let embedder = Arc::new(CountingEmbedder { batches: AtomicUsize::new(0) });
        let ingestor = Ingestor::new(embedder, Arc::new(MemoryVectorStore::new()), settings(10));

        let err = ingestor
            .ingest_path(Path::new("/nonexistent/recipes.csv"), false)
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::Ingest(_)));
    }

    #[tokio::test]
    async fn test_ingest_path_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("recipes.csv");
        std::fs::write(&path, CSV).unwrap();

        let embedder = Arc::new(CountingEmbedder { batches: AtomicUsize::new(0) });
        let store = Arc::new(MemoryVectorStore::new());
        let ingestor = Ingestor::new(embedder, store.clone(), settings(10));

        let report = ingestor.ingest_path(&path, false).await.unwrap();
        assert_eq!(report.indexed, 3);
    }
}
