//! SQLite-based vector store implementation.
//!
//! Cosine similarity is computed in Rust over every stored row, which is fine for
//! a catalog of a few thousand recipes.

use super::{rank_by_similarity, RecipeDocument, SearchResult, VectorStore};
use crate::error::{RagError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS recipes (
        recipe_id INTEGER PRIMARY KEY,
        id TEXT NOT NULL,
        title TEXT NOT NULL,
        category TEXT,
        video_url TEXT,
        ingredients TEXT,
        content TEXT NOT NULL,
        embedding BLOB NOT NULL,
        indexed_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_recipes_indexed_at ON recipes(indexed_at);
"#;

const SELECT_COLUMNS: &str =
    "SELECT id, recipe_id, title, category, video_url, ingredients, content, embedding, indexed_at FROM recipes";

const UPSERT: &str = r#"
    INSERT OR REPLACE INTO recipes
    (recipe_id, id, title, category, video_url, ingredients, content, embedding, indexed_at)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
"#;

/// SQLite-based vector store.
pub struct SqliteVectorStore {
    conn: Mutex<Connection>,
}

impl SqliteVectorStore {
    /// Open (or create) a SQLite vector store at `path`.
    #[instrument(skip_all)]
    pub fn new(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        // WAL lets readers proceed while an ingest is writing
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;

        info!("Initialized SQLite vector store at {:?}", path);

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite vector store (useful for testing).
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RagError::VectorStore(format!("Failed to acquire lock: {}", e)))
    }

    /// Serialize embedding to bytes.
    fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
        embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
    }

    /// Deserialize embedding from bytes.
    fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
        bytes
            .chunks_exact(4)
            .map(|chunk| {
                let arr: [u8; 4] = chunk.try_into().unwrap_or_default();
                f32::from_le_bytes(arr)
            })
            .collect()
    }

    fn parse_timestamp(raw: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<RecipeDocument> {
        let id_str: String = row.get(0)?;
        let embedding_bytes: Vec<u8> = row.get(7)?;
        let indexed_at_str: String = row.get(8)?;

        Ok(RecipeDocument {
            id: uuid::Uuid::parse_str(&id_str).unwrap_or_default(),
            recipe_id: row.get(1)?,
            title: row.get(2)?,
            category: row.get(3)?,
            video_url: row.get(4)?,
            ingredients: row.get(5)?,
            content: row.get(6)?,
            embedding: Self::bytes_to_embedding(&embedding_bytes),
            indexed_at: Self::parse_timestamp(&indexed_at_str),
        })
    }

    fn write_document(conn: &Connection, doc: &RecipeDocument) -> Result<()> {
        conn.execute(
            UPSERT,
            params![
                doc.recipe_id,
                doc.id.to_string(),
                doc.title,
                doc.category,
                doc.video_url,
                doc.ingredients,
                doc.content,
                Self::embedding_to_bytes(&doc.embedding),
                doc.indexed_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

#[async_trait]
impl VectorStore for SqliteVectorStore {
    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn upsert_batch(&self, docs: &[RecipeDocument]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        for doc in docs {
            Self::write_document(&tx, doc)?;
        }

        tx.commit()?;
        info!("Batch upserted {} documents", docs.len());
        Ok(docs.len())
    }

    #[instrument(skip(self, query_embedding))]
    async fn search_with_threshold(
        &self,
        query_embedding: &[f32],
        limit: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(&format!("{} ORDER BY recipe_id", SELECT_COLUMNS))?;
        let docs = stmt
            .query_map([], Self::row_to_document)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let results = rank_by_similarity(docs, query_embedding, limit, min_score);
        debug!("Found {} matching documents", results.len());
        Ok(results)
    }

    #[instrument(skip(self))]
    async fn get_by_recipe_id(&self, recipe_id: i64) -> Result<Option<RecipeDocument>> {
        let conn = self.lock()?;
        let result = conn.query_row(
            &format!("{} WHERE recipe_id = ?1", SELECT_COLUMNS),
            params![recipe_id],
            Self::row_to_document,
        );

        match result {
            Ok(doc) => Ok(Some(doc)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self, docs), fields(count = docs.len()))]
    async fn replace_all(&self, docs: &[RecipeDocument]) -> Result<usize> {
        let conn = self.lock()?;
        let tx = conn.unchecked_transaction()?;

        let removed = tx.execute("DELETE FROM recipes", [])?;
        for doc in docs {
            Self::write_document(&tx, doc)?;
        }

        // Readers see either the old index or the new one
        tx.commit()?;
        info!("Replaced {} documents with {}", removed, docs.len());
        Ok(docs.len())
    }

    async fn document_count(&self) -> Result<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM recipes", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(recipe_id: i64, ingredients: Option<&str>, embedding: Vec<f32>) -> RecipeDocument {
        RecipeDocument::new(
            recipe_id,
            format!("recipe {}", recipe_id),
            Some("한식".to_string()),
            Some(format!("https://youtube.com/watch?v={}", recipe_id)),
            ingredients.map(str::to_string),
            "분류: 한식".to_string(),
            embedding,
        )
    }

    #[tokio::test]
    async fn test_sqlite_vector_store() {
        let store = SqliteVectorStore::in_memory().unwrap();

        store
            .upsert_batch(&[doc(1, Some("김치, 두부"), vec![1.0, 0.0, 0.0])])
            .await
            .unwrap();

        let results = store.search_with_threshold(&[1.0, 0.0, 0.0], 10, 0.0).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 1.0).abs() < 0.001);
        assert_eq!(results[0].document.embedding, vec![1.0, 0.0, 0.0]);
        assert_eq!(results[0].document.category.as_deref(), Some("한식"));

        let written = store
            .replace_all(&[doc(2, Some("감자"), vec![0.0, 1.0, 0.0])])
            .await
            .unwrap();
        assert_eq!(written, 1);
        assert_eq!(store.document_count().await.unwrap(), 1);
        assert!(store.get_by_recipe_id(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_ingredients_roundtrip_as_none() {
        let store = SqliteVectorStore::in_memory().unwrap();
        store.upsert_batch(&[doc(9, None, vec![0.5, 0.5])]).await.unwrap();

        let stored = store.get_by_recipe_id(9).await.unwrap().unwrap();
        assert!(stored.ingredients.is_none());
        assert!(store.get_by_recipe_id(10).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_batch_upsert_replaces_by_recipe_id() {
        let store = SqliteVectorStore::in_memory().unwrap();
        let docs = vec![
            doc(1, Some("감자"), vec![1.0, 0.0]),
            doc(2, Some("양파"), vec![0.0, 1.0]),
            doc(1, Some("감자, 당근"), vec![1.0, 1.0]),
        ];

        store.upsert_batch(&docs).await.unwrap();
        assert_eq!(store.document_count().await.unwrap(), 2);

        let stored = store.get_by_recipe_id(1).await.unwrap().unwrap();
        assert_eq!(stored.ingredients.as_deref(), Some("감자, 당근"));
    }

    #[tokio::test]
    async fn test_file_backed_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("recipes.db");

        {
            let store = SqliteVectorStore::new(&path).unwrap();
            store.upsert_batch(&[doc(3, Some("계란"), vec![1.0])]).await.unwrap();
        }

        let reopened = SqliteVectorStore::new(&path).unwrap();
        assert_eq!(reopened.document_count().await.unwrap(), 1);
    }
}
