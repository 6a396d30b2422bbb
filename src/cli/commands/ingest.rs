//! Ingest command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::ingest::Ingestor;
use crate::vector_store::open_store;
use anyhow::Result;
use std::path::Path;
use std::sync::Arc;

/// Run the ingest command.
pub async fn run_ingest(
    csv: &Path,
    reset: bool,
    with_steps: bool,
    settings: Settings,
) -> Result<()> {
    if !csv.exists() {
        Output::error(&format!("File not found: {}", csv.display()));
        anyhow::bail!("File not found: {}", csv.display());
    }

    let store = open_store(&settings)?;
    let embedder = OpenAIEmbedder::from_settings(&settings.embedding)?;

    let mut ingest_settings = settings.ingest.clone();
    ingest_settings.include_steps |= with_steps;

    Output::info(&format!("Indexing recipes from {}", csv.display()));
    Output::kv("Embedding model", embedder.model());
    Output::kv("Dimensions", &embedder.dimensions().to_string());
    if reset {
        Output::warning("Existing index will be cleared.");
    }

    let pb = Output::progress_bar(0, "Embedding recipes");
    let ingestor = Ingestor::new(Arc::new(embedder), store.clone(), ingest_settings)
        .with_progress(pb.clone());
    let result = ingestor.ingest_path(csv, reset).await;
    pb.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(e) => {
            Output::error(&format!("Ingest failed: {}", e));
            return Err(e.into());
        }
    };

    Output::success(&format!(
        "Indexed {} of {} rows ({} recipes in index)",
        report.indexed,
        report.rows_read,
        store.document_count().await?
    ));

    if !report.rejected.is_empty() {
        Output::warning(&format!("{} rows skipped:", report.rejected.len()));
        for rejection in report.rejected.iter().take(20) {
            Output::list_item(&format!("line {}: {}", rejection.line, rejection.reason));
        }
        if report.rejected.len() > 20 {
            Output::list_item(&format!("... and {} more", report.rejected.len() - 20));
        }
    }

    Ok(())
}
