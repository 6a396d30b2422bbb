//! Search command implementation.

use crate::cli::Output;
use crate::config::Settings;
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::vector_store::open_store;
use anyhow::Result;

/// Run the search command: raw similarity search, no ingredient re-ranking.
pub async fn run_search(
    query: &str,
    limit: usize,
    min_score: f32,
    settings: Settings,
) -> Result<()> {
    let store = open_store(&settings)?;
    let embedder = OpenAIEmbedder::from_settings(&settings.embedding)?;

    let spinner = Output::spinner("Searching...");
    let results = match embedder.embed(query).await {
        Ok(embedding) => store.search_with_threshold(&embedding, limit, min_score).await,
        Err(e) => Err(e),
    };
    spinner.finish_and_clear();

    match results {
        Ok(results) => {
            if results.is_empty() {
                Output::warning("No results found matching your query.");
            } else {
                Output::success(&format!("Found {} results", results.len()));

                for result in &results {
                    Output::search_result(
                        result.document.recipe_id,
                        &result.document.title,
                        result.score,
                        &result.document.content,
                        result.document.video_url.as_deref(),
                    );
                }
            }
        }
        Err(e) => {
            Output::error(&format!("Search failed: {}", e));
            return Err(anyhow::anyhow!("{}", e));
        }
    }

    Ok(())
}
