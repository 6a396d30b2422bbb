//! Recommend command implementation.

use super::build_pipeline;
use crate::cli::Output;
use crate::config::Settings;
use crate::recommend::IngredientQuery;
use crate::vector_store::open_store;
use anyhow::Result;

/// Run the recommend command.
pub async fn run_recommend(ingredients: &[String], settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;
    let pipeline = build_pipeline(&settings, store.clone())?;
    let query = IngredientQuery::new(ingredients.iter().cloned());

    let spinner = Output::spinner("Finding recipes...");
    let result = pipeline.recommend(&query).await;
    spinner.finish_and_clear();

    let recommendation = match result {
        Ok(r) => r,
        Err(e) => {
            Output::error(&format!("Recommendation failed: {}", e));
            return Err(e.into());
        }
    };

    if recommendation.is_fallback() {
        Output::warning("No ingredients given; showing fallback recipes.");
    }

    let ids = recommendation.ids();
    if ids.is_empty() {
        Output::warning("No recipes found.");
        return Ok(());
    }

    Output::success(&format!("Recommended {} recipes for {}", ids.len(), query.joined()));
    for (rank, id) in ids.iter().enumerate() {
        match store.get_by_recipe_id(*id).await? {
            Some(doc) => Output::recipe(rank + 1, *id, &doc.title, doc.ingredients.as_deref()),
            None => Output::recipe(rank + 1, *id, "(not indexed)", None),
        }
    }

    Ok(())
}
