//! CLI command implementations.

mod config;
mod doctor;
mod ingest;
mod recommend;
mod search;
mod serve;

pub use config::run_config;
pub use doctor::run_doctor;
pub use ingest::run_ingest;
pub use recommend::run_recommend;
pub use search::run_search;
pub use serve::{router, run_serve, AppState};

use crate::config::Settings;
use crate::embedding::OpenAIEmbedder;
use crate::error::Result;
use crate::recommend::{PipelineConfig, RecommendationPipeline, VectorCandidateSource};
use crate::vector_store::VectorStore;
use std::sync::Arc;

/// Wire the OpenAI embedder and `store` into a recommendation pipeline.
fn build_pipeline(
    settings: &Settings,
    store: Arc<dyn VectorStore>,
) -> Result<RecommendationPipeline> {
    let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
    let source = VectorCandidateSource::new(embedder, store)
        .with_min_score(settings.recommend.min_score);
    let config = PipelineConfig::from_settings(&settings.recommend);
    RecommendationPipeline::new(Arc::new(source), config)
}
