//! Two-stage recommendation: over-fetch by similarity, re-rank by exact ingredients.

use super::ranker::rank;
use super::source::CandidateSource;
use super::{IngredientQuery, Recommendation};
use crate::config::{DuplicatePolicy, RecommendSettings};
use crate::error::{RagError, Result};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Placeholder in the query template replaced by the joined ingredient list.
const INGREDIENTS_VAR: &str = "{{ingredients}}";

/// Immutable pipeline parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub overfetch_size: usize,
    pub top_n: usize,
    pub retrieval_timeout: Duration,
    pub fallback_ids: Vec<i64>,
    pub duplicate_policy: DuplicatePolicy,
    pub query_template: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_settings(&RecommendSettings::default())
    }
}

impl PipelineConfig {
    pub fn from_settings(settings: &RecommendSettings) -> Self {
        Self {
            overfetch_size: settings.overfetch_size,
            top_n: settings.top_n,
            retrieval_timeout: Duration::from_secs(settings.retrieval_timeout_seconds),
            fallback_ids: settings.fallback_ids.clone(),
            duplicate_policy: settings.duplicate_policy,
            query_template: settings.query_template.clone(),
        }
    }

    /// Reject inconsistent sizes and a zero timeout.
    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            return Err(RagError::Config("recommend.top_n must be at least 1".to_string()));
        }
        if self.overfetch_size < self.top_n {
            return Err(RagError::Config(format!(
                "recommend.overfetch_size ({}) must be >= recommend.top_n ({})",
                self.overfetch_size, self.top_n
            )));
        }
        if self.retrieval_timeout.is_zero() {
            return Err(RagError::Config(
                "recommend.retrieval_timeout_seconds must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Render the free-text search query for `query`.
    pub fn render_query(&self, query: &IngredientQuery) -> String {
        let joined = query.joined();
        if self.query_template.contains(INGREDIENTS_VAR) {
            self.query_template.replace(INGREDIENTS_VAR, &joined)
        } else {
            joined
        }
    }
}

/// Stateless recommendation pipeline. Safe to share across requests.
pub struct RecommendationPipeline {
    source: Arc<dyn CandidateSource>,
    config: PipelineConfig,
}

impl RecommendationPipeline {
    /// Create a pipeline, rejecting inconsistent sizes.
    pub fn new(source: Arc<dyn CandidateSource>, config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { source, config })
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Recommend recipe ids for `query`.
    ///
    /// An empty query returns the configured fallback, capped and deduplicated like a
    /// ranked result, without touching the source.
    /// Source failures and timeouts are returned as errors, never as empty results.
    #[instrument(skip(self, query), fields(ingredients = query.len()))]
    pub async fn recommend(&self, query: &IngredientQuery) -> Result<Recommendation> {
        if query.is_empty() {
            debug!("Empty ingredient list, returning fallback");
            let ids = self.finalize(self.config.fallback_ids.iter().copied());
            return Ok(Recommendation::Fallback(ids));
        }

        let query_text = self.config.render_query(query);
        info!("Recommendation query: {}", query_text);

        let pool = tokio::time::timeout(
            self.config.retrieval_timeout,
            self.source.search(&query_text, self.config.overfetch_size),
        )
        .await
        .map_err(|_| RagError::Timeout(self.config.retrieval_timeout))?
        .map_err(|e| match e {
            RagError::Retrieval(_) | RagError::Timeout(_) => e,
            other => RagError::Retrieval(other.to_string()),
        })?;

        debug!("Candidate pool size: {}", pool.len());

        let ranked = rank(query, pool, self.config.duplicate_policy);

        let ids = self.finalize(ranked.into_iter().map(|scored| scored.candidate.id));

        info!("Recommended recipe ids: {:?}", ids);
        Ok(Recommendation::Ranked(ids))
    }

    /// First `top_n` entries, then order-preserving dedup.
    fn finalize(&self, ids: impl Iterator<Item = i64>) -> Vec<i64> {
        let mut seen = HashSet::new();
        ids.take(self.config.top_n).filter(|id| seen.insert(*id)).collect()
    }
}
