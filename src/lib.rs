//! eateum-rag - ingredient-based recipe recommendation
//!
//! Given the ingredients a user has on hand, returns recipe ids ordered by how
//! many of those ingredients each recipe uses.
//!
//! # Overview
//!
//! Recommendation runs in two stages:
//! - Over-fetch: the ingredient list is rendered into a search sentence, embedded,
//!   and the most similar recipes are pulled from a vector index.
//! - Re-rank: each candidate is scored by exact ingredient matches and the pool is
//!   stable-sorted, so similarity order breaks ties.
//!
//! # Architecture
//!
//! - `recommend` - matcher, ranker, candidate source and pipeline
//! - `embedding` - embedding generation
//! - `vector_store` - vector database abstraction
//! - `ingest` - recipe CSV to vector index
//! - `config` - configuration management
//! - `cli` - command line and HTTP server
//!
//! # Example
//!
//! ```rust,no_run
//! use eateum_rag::config::Settings;
//! use eateum_rag::embedding::OpenAIEmbedder;
//! use eateum_rag::recommend::{
//!     IngredientQuery, PipelineConfig, RecommendationPipeline, VectorCandidateSource,
//! };
//! use eateum_rag::vector_store::open_store;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let embedder = Arc::new(OpenAIEmbedder::from_settings(&settings.embedding)?);
//!     let source = VectorCandidateSource::new(embedder, open_store(&settings)?);
//!     let pipeline = RecommendationPipeline::new(
//!         Arc::new(source),
//!         PipelineConfig::from_settings(&settings.recommend),
//!     )?;
//!
//!     let query = IngredientQuery::new(["김치", "돼지고기"]);
//!     let recommendation = pipeline.recommend(&query).await?;
//!     println!("{:?}", recommendation.ids());
//!
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod embedding;
pub mod error;
pub mod ingest;
pub mod openai;
pub mod recommend;
pub mod vector_store;

pub use error::{RagError, Result};
