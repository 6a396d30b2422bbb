//! Configuration module for eateum-rag.
//!
//! Handles loading and saving application settings.

mod settings;

pub use settings::{
    DuplicatePolicy, EmbeddingSettings, GeneralSettings, IngestSettings, RecommendSettings,
    ServerSettings, Settings, VectorStoreProvider, VectorStoreSettings,
};
