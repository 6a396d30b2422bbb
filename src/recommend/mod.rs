//! Ingredient-based recipe recommendation.
//!
//! Two stages: a vector similarity search over-fetches a candidate pool, then the
//! pool is re-ranked by how many of the user's ingredients each recipe contains
//! verbatim. The ranker and matcher are pure; the pipeline owns the I/O boundary.

pub mod matcher;
pub mod pipeline;
pub mod ranker;
pub mod source;

pub use matcher::{matches, parse_ingredient_list};
pub use pipeline::{PipelineConfig, RecommendationPipeline};
pub use ranker::rank;
pub use source::{CandidateSource, VectorCandidateSource};

use serde::{Deserialize, Serialize};

/// Ordered ingredient names supplied by the user.
///
/// Entries are trimmed and blank entries dropped on construction; duplicates are kept
/// so the ranker's duplicate policy can decide how they count.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientQuery(Vec<String>);

impl IngredientQuery {
    pub fn new<I, S>(ingredients: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(
            ingredients
                .into_iter()
                .map(|s| s.as_ref().trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Ingredients joined for embedding, in the order the user gave them.
    pub fn joined(&self) -> String {
        self.0.join(", ")
    }
}

/// One recipe returned by the similarity search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub id: i64,
    pub title: String,
    pub ingredients: Vec<String>,
}

impl CandidateRecord {
    pub fn new(id: i64, title: impl Into<String>, ingredients: Vec<String>) -> Self {
        Self {
            id,
            title: title.into(),
            ingredients,
        }
    }

    /// Build a record from a stored comma-separated ingredient field.
    pub fn from_raw(id: i64, title: impl Into<String>, raw_ingredients: &str) -> Self {
        Self::new(id, title, parse_ingredient_list(raw_ingredients))
    }
}

/// A candidate with its exact-ingredient match count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoredCandidate {
    pub candidate: CandidateRecord,
    pub match_count: usize,
}

/// Outcome of a recommendation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recommendation {
    /// Retrieval ran and the pool was re-ranked.
    Ranked(Vec<i64>),
    /// The query carried no ingredients; the configured fallback was returned.
    Fallback(Vec<i64>),
}

impl Recommendation {
    /// Recipe ids in ranked order, without duplicates.
    pub fn ids(&self) -> &[i64] {
        match self {
            Recommendation::Ranked(ids) | Recommendation::Fallback(ids) => ids,
        }
    }

    pub fn into_ids(self) -> Vec<i64> {
        match self {
            Recommendation::Ranked(ids) | Recommendation::Fallback(ids) => ids,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Recommendation::Fallback(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_trims_and_drops_blanks() {
        let query = IngredientQuery::new([" 김치 ", "", "  ", "돼지고기"]);
        assert_eq!(query.len(), 2);
        assert_eq!(query.joined(), "김치, 돼지고기");
    }

    #[test]
    fn test_query_keeps_duplicates() {
        let query = IngredientQuery::new(["파", "파"]);
        assert_eq!(query.len(), 2);
    }

    #[test]
    fn test_candidate_from_raw() {
        let record = CandidateRecord::from_raw(4, "김치찌개", "김치, 돼지고기,, 두부 ");
        assert_eq!(record.ingredients, vec!["김치", "돼지고기", "두부"]);
    }

    #[test]
    fn test_recommendation_ids() {
        let ranked = Recommendation::Ranked(vec![2, 1]);
        assert_eq!(ranked.ids(), &[2, 1]);
        assert!(!ranked.is_fallback());

        let fallback = Recommendation::Fallback(vec![10]);
        assert!(fallback.is_fallback());
        assert_eq!(fallback.into_ids(), vec![10]);
    }
}
