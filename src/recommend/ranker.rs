//! Candidate re-ranking by exact ingredient overlap.

use super::matcher::matches;
use super::{CandidateRecord, IngredientQuery, ScoredCandidate};
use crate::config::DuplicatePolicy;
use std::collections::HashSet;

/// Score every candidate and order by match count, highest first.
///
/// The sort is stable: candidates with equal counts keep their retrieval order,
/// which is the similarity rank. No candidate is dropped.
pub fn rank(
    query: &IngredientQuery,
    candidates: Vec<CandidateRecord>,
    policy: DuplicatePolicy,
) -> Vec<ScoredCandidate> {
    let terms = counted_terms(query, policy);

    let mut scored: Vec<ScoredCandidate> = candidates
        .into_iter()
        .map(|candidate| {
            let match_count = terms
                .iter()
                .filter(|term| matches(term, &candidate.ingredients))
                .count();
            ScoredCandidate {
                candidate,
                match_count,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.match_count.cmp(&a.match_count));
    scored
}

/// Query terms that contribute to a match count under `policy`.
fn counted_terms(query: &IngredientQuery, policy: DuplicatePolicy) -> Vec<&str> {
    match policy {
        DuplicatePolicy::CountEach => query.iter().collect(),
        DuplicatePolicy::Distinct => {
            let mut seen = HashSet::new();
            query.iter().filter(|term| seen.insert(*term)).collect()
        }
    }
}
