//! Exact ingredient matching.
//!
//! Matching is whole-entry equality after trimming. Substring containment would let
//! "파" (green onion) match "양파" (onion), so it is never used.

/// Whether `query_ingredient` appears verbatim in `candidate_ingredients`.
pub fn matches(query_ingredient: &str, candidate_ingredients: &[String]) -> bool {
    let needle = query_ingredient.trim();
    if needle.is_empty() {
        return false;
    }
    candidate_ingredients
        .iter()
        .any(|ingredient| ingredient.trim() == needle)
}

/// Split a stored comma-separated ingredient field into trimmed, non-empty entries.
pub fn parse_ingredient_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
