//! Filtering generated names against names already taken by saved projects.
//!
//! The check is global (every user's projects) and best-effort: nothing
//! stops another request from saving a project with a returned name between
//! this check and the caller's own save.

use std::collections::HashSet;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::PgPool;

use buildify_db::queries::projects;

/// Source of business names that are already in use.
#[async_trait]
pub trait NameLookup: Send + Sync {
    /// Return the members of `candidates` that are already taken.
    async fn existing_names(&self, candidates: &[String]) -> Result<HashSet<String>>;
}

#[async_trait]
impl NameLookup for PgPool {
    async fn existing_names(&self, candidates: &[String]) -> Result<HashSet<String>> {
        let taken = projects::find_existing_business_names(self, candidates).await?;
        Ok(taken.into_iter().collect())
    }
}

#[async_trait]
impl NameLookup for HashSet<String> {
    async fn existing_names(&self, candidates: &[String]) -> Result<HashSet<String>> {
        Ok(candidates
            .iter()
            .filter(|c| self.contains(*c))
            .cloned()
            .collect())
    }
}

/// Candidates not present in `existing`, in their original order.
pub fn filter_available(candidates: &[String], existing: &HashSet<String>) -> Vec<String> {
    candidates
        .iter()
        .filter(|c| !existing.contains(*c))
        .cloned()
        .collect()
}

/// Filter `candidates` through `lookup`.
///
/// When every candidate is taken, the first `fallback_count` unfiltered
/// candidates are returned instead, so a non-empty candidate list never
/// turns into an empty answer.
pub async fn available_names(
    lookup: &dyn NameLookup,
    candidates: Vec<String>,
    fallback_count: usize,
) -> Result<Vec<String>> {
    if candidates.is_empty() {
        return Ok(candidates);
    }

    let existing = lookup.existing_names(&candidates).await?;
    let available = filter_available(&candidates, &existing);
    if !available.is_empty() {
        tracing::debug!(
            candidates = candidates.len(),
            taken = existing.len(),
            "filtered taken names"
        );
        return Ok(available);
    }

    tracing::info!(
        candidates = candidates.len(),
        "all generated names are taken; returning unfiltered candidates"
    );
    Ok(candidates.into_iter().take(fallback_count).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn taken(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn filter_preserves_order() {
        let candidates = strings(&["Zylo", "Plura", "Vexel", "Qubix"]);
        let result = filter_available(&candidates, &taken(&["Plura", "Qubix"]));
        assert_eq!(result, vec!["Zylo", "Vexel"]);
    }

    #[tokio::test]
    async fn removes_existing_names() {
        let lookup = taken(&["Plura"]);
        let result = available_names(&lookup, strings(&["Zylo", "Plura"]), 5)
            .await
            .unwrap();
        assert_eq!(result, vec!["Zylo"]);
    }

    #[tokio::test]
    async fn all_taken_returns_unfiltered_candidates() {
        let lookup = taken(&["Zylo", "Plura"]);
        let result = available_names(&lookup, strings(&["Zylo", "Plura"]), 5)
            .await
            .unwrap();
        assert_eq!(result, vec!["Zylo", "Plura"]);
    }

    #[tokio::test]
    async fn all_taken_fallback_is_truncated() {
        let all = strings(&["A", "B", "C", "D", "E", "F", "G"]);
        let lookup: HashSet<String> = all.iter().cloned().collect();
        let result = available_names(&lookup, all, 5).await.unwrap();
        assert_eq!(result, vec!["A", "B", "C", "D", "E"]);
    }

    #[tokio::test]
    async fn match_is_exact() {
        let lookup = taken(&["zylo"]);
        let result = available_names(&lookup, strings(&["Zylo"]), 5)
            .await
            .unwrap();
        assert_eq!(result, vec!["Zylo"]);
    }

    #[tokio::test]
    async fn empty_candidates_stay_empty() {
        let lookup = taken(&["Zylo"]);
        let result = available_names(&lookup, Vec::new(), 5).await.unwrap();
        assert!(result.is_empty());
    }
}
