use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ApiError, Result};
use crate::models::Candidate;
use crate::services::chooser::{TitleChooser, ABSTAIN_TOKEN};

#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    Chosen(String),
    Abstained(AbstainReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbstainReason {
    NoCloseMatch,
}

/// Resolves a ranked candidate list plus the chooser's judgment into exactly
/// one title or an abstention, under the configured distance threshold and
/// short-query bound.
pub struct Selector {
    chooser: Arc<dyn TitleChooser>,
    distance_threshold: f32,
    short_query_max_chars: usize,
}

impl Selector {
    pub fn new(
        chooser: Arc<dyn TitleChooser>,
        distance_threshold: f32,
        short_query_max_chars: usize,
    ) -> Self {
        Self {
            chooser,
            distance_threshold,
            short_query_max_chars,
        }
    }

    pub async fn select(
        &self,
        query: &str,
        candidates: &[Candidate],
        best_distance: f32,
    ) -> Result<SelectionOutcome> {
        if candidates.is_empty() {
            return Err(ApiError::NoCandidates);
        }

        let trimmed = query.trim();
        let very_short = trimmed.chars().count() <= self.short_query_max_chars;
        let too_far = best_distance > self.distance_threshold;
        debug!(
            "Gating: best_distance={:.3} very_short={} too_far={} query={:?}",
            best_distance, very_short, too_far, trimmed
        );

        // Soft gate: refuse outright only when the query is tiny AND the
        // match is far. Everything else gets the chooser's judgment.
        if very_short && too_far {
            return Ok(SelectionOutcome::Abstained(AbstainReason::NoCloseMatch));
        }

        let titles: Vec<String> = candidates.iter().map(|c| c.title.clone()).collect();
        let verdict = self.chooser.choose(trimmed, &titles, best_distance).await?;
        let verdict = verdict.trim();

        if verdict.eq_ignore_ascii_case(ABSTAIN_TOKEN) {
            if very_short {
                return Ok(SelectionOutcome::Abstained(AbstainReason::NoCloseMatch));
            }
            // An abstention on a real query: trust retrieval's closest match.
            return Ok(SelectionOutcome::Chosen(candidates[0].title.clone()));
        }

        if candidates.iter().any(|c| c.title == verdict) {
            return Ok(SelectionOutcome::Chosen(verdict.to_string()));
        }

        // The chooser invented a title. Treat it as a chooser defect rather
        // than surfacing a name the catalog cannot back.
        warn!(
            "Chooser replied with a non-candidate title {:?}; falling back to the closest match",
            verdict
        );
        Ok(SelectionOutcome::Chosen(candidates[0].title.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct ScriptedChooser {
        reply: String,
        calls: AtomicUsize,
    }

    impl ScriptedChooser {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TitleChooser for ScriptedChooser {
        async fn choose(
            &self,
            _query: &str,
            _titles: &[String],
            _best_distance: f32,
        ) -> Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    struct FailingChooser;

    #[async_trait]
    impl TitleChooser for FailingChooser {
        async fn choose(
            &self,
            _query: &str,
            _titles: &[String],
            _best_distance: f32,
        ) -> Result<String> {
            Err(ApiError::ExternalService("chooser unavailable".into()))
        }
    }

    fn candidate(title: &str, distance: f32) -> Candidate {
        Candidate {
            title: title.to_string(),
            short: format!("{} short", title),
            full: format!("{} full", title),
            distance,
        }
    }

    fn candidates() -> Vec<Candidate> {
        vec![candidate("The Hobbit", 0.31), candidate("1984", 0.52)]
    }

    fn selector(chooser: Arc<ScriptedChooser>) -> Selector {
        Selector::new(chooser, 0.75, 3)
    }

    #[tokio::test]
    async fn test_short_and_far_abstains_without_calling_chooser() {
        let chooser = ScriptedChooser::new("The Hobbit");
        let outcome = selector(chooser.clone())
            .select(" ab ", &candidates(), 0.9)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SelectionOutcome::Abstained(AbstainReason::NoCloseMatch)
        );
        assert_eq!(chooser.call_count(), 0);
    }

    #[tokio::test]
    async fn test_chooser_is_consulted_whenever_query_is_not_short() {
        // Far match, but the query has substance: the chooser still runs.
        let chooser = ScriptedChooser::new("ABSTAIN");
        let outcome = selector(chooser.clone())
            .select("obscure midnight poetry", &candidates(), 0.95)
            .await
            .unwrap();

        assert_eq!(chooser.call_count(), 1);
        assert_eq!(outcome, SelectionOutcome::Chosen("The Hobbit".to_string()));
    }

    #[tokio::test]
    async fn test_verbatim_candidate_title_is_selected() {
        let chooser = ScriptedChooser::new("1984");
        let outcome = selector(chooser.clone())
            .select("dystopian surveillance state", &candidates(), 0.52)
            .await
            .unwrap();

        assert_eq!(outcome, SelectionOutcome::Chosen("1984".to_string()));
        assert_eq!(chooser.call_count(), 1);
    }

    #[tokio::test]
    async fn test_abstain_is_matched_case_insensitively() {
        let chooser = ScriptedChooser::new("  abstain  ");
        let outcome = selector(chooser)
            .select("space opera adventure", &candidates(), 0.6)
            .await
            .unwrap();

        assert_eq!(outcome, SelectionOutcome::Chosen("The Hobbit".to_string()));
    }

    #[tokio::test]
    async fn test_abstain_on_short_query_abstains() {
        // Short but close: passes the gate, then the chooser abstains.
        let chooser = ScriptedChooser::new("ABSTAIN");
        let outcome = selector(chooser.clone())
            .select("cat", &candidates(), 0.5)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            SelectionOutcome::Abstained(AbstainReason::NoCloseMatch)
        );
        assert_eq!(chooser.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invented_title_falls_back_to_closest_match() {
        let chooser = ScriptedChooser::new("The Silmarillion");
        let outcome = selector(chooser)
            .select("epic fantasy history", &candidates(), 0.4)
            .await
            .unwrap();

        assert_eq!(outcome, SelectionOutcome::Chosen("The Hobbit".to_string()));
    }

    #[tokio::test]
    async fn test_empty_candidate_list_is_an_error() {
        let chooser = ScriptedChooser::new("The Hobbit");
        let err = selector(chooser.clone())
            .select("dragons", &[], 1.0)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::NoCandidates));
        assert_eq!(chooser.call_count(), 0);
    }

    #[tokio::test]
    async fn test_chooser_failure_propagates() {
        let selector = Selector::new(Arc::new(FailingChooser), 0.75, 3);
        let err = selector
            .select("dragons and treasure", &candidates(), 0.4)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::ExternalService(_)));
    }
}
