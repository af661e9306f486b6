use serde::Serialize;

use crate::domain::entities::RetrievalResult;

/// A hit at or above this score counts as a strong retrieval signal.
pub const STRONG_HIT_THRESHOLD: f32 = 0.75;

/// Below this top score, with no strong hits, retrieval is considered weak.
pub const WEAK_TOP_SCORE_FLOOR: f32 = 0.45;

/// Retrieval signal strength, computed once per query and fed to mode
/// selection. Kept as a plain value type so the selection logic stays a
/// pure function.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RetrievalSignals {
    pub top_score: f32,
    pub avg_top3: f32,
    pub strong_hit_count: usize,
}

impl RetrievalSignals {
    pub fn from_results(results: &[RetrievalResult]) -> Self {
        let mut scores: Vec<f32> = results.iter().map(|r| r.effective_score()).collect();
        scores.sort_by(|a, b| b.partial_cmp(a).unwrap_or(std::cmp::Ordering::Equal));

        let top_score = scores.first().copied().unwrap_or(0.0);
        let top3 = &scores[..scores.len().min(3)];
        let avg_top3 = if top3.is_empty() {
            0.0
        } else {
            top3.iter().sum::<f32>() / top3.len() as f32
        };
        let strong_hit_count = scores.iter().filter(|s| **s >= STRONG_HIT_THRESHOLD).count();

        Self {
            top_score,
            avg_top3,
            strong_hit_count,
        }
    }
}

/// Answer verbosity/confidence strategy chosen before generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerMode {
    Standard,
    Cautious,
}

impl AnswerMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerMode::Standard => "standard",
            AnswerMode::Cautious => "cautious",
        }
    }

    /// Style directive appended to the generation prompt.
    pub fn directive(&self) -> &'static str {
        match self {
            AnswerMode::Standard => {
                "Answer directly and concretely, citing the manual passages provided."
            }
            AnswerMode::Cautious => {
                "The manual coverage for this question is thin. Answer conservatively, \
                 say explicitly when the manual does not cover something, and suggest \
                 checking with the manufacturer where unsure."
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StyleDecision {
    pub mode: AnswerMode,
    pub is_weak: bool,
}

/// Pure signal-to-mode mapping. Weak retrieval means a low top score with no
/// strong hits at all; anything else gets the standard mode.
pub fn select_mode(signals: RetrievalSignals) -> StyleDecision {
    let is_weak = signals.top_score < WEAK_TOP_SCORE_FLOOR && signals.strong_hit_count == 0;
    let mode = if is_weak {
        AnswerMode::Cautious
    } else {
        AnswerMode::Standard
    };
    StyleDecision { mode, is_weak }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::RetrievalSource;
    use uuid::Uuid;

    fn result(score: f32) -> RetrievalResult {
        RetrievalResult {
            id: Uuid::new_v4(),
            manual_id: "m-1".to_string(),
            content: "content".to_string(),
            page_start: 1,
            page_end: 1,
            menu_path: None,
            vector_score: score,
            rerank_score: None,
            source: RetrievalSource::Chunk,
        }
    }

    fn signals(top: f32, strong: usize) -> RetrievalSignals {
        RetrievalSignals {
            top_score: top,
            avg_top3: top,
            strong_hit_count: strong,
        }
    }

    #[test]
    fn test_signals_from_results() {
        let results = vec![result(0.9), result(0.8), result(0.4), result(0.2)];
        let s = RetrievalSignals::from_results(&results);
        assert_eq!(s.top_score, 0.9);
        assert_eq!(s.strong_hit_count, 2);
        let expected = (0.9 + 0.8 + 0.4) / 3.0;
        assert!((s.avg_top3 - expected).abs() < 1e-6);
    }

    #[test]
    fn test_signals_from_empty_results() {
        let s = RetrievalSignals::from_results(&[]);
        assert_eq!(s.top_score, 0.0);
        assert_eq!(s.avg_top3, 0.0);
        assert_eq!(s.strong_hit_count, 0);
    }

    #[test]
    fn test_weak_boundary_extremes() {
        // Nothing retrieved at all: must be weak.
        let decision = select_mode(signals(0.0, 0));
        assert!(decision.is_weak);
        assert_eq!(decision.mode, AnswerMode::Cautious);

        // High score with several strong hits: must not be weak.
        let decision = select_mode(signals(0.9, 3));
        assert!(!decision.is_weak);
        assert_eq!(decision.mode, AnswerMode::Standard);
    }

    #[test]
    fn test_single_strong_hit_is_not_weak() {
        let decision = select_mode(signals(0.3, 1));
        assert!(!decision.is_weak);
    }

    #[test]
    fn test_low_top_score_alone_is_weak() {
        let decision = select_mode(signals(0.44, 0));
        assert!(decision.is_weak);
        let decision = select_mode(signals(0.45, 0));
        assert!(!decision.is_weak);
    }
}
