//! Lenient lexical matching of utterances against the command catalog
//!
//! Scoring tolerates transcription noise and word-form variation: a word
//! counts as matched when it contains, or is contained in, any word of the
//! other phrase. The per-rule confidence thresholds are tuned against exactly
//! this metric.

use crate::commands::CommandCatalog;
use crate::intent::Intent;

/// Outcome of matching one utterance
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult {
    /// Matched intent, `None` when no rule cleared its threshold
    pub action: Option<Intent>,

    /// Score of the winning candidate (0.0 when nothing matched)
    pub score: f64,
}

impl MatchResult {
    /// No rule matched
    #[must_use]
    pub const fn none() -> Self {
        Self {
            action: None,
            score: 0.0,
        }
    }

    /// Whether an intent was selected
    #[must_use]
    pub const fn is_match(&self) -> bool {
        self.action.is_some()
    }
}

/// Similarity between an utterance and a reference pattern, in `[0, 1]`
///
/// Counts the utterance words that substring-match some pattern word (in
/// either direction, case-insensitively) and divides by the longer word count.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn similarity(utterance: &str, pattern: &str) -> f64 {
    let utterance = utterance.to_lowercase();
    let pattern = pattern.to_lowercase();

    let spoken: Vec<&str> = utterance.split_whitespace().collect();
    let reference: Vec<&str> = pattern.split_whitespace().collect();

    if spoken.is_empty() || reference.is_empty() {
        return 0.0;
    }

    let matched = spoken
        .iter()
        .filter(|word| {
            reference
                .iter()
                .any(|other| word.contains(other) || other.contains(*word))
        })
        .count();

    matched as f64 / spoken.len().max(reference.len()) as f64
}

impl CommandCatalog {
    /// Select the best-scoring intent for an utterance
    ///
    /// A pattern is a candidate only if its score reaches its rule's
    /// confidence. The highest candidate wins; on an exact tie the rule
    /// listed first keeps the win. That tie-break is an artifact of evaluation
    /// order, kept stable for compatibility rather than chosen on merit.
    #[must_use]
    pub fn match_utterance(&self, utterance: &str) -> MatchResult {
        let mut best = MatchResult::none();

        for rule in self.rules() {
            for pattern in &rule.patterns {
                let score = similarity(utterance, pattern);
                if score >= rule.confidence && score > best.score {
                    best = MatchResult {
                        action: Some(rule.action),
                        score,
                    };
                }
            }
        }

        match best.action {
            Some(action) => {
                tracing::debug!(utterance, %action, score = best.score, "command matched");
            }
            None => tracing::debug!(utterance, "no command matched"),
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::CommandRule;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn identical_phrases_score_one() {
        assert!(approx(similarity("help", "help"), 1.0));
        assert!(approx(similarity("what time is it", "what time is it"), 1.0));
    }

    #[test]
    fn empty_input_scores_zero() {
        assert!(approx(similarity("", "help"), 0.0));
        assert!(approx(similarity("   ", "help"), 0.0));
    }

    #[test]
    fn similarity_is_case_insensitive() {
        assert!(approx(similarity("HELP", "help"), 1.0));
    }

    #[test]
    fn containment_counts_in_both_directions() {
        assert!(approx(similarity("walked", "walk"), 1.0));
        assert!(approx(similarity("walk", "walked"), 1.0));
    }

    #[test]
    fn denominator_is_the_longer_phrase() {
        assert!(approx(similarity("help", "i need help"), 1.0 / 3.0));
        // "i" is contained in "it", so three of four spoken words match
        assert!(approx(similarity("i took it now", "took it"), 0.75));
        assert!(approx(similarity("i totally took it just now", "took it"), 0.5));
    }

    #[test]
    fn empty_utterance_matches_nothing() {
        let result = CommandCatalog::reference().match_utterance("");
        assert_eq!(result, MatchResult::none());
    }

    #[test]
    fn help_is_an_emergency() {
        let result = CommandCatalog::reference().match_utterance("help");
        assert_eq!(result.action, Some(Intent::Emergency));
        assert!(approx(result.score, 1.0));
    }

    #[test]
    fn tolerates_extra_words() {
        let result = CommandCatalog::reference().match_utterance("i took it now");
        assert_eq!(result.action, Some(Intent::MedicationTaken));
        assert!(approx(result.score, 0.75));
    }

    #[test]
    fn nonsense_is_unmatched() {
        assert!(!CommandCatalog::reference().match_utterance("xyz nonsense").is_match());
    }

    #[test]
    fn best_score_below_threshold_is_rejected() {
        // "what" half-matches "what time" (0.5) but tell_time needs 0.8
        assert!(!CommandCatalog::reference().match_utterance("what").is_match());
    }

    #[test]
    fn ineligible_high_score_loses_to_eligible_low_score() {
        let catalog = CommandCatalog::new(vec![
            CommandRule::new(&["took it"], Intent::MedicationTaken, 1.0),
            CommandRule::new(&["now"], Intent::MedicationSnooze, 0.3),
        ])
        .unwrap();

        let result = catalog.match_utterance("took it now");
        assert_eq!(result.action, Some(Intent::MedicationSnooze));
        assert!(approx(result.score, 1.0 / 3.0));
    }

    #[test]
    fn ties_go_to_the_earlier_rule() {
        let forward = CommandCatalog::new(vec![
            CommandRule::new(&["thanks"], Intent::Acknowledgment, 0.5),
            CommandRule::new(&["thanks"], Intent::Emergency, 0.5),
        ])
        .unwrap();
        let reversed = CommandCatalog::new(vec![
            CommandRule::new(&["thanks"], Intent::Emergency, 0.5),
            CommandRule::new(&["thanks"], Intent::Acknowledgment, 0.5),
        ])
        .unwrap();

        assert_eq!(forward.match_utterance("thanks").action, Some(Intent::Acknowledgment));
        assert_eq!(reversed.match_utterance("thanks").action, Some(Intent::Emergency));
    }

    #[test]
    fn reference_tie_between_walk_rules() {
        let catalog = CommandCatalog::reference();
        // pet_walk_done ("walked the dog") and pet_walk_reminder ("walk the dog")
        // both score 0.75; the earlier rule wins
        let result = catalog.match_utterance("i walked the dog");
        assert_eq!(result.action, Some(Intent::PetWalkDone));
        assert!(approx(result.score, 0.75));

        // "walk" is contained in "walked", so even the reminder phrase ties at 1.0
        assert_eq!(
            catalog.match_utterance("walk the dog").action,
            Some(Intent::PetWalkDone)
        );
    }

    #[test]
    fn zero_threshold_still_needs_some_overlap() {
        let catalog =
            CommandCatalog::new(vec![CommandRule::new(&["medicine"], Intent::MedicationTaken, 0.0)])
                .unwrap();
        assert!(!catalog.match_utterance("xyz").is_match());
        assert!(!catalog.match_utterance("").is_match());
    }
}
