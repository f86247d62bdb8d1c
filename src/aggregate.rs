// Aggregation: merge per-document term counts into one corpus-wide tally,
// then rank.
//
// Merging is commutative, associative, and idempotent under duplicate
// unit ids, so results can arrive in any order, from any mix of workers,
// and redelivered duplicates from an at-least-once queue contribute once.
// The state is owned exclusively by the coordinator — workers never touch
// it, which is why no locking exists here.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::debug;

use crate::dispatch::{WorkOutcome, WorkResult};

/// One entry of the final ranked output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTerm {
    pub term: String,
    pub count: u64,
}

/// A unit that did not produce counts, kept for the run report.
#[derive(Debug, Clone, Serialize)]
pub struct FailedUnit {
    pub unit_id: String,
    pub source: String,
    pub reason: String,
}

/// Running corpus-wide tally.
#[derive(Debug, Default)]
pub struct AggregateState {
    counts: HashMap<String, u64>,
    merged: HashSet<String>,
    succeeded: usize,
    failed: Vec<FailedUnit>,
}

impl AggregateState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one work result into the tally. A unit_id seen before is
    /// ignored entirely, failures are recorded without touching the counts.
    pub fn merge(&mut self, result: WorkResult) {
        if !self.merged.insert(result.unit_id.clone()) {
            debug!(unit_id = %result.unit_id, "Ignoring duplicate work result");
            return;
        }

        match result.outcome {
            WorkOutcome::Counts(counts) => {
                for (term, occurrences) in counts {
                    *self.counts.entry(term).or_insert(0) += occurrences;
                }
                self.succeeded += 1;
            }
            WorkOutcome::Failed { reason } => {
                self.failed.push(FailedUnit {
                    unit_id: result.unit_id,
                    source: result.source,
                    reason,
                });
            }
        }
    }

    /// Distinct units merged so far (successes and failures).
    pub fn merged_units(&self) -> usize {
        self.merged.len()
    }

    /// Units that contributed counts.
    pub fn succeeded(&self) -> usize {
        self.succeeded
    }

    pub fn failed(&self) -> &[FailedUnit] {
        &self.failed
    }

    /// Rank the tally: count descending, ties broken by term ascending, so
    /// output is reproducible across runs and across distributed
    /// executions. `top_n <= 0` (or larger than the vocabulary) returns
    /// everything.
    pub fn finalize(self, top_n: i64) -> Vec<RankedTerm> {
        let mut ranked: Vec<RankedTerm> = self
            .counts
            .into_iter()
            .map(|(term, count)| RankedTerm { term, count })
            .collect();

        ranked.sort_unstable_by(|a, b| b.count.cmp(&a.count).then_with(|| a.term.cmp(&b.term)));

        if top_n > 0 {
            ranked.truncate(top_n as usize);
        }
        ranked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::TermCounts;

    fn counts_result(unit_id: &str, pairs: &[(&str, u64)]) -> WorkResult {
        let counts: TermCounts = pairs
            .iter()
            .map(|(term, n)| (term.to_string(), *n))
            .collect();
        WorkResult {
            unit_id: unit_id.to_string(),
            source: format!("{unit_id}.txt"),
            outcome: WorkOutcome::Counts(counts),
        }
    }

    fn failed_result(unit_id: &str, reason: &str) -> WorkResult {
        WorkResult {
            unit_id: unit_id.to_string(),
            source: format!("{unit_id}.txt"),
            outcome: WorkOutcome::Failed {
                reason: reason.to_string(),
            },
        }
    }

    #[test]
    fn merge_is_commutative() {
        let results = [
            counts_result("u1", &[("cat", 2), ("dog", 1)]),
            counts_result("u2", &[("cat", 1), ("ram", 4)]),
            counts_result("u3", &[("dog", 3)]),
        ];

        let mut forward = AggregateState::new();
        for r in results.iter().cloned() {
            forward.merge(r);
        }
        let mut backward = AggregateState::new();
        for r in results.iter().rev().cloned() {
            backward.merge(r);
        }

        assert_eq!(forward.finalize(0), backward.finalize(0));
    }

    #[test]
    fn duplicate_unit_contributes_once() {
        let mut once = AggregateState::new();
        once.merge(counts_result("u1", &[("cat", 2)]));

        let mut twice = AggregateState::new();
        twice.merge(counts_result("u1", &[("cat", 2)]));
        twice.merge(counts_result("u1", &[("cat", 2)]));

        assert_eq!(twice.merged_units(), 1);
        assert_eq!(once.finalize(0), twice.finalize(0));
    }

    #[test]
    fn ties_break_lexicographically() {
        let mut state = AggregateState::new();
        state.merge(counts_result(
            "u1",
            &[("ran", 2), ("cat", 2), ("sat", 1), ("dog", 1)],
        ));

        let ranked = state.finalize(3);
        let terms: Vec<&str> = ranked.iter().map(|r| r.term.as_str()).collect();
        assert_eq!(terms, vec!["cat", "ran", "dog"]);
    }

    #[test]
    fn top_n_zero_or_negative_returns_everything() {
        let mut state = AggregateState::new();
        state.merge(counts_result("u1", &[("a", 1), ("b", 2), ("c", 3)]));
        assert_eq!(state.finalize(0).len(), 3);

        let mut state = AggregateState::new();
        state.merge(counts_result("u1", &[("a", 1), ("b", 2), ("c", 3)]));
        assert_eq!(state.finalize(-5).len(), 3);
    }

    #[test]
    fn top_n_beyond_vocabulary_returns_everything() {
        let mut state = AggregateState::new();
        state.merge(counts_result("u1", &[("a", 1), ("b", 2)]));
        assert_eq!(state.finalize(100).len(), 2);
    }

    #[test]
    fn failures_are_recorded_not_counted() {
        let mut state = AggregateState::new();
        state.merge(counts_result("u1", &[("cat", 1)]));
        state.merge(failed_result("u2", "unreadable"));

        assert_eq!(state.succeeded(), 1);
        assert_eq!(state.failed().len(), 1);
        assert_eq!(state.failed()[0].unit_id, "u2");
        assert_eq!(state.finalize(0).len(), 1);
    }
}
