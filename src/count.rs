// Per-document term counting.
//
// Counts are produced from a sparse incidence structure: a vocabulary index
// plus one sparse row per sentence mapping term index -> occurrences.
// Summing the columns gives the document tally. Memory stays O(distinct
// terms) plus O(nonzero cells), regardless of how large the vocabulary is.

use std::collections::{BTreeMap, HashMap};

/// Term -> occurrence count for a single document.
///
/// A `BTreeMap` so that serialized results are byte-stable across workers.
pub type TermCounts = BTreeMap<String, u64>;

/// Tally normalized terms, one inner sequence per sentence.
///
/// Order-independent: this is a multiset tally, so any permutation of the
/// input produces the same counts.
pub fn count_terms<I, S>(sentence_terms: I) -> TermCounts
where
    I: IntoIterator<Item = S>,
    S: IntoIterator<Item = String>,
{
    let mut vocabulary: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<HashMap<usize, u64>> = Vec::new();

    for sentence in sentence_terms {
        let mut row: HashMap<usize, u64> = HashMap::new();
        for term in sentence {
            let next_index = vocabulary.len();
            let index = *vocabulary.entry(term).or_insert(next_index);
            *row.entry(index).or_insert(0) += 1;
        }
        if !row.is_empty() {
            rows.push(row);
        }
    }

    // Column sums across the incidence rows.
    let mut totals = vec![0u64; vocabulary.len()];
    for row in &rows {
        for (&index, &occurrences) in row {
            totals[index] += occurrences;
        }
    }

    vocabulary
        .into_iter()
        .map(|(term, index)| (term, totals[index]))
        .collect()
}
