// Text normalization: raw document text -> significant terms.
//
// Pipeline per sentence: split on non-alphabetic boundaries, lower-case,
// stem when configured, drop stopwords. Tokens without alphabetic content
// (pure punctuation, numerals) never survive the split, so they need no
// separate filter.
//
// Everything here is deterministic by construction — the stemming
// algorithm is pinned by the `Language` in the config, so the same unit
// produces the same terms no matter which worker runs it.

use std::collections::BTreeSet;

use rust_stemmers::Stemmer;

use crate::config::{AnalysisConfig, Language};

/// Turns raw text into normalized terms according to one `AnalysisConfig`.
///
/// Cheap to construct; pool workers build one per work unit and stay
/// stateless between units.
pub struct Normalizer {
    stemmer: Option<Stemmer>,
    stopwords: BTreeSet<String>,
}

impl Normalizer {
    pub fn new(config: &AnalysisConfig) -> Self {
        let mut normalizer = Self::bare(config.language, config.use_stemming);
        normalizer.stopwords = config.stopword_set.clone();
        normalizer
    }

    /// A normalizer with no stopword set. Used to pre-process the stopword
    /// lists themselves, which must go through the same lowercasing and
    /// stemming as the documents.
    pub(crate) fn bare(language: Language, use_stemming: bool) -> Self {
        Self {
            stemmer: use_stemming.then(|| Stemmer::create(language.stemmer_algorithm())),
            stopwords: BTreeSet::new(),
        }
    }

    /// Split text into sentence-like units. The counter builds one sparse
    /// incidence row per unit returned here.
    ///
    /// Empty or whitespace-only text yields nothing.
    pub fn sentences<'a>(&self, text: &'a str) -> impl Iterator<Item = &'a str> {
        text.split(['.', '!', '?'])
            .map(str::trim)
            .filter(|sentence| !sentence.is_empty())
    }

    /// Normalize one piece of text into a lazy, finite sequence of terms.
    /// Single consumption is all the callers need — the counter folds it
    /// once into a tally.
    pub fn terms<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        text.split(|c: char| !c.is_alphabetic())
            .filter(|token| !token.is_empty())
            .map(move |token| self.stem(token.to_lowercase()))
            .filter(move |term| !self.stopwords.contains(term))
    }

    fn stem(&self, word: String) -> String {
        match &self.stemmer {
            Some(stemmer) => stemmer.stem(&word).into_owned(),
            None => word,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AnalysisConfig, Language};

    fn plain_config(stopwords: &[&str]) -> AnalysisConfig {
        AnalysisConfig::with_stopwords(Language::English, false, stopwords, 10, false)
    }

    #[test]
    fn lowercases_and_strips_punctuation() {
        let normalizer = Normalizer::new(&plain_config(&[]));
        let terms: Vec<String> = normalizer.terms("The CAT, sat!").collect();
        assert_eq!(terms, vec!["the", "cat", "sat"]);
    }

    #[test]
    fn drops_numerals_and_mixed_tokens() {
        let normalizer = Normalizer::new(&plain_config(&[]));
        let terms: Vec<String> = normalizer.terms("route 66 b2b plan9").collect();
        // Digits split tokens apart; only the alphabetic runs survive.
        assert_eq!(terms, vec!["route", "b", "b", "plan"]);
    }

    #[test]
    fn removes_stopwords() {
        let normalizer = Normalizer::new(&plain_config(&["the", "a"]));
        let terms: Vec<String> = normalizer.terms("the cat saw a dog").collect();
        assert_eq!(terms, vec!["cat", "saw", "dog"]);
    }

    #[test]
    fn stems_when_configured() {
        let config = AnalysisConfig::with_stopwords::<&str>(Language::English, true, &[], 10, false);
        let normalizer = Normalizer::new(&config);
        let terms: Vec<String> = normalizer.terms("running runners ran").collect();
        assert_eq!(terms, vec!["run", "runner", "ran"]);
    }

    #[test]
    fn empty_text_yields_no_sentences_or_terms() {
        let normalizer = Normalizer::new(&plain_config(&[]));
        assert_eq!(normalizer.sentences("").count(), 0);
        assert_eq!(normalizer.sentences("   \n\t ").count(), 0);
        assert_eq!(normalizer.terms("").count(), 0);
        assert_eq!(normalizer.terms(" 1234 !?! ").count(), 0);
    }

    #[test]
    fn splits_sentences_on_terminators() {
        let normalizer = Normalizer::new(&plain_config(&[]));
        let sentences: Vec<&str> = normalizer
            .sentences("One sentence. Another! A third? ")
            .collect();
        assert_eq!(sentences, vec!["One sentence", "Another", "A third"]);
    }
}
