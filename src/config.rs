// Run configuration.
//
// Two layers, deliberately separate:
//   * AnalysisConfig — the immutable, serializable options that travel with
//     every work unit so any worker reproduces the exact same analysis.
//   * Settings — ambient runtime knobs (worker count, timeouts) loaded from
//     the environment. These stay on the coordinator side and never ship
//     to workers.

use std::collections::BTreeSet;
use std::env;
use std::time::Duration;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::normalize::Normalizer;

/// Languages for which both a stopword list and a Snowball stemming
/// algorithm are available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    English,
    Spanish,
    French,
    German,
    Italian,
    Portuguese,
    Dutch,
    Russian,
    Swedish,
    Norwegian,
}

impl Language {
    /// Parse a user-supplied language selector.
    ///
    /// Unknown selectors are a configuration error and must be rejected
    /// before any work unit is built.
    pub fn parse(selector: &str) -> Result<Self> {
        match selector.to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(Self::English),
            "spanish" | "es" => Ok(Self::Spanish),
            "french" | "fr" => Ok(Self::French),
            "german" | "de" => Ok(Self::German),
            "italian" | "it" => Ok(Self::Italian),
            "portuguese" | "pt" => Ok(Self::Portuguese),
            "dutch" | "nl" => Ok(Self::Dutch),
            "russian" | "ru" => Ok(Self::Russian),
            "swedish" | "sv" => Ok(Self::Swedish),
            "norwegian" | "no" => Ok(Self::Norwegian),
            other => anyhow::bail!(
                "Unknown language '{other}'. Supported: english, spanish, french, german, \
                 italian, portuguese, dutch, russian, swedish, norwegian"
            ),
        }
    }

    /// The Snowball algorithm for this language. Pinning the algorithm to
    /// the config (rather than an ambient default) is what keeps stemming
    /// identical across workers.
    pub(crate) fn stemmer_algorithm(self) -> rust_stemmers::Algorithm {
        use rust_stemmers::Algorithm;
        match self {
            Self::English => Algorithm::English,
            Self::Spanish => Algorithm::Spanish,
            Self::French => Algorithm::French,
            Self::German => Algorithm::German,
            Self::Italian => Algorithm::Italian,
            Self::Portuguese => Algorithm::Portuguese,
            Self::Dutch => Algorithm::Dutch,
            Self::Russian => Algorithm::Russian,
            Self::Swedish => Algorithm::Swedish,
            Self::Norwegian => Algorithm::Norwegian,
        }
    }

    fn stopword_language(self) -> stop_words::LANGUAGE {
        use stop_words::LANGUAGE;
        match self {
            Self::English => LANGUAGE::English,
            Self::Spanish => LANGUAGE::Spanish,
            Self::French => LANGUAGE::French,
            Self::German => LANGUAGE::German,
            Self::Italian => LANGUAGE::Italian,
            Self::Portuguese => LANGUAGE::Portuguese,
            Self::Dutch => LANGUAGE::Dutch,
            Self::Russian => LANGUAGE::Russian,
            Self::Swedish => LANGUAGE::Swedish,
            Self::Norwegian => LANGUAGE::Norwegian,
        }
    }
}

/// Immutable configuration shared by every work unit in a run.
///
/// Serializable so it can travel to a remote worker alongside the document
/// it applies to. The stopword set is a `BTreeSet` so its serialized form
/// is deterministic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Count stems instead of surface words.
    pub use_stemming: bool,
    /// Selects both the stopword list and the stemming algorithm.
    pub language: Language,
    /// Terms excluded from the ranking. Already normalized (lower-cased,
    /// stemmed when `use_stemming` is on).
    pub stopword_set: BTreeSet<String>,
    /// How many ranked terms to return. Zero or negative means all of them.
    pub top_n: i64,
    /// Distribute work across the pool instead of running inline.
    pub async_mode: bool,
}

impl AnalysisConfig {
    /// Build a config for a run, materializing the stopword set for the
    /// selected language from the `stop-words` lists.
    pub fn new(language: Language, use_stemming: bool, top_n: i64, async_mode: bool) -> Self {
        let raw = stop_words::get(language.stopword_language());
        Self::with_stopwords(language, use_stemming, &raw, top_n, async_mode)
    }

    /// Build a config with an explicit stopword list (injectable input —
    /// callers may version their own lists instead of using the bundled
    /// ones).
    ///
    /// Stopwords are pushed through the same normalization the documents
    /// get, so a stemmed document term still matches its stopword. Done
    /// once here rather than on every worker.
    pub fn with_stopwords<S: AsRef<str>>(
        language: Language,
        use_stemming: bool,
        stopwords: &[S],
        top_n: i64,
        async_mode: bool,
    ) -> Self {
        let normalizer = Normalizer::bare(language, use_stemming);
        let stopword_set = stopwords
            .iter()
            .flat_map(|word| normalizer.terms(word.as_ref()).collect::<Vec<_>>())
            .collect();
        Self {
            use_stemming,
            language,
            stopword_set,
            top_n,
            async_mode,
        }
    }
}

/// Ambient runtime knobs, loaded from environment variables.
///
/// The .env file is loaded at startup via dotenvy. None of these affect
/// the analysis output, only how it is scheduled, so they are not part of
/// `AnalysisConfig` and never reach a worker.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Number of pool workers (GLEANER_WORKERS, default 4).
    pub workers: usize,
    /// Overall run deadline in async mode (GLEANER_TIMEOUT_SECS, default 300).
    /// Units still outstanding at the deadline are reported failed-by-timeout
    /// instead of the run hanging.
    pub run_timeout: Duration,
    /// Bounded capacity of the in-memory task queue (GLEANER_QUEUE_CAPACITY,
    /// default 256).
    pub queue_capacity: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            workers: 4,
            run_timeout: Duration::from_secs(300),
            queue_capacity: 256,
        }
    }
}

impl Settings {
    /// Load settings from the environment, falling back to defaults for
    /// anything unset or unparsable.
    pub fn load() -> Self {
        let defaults = Self::default();
        Self {
            workers: env_usize("GLEANER_WORKERS").unwrap_or(defaults.workers),
            run_timeout: env_usize("GLEANER_TIMEOUT_SECS")
                .map(|secs| Duration::from_secs(secs as u64))
                .unwrap_or(defaults.run_timeout),
            queue_capacity: env_usize("GLEANER_QUEUE_CAPACITY").unwrap_or(defaults.queue_capacity),
        }
    }
}

fn env_usize(key: &str) -> Option<usize> {
    env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_languages() {
        assert_eq!(Language::parse("english").unwrap(), Language::English);
        assert_eq!(Language::parse("EN").unwrap(), Language::English);
        assert_eq!(Language::parse("de").unwrap(), Language::German);
    }

    #[test]
    fn parse_unknown_language_fails() {
        let err = Language::parse("klingon").unwrap_err();
        assert!(err.to_string().contains("klingon"));
    }

    #[test]
    fn bundled_stopwords_are_lowercased() {
        let config = AnalysisConfig::new(Language::English, false, 10, false);
        assert!(config.stopword_set.contains("the"));
        assert!(config.stopword_set.iter().all(|w| w == &w.to_lowercase()));
    }

    #[test]
    fn stopwords_are_prestemmed_when_stemming_is_on() {
        let config =
            AnalysisConfig::with_stopwords(Language::English, true, &["running"], 10, false);
        // Snowball reduces "running" to "run"; the set must hold the stemmed
        // form so it matches stemmed document terms.
        assert!(config.stopword_set.contains("run"));
        assert!(!config.stopword_set.contains("running"));
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = AnalysisConfig::with_stopwords(
            Language::French,
            true,
            &["le", "la"],
            5,
            true,
        );
        let json = serde_json::to_string(&config).unwrap();
        let restored: AnalysisConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.language, Language::French);
        assert_eq!(restored.stopword_set, config.stopword_set);
        assert_eq!(restored.top_n, 5);
        assert!(restored.async_mode);
    }
}
