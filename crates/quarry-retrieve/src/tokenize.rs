//! Text tokenization pipeline.
//!
//! Turns free text into the token stream that the positional index stores and
//! the BM25 scorer matches against. The pipeline runs, in order:
//!
//! 1. ASCII lowercasing
//! 2. Split on any character that is not a letter or digit
//! 3. Drop tokens shorter than the minimum length (default 2)
//! 4. Drop English stopwords (frozen list, see [`ENGLISH_STOPWORDS`])
//! 5. English Snowball stemming (the stemmed form is emitted)
//!
//! Occurrence order is preserved and duplicates are kept, because the index
//! records token positions.
//!
//! The same `Tokenizer` instance (or one with the same configuration) must be
//! used at index build time and at query time; any divergence silently
//! destroys recall. To make this checkable across processes, the tokenizer
//! exposes a [`Tokenizer::fingerprint`] over its configuration which is
//! persisted in the index file and verified on load.

use once_cell::sync::Lazy;
use rust_stemmers::{Algorithm, Stemmer};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::OnceLock;

/// Frozen English stopword list (~174 function words).
///
/// Frozen at release: editing it invalidates every persisted index, which is
/// why the list participates in the tokenizer fingerprint.
#[rustfmt::skip]
pub static ENGLISH_STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "am",
    "an", "and", "any", "are", "aren't", "as", "at", "be",
    "because", "been", "before", "being", "below", "between", "both", "but",
    "by", "can't", "cannot", "could", "couldn't", "did", "didn't", "do",
    "does", "doesn't", "doing", "don't", "down", "during", "each", "few",
    "for", "from", "further", "had", "hadn't", "has", "hasn't", "have",
    "haven't", "having", "he", "he'd", "he'll", "he's", "her", "here",
    "here's", "hers", "herself", "him", "himself", "his", "how", "how's",
    "i", "i'd", "i'll", "i'm", "i've", "if", "in", "into",
    "is", "isn't", "it", "it's", "its", "itself", "let's", "me",
    "more", "most", "mustn't", "my", "myself", "no", "nor", "not",
    "of", "off", "on", "once", "only", "or", "other", "ought",
    "our", "ours", "ourselves", "out", "over", "own", "same", "shan't",
    "she", "she'd", "she'll", "she's", "should", "shouldn't", "so", "some",
    "such", "than", "that", "that's", "the", "their", "theirs", "them",
    "themselves", "then", "there", "there's", "these", "they", "they'd", "they'll",
    "they're", "they've", "this", "those", "through", "to", "too", "under",
    "until", "up", "very", "was", "wasn't", "we", "we'd", "we'll",
    "we're", "we've", "were", "weren't", "what", "what's", "when", "when's",
    "where", "where's", "which", "while", "who", "who's", "whom", "why",
    "why's", "with", "won't", "would", "wouldn't", "you", "you'd", "you'll",
    "you're", "you've", "your", "yours", "yourself", "yourselves",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| ENGLISH_STOPWORDS.iter().copied().collect());

/// Shared English stemmer instance.
///
/// `rust_stemmers::Stemmer` is stateless after construction, so a single
/// process-wide instance serves all tokenizers.
fn stemmer() -> &'static Stemmer {
    static STEMMER: OnceLock<Stemmer> = OnceLock::new();
    STEMMER.get_or_init(|| Stemmer::create(Algorithm::English))
}

/// Tokenizer configuration.
///
/// Persisted inside the index file so a loaded index can rebuild the exact
/// tokenizer it was built with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenizerConfig {
    /// Remove stopwords before stemming. Default: true.
    pub use_stopwords: bool,
    /// Minimum token length in characters; shorter tokens are dropped.
    /// Default: 2.
    pub min_token_len: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            use_stopwords: true,
            min_token_len: 2,
        }
    }
}

/// Deterministic text-to-tokens pipeline.
///
/// `tokenize` is a pure function of the input text and the configuration:
/// same input, same output, never fails. Empty input yields an empty vec.
///
/// # Example
///
/// ```rust
/// use quarry_retrieve::tokenize::Tokenizer;
///
/// let tokenizer = Tokenizer::new();
/// assert_eq!(tokenizer.tokenize("running runs"), vec!["run", "run"]);
/// assert_eq!(tokenizer.tokenize(""), Vec::<String>::new());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Tokenizer {
    config: TokenizerConfig,
}

impl Tokenizer {
    /// Create a tokenizer with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a tokenizer with an explicit configuration.
    pub fn with_config(config: TokenizerConfig) -> Self {
        Self { config }
    }

    /// The configuration this tokenizer was built with.
    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    /// Tokenize text into the normalized, stemmed token stream.
    ///
    /// Order follows the original occurrence order; duplicates are kept
    /// (positions matter downstream).
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lowered = text.to_ascii_lowercase();
        lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|raw| raw.chars().count() >= self.config.min_token_len)
            .filter(|raw| !self.config.use_stopwords || !STOPWORD_SET.contains(raw))
            .map(|raw| stemmer().stem(raw).into_owned())
            .collect()
    }

    /// CRC32 fingerprint of the tokenizer configuration.
    ///
    /// Covers the stopword list contents, the stemmer identity, and the
    /// minimum token length. Two tokenizers with equal fingerprints produce
    /// bit-identical token streams, so the fingerprint is the compatibility
    /// check persisted into index artifacts.
    pub fn fingerprint(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(b"snowball-english");
        hasher.update(&(self.config.min_token_len as u64).to_le_bytes());
        if self.config.use_stopwords {
            for word in ENGLISH_STOPWORDS {
                hasher.update(word.as_bytes());
                hasher.update(b"\0");
            }
        }
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_tokenization() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("Hello, World!");

        assert!(tokens.contains(&"hello".to_string()));
        assert!(tokens.contains(&"world".to_string()));
        assert!(!tokens.join("").contains(','));
    }

    #[test]
    fn test_stopword_removal() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("This is a book about the python");

        assert!(!tokens.contains(&"is".to_string()));
        assert!(!tokens.contains(&"the".to_string()));
        assert!(tokens.contains(&"book".to_string()));
        assert!(tokens.contains(&"python".to_string()));
    }

    #[test]
    fn test_stemming() {
        let tokenizer = Tokenizer::new();

        assert_eq!(tokenizer.tokenize("running runs"), vec!["run", "run"]);

        let tokens = tokenizer.tokenize("computation computer");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0], tokens[1]);
    }

    #[test]
    fn test_empty_input() {
        let tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.tokenize(""), Vec::<String>::new());
        assert_eq!(tokenizer.tokenize("   \t\n "), Vec::<String>::new());
    }

    #[test]
    fn test_short_tokens_dropped() {
        let tokenizer = Tokenizer::new();
        // "c" is below the minimum length; "99" survives as a digit token
        let tokens = tokenizer.tokenize("c 99 rust");
        assert!(!tokens.contains(&"c".to_string()));
        assert!(tokens.contains(&"99".to_string()));
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let tokenizer = Tokenizer::new();
        let tokens = tokenizer.tokenize("apple banana apple");
        assert_eq!(tokens, vec!["appl", "banana", "appl"]);
    }

    #[test]
    fn test_stopwords_can_be_disabled() {
        let tokenizer = Tokenizer::with_config(TokenizerConfig {
            use_stopwords: false,
            ..TokenizerConfig::default()
        });
        let tokens = tokenizer.tokenize("the cat");
        assert!(tokens.contains(&"the".to_string()));
    }

    #[test]
    fn test_fingerprint_tracks_config() {
        let default = Tokenizer::new();
        let no_stopwords = Tokenizer::with_config(TokenizerConfig {
            use_stopwords: false,
            ..TokenizerConfig::default()
        });

        assert_eq!(default.fingerprint(), Tokenizer::new().fingerprint());
        assert_ne!(default.fingerprint(), no_stopwords.fingerprint());
    }
}
