use std::collections::HashSet;
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

const ENGLISH: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "for", "if", "in",
    "into", "is", "it", "no", "not", "of", "on", "or", "such", "that", "the",
    "their", "then", "there", "these", "they", "this", "to", "was", "will", "with",
];

/// Drops stop words. Survivors keep their positions, so a phrase
/// over the remaining words still needs slop for the gaps.
pub struct StopWordFilter {
    stop_words: HashSet<String>,
}

impl StopWordFilter {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        StopWordFilter {
            stop_words: words.into_iter().map(Into::into).collect(),
        }
    }

    /// The Lucene English stop set
    pub fn english() -> Self {
        StopWordFilter::new(ENGLISH.iter().copied())
    }

    pub fn is_stop_word(&self, word: &str) -> bool {
        self.stop_words.contains(word)
    }
}

impl TokenFilter for StopWordFilter {
    fn filter(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        tokens.retain(|token| !self.is_stop_word(&token.text));
        tokens
    }

    fn name(&self) -> &str {
        "stop_words"
    }
}
