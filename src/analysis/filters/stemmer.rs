use rust_stemmers::{Algorithm, Stemmer};
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Snowball stemming. Tokens containing digits are left alone so
/// numeric and code-like terms stay exact.
pub struct StemmerFilter {
    stemmer: Stemmer,
}

impl StemmerFilter {
    pub fn new(algorithm: Algorithm) -> Self {
        StemmerFilter {
            stemmer: Stemmer::create(algorithm),
        }
    }
}

impl TokenFilter for StemmerFilter {
    fn filter(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        for token in tokens.iter_mut() {
            if token.text.chars().any(|c| c.is_ascii_digit()) {
                continue;
            }
            let stemmed = self.stemmer.stem(&token.text).into_owned();
            token.text = stemmed;
        }
        tokens
    }

    fn name(&self) -> &str {
        "stemmer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stems_words_not_numbers() {
        let tokens = vec![
            Token::new("engines".to_string(), 0, 0),
            Token::new("searching".to_string(), 1, 8),
            Token::new("v2s".to_string(), 2, 18),
        ];
        let stemmed = StemmerFilter::new(Algorithm::English).filter(tokens);
        let texts: Vec<&str> = stemmed.iter().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["engin", "search", "v2s"]);
    }
}
