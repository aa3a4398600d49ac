use crate::analysis::token::Token;

/// One stage of an analyzer after tokenization.
/// Filters may drop or rewrite tokens but never renumber positions.
pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token>;

    fn name(&self) -> &str;
}

/// Lowercases token text; for tokenizers that keep case
pub struct LowercaseFilter;

impl TokenFilter for LowercaseFilter {
    fn filter(&self, mut tokens: Vec<Token>) -> Vec<Token> {
        for token in tokens.iter_mut().filter(|t| t.text.chars().any(char::is_uppercase)) {
            token.text = token.text.to_lowercase();
        }
        tokens
    }

    fn name(&self) -> &str {
        "lowercase"
    }
}
