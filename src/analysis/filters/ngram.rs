use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Emits character n-grams of each token at the token's position.
/// Useful for scripts without word separators, where the standard
/// tokenizer yields one token per ideograph.
pub struct NGramFilter {
    pub min_gram: usize,
    pub max_gram: usize,
}

impl NGramFilter {
    pub fn new(min_gram: usize, max_gram: usize) -> Self {
        NGramFilter {
            min_gram: min_gram.max(1),
            max_gram: max_gram.max(min_gram.max(1)),
        }
    }
}

impl TokenFilter for NGramFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        let mut result = Vec::new();

        for token in tokens {
            let chars: Vec<(usize, char)> = token.text.char_indices().collect();

            for n in self.min_gram..=self.max_gram.min(chars.len()) {
                for i in 0..=chars.len() - n {
                    let start = chars[i].0;
                    let end = chars.get(i + n).map(|(b, _)| *b).unwrap_or(token.text.len());

                    result.push(Token {
                        text: token.text[start..end].to_string(),
                        position: token.position,
                        offset: token.offset + start,
                        length: end - start,
                    });
                }
            }
        }

        result
    }

    fn name(&self) -> &str {
        "ngram"
    }
}
