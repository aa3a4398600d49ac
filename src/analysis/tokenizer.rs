use crate::analysis::token::Token;
use unicode_segmentation::UnicodeSegmentation;

/// Pluggable text → positioned terms capability
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<Token>;

    fn name(&self) -> &str;
}

/// Standard Unicode tokenizer (UAX #29 word boundaries)
#[derive(Debug, Clone)]
pub struct StandardTokenizer {
    pub lowercase: bool,
    pub max_token_length: usize,
}

impl Default for StandardTokenizer {
    fn default() -> Self {
        StandardTokenizer {
            lowercase: true,
            max_token_length: 255,
        }
    }
}

impl Tokenizer for StandardTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut position = 0u32;

        for (offset, word) in text.unicode_word_indices() {
            if word.len() > self.max_token_length {
                continue;
            }

            let token_text = if self.lowercase {
                word.to_lowercase()
            } else {
                word.to_string()
            };

            let mut token = Token::new(token_text, position, offset);
            token.length = word.len();
            tokens.push(token);
            position += 1;
        }

        tokens
    }

    fn name(&self) -> &str {
        "standard"
    }
}

/// Splits on Unicode whitespace only, keeps punctuation and case
#[derive(Debug, Clone, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut tokens = Vec::new();
        let mut start: Option<usize> = None;

        for (idx, ch) in text.char_indices() {
            match (ch.is_whitespace(), start) {
                (true, Some(s)) => {
                    tokens.push(Token::new(text[s..idx].to_string(), tokens.len() as u32, s));
                    start = None;
                }
                (false, None) => start = Some(idx),
                _ => {}
            }
        }
        if let Some(s) = start {
            tokens.push(Token::new(text[s..].to_string(), tokens.len() as u32, s));
        }

        tokens
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_tokenizer_positions_and_offsets() {
        let tokens = StandardTokenizer::default().tokenize("Elasticsearch VS Solr, again");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();

        assert_eq!(texts, vec!["elasticsearch", "vs", "solr", "again"]);
        assert_eq!(tokens[2].position, 2);
        assert_eq!(tokens[2].offset, 17);
        assert_eq!(tokens[2].length, 4);
    }

    #[test]
    fn test_whitespace_tokenizer() {
        let tokens = WhitespaceTokenizer.tokenize("  Lucene is\ttool ");
        let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();

        assert_eq!(texts, vec!["Lucene", "is", "tool"]);
        assert_eq!(tokens[1].offset, 9);
        assert_eq!(tokens[2].position, 2);
    }
}
