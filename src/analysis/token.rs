/// A normalized term with its place in the source value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub position: u32,     // Term index within the field, gaps allowed
    pub offset: usize,     // Byte offset in the original value
    pub length: usize,     // Bytes of the original slice
}

impl Token {
    pub fn new(text: String, position: u32, offset: usize) -> Self {
        let length = text.len();
        Token {
            text,
            position,
            offset,
            length,
        }
    }

    /// A whole unanalyzed value as one term
    pub fn verbatim(value: impl Into<String>, position: u32) -> Self {
        Token::new(value.into(), position, 0)
    }

    /// Same token moved `gap` positions later
    pub fn shifted(mut self, gap: u32) -> Self {
        self.position += gap;
        self
    }
}
