use std::fmt;

use crate::error::ParseError;

/// A validated dotted name, e.g. `a.b.c` or the special name `.`.
///
/// The parser produces these from raw tag text and stores them directly in
/// [`crate::tree::Segment`]; the render engine walks `keys`/`is_dot` off the
/// already-validated structure instead of re-splitting a name string on
/// every render. [`Path::to_string`] is used only where a name is needed as
/// text, e.g. a loader key or an error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub keys: Vec<String>,
}

impl Path {
    pub fn new(keys: Vec<String>) -> Self {
        Path { keys }
    }

    /// Parses and validates a tag name: trims surrounding whitespace,
    /// rejects empty names, and rejects dotted names with an empty segment
    /// (e.g. `a..b` or a trailing/leading dot other than the bare `.`).
    pub fn parse(text: &str, position: usize) -> Result<Self, ParseError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ParseError::EmptyName(position));
        }
        if text == "." {
            return Ok(Path::new(vec![".".to_string()]));
        }

        let keys: Vec<String> = text.split('.').map(str::to_string).collect();
        if keys.iter().any(|key| key.is_empty()) {
            return Err(ParseError::BadDottedName(position));
        }
        if keys.len() > 1 && keys.iter().any(|key| key.chars().any(char::is_whitespace)) {
            return Err(ParseError::BadDottedName(position));
        }
        Ok(Path::new(keys))
    }

    /// Whether this path is the special self-reference `.`.
    pub fn is_dot(&self) -> bool {
        self.keys.len() == 1 && self.keys[0] == "."
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.keys.join("."))
    }
}
