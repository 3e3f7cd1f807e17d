use thiserror::Error;

/// A byte offset into the template source a `ParseError` occurred at.
pub type Position = usize;

/// A failure to parse a template into a parse tree.
///
/// Parse errors always abort parsing; there is no lenient-mode recovery for
/// a malformed template, only for missing data at render time (see
/// [`RenderError`]).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    /// Reserved for an unclosed `{{` that never reaches a matching `}}`.
    /// The scanner never actually constructs this: an unterminated `{{`
    /// simply fails to match the tag regex, so the bytes fall through to
    /// the trailing-literal branch instead, matching the reference
    /// engine's behavior of treating it as plain text rather than an error.
    #[error("unterminated tag at byte {0}")]
    UnterminatedTag(Position),

    #[error("unknown tag sigil at byte {0}")]
    UnknownSigil(Position),

    #[error("empty tag name at byte {0}")]
    EmptyName(Position),

    #[error("dotted name with an empty segment at byte {0}")]
    BadDottedName(Position),

    #[error("section close {close:?} does not match open {open:?} (closing tag at byte {position})")]
    MismatchedClose {
        open: String,
        close: String,
        position: Position,
    },

    #[error("malformed delimiter change {0:?} at byte {1}")]
    BadDelimiterChange(String, Position),
}

/// A recoverable-by-default failure while rendering a parse tree.
///
/// In lenient mode (the default) these are swallowed, emitting empty output
/// at the offending site; in strict mode they surface from
/// [`crate::Engine::render`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RenderError {
    #[error("partial {0:?} was not found")]
    PartialNotFoundStrict(String),

    #[error("lambda at {0:?} returned a non-text value that could not be coerced")]
    LambdaReturnedNonText(String),

    #[error("dotted navigation into a non-map value at {0:?}")]
    ContextTypeError(String),

    /// A template failed to parse before rendering could begin, surfaced
    /// through [`crate::Engine::render_str`].
    #[error(transparent)]
    Parse(#[from] ParseError),
}
