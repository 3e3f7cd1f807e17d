use crate::path::Path;

/// An ordered sequence of [`Segment`]s produced by the parser.
///
/// Parse trees are immutable once built and may be rendered any number of
/// times, including concurrently against independent contexts.
pub type ParseTree = Vec<Segment>;

/// A node in a parse tree.
///
/// Context-lookup sites (`Interpolation`, `Section`, `Inverted`) carry the
/// already-validated [`Path`] the parser produced rather than the source
/// text: the render engine walks `path.keys` directly instead of
/// re-splitting a name string on every render. `Partial`'s name is a plain
/// loader key, not a context path, so it stays a `String`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Verbatim text emitted as-is.
    Literal(String),

    /// `{{name}}`, `{{&name}}`, or `{{{name}}}`.
    Interpolation { name: Path, escaped: bool },

    /// `{{#name}}...{{/name}}`.
    Section {
        name: Path,
        body: ParseTree,
        raw_body: String,
        delims: (String, String),
    },

    /// `{{^name}}...{{/name}}`.
    Inverted { name: Path, body: ParseTree },

    /// `{{>name}}`, with the horizontal-whitespace indentation captured
    /// from a standalone partial tag's line (empty otherwise).
    Partial { name: String, indent: String },
}
