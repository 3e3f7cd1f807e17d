//! A logic-less Mustache template parser and render engine.
//!
//! The pipeline is [`parser::parse`] (template text to [`tree::ParseTree`])
//! followed by [`Engine::render`] (parse tree plus a [`value::Value`]
//! context to rendered text). Everything a caller plugs in — partial
//! resolution, HTML escaping, strictness — is a collaborator on [`Engine`],
//! not a global.

pub use context::Context;
pub use error::{ParseError, Position, RenderError};
pub use partial::{MapLoader, PartialLoader};
pub use path::Path;
pub use tree::{ParseTree, Segment};
pub use value::{Bindable, Lambda, Number, Value};

pub mod context;
pub mod error;
pub mod escape;
pub mod parser;
pub mod partial;
pub mod path;
mod render;
pub mod tree;
pub mod value;

/// The render-time configuration: how to resolve partials, how to escape or
/// pass through interpolated text, and whether missing data is an error.
///
/// An `Engine` owns no template state; it is cheap to build once and reuse
/// across any number of `render` calls.
pub struct Engine<'a> {
    loader: &'a dyn PartialLoader,
    escape: &'a dyn Fn(&str) -> String,
    literal: &'a dyn Fn(&str) -> String,
    strict: bool,
}

impl<'a> Engine<'a> {
    /// An engine with no partials, the default HTML escape function, and
    /// lenient error handling (missing data renders empty).
    pub fn new() -> Self {
        Engine {
            loader: &(),
            escape: &escape::default_escape,
            literal: &escape::default_literal,
            strict: false,
        }
    }

    /// Supplies a partial loader. Defaults to one that resolves nothing.
    pub fn with_partials(mut self, loader: &'a dyn PartialLoader) -> Self {
        self.loader = loader;
        self
    }

    /// Overrides the escape function used for `{{name}}` interpolation.
    pub fn with_escape(mut self, escape: &'a dyn Fn(&str) -> String) -> Self {
        self.escape = escape;
        self
    }

    /// Overrides the pass-through function used for `{{{name}}}` and
    /// `{{&name}}` interpolation.
    pub fn with_literal(mut self, literal: &'a dyn Fn(&str) -> String) -> Self {
        self.literal = literal;
        self
    }

    /// Switches on strict mode: a missing partial, a lambda that returns a
    /// non-text value, or a dotted name that navigates into a non-map value
    /// surfaces as a [`RenderError`] instead of rendering empty.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Renders `tree` against `context`.
    pub fn render(&self, tree: &ParseTree, context: &mut Context) -> Result<String, RenderError> {
        let rc = render::RenderCtx {
            loader: self.loader,
            escape: self.escape,
            literal: self.literal,
            strict: self.strict,
        };
        render::render(tree, context, &rc)
    }

    /// Parses `template` and renders it against a fresh context rooted at
    /// `data` in one step, for callers who don't need the parse tree
    /// independently.
    pub fn render_str(&self, template: &str, data: Value) -> Result<String, RenderError> {
        let tree = parser::parse(template)?;
        let mut context = Context::new(data);
        self.render(&tree, &mut context)
    }
}

impl Default for Engine<'_> {
    fn default() -> Self {
        Engine::new()
    }
}

/// The "no partials configured" default: every lookup misses.
impl PartialLoader for () {
    fn load(&self, _name: &str) -> Option<String> {
        None
    }
}
