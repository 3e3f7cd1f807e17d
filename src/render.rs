//! Walks a [`ParseTree`] against a [`Context`], producing rendered text
//! (spec §4.3).

use crate::context::Context;
use crate::error::RenderError;
use crate::parser;
use crate::partial::PartialLoader;
use crate::path::Path;
use crate::tree::{ParseTree, Segment};
use crate::value::{Lambda, Value};

/// The render-time collaborators threaded through every recursive call:
/// the partial loader, the escape/literal functions, and the strictness
/// mode. Bundled so `render` doesn't grow a five-parameter signature on
/// every recursive invocation (lambdas re-parsing and sections iterating
/// both recurse).
pub(crate) struct RenderCtx<'a> {
    pub loader: &'a dyn PartialLoader,
    pub escape: &'a dyn Fn(&str) -> String,
    pub literal: &'a dyn Fn(&str) -> String,
    pub strict: bool,
}

/// Renders `tree` against `context`, appending output to a fresh `String`.
pub(crate) fn render(
    tree: &ParseTree,
    context: &mut Context,
    rc: &RenderCtx,
) -> Result<String, RenderError> {
    let mut out = String::new();
    render_into(tree, context, rc, &mut out)?;
    Ok(out)
}

fn render_into(
    tree: &ParseTree,
    context: &mut Context,
    rc: &RenderCtx,
    out: &mut String,
) -> Result<(), RenderError> {
    for segment in tree {
        match segment {
            Segment::Literal(text) => out.push_str(text),

            Segment::Interpolation { name, escaped } => {
                render_interpolation(name, *escaped, context, rc, out)?;
            }

            Segment::Section {
                name,
                body,
                raw_body,
                delims,
            } => {
                render_section(name, body, raw_body, delims, context, rc, out)?;
            }

            Segment::Inverted { name, body } => {
                let resolved = resolve(name, context, rc)?;
                if !resolved.is_truthy() {
                    render_into(body, context, rc, out)?;
                }
            }

            Segment::Partial { name, indent } => {
                render_partial(name, indent, context, rc, out)?;
            }
        }
    }
    Ok(())
}

/// Resolves `path` against `context`, surfacing a dotted-navigation type
/// mismatch as a `RenderError` in strict mode and silently falling back to
/// `Null` in lenient mode.
fn resolve(path: &Path, context: &Context, rc: &RenderCtx) -> Result<Value, RenderError> {
    match context.lookup_path_checked(path) {
        Ok(value) => Ok(value),
        Err(_) if rc.strict => Err(RenderError::ContextTypeError(path.to_string())),
        Err(_) => {
            log::debug!("dotted lookup {path} navigated into a non-map value, using null");
            Ok(Value::Null)
        }
    }
}

fn render_interpolation(
    name: &Path,
    escaped: bool,
    context: &mut Context,
    rc: &RenderCtx,
    out: &mut String,
) -> Result<(), RenderError> {
    let resolved = resolve(name, context, rc)?;

    let text = match resolved {
        Value::Lambda(Lambda::Interpolation(f)) => {
            let produced = f();
            match coerce_lambda_result(produced, &name.to_string()) {
                Ok(rendered) => render_lambda_text(&rendered, "{{", "}}", context, rc)?,
                Err(err) => recover(err, rc)?,
            }
        }
        // Mixing lambda shapes at the wrong site yields the empty string.
        Value::Lambda(Lambda::Section(_)) => String::new(),
        other => coerce_plain(&other),
    };

    let converted = if escaped {
        (rc.escape)(&text)
    } else {
        (rc.literal)(&text)
    };
    out.push_str(&converted);
    Ok(())
}

fn render_section(
    name: &Path,
    body: &ParseTree,
    raw_body: &str,
    delims: &(String, String),
    context: &mut Context,
    rc: &RenderCtx,
    out: &mut String,
) -> Result<(), RenderError> {
    let resolved = resolve(name, context, rc)?;
    if !resolved.is_truthy() {
        return Ok(());
    }

    match resolved {
        Value::Lambda(Lambda::Section(f)) => {
            let produced = f(raw_body);
            match coerce_lambda_result(produced, &name.to_string()) {
                Ok(rendered) => {
                    let text = render_lambda_text(&rendered, &delims.0, &delims.1, context, rc)?;
                    out.push_str(&text);
                }
                Err(err) => out.push_str(&recover(err, rc)?),
            }
        }
        // Mixing lambda shapes at the wrong site yields the empty string.
        Value::Lambda(Lambda::Interpolation(_)) => {}
        Value::List(items) => {
            for item in items {
                let rendered = context.scoped(item, |ctx| render(body, ctx, rc))?;
                out.push_str(&rendered);
            }
        }
        other => {
            let rendered = context.scoped(other, |ctx| render(body, ctx, rc))?;
            out.push_str(&rendered);
        }
    }
    Ok(())
}

fn render_partial(
    name: &str,
    indent: &str,
    context: &mut Context,
    rc: &RenderCtx,
    out: &mut String,
) -> Result<(), RenderError> {
    let template = match rc.loader.load(name) {
        Some(template) => template,
        None => {
            if rc.strict {
                return Err(RenderError::PartialNotFoundStrict(name.to_string()));
            }
            log::warn!("partial {name:?} not found, rendering empty");
            return Ok(());
        }
    };

    let indented = indent_lines(&template, indent);
    match parser::parse(&indented) {
        Ok(tree) => {
            let rendered = render(&tree, context, rc)?;
            out.push_str(&rendered);
        }
        Err(err) => {
            log::warn!("partial {name:?} failed to parse, rendering empty: {err}");
        }
    }
    Ok(())
}

/// Re-parses lambda-produced text at the given delimiters and renders it
/// against the current context. A malformed result is treated the same
/// way any other recoverable render failure is: empty output in lenient
/// mode, a `LambdaReturnedNonText` error in strict mode.
fn render_lambda_text(
    text: &str,
    otag: &str,
    ctag: &str,
    context: &mut Context,
    rc: &RenderCtx,
) -> Result<String, RenderError> {
    match parser::parse_with_delimiters(text, otag, ctag) {
        Ok(tree) => render(&tree, context, rc),
        Err(err) => {
            log::warn!("lambda-produced template failed to parse: {err}");
            if rc.strict {
                Err(RenderError::LambdaReturnedNonText(text.to_string()))
            } else {
                Ok(String::new())
            }
        }
    }
}

fn recover(err: RenderError, rc: &RenderCtx) -> Result<String, RenderError> {
    if rc.strict {
        Err(err)
    } else {
        log::warn!("{err}, rendering empty");
        Ok(String::new())
    }
}

/// Coerces a non-lambda resolved value to text for interpolation.
/// `List`/`Map`/`Host` are not directly interpolable and render empty.
fn coerce_plain(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_text(),
        Value::Text(s) => s.clone(),
        Value::List(_) | Value::Map(_) | Value::Host(_) | Value::Lambda(_) => String::new(),
    }
}

/// Coerces a lambda's return value to text. Unlike [`coerce_plain`], a
/// non-text-like return (`List`/`Map`/`Lambda`/`Host`) is a `RenderError`:
/// a lambda is documented to return text-like values, so this is a
/// contract violation rather than an ordinary empty interpolation.
fn coerce_lambda_result(value: Value, name: &str) -> Result<String, RenderError> {
    match value {
        Value::Null => Ok(String::new()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => Ok(n.to_text()),
        Value::Text(s) => Ok(s),
        Value::List(_) | Value::Map(_) | Value::Lambda(_) | Value::Host(_) => {
            Err(RenderError::LambdaReturnedNonText(name.to_string()))
        }
    }
}

/// Prepends `indent` to the start of `text` and after every interior line
/// terminator, excluding empty lines (a line consisting of nothing but the
/// terminator itself, including a trailing empty line).
fn indent_lines(text: &str, indent: &str) -> String {
    if indent.is_empty() {
        return text.to_string();
    }

    let mut out = String::with_capacity(text.len() + indent.len() * 4);
    let mut at_line_start = true;
    for ch in text.chars() {
        if at_line_start && ch != '\n' {
            out.push_str(indent);
        }
        out.push(ch);
        at_line_start = ch == '\n';
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn indents_every_nonempty_line_including_first() {
        assert_eq!(indent_lines("Hi,\nAda\n", "  "), "  Hi,\n  Ada\n");
    }

    #[test]
    fn indent_skips_blank_lines() {
        assert_eq!(indent_lines("a\n\nb\n", "> "), "> a\n\n> b\n");
    }

    #[test]
    fn empty_indent_is_identity() {
        assert_eq!(indent_lines("a\nb\n", ""), "a\nb\n");
    }

    #[test]
    fn coerce_plain_renders_false_as_lowercase() {
        assert_eq!(coerce_plain(&Value::Bool(false)), "false");
    }

    #[test]
    fn coerce_plain_list_is_empty() {
        assert_eq!(coerce_plain(&Value::List(vec![Value::from(1i64)])), "");
    }
}
