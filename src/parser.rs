//! Compiles a template string into a [`ParseTree`].
//!
//! The classic engine this crate descends from parses sections by
//! recursing and throwing an end-of-section exception carrying the
//! collected body and resume position. This parser instead uses an
//! explicit recursive descent that returns `(body, raw_body, end_index)`
//! and propagates a mismatched close as an ordinary [`ParseError`] value.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ParseError;
use crate::path::Path;
use crate::tree::{ParseTree, Segment};

const DEFAULT_OTAG: &str = "{{";
const DEFAULT_CTAG: &str = "}}";

static DEFAULT_TAG_RE: Lazy<Regex> = Lazy::new(|| build_tag_regex(DEFAULT_OTAG, DEFAULT_CTAG));

/// Compiles a template into a [`ParseTree`] using the default `{{ }}`
/// delimiters.
pub fn parse(template: &str) -> Result<ParseTree, ParseError> {
    parse_with_delimiters(template, DEFAULT_OTAG, DEFAULT_CTAG)
}

/// Compiles a template into a [`ParseTree`], starting from the given
/// delimiter pair. The render engine uses this to re-parse a section
/// lambda's returned text with the delimiters captured at the section tag.
pub fn parse_with_delimiters(
    template: &str,
    otag: &str,
    ctag: &str,
) -> Result<ParseTree, ParseError> {
    let mut parser = Parser::new(otag, ctag);
    let (tree, _raw, _end) = parser.parse_block(template, 0, None)?;
    Ok(tree)
}

/// Builds the tag-matching regex for a delimiter pair, per the grammar in
/// spec §6. `content` and `name` use `[\s\S]` to span newlines; `delims`
/// and `raw_name` deliberately do not, matching a single-line delimiter
/// change or triple-brace name.
fn build_tag_regex(otag: &str, ctag: &str) -> Regex {
    let otag = regex::escape(otag);
    let ctag = regex::escape(ctag);
    let pattern = format!(
        r"(?x)
        (?P<content>[\s\S]*?)
        (?P<whitespace>[ \t]*)
        {otag}\s*
        (?:
            (?P<change>=)\s*(?P<delims>.+?)\s*=
            |(?P<raw>\{{)\s*(?P<raw_name>.+?)\s*\}}
            |(?P<tag>[!>&/#^]?)\s*(?P<name>[\s\S]+?)
        )
        \s*{ctag}
        "
    );
    Regex::new(&pattern).expect("generated tag regex is always valid")
}

struct Parser {
    otag: String,
    ctag: String,
    tag_re: Regex,
}

impl Parser {
    fn new(otag: &str, ctag: &str) -> Self {
        let tag_re = if otag == DEFAULT_OTAG && ctag == DEFAULT_CTAG {
            DEFAULT_TAG_RE.clone()
        } else {
            build_tag_regex(otag, ctag)
        };
        Parser {
            otag: otag.to_string(),
            ctag: ctag.to_string(),
            tag_re,
        }
    }

    fn set_delimiters(&mut self, otag: String, ctag: String) {
        log::trace!("delimiter change to {:?} {:?}", otag, ctag);
        self.tag_re = build_tag_regex(&otag, &ctag);
        self.otag = otag;
        self.ctag = ctag;
    }

    /// Parses a run of segments starting at `index`.
    ///
    /// When `closing` is `Some(name)`, this is a section/inverted body:
    /// parsing stops at the first `{{/name}}` tag (validated against
    /// `name`) and returns the body, its raw source text, and the byte
    /// offset just past the closing tag. Reaching end-of-template first,
    /// or finding a `/` tag with a different name, is a `MismatchedClose`
    /// error.
    ///
    /// When `closing` is `None`, this is the top-level template: parsing
    /// runs to end-of-template, and any `/` tag encountered is itself a
    /// `MismatchedClose` error (there is no open section to close).
    fn parse_block(
        &mut self,
        template: &str,
        mut index: usize,
        closing: Option<&str>,
    ) -> Result<(ParseTree, String, usize), ParseError> {
        let mut tree = ParseTree::new();
        let block_start = index;

        loop {
            let caps = match self.tag_re.captures_at(template, index) {
                Some(caps) => caps,
                None => {
                    if let Some(open) = closing {
                        return Err(ParseError::MismatchedClose {
                            open: open.to_string(),
                            close: "end of template".to_string(),
                            position: template.len(),
                        });
                    }
                    let rest = &template[index..];
                    if !rest.is_empty() {
                        tree.push(Segment::Literal(rest.to_string()));
                    }
                    return Ok((tree, String::new(), template.len()));
                }
            };

            let whole = caps.get(0).unwrap();
            let content_m = caps.name("content").unwrap();
            let content = content_m.as_str();
            let content_end = content_m.end();
            let raw_whitespace = caps.name("whitespace").map(|m| m.as_str()).unwrap_or("");
            let tag_start = whole.start();
            let mut tag_end = whole.end();

            if !content.is_empty() {
                tree.push(Segment::Literal(content.to_string()));
            }

            let is_interpolating = caps.name("raw").is_some()
                || matches!(caps.name("tag").map(|m| m.as_str()), Some("") | Some("&"));

            let did_begin_line = content_end == 0
                || matches!(
                    template.as_bytes().get(content_end - 1),
                    Some(b'\r') | Some(b'\n')
                );
            let did_end_line = tag_end == template.len()
                || matches!(template.as_bytes().get(tag_end), Some(b'\r') | Some(b'\n'));
            let standalone = did_begin_line && did_end_line && !is_interpolating;

            if standalone {
                log::trace!("standalone tag at byte {tag_start}, stripping surrounding whitespace");
                if matches!(template.as_bytes().get(tag_end), Some(b'\r')) {
                    tag_end += 1;
                }
                if matches!(template.as_bytes().get(tag_end), Some(b'\n')) {
                    tag_end += 1;
                }
            } else if !raw_whitespace.is_empty() {
                tree.push(Segment::Literal(raw_whitespace.to_string()));
            }
            let indent = if standalone {
                raw_whitespace.to_string()
            } else {
                String::new()
            };

            if caps.name("change").is_some() {
                let delims_text = caps.name("delims").unwrap().as_str();
                let mut parts = delims_text.split_whitespace();
                match (parts.next(), parts.next(), parts.next()) {
                    (Some(o), Some(c), None) => {
                        self.set_delimiters(o.to_string(), c.to_string());
                    }
                    _ => {
                        return Err(ParseError::BadDelimiterChange(
                            delims_text.to_string(),
                            tag_start,
                        ))
                    }
                }
                index = tag_end;
                continue;
            }

            if caps.name("raw").is_some() {
                let name = Path::parse(caps.name("raw_name").unwrap().as_str(), tag_start)?;
                tree.push(Segment::Interpolation {
                    name,
                    escaped: false,
                });
                index = tag_end;
                continue;
            }

            let sigil = caps.name("tag").map(|m| m.as_str()).unwrap_or("");
            let name_text = caps.name("name").unwrap().as_str();

            match sigil {
                "!" => {
                    log::trace!("comment at byte {tag_start}");
                }
                ">" => {
                    let name = Path::parse(name_text, tag_start)?;
                    tree.push(Segment::Partial {
                        name: name.to_string(),
                        indent,
                    });
                }
                "&" => {
                    let name = Path::parse(name_text, tag_start)?;
                    tree.push(Segment::Interpolation {
                        name,
                        escaped: false,
                    });
                }
                "" => {
                    let name = Path::parse(name_text, tag_start)?;
                    tree.push(Segment::Interpolation {
                        name,
                        escaped: true,
                    });
                }
                "#" | "^" => {
                    let name = Path::parse(name_text, tag_start)?;
                    let closing_name = name.to_string();
                    let delims = (self.otag.clone(), self.ctag.clone());
                    let (body, raw_body, resume) =
                        self.parse_block(template, tag_end, Some(&closing_name))?;
                    if sigil == "#" {
                        tree.push(Segment::Section {
                            name,
                            body,
                            raw_body,
                            delims,
                        });
                    } else {
                        tree.push(Segment::Inverted { name, body });
                    }
                    index = resume;
                    continue;
                }
                "/" => {
                    let name = Path::parse(name_text, tag_start)?.to_string();
                    return match closing {
                        Some(open) if open == name => {
                            let raw_body = template[block_start..content_end].to_string();
                            Ok((tree, raw_body, tag_end))
                        }
                        Some(open) => Err(ParseError::MismatchedClose {
                            open: open.to_string(),
                            close: name,
                            position: tag_start,
                        }),
                        None => Err(ParseError::MismatchedClose {
                            open: String::new(),
                            close: name,
                            position: tag_start,
                        }),
                    };
                }
                _ => return Err(ParseError::UnknownSigil(tag_start)),
            }

            index = tag_end;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(tree: &ParseTree) -> Vec<&str> {
        tree.iter()
            .filter_map(|s| match s {
                Segment::Literal(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn literal_only_template() {
        let tree = parse("Hello, World!").unwrap();
        assert_eq!(tree, vec![Segment::Literal("Hello, World!".to_string())]);
    }

    #[test]
    fn escaped_and_unescaped_interpolation() {
        let tree = parse("{{x}} | {{{x}}}").unwrap();
        assert_eq!(
            tree,
            vec![
                Segment::Interpolation {
                    name: Path::new(vec!["x".to_string()]),
                    escaped: true,
                },
                Segment::Literal(" | ".to_string()),
                Segment::Interpolation {
                    name: Path::new(vec!["x".to_string()]),
                    escaped: false,
                },
            ]
        );
    }

    #[test]
    fn ampersand_is_unescaped() {
        let tree = parse("{{& x }}").unwrap();
        assert_eq!(
            tree,
            vec![Segment::Interpolation {
                name: Path::new(vec!["x".to_string()]),
                escaped: false,
            }]
        );
    }

    #[test]
    fn standalone_section_strips_its_lines() {
        let tree = parse("A\n{{#items}}\n- {{.}}\n{{/items}}\nB\n").unwrap();
        match &tree[..] {
            [Segment::Literal(a), Segment::Section { name, body, raw_body, .. }, Segment::Literal(b)] =>
            {
                assert_eq!(a, "A\n");
                assert_eq!(name.to_string(), "items");
                assert_eq!(raw_body, "- {{.}}\n");
                assert_eq!(b, "B\n");
                assert_eq!(
                    body,
                    &vec![
                        Segment::Literal("- ".to_string()),
                        Segment::Interpolation {
                            name: Path::new(vec![".".to_string()]),
                            escaped: true,
                        },
                        Segment::Literal("\n".to_string()),
                    ]
                );
            }
            other => panic!("unexpected tree shape: {other:?}"),
        }
    }

    #[test]
    fn standalone_comment_is_fully_removed() {
        let tree = parse("before\n{{! a comment }}\nafter\n").unwrap();
        assert_eq!(
            tree,
            vec![
                Segment::Literal("before\n".to_string()),
                Segment::Literal("after\n".to_string()),
            ]
        );
    }

    #[test]
    fn non_standalone_tag_keeps_surrounding_whitespace() {
        let tree = parse("{{! c }} x\n").unwrap();
        assert_eq!(names(&tree), vec![" x\n"]);
    }

    #[test]
    fn standalone_partial_captures_indent() {
        let tree = parse("  {{>greet}}\n").unwrap();
        assert_eq!(
            tree,
            vec![Segment::Partial {
                name: "greet".to_string(),
                indent: "  ".to_string(),
            }]
        );
    }

    #[test]
    fn non_standalone_partial_has_empty_indent() {
        let tree = parse("x {{>greet}} y").unwrap();
        assert_eq!(
            tree,
            vec![
                Segment::Literal("x ".to_string()),
                Segment::Partial {
                    name: "greet".to_string(),
                    indent: String::new(),
                },
                Segment::Literal(" y".to_string()),
            ]
        );
    }

    #[test]
    fn delimiter_change_applies_to_remainder() {
        let tree = parse("{{=<% %>=}}<%name%>{{literal}}").unwrap();
        assert_eq!(
            tree,
            vec![
                Segment::Interpolation {
                    name: Path::new(vec!["name".to_string()]),
                    escaped: true,
                },
                Segment::Literal("{{literal}}".to_string()),
            ]
        );
    }

    #[test]
    fn mismatched_close_is_an_error() {
        let err = parse("{{#one}}test{{/two}}").unwrap_err();
        assert_eq!(
            err,
            ParseError::MismatchedClose {
                open: "one".to_string(),
                close: "two".to_string(),
                position: 12,
            }
        );
    }

    #[test]
    fn unexpected_close_at_top_level_is_an_error() {
        let err = parse("{{/oops}}").unwrap_err();
        assert_eq!(
            err,
            ParseError::MismatchedClose {
                open: String::new(),
                close: "oops".to_string(),
                position: 0,
            }
        );
    }

    #[test]
    fn unterminated_section_is_an_error() {
        let err = parse("{{#one}}test").unwrap_err();
        assert_eq!(
            err,
            ParseError::MismatchedClose {
                open: "one".to_string(),
                close: "end of template".to_string(),
                position: 12,
            }
        );
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = parse("{{ }}").unwrap_err();
        assert_eq!(err, ParseError::EmptyName(0));
    }

    #[test]
    fn dotted_name_round_trips() {
        let tree = parse("{{ name.first }}").unwrap();
        assert_eq!(
            tree,
            vec![Segment::Interpolation {
                name: Path::new(vec!["name".to_string(), "first".to_string()]),
                escaped: true,
            }]
        );
    }
}
