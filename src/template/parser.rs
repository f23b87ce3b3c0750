//! Structural parser for query templates.
//!
//! Consumes the token stream from the lexer in a single left-to-right pass,
//! keeping an explicit stack of open optional blocks. There is no
//! backtracking: every token is looked at once and segment order always
//! matches source order.

use std::sync::LazyLock;

use chumsky::span::SimpleSpan;
use regex::Regex;

use super::ast::{first_placeholder, OptionalBlock, PlaceholderRef, Segment, Template};
use super::lexer::{self, Token};

/// Byte range in the template source.
pub type Span = std::ops::Range<usize>;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// A malformed template.
///
/// Templates are never repaired: any structural problem fails the whole
/// parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("Malformed template at {span:?}: {message}")]
    Lex { span: Span, message: String },

    #[error("Malformed template: placeholder opened at {span:?} is never closed")]
    UnclosedPlaceholder { span: Span },

    #[error("Malformed template: optional block opened at {span:?} is never closed")]
    UnclosedBlock { span: Span },

    #[error("Malformed template: `{token}` at {span:?} has no matching opener")]
    UnexpectedCloser { token: &'static str, span: Span },

    #[error("Malformed template: invalid placeholder name {name:?} at {span:?}")]
    InvalidPlaceholderName { name: String, span: Span },

    #[error("Malformed template: optional block at {span:?} contains no placeholder")]
    MissingTrigger { span: Span },

    #[error("Malformed template: second fallback separator at {span:?}")]
    DuplicateSeparator { span: Span },
}

impl ParseError {
    /// The source range the error points at.
    pub fn span(&self) -> Span {
        match self {
            ParseError::Lex { span, .. }
            | ParseError::UnclosedPlaceholder { span }
            | ParseError::UnclosedBlock { span }
            | ParseError::UnexpectedCloser { span, .. }
            | ParseError::InvalidPlaceholderName { span, .. }
            | ParseError::MissingTrigger { span }
            | ParseError::DuplicateSeparator { span } => span.clone(),
        }
    }
}

fn to_span(span: SimpleSpan) -> Span {
    span.start..span.end
}

/// Parse a raw template string.
///
/// # Example
///
/// ```
/// use dashql::template::{parse, Segment};
///
/// let template = parse("WHERE id = '{{website_id}}' [[AND {{created_at}}]]").unwrap();
/// assert_eq!(template.segments.len(), 4);
/// assert!(matches!(template.segments[3], Segment::Optional(_)));
/// ```
pub fn parse(source: &str) -> Result<Template, ParseError> {
    let tokens = lexer::lex(source).map_err(|errs| {
        let (span, message) = errs
            .first()
            .map(|e| (to_span(*e.span()), e.to_string()))
            .unwrap_or_else(|| (0..source.len(), "unrecognised input".to_string()));
        ParseError::Lex { span, message }
    })?;

    let mut builder = Builder::default();
    let mut tokens = tokens.into_iter();
    while let Some((token, span)) = tokens.next() {
        builder.token(token, to_span(span), &mut tokens)?;
    }
    builder.finish()
}

/// An optional block whose closing `]]` has not been seen yet.
#[derive(Debug)]
struct BlockFrame {
    open: Span,
    present: Vec<Segment>,
    fallback: Option<Vec<Segment>>,
}

/// Fallback text trailing a `[[ ... --]]` block, collected up to end of line.
#[derive(Debug)]
struct LineFallback {
    trigger: String,
    segments: Vec<Segment>,
}

#[derive(Debug, Default)]
struct Builder {
    root: Vec<Segment>,
    stack: Vec<BlockFrame>,
    line_fallback: Option<LineFallback>,
}

impl Builder {
    fn token<'src, I>(&mut self, token: Token<'src>, span: Span, rest: &mut I) -> Result<(), ParseError>
    where
        I: Iterator<Item = (Token<'src>, SimpleSpan)>,
    {
        match token {
            Token::Text(text) => self.text(text),
            Token::PlaceholderOpen => {
                let placeholder = parse_placeholder(span, rest)?;
                match &mut self.line_fallback {
                    Some(pending) => pending.segments.push(placeholder),
                    None => self.target().push(placeholder),
                }
            }
            Token::PlaceholderClose => {
                return Err(ParseError::UnexpectedCloser { token: "}}", span });
            }
            Token::BlockOpen => {
                self.finish_line_fallback();
                self.stack.push(BlockFrame {
                    open: span,
                    present: Vec::new(),
                    fallback: None,
                });
            }
            Token::BlockClose => {
                self.finish_line_fallback();
                self.close_block(span)?;
            }
            Token::Separator => {
                self.finish_line_fallback();
                match self.stack.last_mut() {
                    // Outside a block `--` is an ordinary SQL comment
                    None => push_literal(&mut self.root, "--"),
                    Some(frame) if frame.fallback.is_some() => {
                        return Err(ParseError::DuplicateSeparator { span });
                    }
                    Some(frame) => frame.fallback = Some(Vec::new()),
                }
            }
        }
        Ok(())
    }

    fn text(&mut self, text: &str) {
        let Some(pending) = &mut self.line_fallback else {
            push_literal(self.target(), text);
            return;
        };
        match text.find('\n') {
            Some(newline) => {
                push_literal(&mut pending.segments, &text[..newline]);
                self.finish_line_fallback();
                push_literal(self.target(), &text[newline..]);
            }
            None => push_literal(&mut pending.segments, text),
        }
    }

    /// The segment list new content is appended to.
    fn target(&mut self) -> &mut Vec<Segment> {
        match self.stack.last_mut() {
            Some(BlockFrame {
                fallback: Some(fallback),
                ..
            }) => fallback,
            Some(frame) => &mut frame.present,
            None => &mut self.root,
        }
    }

    fn close_block(&mut self, close: Span) -> Result<(), ParseError> {
        let frame = self.stack.pop().ok_or(ParseError::UnexpectedCloser {
            token: "]]",
            span: close.clone(),
        })?;
        let trigger = first_placeholder(&frame.present)
            .map(str::to_string)
            .ok_or(ParseError::MissingTrigger {
                span: frame.open.start..close.end,
            })?;

        let Some(fallback) = frame.fallback else {
            self.target().push(Segment::Optional(OptionalBlock {
                trigger,
                negate: false,
                segments: frame.present,
            }));
            return Ok(());
        };

        self.target().push(Segment::Optional(OptionalBlock {
            trigger: trigger.clone(),
            negate: false,
            segments: trim_segments(frame.present),
        }));

        let fallback = trim_segments(fallback);
        if fallback.is_empty() {
            self.line_fallback = Some(LineFallback {
                trigger,
                segments: Vec::new(),
            });
        } else {
            self.target().push(Segment::Optional(OptionalBlock {
                trigger,
                negate: true,
                segments: fallback,
            }));
        }
        Ok(())
    }

    fn finish_line_fallback(&mut self) {
        let Some(pending) = self.line_fallback.take() else {
            return;
        };
        let segments = trim_segments(pending.segments);
        if segments.is_empty() {
            return;
        }
        self.target().push(Segment::Optional(OptionalBlock {
            trigger: pending.trigger,
            negate: true,
            segments,
        }));
    }

    fn finish(mut self) -> Result<Template, ParseError> {
        self.finish_line_fallback();
        if let Some(frame) = self.stack.first() {
            return Err(ParseError::UnclosedBlock {
                span: frame.open.clone(),
            });
        }
        Ok(Template::new(self.root))
    }
}

/// Parse the remainder of a placeholder after its `{{`.
fn parse_placeholder<'src, I>(open: Span, rest: &mut I) -> Result<Segment, ParseError>
where
    I: Iterator<Item = (Token<'src>, SimpleSpan)>,
{
    let unclosed = || ParseError::UnclosedPlaceholder { span: open.clone() };

    let (name, name_span) = match rest.next() {
        Some((Token::Text(text), span)) => (text, to_span(span)),
        Some((Token::PlaceholderClose, span)) => {
            return Err(ParseError::InvalidPlaceholderName {
                name: String::new(),
                span: open.start..span.end,
            });
        }
        _ => return Err(unclosed()),
    };

    match rest.next() {
        Some((Token::PlaceholderClose, _)) => {}
        _ => return Err(unclosed()),
    }

    let trimmed = name.trim();
    if !NAME_PATTERN.is_match(trimmed) {
        return Err(ParseError::InvalidPlaceholderName {
            name: trimmed.to_string(),
            span: name_span,
        });
    }
    Ok(Segment::Placeholder(PlaceholderRef::new(trimmed)))
}

/// Append literal text, merging with a preceding literal.
fn push_literal(segments: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Literal(last)) = segments.last_mut() {
        last.push_str(text);
    } else {
        segments.push(Segment::Literal(text.to_string()));
    }
}

/// Strip leading whitespace from the first literal and trailing whitespace
/// from the last one, dropping literals left empty.
fn trim_segments(mut segments: Vec<Segment>) -> Vec<Segment> {
    if let Some(Segment::Literal(first)) = segments.first_mut() {
        *first = first.trim_start().to_string();
        if first.is_empty() {
            segments.remove(0);
        }
    }
    if let Some(Segment::Literal(last)) = segments.last_mut() {
        *last = last.trim_end().to_string();
        if last.is_empty() {
            segments.pop();
        }
    }
    segments
}
