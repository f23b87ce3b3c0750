//! Lexer for query templates.
//!
//! Splits raw template text into delimiter tokens and literal text runs.
//! The lexer never fails on ordinary SQL: anything that is not one of the
//! five markers is collected into a `Text` token verbatim.

use chumsky::prelude::*;

/// A token in a query template.
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'src> {
    /// `{{`
    PlaceholderOpen,
    /// `}}`
    PlaceholderClose,
    /// `[[`
    BlockOpen,
    /// `]]`
    BlockClose,
    /// `--`
    Separator,
    /// A run of literal text containing no marker.
    Text(&'src str),
}

impl Token<'_> {
    /// The exact source text this token was lexed from.
    pub fn as_source(&self) -> &str {
        match self {
            Token::PlaceholderOpen => "{{",
            Token::PlaceholderClose => "}}",
            Token::BlockOpen => "[[",
            Token::BlockClose => "]]",
            Token::Separator => "--",
            Token::Text(s) => s,
        }
    }
}

impl std::fmt::Display for Token<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Text(s) => write!(f, "text {:?}", s),
            other => write!(f, "`{}`", other.as_source()),
        }
    }
}

/// Create a lexer for query templates.
///
/// Markers are matched greedily left to right, so `[[[` lexes as `[[`
/// followed by the text `[`.
pub fn lexer<'src>(
) -> impl Parser<'src, &'src str, Vec<(Token<'src>, SimpleSpan)>, extra::Err<Rich<'src, char>>> {
    let marker = choice((
        just("{{").to(Token::PlaceholderOpen),
        just("}}").to(Token::PlaceholderClose),
        just("[[").to(Token::BlockOpen),
        just("]]").to(Token::BlockClose),
        just("--").to(Token::Separator),
    ));

    // Literal text: one or more characters that do not start a marker
    let text = any()
        .and_is(marker.clone().not())
        .repeated()
        .at_least(1)
        .to_slice()
        .map(Token::Text);

    marker
        .or(text)
        .map_with(|tok, e| (tok, e.span()))
        .repeated()
        .collect()
        .then_ignore(end())
}

/// Lex a template into tokens.
///
/// Returns Ok with the token list on success, or Err with the lexer errors.
pub fn lex(source: &str) -> Result<Vec<(Token<'_>, SimpleSpan)>, Vec<Rich<'_, char>>> {
    let (tokens, errs) = lexer().parse(source).into_output_errors();
    if errs.is_empty() {
        Ok(tokens.unwrap_or_default())
    } else {
        Err(errs)
    }
}
