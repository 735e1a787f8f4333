//! Query parser and language utilities

use std::fmt;

use derive_more::with_trait::{Display, Error};
use graphql_parser::Pos;

/// A parsed, owned query document.
pub type Document = graphql_parser::query::Document<'static, String>;

/// Error while parsing a GraphQL query.
///
/// Carries the rendered message of the underlying parser, which already
/// includes the offending line and column.
#[derive(Clone, Debug, Display, Eq, Error, PartialEq)]
#[display("{message}")]
pub struct ParseError {
    message: String,
}

impl ParseError {
    /// Message describing what went wrong.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<graphql_parser::query::ParseError> for ParseError {
    fn from(e: graphql_parser::query::ParseError) -> Self {
        Self {
            message: e.to_string().trim_end().to_owned(),
        }
    }
}

/// Parses the given query `source` into an owned [`Document`].
pub fn parse_document_source(source: &str) -> Result<Document, ParseError> {
    graphql_parser::parse_query::<String>(source)
        .map(|doc| doc.into_static())
        .map_err(Into::into)
}

/// A reference to a line and column in an input source file.
///
/// Both `line` and `column` are zero-based; they are reported one-based when
/// serialized into a response.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct SourcePosition {
    line: usize,
    col: usize,
}

impl SourcePosition {
    #[doc(hidden)]
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }

    #[doc(hidden)]
    pub fn new_origin() -> Self {
        Self { line: 0, col: 0 }
    }

    /// The line of the character in the input source.
    ///
    /// Zero-based index: the first line is line zero.
    pub fn line(&self) -> usize {
        self.line
    }

    /// The column of the character in the input source.
    ///
    /// Zero-based index: the first column is column zero.
    pub fn column(&self) -> usize {
        self.col
    }
}

impl From<Pos> for SourcePosition {
    fn from(pos: Pos) -> Self {
        Self {
            line: pos.line.saturating_sub(1),
            col: pos.column.saturating_sub(1),
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.col + 1)
    }
}
