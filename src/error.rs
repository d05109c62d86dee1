//! Error taxonomy for parsing, path lookup, and tree edits.

use thiserror::Error;

/// A PGN input that could not be turned into a move tree.
///
/// `offset` is the character offset of the offending token within the input
/// string (not a line number, so comments with embedded newlines do not skew
/// reporting). Parse failures abort the whole parse; no partial tree is ever
/// returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at offset {offset}")]
pub struct ParseError {
    pub offset: usize,
    pub kind: ParseErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("unknown token `{0}`")]
    UnknownToken(String),
    #[error("illegal move `{san}`: {reason}")]
    IllegalMove { san: String, reason: String },
    #[error("`(` does not follow a move")]
    VariationWithoutMove,
    #[error("unterminated variation")]
    UnterminatedVariation,
    #[error("unmatched `)`")]
    UnmatchedVariationClose,
    #[error("variations nested deeper than {0} levels")]
    NestingTooDeep(usize),
    #[error("unterminated comment")]
    UnterminatedComment,
    #[error("malformed tag pair")]
    MalformedTag,
    #[error("invalid FEN header: {0}")]
    InvalidFen(String),
}

/// A path argument that does not resolve to a node.
///
/// For caller-supplied paths (`go_to`, `Command::GoToPath`) this is a
/// recoverable, reportable error. Internally generated paths must always
/// resolve; seeing this for one of those means a navigation bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("no node at path {path:?}")]
pub struct PathNotFound {
    pub path: Vec<usize>,
}

/// A structural edit that cannot be applied to the tree.
///
/// Pure navigation commands never produce this (boundaries are no-ops), with
/// the single exception of `GoToPath` handing over a dangling path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    #[error(transparent)]
    PathNotFound(#[from] PathNotFound),
    #[error("illegal move `{san}`: {reason}")]
    IllegalMove { san: String, reason: String },
    #[error("stored position does not parse as FEN: {0}")]
    InvalidPosition(String),
    #[error("the root node cannot be deleted")]
    DeleteRoot,
    #[error("the root node is not a variation")]
    PromoteRoot,
}
