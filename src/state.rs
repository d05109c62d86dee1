//! Game-level state: header metadata and the tree-plus-cursor aggregate.

use crate::error::PathNotFound;
use crate::tree::{node_at, Node, Path};
use shakmaty::CastlingMode;
use std::sync::Arc;

/// Which side faces the viewer. Presentation collaborators read this off the
/// headers; navigation never touches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    White,
    Black,
}

/// Game metadata, independent of the move tree. Populated from the tag
/// section; mutated only through `Command::SetHeaders`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Headers {
    pub event: String,
    pub site: String,
    pub date: String,
    pub round: String,
    pub white: String,
    pub black: String,
    pub white_elo: Option<u32>,
    pub black_elo: Option<u32>,
    /// Game result as written ("1-0", "0-1", "1/2-1/2" or "*").
    pub result: String,
    /// Starting position when the game does not begin at the standard one.
    pub fen: Option<String>,
    pub variant: Option<String>,
    pub orientation: Orientation,
    /// Tags outside the standard roster, in first-seen order.
    pub extra: Vec<(String, String)>,
}

impl Headers {
    /// Castling rules implied by the `Variant` tag (matched case-insensitively).
    pub fn castling_mode(&self) -> CastlingMode {
        match &self.variant {
            Some(v) if v.eq_ignore_ascii_case("chess960") => CastlingMode::Chess960,
            _ => CastlingMode::Standard,
        }
    }
}

/// An immutable snapshot of a loaded game: the move tree, the cursor into
/// it, and the headers.
///
/// Invariant: `current` always resolves to a node under `root`. Every
/// constructor and every reducer transition restores this before returning.
/// The root is reference-counted so navigation snapshots share the tree;
/// structural edits clone it first, so observably each action yields a fresh
/// snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeState {
    pub root: Arc<Node>,
    pub current: Path,
    pub headers: Headers,
}

impl TreeState {
    /// Wrap a freshly built tree; the cursor starts at the root.
    pub fn new(root: Node, headers: Headers) -> Self {
        TreeState {
            root: Arc::new(root),
            current: Vec::new(),
            headers,
        }
    }

    /// The node under the cursor.
    ///
    /// Panics if the current-path invariant has been broken, which would be
    /// a bug in this crate rather than a caller error.
    pub fn current_node(&self) -> &Node {
        node_at(&self.root, &self.current).expect("current path resolves to a node")
    }

    /// Checked variant of [`current_node`](Self::current_node) for callers
    /// that assemble `TreeState` values by hand.
    pub fn try_current_node(&self) -> Result<&Node, PathNotFound> {
        node_at(&self.root, &self.current)
    }

    /// FEN of the position under the cursor, ready for a renderer.
    pub fn current_fen(&self) -> &str {
        &self.current_node().fen
    }
}

impl Default for TreeState {
    /// A root-only tree at the standard starting position.
    fn default() -> Self {
        let headers = Headers {
            result: "*".to_string(),
            ..Headers::default()
        };
        TreeState::new(Node::start_position(), headers)
    }
}
