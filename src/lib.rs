//! In-memory move-tree model for chess games.
//!
//! Parses PGN (main line plus arbitrarily nested variations) into an
//! immutable tree of positions, and navigates it with integer paths: a path
//! picks a child index at every depth, the empty path is the root, index 0
//! is always the main line. A [`TreeState`] bundles the tree, the cursor
//! path and the game headers; the [`reduce`] function is the single entry
//! point through which UI events (next/previous/start/end, branch jumps,
//! edits) produce new snapshots.
//!
//! ```
//! use pgn_tree::{parse_pgn, reduce, Command};
//!
//! let state = parse_pgn("1. e4 e5 2. Nf3 Nc6 *").unwrap();
//! let state = reduce(&state, Command::GoToNext).unwrap();
//! assert!(state.current_fen().contains("4P3"));
//! ```

mod comment;
mod error;
mod nav;
mod parse;
mod reducer;
mod state;
mod tree;
mod write;

pub use comment::{parse_comment, Evaluation, ParsedComment};
pub use error::{EditError, ParseError, ParseErrorKind, PathNotFound};
pub use nav::{end, go_to, next, previous, start};
pub use parse::{parse_pgn, parse_pgn_with, ParseOptions};
pub use reducer::{reduce, Command};
pub use state::{Headers, Orientation, TreeState};
pub use tree::{node_at, node_at_mut, Node, Path};
pub use write::write_pgn;
