//! The move tree: nodes keyed by path, each holding a position snapshot and
//! the move that produced it.

use crate::comment::Evaluation;
use crate::error::PathNotFound;
use shakmaty::san::SanPlus;
use shakmaty::{fen::Fen, Chess, EnPassantMode};

/// Address of a node in the tree: `path[i]` selects which child to descend
/// into at depth `i`. The empty path is the root. Index 0 is always the main
/// line; higher indices are variations in insertion order.
pub type Path = Vec<usize>;

/// One position in the move tree, reached by zero (root) or one move from
/// its parent. Nodes are exclusively owned by their parent and never mutated
/// after the snapshot holding them is built.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// FEN of the position at this node. Computed once, never rewritten.
    pub fen: String,
    /// The SAN move that produced this position; `None` only at the root.
    pub san: Option<SanPlus>,
    pub children: Vec<Node>,
    pub comment: Option<String>,
    /// Numeric annotation glyphs ($1..$6 also cover the `!`/`?` suffixes).
    pub nags: Vec<u8>,
    /// Remaining clock time in seconds, from a `[%clk]` annotation.
    pub clock: Option<f32>,
    /// Engine evaluation, from a `[%eval]` annotation.
    pub eval: Option<Evaluation>,
}

impl Node {
    pub fn new(fen: String) -> Self {
        Node {
            fen,
            san: None,
            children: Vec::new(),
            comment: None,
            nags: Vec::new(),
            clock: None,
            eval: None,
        }
    }

    pub fn with_move(fen: String, san: SanPlus) -> Self {
        Node {
            san: Some(san),
            ..Node::new(fen)
        }
    }

    /// Root node for the standard starting position.
    pub fn start_position() -> Self {
        let fen = Fen::from_position(Chess::default(), EnPassantMode::Legal);
        Node::new(fen.to_string())
    }

    /// Walk the first-child spine starting below this node.
    pub fn main_line(&self) -> impl Iterator<Item = &Node> {
        let mut next = self.children.first();
        std::iter::from_fn(move || {
            let node = next?;
            next = node.children.first();
            Some(node)
        })
    }
}

/// Resolve `path` against `root`, descending `children[path[i]]` at each
/// step. Callers inside this crate only pass paths known to resolve; an
/// error here on an internally generated path is a navigation bug.
pub fn node_at<'a>(root: &'a Node, path: &[usize]) -> Result<&'a Node, PathNotFound> {
    let mut node = root;
    for &index in path {
        node = node.children.get(index).ok_or_else(|| PathNotFound {
            path: path.to_vec(),
        })?;
    }
    Ok(node)
}

/// Mutable variant of [`node_at`], used by tree-editing commands.
pub fn node_at_mut<'a>(root: &'a mut Node, path: &[usize]) -> Result<&'a mut Node, PathNotFound> {
    let mut node = root;
    for &index in path {
        node = node.children.get_mut(index).ok_or_else(|| PathNotFound {
            path: path.to_vec(),
        })?;
    }
    Ok(node)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(fen: &str) -> Node {
        Node::new(fen.to_string())
    }

    fn tree() -> Node {
        // root -> a -> (b, c)
        let mut a = leaf("a");
        a.children = vec![leaf("b"), leaf("c")];
        let mut root = leaf("root");
        root.children = vec![a];
        root
    }

    #[test]
    fn test_empty_path_is_root() {
        let root = tree();
        assert_eq!(node_at(&root, &[]).unwrap().fen, "root");
    }

    #[test]
    fn test_descend_child_indices() {
        let root = tree();
        assert_eq!(node_at(&root, &[0]).unwrap().fen, "a");
        assert_eq!(node_at(&root, &[0, 0]).unwrap().fen, "b");
        assert_eq!(node_at(&root, &[0, 1]).unwrap().fen, "c");
    }

    #[test]
    fn test_out_of_range_reports_full_path() {
        let root = tree();
        let err = node_at(&root, &[0, 2]).unwrap_err();
        assert_eq!(err.path, vec![0, 2]);
        assert!(node_at(&root, &[1]).is_err());
    }

    #[test]
    fn test_main_line_follows_first_children() {
        let root = tree();
        let fens: Vec<&str> = root.main_line().map(|n| n.fen.as_str()).collect();
        assert_eq!(fens, vec!["a", "b"]);
    }

    #[test]
    fn test_start_position_fen() {
        assert_eq!(
            Node::start_position().fen,
            "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }
}
