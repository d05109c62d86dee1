//! Pure navigation over `(tree, path)`.
//!
//! Every function is total over valid inputs: tree boundaries are stable
//! no-op states, never errors. When a node has several children, "next"
//! always picks index 0; which branch the caller is inside lives entirely in
//! the path, so switching branches is an explicit [`go_to`] with a non-zero
//! index at the branch point.

use crate::error::PathNotFound;
use crate::tree::{node_at, Node, Path};

/// Advance one move along the main-line child, or stay put at a terminal
/// node (end of line is not an error).
pub fn next(root: &Node, path: &[usize]) -> Path {
    let mut next_path = path.to_vec();
    match node_at(root, path) {
        Ok(node) if !node.children.is_empty() => next_path.push(0),
        _ => {}
    }
    next_path
}

/// Step back to the parent, or stay at the root.
pub fn previous(path: &[usize]) -> Path {
    let mut prev = path.to_vec();
    prev.pop();
    prev
}

/// The root path.
pub fn start() -> Path {
    Vec::new()
}

/// Follow first children from `path` until a node with no children.
///
/// This lands on the end of the main line reachable from the current
/// branch choices, not necessarily the longest variation.
pub fn end(root: &Node, path: &[usize]) -> Path {
    let mut end_path = path.to_vec();
    let Ok(mut node) = node_at(root, path) else {
        return end_path;
    };
    while let Some(first) = node.children.first() {
        end_path.push(0);
        node = first;
    }
    end_path
}

/// Validate an explicit path; validation is the only work.
pub fn go_to(root: &Node, path: &[usize]) -> Result<Path, PathNotFound> {
    node_at(root, path)?;
    Ok(path.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(fen: &str) -> Node {
        Node::new(fen.to_string())
    }

    /// root -> a -> (b -> d, c)
    fn tree() -> Node {
        let mut b = leaf("b");
        b.children = vec![leaf("d")];
        let mut a = leaf("a");
        a.children = vec![b, leaf("c")];
        let mut root = leaf("root");
        root.children = vec![a];
        root
    }

    #[test]
    fn test_next_descends_main_line() {
        let root = tree();
        assert_eq!(next(&root, &[]), vec![0]);
        assert_eq!(next(&root, &[0]), vec![0, 0]);
    }

    #[test]
    fn test_next_is_noop_at_terminal() {
        let root = tree();
        assert_eq!(next(&root, &[0, 1]), vec![0, 1]);
        assert_eq!(next(&root, &[0, 0, 0]), vec![0, 0, 0]);
    }

    #[test]
    fn test_previous_is_noop_at_root() {
        assert_eq!(previous(&[]), Vec::<usize>::new());
        assert_eq!(previous(&[0, 1]), vec![0]);
    }

    #[test]
    fn test_end_follows_first_children_only() {
        let root = tree();
        assert_eq!(end(&root, &start()), vec![0, 0, 0]);
        // From inside the variation, end stays on that branch.
        assert_eq!(end(&root, &[0, 1]), vec![0, 1]);
    }

    #[test]
    fn test_end_equals_next_fixed_point() {
        let root = tree();
        let mut path = start();
        loop {
            let stepped = next(&root, &path);
            if stepped == path {
                break;
            }
            path = stepped;
        }
        assert_eq!(path, end(&root, &start()));
    }

    #[test]
    fn test_go_to_validates() {
        let root = tree();
        assert_eq!(go_to(&root, &[0, 1]).unwrap(), vec![0, 1]);
        let err = go_to(&root, &[0, 2]).unwrap_err();
        assert_eq!(err.path, vec![0, 2]);
    }
}
