//! The command reducer: the single mutation surface over [`TreeState`].
//!
//! Every call produces a new snapshot; the input state is never touched.
//! Navigation commands are total (tree boundaries are no-ops) except for
//! `GoToPath`, which reports a dangling caller-supplied path. Structural
//! edits may refuse with [`EditError`], and always remap the cursor so the
//! current path keeps resolving.

use crate::error::EditError;
use crate::nav;
use crate::state::{Headers, TreeState};
use crate::tree::{node_at, node_at_mut, Node, Path};
use shakmaty::{fen::Fen, san::SanPlus, Chess, EnPassantMode, Position};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    GoToNext,
    GoToPrevious,
    GoToStart,
    GoToEnd,
    GoToPath(Path),
    /// Play a SAN move at the cursor: descend into a matching child if the
    /// move already exists, otherwise append a new variation and descend.
    MakeMove { san: String },
    /// Remove the subtree at a path. The root cannot be deleted.
    DeleteNode(Path),
    /// Make the child at a path the first among its siblings.
    PromoteVariation(Path),
    /// Replace the comment on the node at the cursor.
    SetComment(Option<String>),
    /// Replace the annotation glyphs on the node at the cursor.
    SetNags(Vec<u8>),
    /// The only way headers change; navigation never touches them.
    SetHeaders(Headers),
}

pub fn reduce(state: &TreeState, command: Command) -> Result<TreeState, EditError> {
    match command {
        Command::GoToNext => Ok(with_current(state, nav::next(&state.root, &state.current))),
        Command::GoToPrevious => Ok(with_current(state, nav::previous(&state.current))),
        Command::GoToStart => Ok(with_current(state, nav::start())),
        Command::GoToEnd => Ok(with_current(state, nav::end(&state.root, &state.current))),
        Command::GoToPath(path) => {
            let current = nav::go_to(&state.root, &path)?;
            Ok(with_current(state, current))
        }
        Command::MakeMove { san } => make_move(state, &san),
        Command::DeleteNode(path) => delete_node(state, &path),
        Command::PromoteVariation(path) => promote_variation(state, &path),
        Command::SetComment(comment) => edit_current(state, |node| node.comment = comment),
        Command::SetNags(nags) => edit_current(state, |node| node.nags = nags),
        Command::SetHeaders(headers) => Ok(TreeState {
            root: Arc::clone(&state.root),
            current: state.current.clone(),
            headers,
        }),
    }
}

/// New snapshot sharing the tree, with the cursor moved.
fn with_current(state: &TreeState, current: Path) -> TreeState {
    TreeState {
        root: Arc::clone(&state.root),
        current,
        headers: state.headers.clone(),
    }
}

/// New snapshot around an edited clone of the tree.
fn with_tree(state: &TreeState, root: Node, current: Path) -> TreeState {
    TreeState {
        root: Arc::new(root),
        current,
        headers: state.headers.clone(),
    }
}

fn edit_current(
    state: &TreeState,
    apply: impl FnOnce(&mut Node),
) -> Result<TreeState, EditError> {
    let mut root = Node::clone(&state.root);
    apply(node_at_mut(&mut root, &state.current)?);
    Ok(with_tree(state, root, state.current.clone()))
}

fn make_move(state: &TreeState, san: &str) -> Result<TreeState, EditError> {
    let node = state.try_current_node()?;
    let san_plus = SanPlus::from_ascii(san.as_bytes()).map_err(|e| EditError::IllegalMove {
        san: san.to_string(),
        reason: e.to_string(),
    })?;

    // Re-playing a move that is already a child just descends into it.
    if let Some(index) = node
        .children
        .iter()
        .position(|c| c.san.as_ref().map_or(false, |s| s.san == san_plus.san))
    {
        let mut current = state.current.clone();
        current.push(index);
        return Ok(with_current(state, current));
    }

    let fen = node
        .fen
        .parse::<Fen>()
        .map_err(|e| EditError::InvalidPosition(e.to_string()))?;
    let mut pos: Chess = fen
        .into_position(state.headers.castling_mode())
        .map_err(|e| EditError::InvalidPosition(e.to_string()))?;
    let m = san_plus
        .san
        .to_move(&pos)
        .map_err(|e| EditError::IllegalMove {
            san: san.to_string(),
            reason: e.to_string(),
        })?;
    pos.play_unchecked(&m);
    let next_fen = Fen::from_position(pos, EnPassantMode::Legal).to_string();

    let mut root = Node::clone(&state.root);
    let mut current = state.current.clone();
    let parent = node_at_mut(&mut root, &current)?;
    current.push(parent.children.len());
    parent.children.push(Node::with_move(next_fen, san_plus));
    Ok(with_tree(state, root, current))
}

fn delete_node(state: &TreeState, path: &[usize]) -> Result<TreeState, EditError> {
    let Some((&leaf_index, parent_path)) = path.split_last() else {
        return Err(EditError::DeleteRoot);
    };
    // Validate before cloning so dangling caller paths are just reported.
    node_at(&state.root, path)?;

    let mut root = Node::clone(&state.root);
    node_at_mut(&mut root, parent_path)?.children.remove(leaf_index);

    let depth = parent_path.len();
    let mut current = state.current.clone();
    if current.get(..path.len()) == Some(path) {
        // Cursor was inside the removed subtree; clamp to its parent.
        current.truncate(depth);
    } else if current.get(..depth) == Some(parent_path)
        && current.len() > depth
        && current[depth] > leaf_index
    {
        // Later siblings shifted down by one.
        current[depth] -= 1;
    }
    Ok(with_tree(state, root, current))
}

fn promote_variation(state: &TreeState, path: &[usize]) -> Result<TreeState, EditError> {
    let Some((&leaf_index, parent_path)) = path.split_last() else {
        return Err(EditError::PromoteRoot);
    };
    node_at(&state.root, path)?;
    if leaf_index == 0 {
        // Already the main line.
        return Ok(state.clone());
    }

    let mut root = Node::clone(&state.root);
    let parent = node_at_mut(&mut root, parent_path)?;
    let child = parent.children.remove(leaf_index);
    parent.children.insert(0, child);

    let depth = parent_path.len();
    let mut current = state.current.clone();
    if current.get(..depth) == Some(parent_path) && current.len() > depth {
        let selected = current[depth];
        current[depth] = match selected {
            s if s == leaf_index => 0,
            s if s < leaf_index => s + 1,
            s => s,
        };
    }
    Ok(with_tree(state, root, current))
}
