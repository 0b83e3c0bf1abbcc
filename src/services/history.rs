//! History manager: linear undo/redo over whole-log snapshots.
//!
//! DESIGN
//! ======
//! Two stacks of full snapshots per board; a restore replaces the whole
//! log. The push ordering (current log onto the opposite stack before
//! restoring) keeps the history linear: redo is valid exactly until the
//! next fresh mutation, because `append` and `remove` clear the redo stack.

use std::mem;

use crate::state::{BoardState, Stroke};

/// Restore the most recent undo snapshot and return the restored log.
/// An empty stack is a legitimate idle state, not an error.
pub fn undo(board: &mut BoardState) -> Option<Vec<Stroke>> {
    let snapshot = board.undo.pop()?;
    let current = mem::replace(&mut board.strokes, snapshot);
    board.redo.push(current);
    board.touch();
    Some(board.strokes.clone())
}

/// Restore the most recent redo snapshot and return the restored log.
pub fn redo(board: &mut BoardState) -> Option<Vec<Stroke>> {
    let snapshot = board.redo.pop()?;
    let current = mem::replace(&mut board.strokes, snapshot);
    board.undo.push(current);
    board.touch();
    Some(board.strokes.clone())
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
