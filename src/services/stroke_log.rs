//! Stroke log: append-only draw operations for one board.
//!
//! DESIGN
//! ======
//! Functions operate on a board already locked by the caller, so a whole
//! read-modify-broadcast sequence stays atomic per board. Every mutation
//! records the pre-mutation snapshot for undo and invalidates redo.

use crate::state::{BoardState, Stroke};

/// Append a stroke to the log.
pub fn append(board: &mut BoardState, stroke: Stroke) {
    board.undo.push(board.strokes.clone());
    board.redo.clear();
    board.strokes.push(stroke);
    board.touch();
}

/// Remove a stroke by ID and return the resulting log.
///
/// An absent ID is a no-op (`None`): deletes racing in from concurrent
/// erasers are expected, and a no-op must not burn an undo step.
pub fn remove(board: &mut BoardState, stroke_id: &str) -> Option<Vec<Stroke>> {
    let index = board.strokes.iter().position(|s| s.id == stroke_id)?;
    board.undo.push(board.strokes.clone());
    board.redo.clear();
    board.strokes.remove(index);
    board.touch();
    Some(board.strokes.clone())
}

/// Full ordered log, used to hydrate a joining connection.
#[must_use]
pub fn read(board: &BoardState) -> Vec<Stroke> {
    board.strokes.clone()
}

#[cfg(test)]
#[path = "stroke_log_test.rs"]
mod tests;
