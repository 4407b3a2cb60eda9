//! Pure reorder algorithm behind drag-and-drop moves.
//!
//! Both cases follow list splice semantics: the dragged issue is removed
//! first, then inserted at the destination index. The destination index is
//! clamped to `[0, len]`, where `len` is the destination column length after
//! the removal. Every returned column is renumbered so its ranks are exactly
//! `0..n`.

use super::{Issue, IssueMove, IssueStatus, MoveError};

/// Outcome of reordering one or two columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reordered {
    /// The move was a no-op.
    Unchanged,
    /// The issue moved within its column.
    Within {
        /// Renumbered column.
        column: Vec<Issue>,
    },
    /// The issue moved to another column.
    Across {
        /// Renumbered source column, one issue shorter.
        source: Vec<Issue>,
        /// Renumbered destination column, one issue longer.
        destination: Vec<Issue>,
    },
}

/// Computes the new contents of the columns touched by `issue_move`.
///
/// `destination` is ignored for same-column moves.
///
/// # Errors
///
/// Returns [`MoveError::SourceOutOfRange`] when no issue sits at the source
/// index.
pub fn reorder(
    source: &[Issue],
    destination: &[Issue],
    issue_move: &IssueMove,
) -> Result<Reordered, MoveError> {
    if issue_move.is_noop() {
        return Ok(Reordered::Unchanged);
    }

    let from = issue_move.source.index;
    if from >= source.len() {
        return Err(MoveError::SourceOutOfRange {
            status: issue_move.source.status,
            index: from,
            len: source.len(),
        });
    }

    if issue_move.is_same_column() {
        let column = reorder_within(
            source,
            issue_move.source.status,
            from,
            issue_move.destination.index,
        );
        return Ok(Reordered::Within { column });
    }

    let (source_column, destination_column) = transfer(
        source,
        destination,
        issue_move.source.status,
        issue_move.destination.status,
        from,
        issue_move.destination.index,
    );
    Ok(Reordered::Across {
        source: source_column,
        destination: destination_column,
    })
}

/// Clamps a drop index to the length of the destination column after
/// removal of the dragged issue.
#[must_use]
pub const fn clamp_destination(index: usize, len_after_removal: usize) -> usize {
    if index > len_after_removal {
        len_after_removal
    } else {
        index
    }
}

fn reorder_within(column: &[Issue], status: IssueStatus, from: usize, to: usize) -> Vec<Issue> {
    let mut reordered = column.to_vec();
    let moved = reordered.remove(from);
    let at = clamp_destination(to, reordered.len());
    reordered.insert(at, moved);
    renumber(&mut reordered, status);
    reordered
}

fn transfer(
    source: &[Issue],
    destination: &[Issue],
    source_status: IssueStatus,
    destination_status: IssueStatus,
    from: usize,
    to: usize,
) -> (Vec<Issue>, Vec<Issue>) {
    let mut remaining = source.to_vec();
    let moved = remaining.remove(from);
    let mut receiving = destination.to_vec();
    let at = clamp_destination(to, receiving.len());
    receiving.insert(at, moved);
    renumber(&mut remaining, source_status);
    renumber(&mut receiving, destination_status);
    (remaining, receiving)
}

/// Assigns every issue in `column` the status `status` and its list index as
/// rank.
pub(crate) fn renumber(column: &mut [Issue], status: IssueStatus) {
    for (index, issue) in column.iter_mut().enumerate() {
        let rank = u32::try_from(index).unwrap_or(u32::MAX);
        issue.place(status, rank);
    }
}
