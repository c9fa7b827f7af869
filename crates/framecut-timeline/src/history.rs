//! The edit log: linear undo/redo plus remote operation reconciliation.
//!
//! Remote operations are replayed against the current local timeline exactly
//! like a local edit. A replay that breaks an invariant is dropped and reported
//! back so its author can resubmit. This is optimistic last-valid-wins, not
//! operational transform: nothing is reordered or rebased.

use std::collections::{HashMap, VecDeque};

use framecut_core::{AuthorId, FrameCutError, InvariantError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::edit::Operation;
use crate::timeline::Timeline;

/// Default maximum undo depth.
pub const DEFAULT_HISTORY_DEPTH: usize = 200;

/// `(author, sequence)` stamp carried by every published operation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationStamp {
    pub author: AuthorId,
    /// Strictly increasing per author
    pub sequence: u64,
}

/// An operation as exchanged on the collaboration feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampedOperation {
    pub stamp: OperationStamp,
    pub op: Operation,
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    op: Operation,
    inverse: Operation,
}

/// Serialized owner of the live timeline.
///
/// All mutations go through `perform`, `undo`, `redo` or `apply_remote`.
#[derive(Debug)]
pub struct EditLog {
    timeline: Timeline,
    /// Applied operations, most recent last.
    history: VecDeque<HistoryEntry>,
    /// Undone operations, most recent last.
    undone: Vec<Operation>,
    max_depth: usize,
    author: AuthorId,
    next_sequence: u64,
    last_remote: HashMap<AuthorId, u64>,
}

impl EditLog {
    /// Create a log over `timeline` for the local `author`.
    pub fn new(timeline: Timeline, author: AuthorId) -> Self {
        Self::with_max_depth(timeline, author, DEFAULT_HISTORY_DEPTH)
    }

    pub fn with_max_depth(timeline: Timeline, author: AuthorId, max_depth: usize) -> Self {
        Self {
            timeline,
            history: VecDeque::new(),
            undone: Vec::new(),
            max_depth: max_depth.max(1),
            author,
            next_sequence: 1,
            last_remote: HashMap::new(),
        }
    }

    /// The current timeline.
    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn author(&self) -> &AuthorId {
        &self.author
    }

    /// Validate and apply a local operation.
    ///
    /// On success the new state replaces the old one, the redo stack is
    /// cleared and the stamped operation is returned for publishing.
    pub fn perform(
        &mut self,
        op: Operation,
    ) -> std::result::Result<StampedOperation, InvariantError> {
        let (next, inverse) = self.timeline.apply_with_inverse(&op)?;
        self.timeline = next;
        debug!(op = op.name(), "performed");
        if !op.is_view_change() {
            self.undone.clear();
            self.push_history(HistoryEntry {
                op: op.clone(),
                inverse,
            });
        }
        Ok(self.stamp(op))
    }

    /// Revert the most recent operation.
    ///
    /// Returns `Ok(None)` when there is nothing to undo. If the stored inverse
    /// no longer applies (a remote edit changed the same clips) the entry is
    /// discarded and the error returned; the next call reaches older history.
    pub fn undo(&mut self) -> std::result::Result<Option<StampedOperation>, InvariantError> {
        let Some(entry) = self.history.pop_back() else {
            return Ok(None);
        };
        match self.timeline.apply(&entry.inverse) {
            Ok(next) => {
                self.timeline = next;
                debug!(op = entry.op.name(), "undone");
                self.undone.push(entry.op);
                Ok(Some(self.stamp(entry.inverse)))
            }
            Err(err) => {
                warn!(op = entry.op.name(), error = %err, "undo entry no longer applies, dropped");
                Err(err)
            }
        }
    }

    /// Re-apply the most recently undone operation.
    pub fn redo(&mut self) -> std::result::Result<Option<StampedOperation>, InvariantError> {
        let Some(op) = self.undone.pop() else {
            return Ok(None);
        };
        match self.timeline.apply_with_inverse(&op) {
            Ok((next, inverse)) => {
                self.timeline = next;
                debug!(op = op.name(), "redone");
                self.push_history(HistoryEntry {
                    op: op.clone(),
                    inverse,
                });
                Ok(Some(self.stamp(op)))
            }
            Err(err) => {
                self.undone.push(op);
                Err(err)
            }
        }
    }

    /// Replay an operation received from another editor.
    ///
    /// Stale or duplicate sequence numbers and failed replays are rejected
    /// with `ReconciliationRejected`; the local timeline is left unchanged.
    /// Accepted operations are not undoable locally and clear the redo stack.
    pub fn apply_remote(&mut self, remote: &StampedOperation) -> Result<()> {
        let OperationStamp { author, sequence } = &remote.stamp;
        let reject = |reason: String| {
            warn!(%author, sequence, %reason, "remote operation rejected");
            FrameCutError::ReconciliationRejected {
                author: author.clone(),
                sequence: *sequence,
                reason,
            }
        };

        if *author == self.author {
            return Err(reject("operation carries the local author id".into()));
        }
        if let Some(last) = self.last_remote.get(author) {
            if sequence <= last {
                return Err(reject(format!(
                    "stale or duplicate sequence (last seen {last})"
                )));
            }
        }
        self.last_remote.insert(author.clone(), *sequence);

        let next = self
            .timeline
            .apply(&remote.op)
            .map_err(|err| reject(err.to_string()))?;
        self.timeline = next;
        self.undone.clear();
        debug!(op = remote.op.name(), %author, sequence, "applied remote operation");
        Ok(())
    }

    /// Replace the document (project open). History is discarded.
    pub fn reset(&mut self, timeline: Timeline) {
        self.timeline = timeline;
        self.clear_history();
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.undone.is_empty()
    }

    /// Number of undo steps available.
    pub fn undo_count(&self) -> usize {
        self.history.len()
    }

    /// Number of redo steps available.
    pub fn redo_count(&self) -> usize {
        self.undone.len()
    }

    /// Clear all history.
    pub fn clear_history(&mut self) {
        self.history.clear();
        self.undone.clear();
    }

    fn push_history(&mut self, entry: HistoryEntry) {
        self.history.push_back(entry);
        while self.history.len() > self.max_depth {
            self.history.pop_front();
        }
    }

    fn stamp(&mut self, op: Operation) -> StampedOperation {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        StampedOperation {
            stamp: OperationStamp {
                author: self.author.clone(),
                sequence,
            },
            op,
        }
    }
}
