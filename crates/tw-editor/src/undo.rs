//! Snapshot-based undo/redo for sample edits.

use std::collections::VecDeque;

use tw_ir::{BitDepth, LoopType, PcmRead, Sample, SampleKey, Selection};

use crate::listener::UndoUserData;

/// Everything undo restores about a sample at one instant.
///
/// The frame bytes are a private copy, never the live buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UndoSnapshot {
    data: Option<Vec<u8>>,
    pub len: u32,
    pub depth: BitDepth,
    pub loop_start: u32,
    pub loop_len: u32,
    pub loop_type: LoopType,
    pub relative_note: i8,
    pub finetune: i8,
    pub selection: Selection,
    pub user_data: UndoUserData,
}

impl UndoSnapshot {
    pub fn capture(sample: &Sample, selection: Selection, user_data: UndoUserData) -> Self {
        Self {
            data: (!sample.is_empty()).then(|| sample.raw().to_vec()),
            len: sample.len(),
            depth: sample.bit_depth(),
            loop_start: sample.loop_start,
            loop_len: sample.loop_len,
            loop_type: sample.loop_type,
            relative_note: sample.relative_note,
            finetune: sample.finetune,
            selection,
            user_data,
        }
    }

    /// Copied frame bytes; `None` for an empty sample.
    pub fn data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    /// Bytes needed to restore the frames.
    pub fn byte_len(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    /// Write the metadata back. Memory is the caller's job.
    pub fn restore_header(&self, sample: &mut Sample) {
        sample.loop_start = self.loop_start;
        sample.loop_len = self.loop_len;
        sample.loop_type = self.loop_type;
        sample.relative_note = self.relative_note;
        sample.finetune = self.finetune;
    }
}

/// Undo/redo stack of snapshots for one sample.
///
/// Each recorded edit leaves its before and after states on the stack and
/// the cursor on the after state. Consecutive edits share the snapshot in
/// between.
#[derive(Clone, Debug)]
pub struct UndoStack {
    entries: VecDeque<UndoSnapshot>,
    /// Number of entries at or below the current state
    position: usize,
    depth: usize,
}

impl UndoStack {
    pub fn new(depth: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            position: 0,
            depth: depth.max(2),
        }
    }

    /// Record an edit that turned `before` into `after`.
    pub fn record(&mut self, before: UndoSnapshot, after: UndoSnapshot) {
        // Truncate any redo history beyond current position
        self.entries.truncate(self.position);
        if self.entries.back() != Some(&before) {
            self.entries.push_back(before);
        }
        self.entries.push_back(after);
        while self.entries.len() > self.depth {
            self.entries.pop_front();
        }
        self.position = self.entries.len();
    }

    /// The state an undo would restore.
    pub fn peek_undo(&self) -> Option<&UndoSnapshot> {
        self.can_undo().then(|| &self.entries[self.position - 2])
    }

    /// The state a redo would restore.
    pub fn peek_redo(&self) -> Option<&UndoSnapshot> {
        self.entries.get(self.position)
    }

    /// Step back one state, or None if at the oldest.
    pub fn undo(&mut self) -> Option<&UndoSnapshot> {
        if !self.can_undo() {
            return None;
        }
        self.position -= 1;
        Some(&self.entries[self.position - 1])
    }

    /// Step forward one state, or None if at the newest.
    pub fn redo(&mut self) -> Option<&UndoSnapshot> {
        if !self.can_redo() {
            return None;
        }
        self.position += 1;
        Some(&self.entries[self.position - 1])
    }

    pub fn can_undo(&self) -> bool {
        self.position > 1
    }

    pub fn can_redo(&self) -> bool {
        self.position < self.entries.len()
    }

    /// Nothing to undo.
    pub fn is_empty(&self) -> bool {
        !self.can_undo()
    }

    /// The cursor sits on the newest state.
    pub fn is_top(&self) -> bool {
        !self.can_redo()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Undo stacks of samples that are not attached right now, most recently
/// detached last.
#[derive(Clone, Debug)]
pub struct UndoHistory {
    stacks: VecDeque<(SampleKey, UndoStack)>,
    capacity: usize,
}

impl UndoHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            stacks: VecDeque::new(),
            capacity,
        }
    }

    /// Park `parked` and take out the stack kept for `next`, if any.
    ///
    /// When more than `capacity` stacks are parked the oldest is dropped.
    pub fn swap(&mut self, next: SampleKey, parked: Option<(SampleKey, UndoStack)>) -> Option<UndoStack> {
        if let Some((key, stack)) = parked {
            if key == next {
                return Some(stack);
            }
            self.stacks.push_back((key, stack));
        }
        let found = self
            .stacks
            .iter()
            .position(|(key, _)| *key == next)
            .and_then(|i| self.stacks.remove(i))
            .map(|(_, stack)| stack);
        while self.stacks.len() > self.capacity {
            if let Some((key, _)) = self.stacks.pop_front() {
                log::debug!(target: "undo", "dropping undo history of {key:?}");
            }
        }
        found
    }

    /// Forget the stack of a sample, e.g. when it is deleted.
    pub fn forget(&mut self, key: SampleKey) {
        self.stacks.retain(|(k, _)| *k != key);
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stacks.is_empty()
    }
}
