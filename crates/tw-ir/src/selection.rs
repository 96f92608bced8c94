//! Selection interval over a sample's frames.

use core::ops::Range;

/// A user selection `[start, end)` in frames.
///
/// Either endpoint may be unset. Endpoints are kept as the user placed
/// them until `normalize` orders and clamps them against a sample length.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl Selection {
    /// No selection.
    pub const NONE: Selection = Selection { start: None, end: None };

    pub fn new(start: u32, end: u32) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }

    /// Select all frames of a sample with `len` frames.
    pub fn all(len: u32) -> Self {
        Self::new(0, len)
    }

    pub fn is_set(&self) -> bool {
        self.start.is_some() || self.end.is_some()
    }

    /// Order and clamp the endpoints against a sample of `len` frames.
    ///
    /// An end without a start selects from 0. A start beyond the sample
    /// drops the selection, an end beyond it is pulled back to `len`.
    pub fn normalize(&mut self, len: u32) {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if end < start {
                self.start = Some(end);
                self.end = Some(start);
            }
        }
        if self.end.is_some_and(|end| end > 0) && self.start.is_none() {
            self.start = Some(0);
        }
        if self.start.is_some_and(|start| start > len) {
            *self = Self::NONE;
            return;
        }
        if let Some(end) = self.end {
            self.end = Some(end.min(len));
        }
    }

    /// The ordered range, if both endpoints are set and differ.
    pub fn range(&self) -> Option<Range<u32>> {
        let (start, end) = (self.start?, self.end?);
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        (start != end).then_some(start..end)
    }

    /// True if the selection covers at least one frame.
    pub fn is_valid(&self) -> bool {
        self.range().is_some()
    }

    /// The selected range clamped to `len`, or the whole sample if nothing
    /// usable is selected.
    pub fn range_or_all(&self, len: u32) -> Range<u32> {
        match self.range() {
            Some(range) if range.start < len => range.start..range.end.min(len),
            _ => 0..len,
        }
    }

    /// Number of selected frames (0 if the selection is not valid).
    pub fn width(&self) -> u32 {
        self.range().map_or(0, |r| r.end - r.start)
    }
}
