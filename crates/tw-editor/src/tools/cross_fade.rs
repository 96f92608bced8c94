//! Loop-seam cross-fade.
//!
//! The selection has to straddle exactly one loop edge. A selection around
//! the loop end is mapped onto the loop start, so both edges get blended
//! over the same span either way.

use tw_ir::{PcmBuffer, PcmRead, PcmWrite, Sample, Selection};

use crate::editor::SampleEditor;
use crate::listener::EditorListener;
use crate::module::SampleModule;

/// The ordered selection if it can be cross-faded on `sample`.
pub(crate) fn span(sample: &Sample, selection: Selection) -> Option<(i64, i64)> {
    if sample.is_empty() || !sample.loop_type.is_looping() {
        return None;
    }
    let range = selection.range()?;
    let (start, end) = (range.start as i64, range.end.min(sample.len()) as i64);
    let (loop_start, loop_end) = (sample.loop_start as i64, sample.loop_end() as i64);

    let encloses = start <= loop_start && end >= loop_end;
    let inside = start > loop_start && end < loop_end;
    let before = start < loop_start && end < loop_start;
    let after = start > loop_end && end > loop_end;
    if encloses || inside || before || after {
        return None;
    }
    Some((start, end))
}

/// Blend the loop seam in place. Returns false when the selection does not
/// qualify.
pub(crate) fn apply(sample: &mut Sample, selection: Selection) -> bool {
    let Some((mut start, mut end)) = span(sample, selection) else {
        return false;
    };
    let loop_start = sample.loop_start as i64;
    let loop_end = sample.loop_end() as i64;
    if start >= loop_start && end >= loop_end {
        start -= loop_end - loop_start;
        end -= loop_end - loop_start;
    }
    start = start.max(0);

    let source = PcmBuffer::copy_from(&*sample, 0..sample.len() as usize);
    let blend = |sample: &mut Sample, i: i64, other: i64, t: f32| {
        if i < 0 {
            return;
        }
        let value = source.float_clamped(i) * (1.0 - t) + source.float_clamped(other) * t;
        sample.set_float(i as usize, value);
    };

    if sample.loop_type.is_forward() {
        for i in start..loop_start {
            let t = fade_in(i, start, loop_start);
            blend(sample, i, loop_end - (loop_start - start) + (i - start), t);
        }
        for i in loop_start..end {
            let t = fade_out(i, loop_start, end);
            blend(sample, i, loop_end + (i - loop_start), t);
        }

        let (start, end) = (start - loop_start + loop_end, end - loop_start + loop_end);
        for i in start..loop_end {
            let t = fade_in(i, start, loop_end);
            blend(sample, i, loop_start - (loop_end - start) + (i - start), t);
        }
        for i in loop_end..end {
            let t = fade_out(i, loop_end, end);
            blend(sample, i, loop_start + (i - loop_end), t);
        }
    } else {
        for i in start..loop_start {
            let t = fade_in(i, start, loop_start);
            blend(sample, i, loop_start + (i - start), t);
        }
        for i in loop_start..end {
            let t = fade_out(i, loop_start, end);
            blend(sample, i, loop_start - (i - loop_start), t);
        }
    }
    true
}

/// Weight rising from 0 to 0.5 over `from..to`.
fn fade_in(i: i64, from: i64, to: i64) -> f32 {
    (i - from) as f32 / (to - from) as f32 * 0.5
}

/// Weight falling from 0.5 to 0 over `from..to`.
fn fade_out(i: i64, from: i64, to: i64) -> f32 {
    0.5 - (i - from) as f32 / (to - from) as f32 * 0.5
}

impl<L: EditorListener> SampleEditor<L> {
    /// True if the current selection straddles one loop edge of the
    /// attached sample.
    pub fn is_valid_cross_fade_selection<M: SampleModule + ?Sized>(&self, module: &M) -> bool {
        self.editable(module)
            .is_some_and(|sample| span(sample, self.selection).is_some())
    }
}
