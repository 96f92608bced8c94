//! Edits that change the sample's length or layout: clipboard transfer,
//! crop, minimize, clear, new sample and bit-depth conversion.

use std::ops::Range;

use tw_ir::{BitDepth, PcmRead, PcmWrite, SampleKey, Selection};

use super::reallocate;
use crate::command::LastOperation;
use crate::editor::SampleEditor;
use crate::error::{EditError, EditResult};
use crate::listener::EditorListener;
use crate::module::SampleModule;

impl<L: EditorListener> SampleEditor<L> {
    /// The selection ordered and clamped to the attached sample.
    fn selected_range<M: SampleModule + ?Sized>(&self, module: &M) -> Option<Range<u32>> {
        let sample = self.editable(module)?;
        let mut selection = self.selection;
        selection.normalize(sample.len());
        selection.range()
    }

    /// Copy the selection to the clipboard.
    pub fn copy<M: SampleModule + ?Sized>(&mut self, module: &M) -> bool {
        let Some(range) = self.selected_range(module) else {
            return false;
        };
        let Some(sample) = self.editable(module) else {
            return false;
        };
        if !self.clipboard.borrow_mut().copy(sample, range) {
            return false;
        }
        self.listener.update_no_changes();
        true
    }

    /// Copy the selection to the clipboard and remove it from the sample.
    pub fn cut<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        let Some(key) = self.sample else {
            return Ok(false);
        };
        let Some(range) = self.selected_range(module) else {
            return Ok(false);
        };
        if let Some(sample) = module.sample(key) {
            self.clipboard.borrow_mut().copy(sample, range.clone());
        }
        log::debug!(target: "editor", "cut {range:?}");
        self.structural_edit(module, |ed, module| {
            let removed = remove_frames(module, key, range);
            if removed {
                ed.last_operation = LastOperation::Cut;
            }
            ed.selection = Selection::NONE;
            Ok(removed)
        })
    }

    /// Paste the clipboard at the selection start. A selection is replaced;
    /// the loop keeps its position relative to the frames before the paste.
    pub fn paste<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        let Some(key) = self.sample else {
            return Ok(false);
        };
        if !self.can_paste(module) {
            return Ok(false);
        }
        let replaced = self.selected_range(module);
        let mut selection = self.selection;
        if let Some(sample) = module.sample(key) {
            selection.normalize(sample.len());
        }
        let pos = selection.start.unwrap_or(0);
        log::debug!(target: "editor", "paste at {pos}");

        self.structural_edit(module, |ed, module| {
            if let Some(range) = replaced {
                let kept = module.sample(key).map(|s| (s.loop_start, s.loop_len));
                if remove_frames(module, key, range) {
                    ed.last_operation = LastOperation::Cut;
                }
                if let (Some(sample), Some((start, len))) = (module.sample_mut(key), kept) {
                    sample.loop_start = start;
                    sample.loop_len = len;
                }
            }
            let clipboard = ed.clipboard.borrow();
            let pasted = clipboard.paste(module, key, pos)?;
            let width = clipboard.width();
            drop(clipboard);
            if pasted {
                ed.selection = Selection::new(pos, pos + width);
            }
            Ok(pasted)
        })
    }

    pub fn can_paste<M: SampleModule + ?Sized>(&self, module: &M) -> bool {
        self.sample.and_then(|key| module.sample(key)).is_some() && !self.clipboard.borrow().is_empty()
    }

    /// Add the clipboard onto the selection, stretched to fit it.
    pub fn mix_paste<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        let Some(key) = self.sample else {
            return Ok(false);
        };
        if self.editable(module).is_none() || self.clipboard.borrow().is_empty() {
            return Ok(false);
        }
        self.run_edit(module, None, |ed, module| {
            let Some(sample) = module.sample_mut(key) else {
                return Ok(false);
            };
            let range = ed.filter_range(sample);
            let clipboard = ed.clipboard.borrow();
            let step = clipboard.width() as f32 / range.len() as f32;
            for (n, i) in range.enumerate() {
                let pos = n as f32 * step;
                let (index, frac) = (pos as usize, pos - pos.floor());
                let clip = (1.0 - frac) * clipboard.float(index) + frac * clipboard.float(index + 1);
                let value = sample.float(i) + clip;
                sample.set_float(i, value);
            }
            Ok(true)
        })
    }

    /// Keep only the selected frames.
    pub fn crop<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        let Some(key) = self.sample else {
            return Ok(false);
        };
        let Some(range) = self.selected_range(module) else {
            return Ok(false);
        };
        self.run_edit(module, None, |ed, module| {
            let (start, end) = (range.start, range.end);
            let len = end - start;
            let Some(depth) = module.sample(key).map(|s| s.bit_depth()) else {
                return Ok(false);
            };
            let bpf = depth.bytes_per_frame();
            let resized = reallocate(module, key, len, depth, |src, dst| {
                dst.raw_mut()
                    .copy_from_slice(&src.raw()[start as usize * bpf..end as usize * bpf]);
            })?;
            if !resized {
                return Ok(false);
            }
            if let Some(sample) = module.sample_mut(key) {
                let loop_start = sample.loop_start.saturating_sub(start);
                let loop_end = sample.loop_end().min(end).saturating_sub(start);
                if loop_end <= loop_start {
                    sample.loop_start = 0;
                    sample.loop_len = 0;
                } else {
                    sample.loop_start = loop_start;
                    sample.loop_len = loop_end - loop_start;
                }
                sample.clamp_loop();
            }
            ed.selection = Selection::all(len);
            ed.last_operation = LastOperation::Cut;
            Ok(true)
        })
    }

    /// True if a loop ends before the sample does, so `minimize` would drop
    /// something.
    pub fn can_minimize<M: SampleModule + ?Sized>(&self, module: &M) -> bool {
        self.editable(module).is_some_and(|sample| {
            sample.loop_type.is_looping() && sample.loop_end() > 0 && sample.loop_end() < sample.len()
        })
    }

    /// Drop everything after the loop end.
    pub fn minimize<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        let Some(key) = self.sample else {
            return Ok(false);
        };
        if !self.can_minimize(module) {
            return Ok(false);
        }
        self.run_edit(module, None, |ed, module| {
            let Some(sample) = module.sample(key) else {
                return Ok(false);
            };
            let len = sample.loop_end().min(sample.len());
            let depth = sample.bit_depth();
            let resized = reallocate(module, key, len, depth, |src, dst| {
                let bytes = dst.raw().len();
                dst.raw_mut().copy_from_slice(&src.raw()[..bytes]);
            })?;
            if resized {
                ed.last_operation = LastOperation::Cut;
            }
            Ok(resized)
        })
    }

    /// Release the sample's frames, leaving an empty sample.
    pub fn clear<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        let Some(key) = self.sample else {
            return Ok(false);
        };
        if module.sample(key).is_none() {
            return Ok(false);
        }
        self.run_edit(module, None, |ed, module| {
            let Some(sample) = module.sample_mut(key) else {
                return Ok(false);
            };
            let memory = sample.take_memory();
            sample.loop_start = 0;
            sample.loop_len = 0;
            if let Some(block) = memory {
                module.free_sample_mem(block);
            }
            ed.selection = Selection::NONE;
            Ok(true)
        })
    }

    /// Replace the content with `frames` frames of silence at `bits` bits.
    /// The loop covers the whole new sample.
    pub fn new_sample<M: SampleModule + ?Sized>(&mut self, module: &mut M, frames: u32, bits: u8) -> EditResult {
        let depth = BitDepth::from_bits(bits).ok_or(EditError::UnsupportedBitDepth(bits))?;
        let Some(key) = self.sample else {
            return Ok(false);
        };
        if module.sample(key).is_none() {
            return Ok(false);
        }
        self.run_edit(module, None, |ed, module| {
            if !reallocate(module, key, frames, depth, |_, _| {})? {
                return Ok(false);
            }
            if let Some(sample) = module.sample_mut(key) {
                sample.loop_start = 0;
                sample.loop_len = frames;
            }
            ed.selection = Selection::NONE;
            ed.last_operation = LastOperation::New;
            Ok(true)
        })
    }

    /// Switch between 8 and 16 bits. With `convert` the values are rescaled
    /// into a new block; without it the bytes are kept and read at the other
    /// width, so the frame count and loop double or halve.
    pub fn convert_resolution<M: SampleModule + ?Sized>(&mut self, module: &mut M, convert: bool) -> EditResult {
        let Some(key) = self.sample else {
            return Ok(false);
        };
        let Some(sample) = module.sample(key) else {
            return Ok(false);
        };
        let target = match sample.bit_depth() {
            BitDepth::Eight => BitDepth::Sixteen,
            BitDepth::Sixteen => BitDepth::Eight,
        };
        self.run_edit(module, None, |_, module| {
            if !convert {
                return Ok(module.sample_mut(key).is_some_and(|s| s.reinterpret(target)));
            }
            let Some(len) = module.sample(key).map(|s| s.len()) else {
                return Ok(false);
            };
            reallocate(module, key, len, target, |src, dst| {
                for i in 0..len as usize {
                    let value = match target {
                        BitDepth::Sixteen => src.value(i) << 8,
                        BitDepth::Eight => src.value(i) >> 8,
                    };
                    dst.set_value(i, value);
                }
            })
        })
    }

    /// Undo bracket for clipboard edits: no lengthy notifications, and the
    /// selection is revalidated before the entry is recorded.
    fn structural_edit<M, F>(&mut self, module: &mut M, body: F) -> EditResult
    where
        M: SampleModule + ?Sized,
        F: FnOnce(&mut Self, &mut M) -> EditResult,
    {
        module.enter_critical_section();
        self.prepare_undo(module);
        let result = body(self, module);
        if let Err(e) = &result {
            log::warn!(target: "editor", "edit aborted: {e}");
        }
        self.validate(module);
        self.finish_undo(module);
        module.leave_critical_section();
        result
    }
}

/// Remove `range` in place, shifting the tail down. Loop points move back by
/// however much of the range lay before them. A sample cut to nothing gives
/// its memory back.
fn remove_frames<M: SampleModule + ?Sized>(module: &mut M, key: SampleKey, range: Range<u32>) -> bool {
    let Some(sample) = module.sample_mut(key) else {
        return false;
    };
    let len = sample.len();
    let (start, end) = (range.start.min(len), range.end.min(len));
    if start >= end {
        return false;
    }
    let bpf = sample.bit_depth().bytes_per_frame();
    sample
        .raw_mut()
        .copy_within(end as usize * bpf.., start as usize * bpf);

    let removed_before = |pos: u32| pos.min(end).saturating_sub(start);
    let loop_end = sample.loop_end();
    let loop_end = loop_end - removed_before(loop_end);
    sample.loop_start -= removed_before(sample.loop_start);
    sample.loop_len = loop_end - sample.loop_start;
    sample.truncate(len - (end - start));

    if sample.len() == 0 {
        if let Some(block) = sample.take_memory() {
            module.free_sample_mem(block);
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::Clipboard;
    use crate::config::EditorConfig;
    use crate::listener::{EditorEvent, EventLog};
    use crate::module::SampleBank;
    use crate::tools::test_sample;
    use tw_ir::{LoopType, Sample};

    fn setup(values: &[i32], depth: BitDepth) -> (SampleEditor<EventLog>, SampleBank, SampleKey) {
        let mut bank = SampleBank::new();
        let key = bank.insert(test_sample(values, depth));
        let mut editor = SampleEditor::new(EditorConfig::default(), Clipboard::shared(), EventLog::new());
        editor.attach(&mut bank, key);
        editor.listener_mut().take();
        (editor, bank, key)
    }

    fn values(sample: &Sample) -> Vec<i32> {
        (0..sample.len() as usize).map(|i| sample.value(i)).collect()
    }

    fn set_loop(bank: &mut SampleBank, key: SampleKey, start: u32, len: u32) {
        let sample = bank.sample_mut(key).unwrap();
        sample.loop_type = LoopType::Forward;
        sample.loop_start = start;
        sample.loop_len = len;
    }

    #[test]
    fn copy_notifies_without_changes() {
        let (mut editor, bank, _) = setup(&[1, 2, 3], BitDepth::Eight);
        assert!(!editor.copy(&bank));
        editor.set_selection(Selection::new(2, 0));
        assert!(editor.copy(&bank));
        assert_eq!(editor.clipboard().borrow().width(), 2);
        assert_eq!(editor.listener_mut().take(), vec![EditorEvent::UpdateNoChanges]);
    }

    #[test]
    fn cut_shrinks_loop_by_overlap() {
        let data: Vec<i32> = (0..100).map(|i| i % 100).collect();
        let (mut editor, mut bank, key) = setup(&data, BitDepth::Eight);
        set_loop(&mut bank, key, 10, 30);
        editor.set_selection(Selection::new(20, 30));
        assert!(editor.cut(&mut bank).unwrap());

        let sample = bank.sample(key).unwrap();
        assert_eq!(sample.len(), 90);
        assert_eq!((sample.loop_start, sample.loop_end()), (10, 30));
        assert_eq!(sample.value(20), 30);
        assert_eq!(editor.selection(), Selection::NONE);
        assert_eq!(editor.last_operation(), LastOperation::Cut);
        assert_eq!(editor.clipboard().borrow().byte(0), 20);
    }

    #[test]
    fn cut_over_loop_start_pulls_it_back() {
        let (mut editor, mut bank, key) = setup(&[0; 20], BitDepth::Sixteen);
        set_loop(&mut bank, key, 8, 8);
        editor.set_selection(Selection::new(4, 12));
        editor.cut(&mut bank).unwrap();
        let sample = bank.sample(key).unwrap();
        assert_eq!((sample.loop_start, sample.loop_end()), (4, 8));
    }

    #[test]
    fn cutting_everything_releases_memory() {
        let (mut editor, mut bank, key) = setup(&[1, 2, 3, 4], BitDepth::Eight);
        editor.select_all(&bank);
        assert!(editor.cut(&mut bank).unwrap());
        assert!(bank.sample(key).unwrap().is_empty());
        assert_eq!(bank.bytes_in_use(), 0);
    }

    #[test]
    fn paste_replaces_selection() {
        let (mut editor, mut bank, key) = setup(&[1, 2, 3, 4, 5], BitDepth::Eight);
        editor.set_selection(Selection::new(0, 2));
        editor.copy(&bank);
        editor.set_selection(Selection::new(3, 5));
        assert!(editor.paste(&mut bank).unwrap());
        assert_eq!(values(bank.sample(key).unwrap()), vec![1, 2, 3, 1, 2]);
        assert_eq!(editor.selection(), Selection::new(3, 5));
    }

    #[test]
    fn paste_without_clip_does_nothing() {
        let (mut editor, mut bank, _) = setup(&[1, 2], BitDepth::Eight);
        assert!(!editor.can_paste(&bank));
        assert!(!editor.paste(&mut bank).unwrap());
        assert!(editor.listener().events.is_empty());
    }

    #[test]
    fn paste_out_of_memory_keeps_the_cut() {
        let mut bank = SampleBank::with_memory_limit(6);
        let key = bank.insert(test_sample(&[1, 2, 3, 4, 5, 6], BitDepth::Eight));
        let mut editor = SampleEditor::new(EditorConfig::default(), Clipboard::shared(), EventLog::new());
        editor.attach(&mut bank, key);
        editor.set_selection(Selection::new(0, 3));
        editor.copy(&bank);
        editor.set_selection(Selection::new(3, 5));
        let err = editor.paste(&mut bank).unwrap_err();
        assert!(matches!(err, EditError::OutOfMemory { .. }));
        assert_eq!(values(bank.sample(key).unwrap()), vec![1, 2, 3, 6]);
        assert!(editor.can_undo());
    }

    #[test]
    fn mix_paste_adds_stretched_clip() {
        let (mut editor, mut bank, key) = setup(&[10, 0, 10, 10], BitDepth::Eight);
        editor.set_selection(Selection::new(0, 1));
        editor.copy(&bank);
        editor.set_selection(Selection::new(2, 4));
        assert!(editor.mix_paste(&mut bank).unwrap());
        let result = values(bank.sample(key).unwrap());
        assert_eq!(&result[..2], &[10, 0]);
        assert_eq!(result[2], 20);
        assert!(result[3] > 10 && result[3] < 20);
    }

    #[test]
    fn crop_moves_loop_into_kept_frames() {
        let data: Vec<i32> = (0..20).collect();
        let (mut editor, mut bank, key) = setup(&data, BitDepth::Sixteen);
        set_loop(&mut bank, key, 4, 10);
        editor.set_selection(Selection::new(6, 16));
        assert!(editor.crop(&mut bank).unwrap());

        let sample = bank.sample(key).unwrap();
        assert_eq!(values(sample), (6..16).collect::<Vec<_>>());
        assert_eq!((sample.loop_start, sample.loop_end()), (0, 8));
        assert_eq!(editor.selection(), Selection::all(10));
        assert_eq!(bank.bytes_in_use(), 20);
    }

    #[test]
    fn crop_outside_loop_drops_it() {
        let (mut editor, mut bank, key) = setup(&[0; 20], BitDepth::Eight);
        set_loop(&mut bank, key, 2, 4);
        editor.set_selection(Selection::new(10, 15));
        editor.crop(&mut bank).unwrap();
        let sample = bank.sample(key).unwrap();
        assert_eq!((sample.loop_start, sample.loop_len), (0, 0));
    }

    #[test]
    fn minimize_drops_tail_after_loop() {
        let (mut editor, mut bank, key) = setup(&[1; 16], BitDepth::Eight);
        assert!(!editor.can_minimize(&bank));
        set_loop(&mut bank, key, 2, 6);
        assert!(editor.can_minimize(&bank));
        assert!(editor.minimize(&mut bank).unwrap());
        assert_eq!(bank.sample(key).unwrap().len(), 8);
        assert_eq!(bank.bytes_in_use(), 8);
        assert!(!editor.can_minimize(&bank));
    }

    #[test]
    fn clear_releases_memory() {
        let (mut editor, mut bank, key) = setup(&[1, 2, 3], BitDepth::Eight);
        set_loop(&mut bank, key, 0, 2);
        assert!(editor.clear(&mut bank).unwrap());
        let sample = bank.sample(key).unwrap();
        assert!(sample.is_empty());
        assert_eq!(sample.loop_len, 0);
        assert_eq!(bank.bytes_in_use(), 0);
    }

    #[test]
    fn new_sample_loops_everything() {
        let (mut editor, mut bank, key) = setup(&[5, 5], BitDepth::Eight);
        assert!(editor.new_sample(&mut bank, 32, 16).unwrap());
        let sample = bank.sample(key).unwrap();
        assert_eq!(sample.len(), 32);
        assert!(sample.is_16bit());
        assert_eq!((sample.loop_start, sample.loop_len), (0, 32));
        assert_eq!(editor.last_operation(), LastOperation::New);

        let err = editor.new_sample(&mut bank, 32, 12).unwrap_err();
        assert!(matches!(err, EditError::UnsupportedBitDepth(12)));
    }

    #[test]
    fn converting_rescales_values() {
        let (mut editor, mut bank, key) = setup(&[1, -2, 127], BitDepth::Eight);
        assert!(editor.convert_resolution(&mut bank, true).unwrap());
        let sample = bank.sample(key).unwrap();
        assert!(sample.is_16bit());
        assert_eq!(values(sample), vec![256, -512, 32512]);

        editor.convert_resolution(&mut bank, true).unwrap();
        assert_eq!(values(bank.sample(key).unwrap()), vec![1, -2, 127]);
    }

    #[test]
    fn reinterpreting_keeps_bytes() {
        let (mut editor, mut bank, key) = setup(&[1, 2, 3, 4], BitDepth::Eight);
        set_loop(&mut bank, key, 2, 2);
        editor.convert_resolution(&mut bank, false).unwrap();
        let sample = bank.sample(key).unwrap();
        assert_eq!(sample.len(), 2);
        assert_eq!((sample.loop_start, sample.loop_len), (1, 1));
        assert_eq!(sample.value(0), 0x0201);
    }
}
