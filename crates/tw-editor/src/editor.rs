//! The sample editor: attachment, selection, undo bracketing and the
//! non-destructive metadata edits.
//!
//! Frame-level operations live in `tools`.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tw_ir::{
    position_to_millis, tuning_for_rate, BitDepth, LoopType, PcmRead, PcmWrite, Sample, SampleKey,
    SampleMemory, Selection,
};

use crate::clipboard::SharedClipboard;
use crate::command::{FilterCommand, LastOperation};
use crate::config::EditorConfig;
use crate::error::{EditError, EditResult};
use crate::listener::{EditorListener, NullListener};
use crate::module::SampleModule;
use crate::undo::{UndoHistory, UndoSnapshot, UndoStack};

const MIN_RELATIVE_NOTE: i32 = -48;
const MAX_RELATIVE_NOTE: i32 = 71;

/// Volume scale shown to users (FT2 style).
pub const MAX_VOLUME: u8 = 64;

/// An open undo bracket.
#[derive(Debug)]
struct PendingUndo {
    /// `None` while undo is disabled; the bracket then only notifies
    before: Option<UndoSnapshot>,
    len_before: u32,
}

/// Freehand drawing in progress.
#[derive(Clone, Copy, Debug, Default)]
struct DrawState {
    last: Option<(u32, f32)>,
}

/// A buffer acquired from the module, filled by the host and later
/// installed with `paste_other` or handed back with `discard_work_sample`.
#[derive(Debug)]
pub struct WorkSample {
    memory: SampleMemory,
    len: u32,
    depth: BitDepth,
    rate: f32,
}

impl WorkSample {
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Playback rate of C-4 the content was produced at.
    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl PcmRead for WorkSample {
    fn depth(&self) -> BitDepth {
        self.depth
    }

    fn raw(&self) -> &[u8] {
        self.memory.as_bytes()
    }
}

impl PcmWrite for WorkSample {
    fn raw_mut(&mut self) -> &mut [u8] {
        self.memory.as_bytes_mut()
    }
}

/// Edits one attached sample of a module at a time.
///
/// The editor holds no reference to the module: every operation borrows it
/// for its duration, so the host stays free to hand the module to a
/// playback engine between edits.
pub struct SampleEditor<L: EditorListener = NullListener> {
    pub(crate) config: EditorConfig,
    pub(crate) listener: L,
    pub(crate) clipboard: SharedClipboard,
    pub(crate) sample: Option<SampleKey>,
    pub(crate) selection: Selection,
    undo_stack: Option<UndoStack>,
    undo_history: Option<UndoHistory>,
    pending: Option<PendingUndo>,
    undo_nesting: u32,
    drawing: Option<DrawState>,
    pub(crate) last_operation: LastOperation,
    pub(crate) last_filter: Option<FilterCommand>,
    pub(crate) noise_rng: Box<dyn RngCore>,
}

impl<L: EditorListener> SampleEditor<L> {
    pub fn new(config: EditorConfig, clipboard: SharedClipboard, listener: L) -> Self {
        let noise_rng: Box<dyn RngCore> = match config.noise_seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        };
        let undo_history = config
            .undo_enabled
            .then(|| UndoHistory::new(config.history_size));
        Self {
            config,
            listener,
            clipboard,
            sample: None,
            selection: Selection::NONE,
            undo_stack: None,
            undo_history,
            pending: None,
            undo_nesting: 0,
            drawing: None,
            last_operation: LastOperation::Regular,
            last_filter: None,
            noise_rng,
        }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn clipboard(&self) -> &SharedClipboard {
        &self.clipboard
    }

    /// Replace the random source used by noise generation.
    pub fn set_noise_source(&mut self, rng: Box<dyn RngCore>) {
        self.noise_rng = rng;
    }

    /// Key of the attached sample.
    pub fn attached(&self) -> Option<SampleKey> {
        self.sample
    }

    pub fn last_operation(&self) -> LastOperation {
        self.last_operation
    }

    /// Attach `key`, swapping in its undo stack. Returns false if the key
    /// is unknown or already attached.
    /// An open drawing stroke is committed to the old sample first.
    pub fn attach<M: SampleModule + ?Sized>(&mut self, module: &mut M, key: SampleKey) -> bool {
        if self.sample == Some(key) || module.sample(key).is_none() {
            return false;
        }
        self.end_drawing(module);
        if let Some(history) = self.undo_history.as_mut() {
            let parked = match (self.sample, self.undo_stack.take()) {
                (Some(old), Some(stack)) if stack.can_undo() || stack.can_redo() => Some((old, stack)),
                _ => None,
            };
            let stack = history
                .swap(key, parked)
                .unwrap_or_else(|| UndoStack::new(self.config.undo_depth));
            log::debug!(target: "undo", "attached {key:?}, {} undo entries", stack.len());
            self.undo_stack = Some(stack);
        }
        self.sample = Some(key);
        self.selection = Selection::NONE;
        self.listener.reload();
        true
    }

    /// Drop everything kept about `key`, detaching it if attached. A stroke
    /// open on it is abandoned without recording.
    pub fn forget<M: SampleModule + ?Sized>(&mut self, module: &mut M, key: SampleKey) {
        if self.sample == Some(key) {
            if self.drawing.take().is_some() {
                module.leave_critical_section();
            }
            self.pending = None;
            self.undo_nesting = 0;
            self.sample = None;
            self.selection = Selection::NONE;
            self.undo_stack = None;
        }
        if let Some(history) = self.undo_history.as_mut() {
            history.forget(key);
        }
    }

    pub fn is_undo_enabled(&self) -> bool {
        self.config.undo_enabled
    }

    /// Turn undo recording on or off. Turning it off discards all history.
    pub fn enable_undo(&mut self, enabled: bool) {
        self.config.undo_enabled = enabled;
        if enabled {
            if self.undo_history.is_none() {
                self.undo_history = Some(UndoHistory::new(self.config.history_size));
            }
            if self.sample.is_some() && self.undo_stack.is_none() {
                self.undo_stack = Some(UndoStack::new(self.config.undo_depth));
            }
        } else {
            self.undo_stack = None;
            self.undo_history = None;
        }
    }

    fn undo_active(&self) -> bool {
        self.config.undo_enabled && self.undo_stack.is_some()
    }

    pub fn can_undo(&self) -> bool {
        self.undo_active() && self.undo_stack.as_ref().is_some_and(UndoStack::can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.undo_active() && self.undo_stack.as_ref().is_some_and(UndoStack::can_redo)
    }

    pub fn undo<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        self.step_history(module, true)
    }

    pub fn redo<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        self.step_history(module, false)
    }

    fn step_history<M: SampleModule + ?Sized>(&mut self, module: &mut M, back: bool) -> EditResult {
        if !self.undo_active() {
            return Ok(false);
        }
        let Some(key) = self.sample else {
            return Ok(false);
        };
        if module.sample(key).is_none() {
            return Ok(false);
        }
        self.end_drawing(module);
        let Some(mut stack) = self.undo_stack.take() else {
            return Ok(false);
        };
        let result = self.step_stack(module, key, &mut stack, back);
        self.undo_stack = Some(stack);
        result
    }

    fn step_stack<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        key: SampleKey,
        stack: &mut UndoStack,
        back: bool,
    ) -> EditResult {
        let target = if back { stack.peek_undo() } else { stack.peek_redo() };
        let Some(bytes) = target.map(UndoSnapshot::byte_len) else {
            return Ok(false);
        };
        // acquire before moving the cursor so a failure changes nothing
        let memory = match bytes {
            0 => None,
            _ => Some(
                module
                    .alloc_sample_mem(bytes)
                    .ok_or(EditError::OutOfMemory { bytes })?,
            ),
        };
        let snapshot = if back { stack.undo() } else { stack.redo() };
        let Some(snapshot) = snapshot else {
            if let Some(memory) = memory {
                module.free_sample_mem(memory);
            }
            return Ok(false);
        };

        module.enter_critical_section();
        let size_changed = self.restore(module, key, snapshot, memory);
        module.leave_critical_section();
        log::debug!(
            target: "undo",
            "{} to {} frames",
            if back { "undo" } else { "redo" },
            snapshot.len
        );

        self.listener.fetch_undo_data(&snapshot.user_data);
        self.listener.changes(size_changed);
        Ok(true)
    }

    /// Install a snapshot into the sample. Returns whether the length changed.
    fn restore<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        key: SampleKey,
        snapshot: &UndoSnapshot,
        mut memory: Option<SampleMemory>,
    ) -> bool {
        let Some(sample) = module.sample_mut(key) else {
            if let Some(memory) = memory {
                module.free_sample_mem(memory);
            }
            return false;
        };
        let old_len = sample.len();
        let len = match (memory.as_mut(), snapshot.data()) {
            (Some(block), Some(data)) => {
                block.as_bytes_mut()[..data.len()].copy_from_slice(data);
                snapshot.len
            }
            _ => 0,
        };
        let (old, unused) = sample.install(memory, len, snapshot.depth);
        snapshot.restore_header(sample);
        self.selection = snapshot.selection;
        let size_changed = sample.len() != old_len;
        for block in [old, unused].into_iter().flatten() {
            module.free_sample_mem(block);
        }
        size_changed
    }

    /// Open an undo bracket around a mutation of the attached sample.
    ///
    /// Brackets nest; only the outermost one captures and records.
    pub(crate) fn prepare_undo<M: SampleModule + ?Sized>(&mut self, module: &M) {
        if self.pending.is_some() {
            self.undo_nesting += 1;
            return;
        }
        let Some(key) = self.sample else {
            return;
        };
        let Some(sample) = module.sample(key) else {
            return;
        };
        let before = if self.undo_active() {
            let user_data = self.listener.feed_undo_data();
            Some(UndoSnapshot::capture(sample, self.selection, user_data))
        } else {
            None
        };
        self.pending = Some(PendingUndo {
            before,
            len_before: sample.len(),
        });
    }

    /// Close the bracket opened by `prepare_undo`, recording an entry if
    /// the sample changed.
    pub(crate) fn finish_undo<M: SampleModule + ?Sized>(&mut self, module: &mut M) {
        if self.undo_nesting > 0 {
            self.undo_nesting -= 1;
            return;
        }
        let Some(pending) = self.pending.take() else {
            return;
        };
        let Some(key) = self.sample else {
            return;
        };
        let Some(sample) = module.sample_mut(key) else {
            return;
        };
        self.listener.changes_validate(sample);
        let size_changed = sample.len() != pending.len_before;
        let Some(before) = pending.before else {
            self.listener.changes(size_changed);
            return;
        };
        let after = UndoSnapshot::capture(sample, self.selection, self.listener.feed_undo_data());
        if before == after {
            return;
        }
        if let Some(stack) = self.undo_stack.as_mut() {
            stack.record(before, after);
            log::debug!(target: "undo", "recorded edit, {} entries", stack.len());
        }
        self.listener.changes(size_changed);
    }

    pub fn selection(&self) -> Selection {
        self.selection
    }

    /// Set the raw selection. It is ordered and clamped on the next
    /// `validate` or operation.
    pub fn set_selection(&mut self, selection: Selection) {
        self.selection = selection;
    }

    pub fn reset_selection(&mut self) {
        self.selection = Selection::NONE;
    }

    pub fn select_all<M: SampleModule + ?Sized>(&mut self, module: &M) {
        if let Some(sample) = self.sample.and_then(|key| module.sample(key)) {
            self.selection = Selection::all(sample.len());
        }
    }

    /// Bring selection and loop back in line with the sample. Returns
    /// false (and drops the selection) if there is no usable sample.
    pub fn validate<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> bool {
        let Some(key) = self.sample else {
            self.selection = Selection::NONE;
            return false;
        };
        let Some(sample) = module.sample_mut(key) else {
            self.selection = Selection::NONE;
            return false;
        };
        sample.clamp_loop();
        if sample.is_empty() {
            self.selection = Selection::NONE;
            return false;
        }
        self.selection.normalize(sample.len());
        true
    }

    /// The attached sample, if it exists and holds frames.
    pub(crate) fn editable<'m, M: SampleModule + ?Sized>(&self, module: &'m M) -> Option<&'m Sample> {
        let sample = module.sample(self.sample?)?;
        (!sample.is_empty()).then_some(sample)
    }

    /// Apply a metadata change outside the undo history.
    fn edit_header<M, F>(&mut self, module: &mut M, edit: F) -> bool
    where
        M: SampleModule + ?Sized,
        F: FnOnce(&mut Sample) -> bool,
    {
        let Some(key) = self.sample else {
            return false;
        };
        let Some(sample) = module.sample_mut(key) else {
            return false;
        };
        if !edit(sample) {
            return false;
        }
        self.listener.changes_validate(sample);
        self.listener.changes(false);
        true
    }

    /// Move the loop start, keeping the loop end.
    pub fn set_loop_start<M: SampleModule + ?Sized>(&mut self, module: &mut M, start: u32) -> bool {
        self.edit_header(module, |sample| {
            let end = loop_end_or_len(sample);
            if start >= end || start == sample.loop_start {
                return false;
            }
            sample.loop_start = start;
            sample.loop_len = end - start;
            sample.clamp_loop();
            true
        })
    }

    /// Move the loop end (exclusive), keeping the loop start.
    pub fn set_loop_end<M: SampleModule + ?Sized>(&mut self, module: &mut M, end: u32) -> bool {
        self.edit_header(module, |sample| {
            let end = end.min(sample.len());
            if end <= sample.loop_start || end == sample.loop_end() {
                return false;
            }
            sample.loop_len = end - sample.loop_start;
            true
        })
    }

    pub fn set_loop_len<M: SampleModule + ?Sized>(&mut self, module: &mut M, len: u32) -> bool {
        let Some(start) = self.sample.and_then(|key| module.sample(key)).map(|s| s.loop_start) else {
            return false;
        };
        self.set_loop_end(module, start.saturating_add(len))
    }

    pub fn increase_loop_start<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> bool {
        match self.sample.and_then(|key| module.sample(key)) {
            Some(sample) => {
                let start = sample.loop_start + 1;
                self.set_loop_start(module, start)
            }
            None => false,
        }
    }

    pub fn decrease_loop_start<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> bool {
        match self.sample.and_then(|key| module.sample(key)) {
            Some(sample) if sample.loop_start > 0 => {
                let start = sample.loop_start - 1;
                self.set_loop_start(module, start)
            }
            _ => false,
        }
    }

    pub fn increase_loop_len<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> bool {
        match self.sample.and_then(|key| module.sample(key)) {
            Some(sample) => {
                let len = sample.loop_len + 1;
                self.set_loop_len(module, len)
            }
            None => false,
        }
    }

    pub fn decrease_loop_len<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> bool {
        match self.sample.and_then(|key| module.sample(key)) {
            Some(sample) if sample.loop_len > 1 => {
                let len = sample.loop_len - 1;
                self.set_loop_len(module, len)
            }
            _ => false,
        }
    }

    /// Change the loop type by selector index (0 = off, 1 = forward,
    /// 2 = ping-pong, 3 = one-shot).
    ///
    /// Enabling a loop on a sample whose loop is empty loops the whole
    /// sample. One-shot moves the loop start to 0, keeping the loop end.
    pub fn set_loop_type<M: SampleModule + ?Sized>(&mut self, module: &mut M, index: u8) -> bool {
        let Some(loop_type) = LoopType::from_index(index) else {
            return false;
        };
        self.edit_header(module, |sample| {
            if sample.loop_type == loop_type {
                return false;
            }
            if loop_type.is_looping() && sample.loop_len == 0 {
                sample.loop_start = 0;
                sample.loop_len = sample.len();
            }
            if loop_type == LoopType::OneShot {
                sample.loop_len = sample.loop_end();
                sample.loop_start = 0;
            }
            sample.loop_type = loop_type;
            true
        })
    }

    pub fn set_relative_note<M: SampleModule + ?Sized>(&mut self, module: &mut M, note: i32) -> bool {
        let note = note.clamp(MIN_RELATIVE_NOTE, MAX_RELATIVE_NOTE) as i8;
        self.edit_header(module, |sample| {
            let changed = sample.relative_note != note;
            sample.relative_note = note;
            changed
        })
    }

    /// Transpose by `offset` semitones.
    pub fn change_relative_note<M: SampleModule + ?Sized>(&mut self, module: &mut M, offset: i32) -> bool {
        match self.sample.and_then(|key| module.sample(key)) {
            Some(sample) => {
                let note = sample.relative_note as i32 + offset;
                self.set_relative_note(module, note)
            }
            None => false,
        }
    }

    pub fn set_finetune<M: SampleModule + ?Sized>(&mut self, module: &mut M, finetune: i32) -> bool {
        let finetune = finetune.clamp(i8::MIN as i32, i8::MAX as i32) as i8;
        self.edit_header(module, |sample| {
            let changed = sample.finetune != finetune;
            sample.finetune = finetune;
            changed
        })
    }

    /// Set the default volume on the 0..=64 scale.
    pub fn set_volume<M: SampleModule + ?Sized>(&mut self, module: &mut M, volume: u8) -> bool {
        let stored = ((volume.min(MAX_VOLUME) as u32 * 255 + 32) / MAX_VOLUME as u32) as u8;
        self.edit_header(module, |sample| {
            let changed = sample.volume != stored;
            sample.volume = stored;
            changed
        })
    }

    /// Default volume on the 0..=64 scale.
    pub fn volume<M: SampleModule + ?Sized>(&self, module: &M) -> Option<u8> {
        let sample = module.sample(self.sample?)?;
        Some(((sample.volume as u32 * MAX_VOLUME as u32 + 127) / 255) as u8)
    }

    pub fn set_panning<M: SampleModule + ?Sized>(&mut self, module: &mut M, panning: u8) -> bool {
        self.edit_header(module, |sample| {
            let changed = sample.panning != panning;
            sample.panning = panning;
            changed
        })
    }

    /// Milliseconds it takes to play `pos` frames of the attached sample
    /// transposed by `relative_note` semitones.
    pub fn position_to_millis<M: SampleModule + ?Sized>(&self, module: &M, pos: u32, relative_note: i32) -> u32 {
        match self.sample.and_then(|key| module.sample(key)) {
            Some(sample) => position_to_millis(pos, sample.relative_note as i32 + relative_note, sample.finetune),
            None => 0,
        }
    }

    /// Begin a freehand stroke; the whole stroke is one undo entry.
    pub fn start_drawing<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> bool {
        if self.drawing.is_some() || self.editable(module).is_none() {
            return false;
        }
        module.enter_critical_section();
        self.prepare_undo(module);
        self.drawing = Some(DrawState::default());
        true
    }

    pub fn is_drawing(&self) -> bool {
        self.drawing.is_some()
    }

    /// Draw `value` at frame `index`, joining it to the previous point with
    /// a straight line.
    pub fn draw_sample<M: SampleModule + ?Sized>(&mut self, module: &mut M, index: u32, value: f32) -> bool {
        let Some(state) = self.drawing.as_mut() else {
            return false;
        };
        let Some(key) = self.sample else {
            return false;
        };
        let Some(sample) = module.sample_mut(key) else {
            return false;
        };
        if index >= sample.len() {
            return false;
        }
        let value = value.clamp(-1.0, 1.0);
        match state.last {
            Some((from, from_value)) if from != index => {
                let (lo, hi) = (from.min(index), from.max(index));
                let span = (index as f32) - (from as f32);
                for i in lo..=hi {
                    let t = (i as f32 - from as f32) / span;
                    sample.set_float(i as usize, from_value + (value - from_value) * t);
                }
            }
            _ => sample.set_float(index as usize, value),
        }
        state.last = Some((index, value));
        true
    }

    /// Finish the stroke and commit it.
    pub fn end_drawing<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> bool {
        if self.drawing.take().is_none() {
            return false;
        }
        self.last_operation = LastOperation::Regular;
        self.finish_undo(module);
        module.leave_critical_section();
        true
    }

    /// Acquire a silent buffer from the module for the host to fill.
    pub fn create_work_sample<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        frames: u32,
        bits: u8,
        rate: f32,
    ) -> Result<WorkSample, EditError> {
        let depth = BitDepth::from_bits(bits).ok_or(EditError::UnsupportedBitDepth(bits))?;
        let bytes = frames as usize * depth.bytes_per_frame();
        let memory = module
            .alloc_sample_mem(bytes)
            .ok_or(EditError::OutOfMemory { bytes })?;
        Ok(WorkSample {
            memory,
            len: frames,
            depth,
            rate,
        })
    }

    /// Give an unused work sample's memory back.
    pub fn discard_work_sample<M: SampleModule + ?Sized>(&mut self, module: &mut M, work: WorkSample) {
        module.free_sample_mem(work.memory);
    }

    /// Replace the attached sample's content with `work`. The loop is
    /// cleared and the tuning set so the sample plays C-4 at the work
    /// sample's rate.
    pub fn paste_other<M: SampleModule + ?Sized>(&mut self, module: &mut M, work: WorkSample) -> EditResult {
        let Some(key) = self.sample.filter(|&key| module.sample(key).is_some()) else {
            module.free_sample_mem(work.memory);
            return Ok(false);
        };
        self.run_edit(module, None, |ed, module| {
            let Some(sample) = module.sample_mut(key) else {
                module.free_sample_mem(work.memory);
                return Ok(false);
            };
            let (old, unused) = sample.install(Some(work.memory), work.len, work.depth);
            sample.loop_start = 0;
            sample.loop_len = 0;
            sample.loop_type = LoopType::None;
            let (note, finetune) = tuning_for_rate(work.rate);
            sample.relative_note = note;
            sample.finetune = finetune;
            for block in [old, unused].into_iter().flatten() {
                module.free_sample_mem(block);
            }
            ed.selection = Selection::NONE;
            ed.last_operation = LastOperation::New;
            Ok(true)
        })
    }

    /// Run `body` as one undoable edit: critical section, lengthy
    /// notifications and an undo bracket around it. `command`, if given,
    /// becomes the filter "apply last filter" repeats.
    pub(crate) fn run_edit<M, F>(&mut self, module: &mut M, command: Option<FilterCommand>, body: F) -> EditResult
    where
        M: SampleModule + ?Sized,
        F: FnOnce(&mut Self, &mut M) -> EditResult,
    {
        if let Some(command) = command {
            log::debug!(target: "editor", "{} over {:?}", command.name(), self.selection);
            self.last_filter = Some(command);
        }
        module.enter_critical_section();
        self.listener.prepare_lengthy();
        self.last_operation = LastOperation::Regular;
        self.prepare_undo(module);
        let result = body(self, module);
        if let Err(e) = &result {
            log::warn!(target: "editor", "edit aborted: {e}");
        }
        self.finish_undo(module);
        self.listener.unprepare_lengthy();
        module.leave_critical_section();
        result
    }
}

/// Loop end, or the sample end when there is no loop yet.
fn loop_end_or_len(sample: &Sample) -> u32 {
    if sample.loop_len == 0 {
        sample.len()
    } else {
        sample.loop_end().min(sample.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::Clipboard;
    use crate::listener::{EditorEvent, EventLog, UndoUserData};
    use crate::module::SampleBank;

    fn setup(frames: u32) -> (SampleEditor<EventLog>, SampleBank, SampleKey) {
        let mut bank = SampleBank::new();
        let key = bank.create_sample("s", frames, BitDepth::Eight).unwrap();
        let mut editor = SampleEditor::new(EditorConfig::default(), Clipboard::shared(), EventLog::new());
        assert!(editor.attach(&mut bank, key));
        editor.listener_mut().take();
        (editor, bank, key)
    }

    #[test]
    fn attach_reloads_once() {
        let (mut editor, mut bank, key) = setup(4);
        assert!(!editor.attach(&mut bank, key));
        assert!(editor.listener().events.is_empty());
    }

    #[test]
    fn attach_keeps_per_sample_history() {
        let (mut editor, mut bank, a) = setup(8);
        let b = bank.create_sample("b", 8, BitDepth::Eight).unwrap();

        editor.set_selection(Selection::new(0, 4));
        editor.apply(&mut bank, FilterCommand::DcOffset { offset: 0.5 }).unwrap();
        assert!(editor.can_undo());

        editor.attach(&mut bank, b);
        assert!(!editor.can_undo());
        editor.attach(&mut bank, a);
        assert!(editor.can_undo());
    }

    #[test]
    fn metadata_edits_skip_history() {
        let (mut editor, mut bank, key) = setup(100);
        assert!(editor.set_loop_type(&mut bank, 1));
        assert_eq!(bank.sample(key).unwrap().loop_len, 100);
        assert!(editor.set_loop_start(&mut bank, 10));
        assert!(editor.set_loop_end(&mut bank, 50));
        let sample = bank.sample(key).unwrap();
        assert_eq!((sample.loop_start, sample.loop_end()), (10, 50));
        assert!(!editor.can_undo());
        assert_eq!(editor.listener().commits(), 3);
    }

    #[test]
    fn loop_start_cannot_pass_end() {
        let (mut editor, mut bank, _) = setup(100);
        editor.set_loop_type(&mut bank, 1);
        editor.set_loop_end(&mut bank, 20);
        assert!(!editor.set_loop_start(&mut bank, 20));
        assert!(!editor.set_loop_end(&mut bank, 0));
        assert!(editor.increase_loop_start(&mut bank));
        assert!(editor.decrease_loop_len(&mut bank));
        assert!(editor.increase_loop_len(&mut bank));
        assert!(editor.decrease_loop_start(&mut bank));
    }

    #[test]
    fn one_shot_moves_start_to_zero() {
        let (mut editor, mut bank, key) = setup(100);
        editor.set_loop_type(&mut bank, 1);
        editor.set_loop_start(&mut bank, 30);
        editor.set_loop_end(&mut bank, 60);
        assert!(editor.set_loop_type(&mut bank, 3));
        let sample = bank.sample(key).unwrap();
        assert_eq!((sample.loop_start, sample.loop_len, sample.loop_type), (0, 60, LoopType::OneShot));
    }

    #[test]
    fn moving_loop_start_ends_one_shot() {
        let (mut editor, mut bank, key) = setup(100);
        assert!(editor.set_loop_type(&mut bank, 3));
        assert!(editor.set_loop_start(&mut bank, 10));
        let sample = bank.sample(key).unwrap();
        assert_eq!((sample.loop_start, sample.loop_len, sample.loop_type), (10, 90, LoopType::Forward));
    }

    #[test]
    fn drawing_past_the_end_is_refused() {
        let (mut editor, mut bank, key) = setup(4);
        assert!(editor.start_drawing(&mut bank));
        assert!(editor.draw_sample(&mut bank, 3, 1.0));
        assert!(!editor.draw_sample(&mut bank, 9, 1.0));
        assert!(editor.draw_sample(&mut bank, 1, 0.0));
        assert!(editor.end_drawing(&mut bank));
        assert_eq!(bank.sample(key).unwrap().value(2), 64);
    }

    #[test]
    fn tuning_is_clamped() {
        let (mut editor, mut bank, key) = setup(4);
        editor.set_relative_note(&mut bank, 100);
        editor.set_finetune(&mut bank, -1000);
        let sample = bank.sample(key).unwrap();
        assert_eq!((sample.relative_note, sample.finetune), (71, -128));
        editor.change_relative_note(&mut bank, -200);
        assert_eq!(bank.sample(key).unwrap().relative_note, -48);
    }

    #[test]
    fn volume_uses_64_scale() {
        let (mut editor, mut bank, key) = setup(4);
        editor.set_volume(&mut bank, 64);
        assert_eq!(bank.sample(key).unwrap().volume, 255);
        editor.set_volume(&mut bank, 32);
        assert_eq!(editor.volume(&bank), Some(32));
        editor.set_volume(&mut bank, 200);
        assert_eq!(editor.volume(&bank), Some(64));
    }

    #[test]
    fn drawing_interpolates_and_is_one_entry() {
        let (mut editor, mut bank, key) = setup(10);
        assert!(editor.start_drawing(&mut bank));
        assert!(bank.is_editing());
        editor.draw_sample(&mut bank, 0, 0.0);
        editor.draw_sample(&mut bank, 4, 1.0);
        editor.draw_sample(&mut bank, 2, 0.0);
        assert!(editor.end_drawing(&mut bank));
        assert!(!bank.is_editing());

        let sample = bank.sample(key).unwrap();
        assert_eq!(sample.value(1), 32);
        assert_eq!(sample.value(2), 0);
        assert_eq!(sample.value(3), 64);
        assert_eq!(sample.value(4), 127);

        editor.undo(&mut bank).unwrap();
        assert!(!editor.can_undo());
        assert_eq!(bank.sample(key).unwrap().value(4), 0);
    }

    #[test]
    fn undo_restore_notifies_fetch_then_changes() {
        let (mut editor, mut bank, _) = setup(8);
        editor.listener_mut().user_data = UndoUserData(vec![7]);
        editor.apply(&mut bank, FilterCommand::DcOffset { offset: 0.25 }).unwrap();
        editor.listener_mut().take();
        assert!(editor.undo(&mut bank).unwrap());
        assert_eq!(
            editor.listener_mut().take(),
            vec![
                EditorEvent::FetchUndoData(UndoUserData(vec![7])),
                EditorEvent::Changes { size_changed: false },
            ]
        );
    }

    #[test]
    fn disabling_undo_drops_history_but_still_notifies() {
        let (mut editor, mut bank, _) = setup(8);
        editor.apply(&mut bank, FilterCommand::DcOffset { offset: 0.25 }).unwrap();
        editor.enable_undo(false);
        assert!(!editor.can_undo());
        editor.listener_mut().take();
        editor.apply(&mut bank, FilterCommand::DcOffset { offset: 0.25 }).unwrap();
        assert_eq!(editor.listener().commits(), 1);
        assert!(!editor.undo(&mut bank).unwrap());

        editor.enable_undo(true);
        editor.apply(&mut bank, FilterCommand::DcOffset { offset: 0.25 }).unwrap();
        assert!(editor.can_undo());
    }

    #[test]
    fn undo_out_of_memory_keeps_state() {
        let mut bank = SampleBank::with_memory_limit(16);
        let key = bank.create_sample("s", 8, BitDepth::Eight).unwrap();
        let mut editor = SampleEditor::new(EditorConfig::default(), Clipboard::shared(), NullListener);
        editor.attach(&mut bank, key);
        editor.apply(&mut bank, FilterCommand::DcOffset { offset: 0.5 }).unwrap();
        // leave less than a restore's worth of memory
        let hog = bank.alloc_sample_mem(1).unwrap();
        let err = editor.undo(&mut bank).unwrap_err();
        assert!(matches!(err, EditError::OutOfMemory { bytes: 8 }));
        assert!(editor.can_undo());
        assert_eq!(bank.sample(key).unwrap().value(0), 64);
        bank.free_sample_mem(hog);
        assert!(editor.undo(&mut bank).unwrap());
        assert_eq!(bank.sample(key).unwrap().value(0), 0);
    }

    #[test]
    fn work_sample_replaces_content() {
        let (mut editor, mut bank, key) = setup(4);
        let mut work = editor.create_work_sample(&mut bank, 16, 16, 16726.0).unwrap();
        work.set_value(3, 1234);
        assert!(editor.paste_other(&mut bank, work).unwrap());
        let sample = bank.sample(key).unwrap();
        assert_eq!(sample.len(), 16);
        assert!(sample.is_16bit());
        assert_eq!(sample.value(3), 1234);
        assert_eq!(sample.relative_note, 12);
        assert_eq!(editor.last_operation(), LastOperation::New);
        assert_eq!(bank.bytes_in_use(), 32);

        editor.undo(&mut bank).unwrap();
        assert_eq!(bank.sample(key).unwrap().len(), 4);
        assert_eq!(bank.bytes_in_use(), 4);
    }

    #[test]
    fn work_sample_rejects_bad_depth() {
        let (mut editor, mut bank, _) = setup(4);
        let err = editor.create_work_sample(&mut bank, 4, 12, 8363.0).unwrap_err();
        assert!(matches!(err, EditError::UnsupportedBitDepth(12)));
    }

    #[test]
    fn millis_follow_tuning() {
        let (mut editor, mut bank, _) = setup(4);
        assert_eq!(editor.position_to_millis(&bank, 8363, 0), 1000);
        editor.set_relative_note(&mut bank, 12);
        assert_eq!(editor.position_to_millis(&bank, 16726, 0), 1000);
        assert_eq!(editor.position_to_millis(&bank, 8363, -12), 1000);
    }
}
