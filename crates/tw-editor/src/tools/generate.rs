//! Synthesis and length-changing generators: noise, oscillators, silence
//! and resampling.

use std::ops::Range;

use rand::RngCore;
use tw_ir::{c4_speed, tuning_for_rate, PcmRead, PcmWrite, Sample, SampleKey, Selection};

use super::reallocate;
use crate::command::{LastOperation, WaveShape};
use crate::dsp::resample::output_len;
use crate::dsp::{NoiseGenerator, NoiseKind, Resampler};
use crate::editor::SampleEditor;
use crate::error::{EditError, EditResult};
use crate::listener::EditorListener;
use crate::module::SampleModule;

pub(crate) fn noise(sample: &mut Sample, range: Range<usize>, kind: NoiseKind, rng: &mut dyn RngCore) -> bool {
    let mut generator = NoiseGenerator::new(kind, rng);
    for i in range {
        sample.set_float(i, generator.next_value());
    }
    true
}

/// Fill `range` with `periods` cycles of `shape`, starting at phase 0.
pub(crate) fn oscillator(
    sample: &mut Sample,
    range: Range<usize>,
    shape: WaveShape,
    amplitude: f32,
    periods: f32,
) -> bool {
    let width = range.len() as f32;
    for (n, i) in range.enumerate() {
        let phase = n as f32 / width * periods;
        sample.set_float(i, shape.value(phase) * amplitude);
    }
    true
}

impl<L: EditorListener> SampleEditor<L> {
    /// Put `frames` frames of silence where the selection is. A selection is
    /// replaced, a caret inserts in place, no selection inserts at the start.
    pub(crate) fn insert_silence<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        key: SampleKey,
        frames: u32,
    ) -> EditResult {
        let Some(sample) = module.sample(key) else {
            return Ok(false);
        };
        let len = sample.len();
        let (start, end) = match (self.selection.start, self.selection.end) {
            (Some(a), Some(b)) => (a.min(b).min(len), a.max(b).min(len)),
            _ => (0, 0),
        };
        if frames == 0 && start == end {
            return Ok(false);
        }
        let (Some(new_len), Some(gap_end)) = ((len - (end - start)).checked_add(frames), start.checked_add(frames))
        else {
            log::warn!(target: "editor", "{frames} frames of silence do not fit in a {len}-frame sample");
            return Ok(false);
        };
        let depth = sample.bit_depth();
        let bpf = depth.bytes_per_frame();
        let (head, gap) = (start as usize * bpf, gap_end as usize * bpf);

        let resized = reallocate(module, key, new_len, depth, |src, dst| {
            let src = src.raw();
            let dst = dst.raw_mut();
            dst[..head].copy_from_slice(&src[..head]);
            dst[gap..].copy_from_slice(&src[end as usize * bpf..]);
        })?;
        if !resized {
            return Ok(false);
        }
        if let Some(sample) = module.sample_mut(key) {
            sample.clamp_loop();
        }
        self.selection = match frames {
            0 => Selection::NONE,
            _ => Selection::new(start, gap_end),
        };
        self.last_operation = LastOperation::Cut;
        Ok(true)
    }

    /// Resample the whole sample so it plays at `rate` Hz at C-4, then retune
    /// it so the pitch is unchanged.
    pub(crate) fn resample_frames<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        key: SampleKey,
        rate: f32,
        resampler: &mut dyn Resampler,
    ) -> EditResult {
        let Some(sample) = module.sample(key) else {
            return Ok(false);
        };
        let step = c4_speed(sample.relative_note, sample.finetune) as f64 / rate as f64;
        let frames = output_len(sample.len() as usize, step);
        let Some(new_len) = u32::try_from(frames).ok().filter(|&n| n > 0) else {
            log::warn!(target: "editor", "resampling to {rate} Hz gives {frames} frames");
            return Ok(false);
        };
        let mut input = scratch(sample.len() as usize)?;
        input.extend((0..sample.len() as usize).map(|i| sample.float(i)));
        let mut output = scratch(frames)?;
        resampler.resample_into(&input, step, &mut output);
        let depth = sample.bit_depth();

        let resized = reallocate(module, key, new_len, depth, |_, dst| {
            for (i, &value) in output.iter().enumerate() {
                dst.set_float(i, value);
            }
        })?;
        if !resized {
            return Ok(false);
        }
        if let Some(sample) = module.sample_mut(key) {
            sample.loop_start = (sample.loop_start as f64 / step) as u32;
            sample.loop_len = (sample.loop_len as f64 / step) as u32;
            sample.clamp_loop();
            let (note, finetune) = tuning_for_rate(rate);
            sample.relative_note = note;
            sample.finetune = finetune;
        }
        self.selection = Selection::NONE;
        self.last_operation = LastOperation::Cut;
        Ok(true)
    }
}

/// An empty float buffer with room for `frames` values, or `OutOfMemory`.
fn scratch(frames: usize) -> Result<Vec<f32>, EditError> {
    let mut buffer = Vec::new();
    buffer.try_reserve_exact(frames).map_err(|_| EditError::OutOfMemory {
        bytes: frames.saturating_mul(std::mem::size_of::<f32>()),
    })?;
    Ok(buffer)
}
