//! Frame-level editing operations.
//!
//! Repeatable filters go through `SampleEditor::apply`, which checks the
//! preconditions, opens the edit bracket and remembers the command for
//! `apply_last_filter`. Structural edits have their own entry points in
//! `structure`.

mod cross_fade;
mod filters;
mod generate;
mod structure;

use std::ops::Range;

use tw_ir::{c4_speed, BitDepth, PcmSliceMut, Sample, SampleKey};

use crate::command::{FilterCommand, WaveShape};
use crate::dsp::{Equalizer, EqualizerBank, Interpolation, NoiseKind, Resampler};
use crate::editor::SampleEditor;
use crate::error::{EditError, EditResult};
use crate::listener::EditorListener;
use crate::module::SampleModule;

impl<L: EditorListener> SampleEditor<L> {
    /// Run `command` over the selection (or the whole sample) and remember
    /// it for `apply_last_filter`.
    pub fn apply<M: SampleModule + ?Sized>(&mut self, module: &mut M, command: FilterCommand) -> EditResult {
        let Some(key) = self.sample else {
            return Ok(false);
        };
        let Some(sample) = self.editable(module) else {
            return Ok(false);
        };
        if !self.accepts(sample, &command) {
            return Ok(false);
        }
        let repeat = command.clone();
        self.run_edit(module, Some(repeat), |ed, module| ed.run_command(module, key, &command))
    }

    /// Run the last applied filter again with the same parameters.
    pub fn apply_last_filter<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        match self.last_filter.clone() {
            Some(command) => self.apply(module, command),
            None => Ok(false),
        }
    }

    pub fn can_apply_last_filter<M: SampleModule + ?Sized>(&self, module: &M) -> bool {
        self.last_filter.is_some() && self.editable(module).is_some()
    }

    pub fn last_filter(&self) -> Option<&FilterCommand> {
        self.last_filter.as_ref()
    }

    fn accepts(&self, sample: &Sample, command: &FilterCommand) -> bool {
        match command {
            FilterCommand::CrossFade => cross_fade::span(sample, self.selection).is_some(),
            FilterCommand::SwapByteOrder => sample.is_16bit(),
            FilterCommand::Resample { rate, .. } => rate.is_finite() && *rate > 0.0,
            FilterCommand::Equalize { gains } => {
                let ok = matches!(gains.len(), 3 | 10);
                if !ok {
                    log::warn!(target: "editor", "equalizer needs 3 or 10 bands, got {}", gains.len());
                }
                ok
            }
            _ => true,
        }
    }

    fn run_command<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        key: SampleKey,
        command: &FilterCommand,
    ) -> EditResult {
        match command {
            FilterCommand::Resample { rate, interpolation } => {
                let mut resampler = *interpolation;
                return self.resample_frames(module, key, *rate, &mut resampler);
            }
            FilterCommand::Silence { frames } => return self.insert_silence(module, key, *frames),
            _ => {}
        }

        let Some(sample) = module.sample_mut(key) else {
            return Ok(false);
        };
        let range = self.filter_range(sample);
        let changed = match command {
            FilterCommand::Scale { from, to } => filters::scale(sample, range, *from, *to),
            FilterCommand::Normalize { level } => filters::normalize(sample, range, *level),
            FilterCommand::Reverse => filters::reverse(sample, range),
            FilterCommand::Boost => filters::boost(sample, range),
            FilterCommand::CrossFade => cross_fade::apply(sample, self.selection),
            FilterCommand::ChangeSign => filters::change_sign(sample, range),
            FilterCommand::SwapByteOrder => filters::swap_byte_order(sample, range),
            FilterCommand::RemoveDc => filters::remove_dc(sample, range),
            FilterCommand::DcOffset { offset } => filters::dc_offset(sample, range, *offset),
            FilterCommand::SmoothRectangular => filters::smooth(sample, range, &filters::RECTANGULAR),
            FilterCommand::SmoothTriangular => filters::smooth(sample, range, &filters::TRIANGULAR),
            FilterCommand::Equalize { gains } => {
                let rate = c4_speed(sample.relative_note, sample.finetune);
                match EqualizerBank::new(gains, rate) {
                    Some(mut bank) => filters::equalize(sample, range, &mut bank),
                    None => false,
                }
            }
            FilterCommand::Noise { kind } => generate::noise(sample, range, *kind, &mut *self.noise_rng),
            FilterCommand::Oscillator {
                shape,
                amplitude,
                periods,
            } => generate::oscillator(sample, range, *shape, *amplitude, *periods),
            FilterCommand::Resample { .. } | FilterCommand::Silence { .. } => false,
        };
        Ok(changed)
    }

    /// Frames a filter works on: the selection, or everything.
    pub(crate) fn filter_range(&self, sample: &Sample) -> Range<usize> {
        let range = self.selection.range_or_all(sample.len());
        range.start as usize..range.end as usize
    }

    pub fn scale<M: SampleModule + ?Sized>(&mut self, module: &mut M, from: f32, to: f32) -> EditResult {
        self.apply(module, FilterCommand::Scale { from, to })
    }

    pub fn normalize<M: SampleModule + ?Sized>(&mut self, module: &mut M, level: f32) -> EditResult {
        self.apply(module, FilterCommand::Normalize { level })
    }

    pub fn reverse<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        self.apply(module, FilterCommand::Reverse)
    }

    pub fn boost<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        self.apply(module, FilterCommand::Boost)
    }

    pub fn cross_fade<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        self.apply(module, FilterCommand::CrossFade)
    }

    pub fn change_sign<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        self.apply(module, FilterCommand::ChangeSign)
    }

    pub fn swap_byte_order<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        self.apply(module, FilterCommand::SwapByteOrder)
    }

    pub fn resample<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        rate: f32,
        interpolation: Interpolation,
    ) -> EditResult {
        self.apply(module, FilterCommand::Resample { rate, interpolation })
    }

    pub fn remove_dc<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        self.apply(module, FilterCommand::RemoveDc)
    }

    pub fn dc_offset<M: SampleModule + ?Sized>(&mut self, module: &mut M, offset: f32) -> EditResult {
        self.apply(module, FilterCommand::DcOffset { offset })
    }

    pub fn smooth_rectangular<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        self.apply(module, FilterCommand::SmoothRectangular)
    }

    pub fn smooth_triangular<M: SampleModule + ?Sized>(&mut self, module: &mut M) -> EditResult {
        self.apply(module, FilterCommand::SmoothTriangular)
    }

    /// Graphic equalizer; `gains` are 3 or 10 band gains in dB.
    pub fn equalize<M: SampleModule + ?Sized>(&mut self, module: &mut M, gains: &[f32]) -> EditResult {
        self.apply(
            module,
            FilterCommand::Equalize {
                gains: gains.to_vec(),
            },
        )
    }

    pub fn generate_silence<M: SampleModule + ?Sized>(&mut self, module: &mut M, frames: u32) -> EditResult {
        self.apply(module, FilterCommand::Silence { frames })
    }

    pub fn generate_noise<M: SampleModule + ?Sized>(&mut self, module: &mut M, kind: NoiseKind) -> EditResult {
        self.apply(module, FilterCommand::Noise { kind })
    }

    pub fn generate_sine<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        amplitude: f32,
        periods: f32,
    ) -> EditResult {
        self.generate_waveform(module, WaveShape::Sine, amplitude, periods)
    }

    pub fn generate_square<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        amplitude: f32,
        periods: f32,
    ) -> EditResult {
        self.generate_waveform(module, WaveShape::Square, amplitude, periods)
    }

    pub fn generate_triangle<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        amplitude: f32,
        periods: f32,
    ) -> EditResult {
        self.generate_waveform(module, WaveShape::Triangle, amplitude, periods)
    }

    pub fn generate_sawtooth<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        amplitude: f32,
        periods: f32,
    ) -> EditResult {
        self.generate_waveform(module, WaveShape::Sawtooth, amplitude, periods)
    }

    pub fn generate_waveform<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        shape: WaveShape,
        amplitude: f32,
        periods: f32,
    ) -> EditResult {
        self.apply(
            module,
            FilterCommand::Oscillator {
                shape,
                amplitude,
                periods,
            },
        )
    }

    /// Resample with a caller-supplied resampler. Not repeatable through
    /// `apply_last_filter`.
    pub fn resample_with<M: SampleModule + ?Sized>(
        &mut self,
        module: &mut M,
        rate: f32,
        resampler: &mut dyn Resampler,
    ) -> EditResult {
        let Some(key) = self.sample else {
            return Ok(false);
        };
        if self.editable(module).is_none() || !(rate.is_finite() && rate > 0.0) {
            return Ok(false);
        }
        self.run_edit(module, None, |ed, module| ed.resample_frames(module, key, rate, resampler))
    }

    /// Filter the selection through a caller-supplied equalizer. Not
    /// repeatable through `apply_last_filter`.
    pub fn equalize_with<M: SampleModule + ?Sized>(&mut self, module: &mut M, eq: &mut dyn Equalizer) -> EditResult {
        let Some(key) = self.sample else {
            return Ok(false);
        };
        if self.editable(module).is_none() {
            return Ok(false);
        }
        self.run_edit(module, None, |ed, module| {
            let Some(sample) = module.sample_mut(key) else {
                return Ok(false);
            };
            let range = ed.filter_range(sample);
            Ok(filters::equalize(sample, range, eq))
        })
    }
}

/// Give sample `key` a fresh zeroed block of `len` frames at `depth`, let
/// `fill` copy what it keeps from the current content, then install the
/// block and release the old one.
///
/// Nothing about the sample changes if the module has no memory.
pub(crate) fn reallocate<M, F>(module: &mut M, key: SampleKey, len: u32, depth: BitDepth, fill: F) -> EditResult
where
    M: SampleModule + ?Sized,
    F: FnOnce(&Sample, &mut PcmSliceMut<'_>),
{
    let bytes = len as usize * depth.bytes_per_frame();
    let mut memory = match bytes {
        0 => None,
        _ => Some(
            module
                .alloc_sample_mem(bytes)
                .ok_or(EditError::OutOfMemory { bytes })?,
        ),
    };
    let Some(sample) = module.sample(key) else {
        if let Some(block) = memory {
            module.free_sample_mem(block);
        }
        return Ok(false);
    };
    if let Some(block) = memory.as_mut() {
        fill(sample, &mut PcmSliceMut::new(block.as_bytes_mut(), depth));
    }
    let Some(sample) = module.sample_mut(key) else {
        if let Some(block) = memory {
            module.free_sample_mem(block);
        }
        return Ok(false);
    };
    let (old, unused) = sample.install(memory, len, depth);
    for block in [old, unused].into_iter().flatten() {
        module.free_sample_mem(block);
    }
    Ok(true)
}

#[cfg(test)]
pub(crate) fn test_sample(values: &[i32], depth: BitDepth) -> Sample {
    use tw_ir::{PcmWrite, SampleMemory};

    let mut sample = Sample::new("test");
    let len = values.len() as u32;
    let memory = (len > 0).then(|| SampleMemory::zeroed(values.len() * depth.bytes_per_frame()));
    sample.install(memory, len, depth);
    for (i, &v) in values.iter().enumerate() {
        sample.set_value(i, v);
    }
    sample
}
