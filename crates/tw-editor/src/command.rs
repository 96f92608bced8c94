//! Repeatable editing commands.

use crate::dsp::{Interpolation, NoiseKind};

/// A parametrized operation that "apply last filter" can run again.
///
/// Structural edits (cut, paste, crop, ...) are not commands; only
/// operations that transform or generate frames in place of a selection.
#[derive(Clone, Debug, PartialEq)]
pub enum FilterCommand {
    /// Multiply by a factor ramping linearly from `from` to `to`
    Scale { from: f32, to: f32 },
    /// Scale so the loudest frame reaches `level`
    Normalize { level: f32 },
    Reverse,
    /// ProTracker-style boost: exaggerate frame-to-frame changes
    Boost,
    /// Blend across the loop boundary
    CrossFade,
    /// Flip the sign bit of every frame
    ChangeSign,
    /// Swap the two bytes of every 16-bit frame
    SwapByteOrder,
    /// Resample so the sample plays at `rate` Hz at C-4
    Resample { rate: f32, interpolation: Interpolation },
    /// Subtract the mean
    RemoveDc,
    /// Add a constant
    DcOffset { offset: f32 },
    /// 3-tap box filter
    SmoothRectangular,
    /// 5-tap (1, 2, 3, 2, 1) filter
    SmoothTriangular,
    /// Graphic equalizer with 3 or 10 band gains in dB
    Equalize { gains: Vec<f32> },
    /// Replace the selection with, or insert, `frames` frames of silence
    Silence { frames: u32 },
    Noise { kind: NoiseKind },
    /// Periodic waveform spanning the selection `periods` times
    Oscillator {
        shape: WaveShape,
        amplitude: f32,
        periods: f32,
    },
}

impl FilterCommand {
    pub fn name(&self) -> &'static str {
        match self {
            FilterCommand::Scale { .. } => "scale",
            FilterCommand::Normalize { .. } => "normalize",
            FilterCommand::Reverse => "reverse",
            FilterCommand::Boost => "boost",
            FilterCommand::CrossFade => "cross fade",
            FilterCommand::ChangeSign => "change sign",
            FilterCommand::SwapByteOrder => "swap byte order",
            FilterCommand::Resample { .. } => "resample",
            FilterCommand::RemoveDc => "remove dc",
            FilterCommand::DcOffset { .. } => "dc offset",
            FilterCommand::SmoothRectangular => "smooth (rectangular)",
            FilterCommand::SmoothTriangular => "smooth (triangular)",
            FilterCommand::Equalize { .. } => "equalize",
            FilterCommand::Silence { .. } => "silence",
            FilterCommand::Noise { .. } => "noise",
            FilterCommand::Oscillator { .. } => "oscillator",
        }
    }
}

/// Periodic waveform shapes for synthesis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum WaveShape {
    #[default]
    Sine,
    Square,
    Triangle,
    Sawtooth,
}

impl WaveShape {
    /// Unit-amplitude value at `phase`, measured in cycles.
    pub fn value(self, phase: f32) -> f32 {
        let frac = phase - phase.floor();
        match self {
            WaveShape::Sine => (phase * core::f32::consts::TAU).sin(),
            WaveShape::Square => {
                if frac < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            WaveShape::Triangle => {
                if frac < 0.25 {
                    frac * 4.0
                } else if frac < 0.75 {
                    1.0 - (frac - 0.25) * 4.0
                } else {
                    -1.0 + (frac - 0.75) * 4.0
                }
            }
            WaveShape::Sawtooth => {
                if frac < 0.5 {
                    frac * 2.0
                } else {
                    -1.0 + (frac - 0.5) * 2.0
                }
            }
        }
    }
}

/// Kind of the most recent edit, so a host knows whether to reset its
/// waveform view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LastOperation {
    #[default]
    Regular,
    /// The length changed by removing or replacing frames
    Cut,
    /// The content was replaced by a new sample
    New,
}
