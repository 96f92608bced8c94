//! Signal processing collaborators used by the editing operations.
//!
//! Each works on plain `f32` frames in [-1.0, 1.0] and knows nothing about
//! samples or bit depths.

pub mod equalizer;
pub mod noise;
pub mod resample;

pub use equalizer::{Equalizer, EqualizerBank, PeakingBand};
pub use noise::{NoiseGenerator, NoiseKind};
pub use resample::{Interpolation, Resampler};
