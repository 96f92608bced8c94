//! Sample data model for the trackwave sample editor.
//!
//! This crate defines the owned waveform buffer, its loop and tuning
//! metadata, the selection interval used to scope edits, and the
//! bit-depth-agnostic accessors every editing operation reads and writes
//! through.
//!
//! Designed to be `no_std` compatible with the `alloc` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod pcm;
mod sample;
mod selection;
mod tuning;

pub use pcm::{
    decode_float, encode_float, BitDepth, PcmBuffer, PcmRead, PcmSlice, PcmSliceMut, PcmWrite,
};
pub use sample::{LoopType, Sample, SampleHeader, SampleKey, SampleMemory};
pub use selection::Selection;
pub use tuning::{c4_speed, position_to_millis, tuning_for_rate, BASE_C4_SPEED};
