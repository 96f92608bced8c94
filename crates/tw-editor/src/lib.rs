//! Undoable sample-buffer editing for the trackwave tracker.
//!
//! A `SampleEditor` attaches to one sample of a `SampleModule` at a time and
//! runs destructive edits over it: clipboard transfer, crop and minimize,
//! bit-depth conversion, resampling, level and smoothing filters, EQ and
//! waveform synthesis. Every edit is bracketed by an undo snapshot, and
//! each sample keeps its own undo stack across re-attachment.
//!
//! Sample memory always comes from, and goes back to, the module's
//! allocator. An edit that cannot get memory fails with
//! `EditError::OutOfMemory` and leaves the sample as it was.

mod clipboard;
mod command;
mod config;
pub mod dsp;
mod editor;
mod error;
mod listener;
mod module;
mod tools;
mod undo;

pub use clipboard::{Clipboard, SharedClipboard};
pub use command::{FilterCommand, LastOperation, WaveShape};
pub use config::{EditorConfig, MIN_UNDO_DEPTH};
pub use dsp::{Equalizer, EqualizerBank, Interpolation, NoiseGenerator, NoiseKind, Resampler};
pub use editor::{SampleEditor, WorkSample, MAX_VOLUME};
pub use error::{EditError, EditResult};
pub use listener::{EditorEvent, EditorListener, EventLog, NullListener, UndoUserData};
pub use module::{SampleBank, SampleModule};
pub use undo::{UndoHistory, UndoSnapshot, UndoStack};

pub use tw_ir;
