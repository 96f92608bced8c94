//! Sample tuning: relative note + finetune <-> playback rate.
//!
//! A sample with relative note 0 and finetune 0 plays C-4 at
//! `BASE_C4_SPEED` Hz. Each semitone is 128 finetune steps.

/// Playback rate of C-4 for an untransposed sample (Amiga PAL rate).
pub const BASE_C4_SPEED: f32 = 8363.0;

const STEPS_PER_SEMITONE: f32 = 128.0;
const STEPS_PER_OCTAVE: f32 = 12.0 * STEPS_PER_SEMITONE;

const MIN_RELATIVE_NOTE: f32 = -48.0;
const MAX_RELATIVE_NOTE: f32 = 71.0;

/// Playback rate in Hz at which the sample sounds C-4.
pub fn c4_speed(relative_note: i8, finetune: i8) -> f32 {
    let steps = relative_note as f32 * STEPS_PER_SEMITONE + finetune as f32;
    BASE_C4_SPEED * libm::powf(2.0, steps / STEPS_PER_OCTAVE)
}

/// Relative note and finetune that make the sample play C-4 at `rate` Hz.
///
/// The relative note is rounded to the nearest semitone so the finetune
/// stays within half a semitone either way.
pub fn tuning_for_rate(rate: f32) -> (i8, i8) {
    if rate <= 0.0 {
        return (0, 0);
    }
    let steps = libm::roundf(libm::log2f(rate / BASE_C4_SPEED) * STEPS_PER_OCTAVE);
    let note = libm::roundf(steps / STEPS_PER_SEMITONE).clamp(MIN_RELATIVE_NOTE, MAX_RELATIVE_NOTE);
    let finetune = (steps - note * STEPS_PER_SEMITONE).clamp(i8::MIN as f32, i8::MAX as f32);
    (note as i8, finetune as i8)
}

/// Duration in milliseconds of `pos` frames played at C-4, transposed by
/// `relative_note` semitones.
pub fn position_to_millis(pos: u32, relative_note: i32, finetune: i8) -> u32 {
    let note = relative_note.clamp(i8::MIN as i32, i8::MAX as i32) as i8;
    let rate = c4_speed(note, finetune) as f64;
    ((pos as f64 / rate) * 1000.0) as u32
}
