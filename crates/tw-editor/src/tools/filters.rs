//! In-place filters over a frame range.
//!
//! Each returns whether it touched the sample. Frames are read and written
//! through the float accessors except where the operation is about the
//! stored bits themselves.

use std::ops::Range;

use tw_ir::{BitDepth, PcmBuffer, PcmRead, PcmWrite, Sample};

use crate::dsp::Equalizer;

/// Box filter taps.
pub(crate) const RECTANGULAR: [f32; 3] = [1.0, 1.0, 1.0];
/// Triangular filter taps.
pub(crate) const TRIANGULAR: [f32; 5] = [1.0, 2.0, 3.0, 2.0, 1.0];

pub(crate) fn scale(sample: &mut Sample, range: Range<usize>, from: f32, to: f32) -> bool {
    let step = (to - from) / range.len() as f32;
    for (n, i) in range.enumerate() {
        let factor = from + step * n as f32;
        let value = sample.float(i) * factor;
        sample.set_float(i, value);
    }
    true
}

/// Scale so the peak reaches `level`. A silent range is left alone.
pub(crate) fn normalize(sample: &mut Sample, range: Range<usize>, level: f32) -> bool {
    let peak = range
        .clone()
        .map(|i| sample.float(i).abs())
        .fold(0.0f32, f32::max);
    if peak == 0.0 {
        return false;
    }
    let factor = level / peak;
    for i in range {
        let value = sample.float(i) * factor;
        sample.set_float(i, value);
    }
    true
}

pub(crate) fn reverse(sample: &mut Sample, range: Range<usize>) -> bool {
    let (start, end) = (range.start, range.end);
    for i in 0..(end - start) / 2 {
        let (a, b) = (start + i, end - 1 - i);
        let (va, vb) = (sample.value(a), sample.value(b));
        sample.set_value(a, vb);
        sample.set_value(b, va);
    }
    true
}

/// Amplify each frame's change from the previous one by a quarter.
pub(crate) fn boost(sample: &mut Sample, range: Range<usize>) -> bool {
    let mut previous = 0.0f32;
    for i in range {
        let current = sample.float(i);
        let delta = (current - previous) * 0.25;
        previous = current;
        sample.set_float(i, current + delta);
    }
    true
}

/// Toggle between signed and unsigned interpretation of each frame.
pub(crate) fn change_sign(sample: &mut Sample, range: Range<usize>) -> bool {
    let depth = sample.bit_depth();
    for i in range {
        let value = sample.value(i);
        let flipped = match depth {
            BitDepth::Eight => ((value as u8) ^ 0x7f) as i8 as i32,
            BitDepth::Sixteen => ((value as u16) ^ 0x7fff) as i16 as i32,
        };
        sample.set_value(i, flipped);
    }
    true
}

/// Swap the bytes of each 16-bit frame. 8-bit samples are left alone.
pub(crate) fn swap_byte_order(sample: &mut Sample, range: Range<usize>) -> bool {
    if !sample.is_16bit() {
        return false;
    }
    let raw = sample.raw_mut();
    for frame in raw[range.start * 2..range.end * 2].chunks_exact_mut(2) {
        frame.swap(0, 1);
    }
    true
}

/// Subtract the mean of the range.
pub(crate) fn remove_dc(sample: &mut Sample, range: Range<usize>) -> bool {
    let sum: f32 = range.clone().map(|i| sample.float(i)).sum();
    let dc = sum / range.len() as f32;
    dc_offset(sample, range, -dc)
}

pub(crate) fn dc_offset(sample: &mut Sample, range: Range<usize>, offset: f32) -> bool {
    for i in range {
        let value = sample.float(i) + offset;
        sample.set_float(i, value);
    }
    true
}

/// Convolve the range with symmetric `taps`, normalized to unit gain.
///
/// Reads come from a copy of the range taken up front; positions outside it
/// repeat the nearest edge frame.
pub(crate) fn smooth(sample: &mut Sample, range: Range<usize>, taps: &[f32]) -> bool {
    let source = PcmBuffer::copy_from(&*sample, range.clone());
    let gain: f32 = taps.iter().sum();
    let half = (taps.len() / 2) as i64;
    for (n, i) in range.enumerate() {
        let acc: f32 = taps
            .iter()
            .enumerate()
            .map(|(k, &tap)| tap * source.float_clamped(n as i64 + k as i64 - half))
            .sum();
        sample.set_float(i, acc / gain);
    }
    true
}

pub(crate) fn equalize(sample: &mut Sample, range: Range<usize>, eq: &mut dyn Equalizer) -> bool {
    for i in range {
        let value = eq.process(sample.float(i));
        sample.set_float(i, value);
    }
    true
}
