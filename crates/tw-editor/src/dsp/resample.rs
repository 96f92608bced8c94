//! Resampling by a fixed read step.

/// Reads a frame sequence at fractional positions `0, step, 2 * step, ...`.
///
/// A step above 1.0 shortens the material (raises its rate), below 1.0
/// lengthens it.
pub trait Resampler {
    /// Append `output_len(input.len(), step)` frames to `output`.
    fn resample_into(&mut self, input: &[f32], step: f64, output: &mut Vec<f32>);

    fn resample(&mut self, input: &[f32], step: f64) -> Vec<f32> {
        let mut output = Vec::new();
        self.resample_into(input, step, &mut output);
        output
    }
}

/// Number of frames produced when reading `input_len` frames by `step`.
pub fn output_len(input_len: usize, step: f64) -> usize {
    if !(step.is_finite() && step > 0.0) {
        return 0;
    }
    (input_len as f64 / step) as usize
}

/// Built-in interpolating resamplers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Interpolation {
    /// Take the frame at or before the read position
    Nearest,
    /// Straight line between the two neighbours
    #[default]
    Linear,
    /// Catmull-Rom spline through four neighbours
    Cubic,
}

impl Interpolation {
    fn read(self, input: &[f32], pos: f64) -> f32 {
        let last = input.len() - 1;
        let i0 = (pos.floor() as usize).min(last);
        let t = (pos - i0 as f64).clamp(0.0, 1.0) as f32;
        let at = |i: isize| input[i.clamp(0, last as isize) as usize];
        match self {
            Interpolation::Nearest => input[i0],
            Interpolation::Linear => {
                let i1 = (i0 + 1).min(last);
                input[i0] * (1.0 - t) + input[i1] * t
            }
            Interpolation::Cubic => {
                let i = i0 as isize;
                let (p0, p1, p2, p3) = (at(i - 1), at(i), at(i + 1), at(i + 2));
                let a = -0.5 * p0 + 1.5 * p1 - 1.5 * p2 + 0.5 * p3;
                let b = p0 - 2.5 * p1 + 2.0 * p2 - 0.5 * p3;
                let c = -0.5 * p0 + 0.5 * p2;
                ((a * t + b) * t + c) * t + p1
            }
        }
    }
}

impl Resampler for Interpolation {
    fn resample_into(&mut self, input: &[f32], step: f64, output: &mut Vec<f32>) {
        if input.is_empty() {
            return;
        }
        let out_len = output_len(input.len(), step);
        output.extend((0..out_len).map(|i| self.read(input, i as f64 * step)));
    }
}
