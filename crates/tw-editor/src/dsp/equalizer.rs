//! Peaking-band graphic equalizer.

use arrayvec::ArrayVec;

/// Frame-by-frame filter applied by the equalize operation.
pub trait Equalizer {
    fn process(&mut self, input: f32) -> f32;
}

/// Rate the band frequencies are specified at; they scale with the
/// sample's own rate so the curve stays put relative to Nyquist.
pub const REFERENCE_RATE: f32 = 44100.0;

/// Band centres of the 3-band equalizer (low / mid / high).
pub const THREE_BAND_CENTERS: [f32; 3] = [80.0, 2500.0, 12000.0];

/// Band centres of the 10-band equalizer, one octave apart.
pub const TEN_BAND_CENTERS: [f32; 10] = [
    31.25, 62.5, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// One RBJ peaking biquad.
#[derive(Clone, Copy, Debug, Default)]
pub struct PeakingBand {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

impl PeakingBand {
    /// A band boosting or cutting `gain_db` around `center` Hz, `bandwidth`
    /// Hz wide, at `sample_rate`.
    pub fn new(center: f32, bandwidth: f32, sample_rate: f32, gain_db: f32) -> Self {
        let a = 10f64.powf(gain_db as f64 / 40.0);
        let w0 = core::f64::consts::TAU * center as f64 / sample_rate as f64;
        let q = (center / bandwidth.max(f32::EPSILON)) as f64;
        let alpha = w0.sin() / (2.0 * q);
        let cos_w0 = w0.cos();
        let a0 = 1.0 + alpha / a;
        Self {
            b0: (1.0 + alpha * a) / a0,
            b1: (-2.0 * cos_w0) / a0,
            b2: (1.0 - alpha * a) / a0,
            a1: (-2.0 * cos_w0) / a0,
            a2: (1.0 - alpha / a) / a0,
            ..Self::default()
        }
    }

    pub fn process(&mut self, input: f32) -> f32 {
        let x = input as f64;
        let y = self.b0 * x + self.b1 * self.x1 + self.b2 * self.x2 - self.a1 * self.y1 - self.a2 * self.y2;
        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;
        y as f32
    }
}

/// A chain of peaking bands, 3 or 10 of them.
#[derive(Clone, Debug)]
pub struct EqualizerBank {
    bands: ArrayVec<PeakingBand, 10>,
}

impl EqualizerBank {
    /// Bands at the standard centres with `gains_db`, for material at
    /// `sample_rate`. `None` unless there are exactly 3 or 10 gains.
    pub fn new(gains_db: &[f32], sample_rate: f32) -> Option<Self> {
        let centers: &[f32] = match gains_db.len() {
            3 => &THREE_BAND_CENTERS,
            10 => &TEN_BAND_CENTERS,
            _ => return None,
        };
        let scale = sample_rate / REFERENCE_RATE;
        let bands = centers
            .iter()
            .zip(gains_db)
            .map(|(&center, &gain)| PeakingBand::new(center * scale, center * scale, sample_rate, gain))
            .collect();
        Some(Self { bands })
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }
}

impl Equalizer for EqualizerBank {
    fn process(&mut self, input: f32) -> f32 {
        self.bands.iter_mut().fold(input, |x, band| band.process(x))
    }
}
