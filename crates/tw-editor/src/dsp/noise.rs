//! White, pink and brown noise sources.

use rand::Rng;

/// Noise colour.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NoiseKind {
    /// Equal energy at all frequencies
    #[default]
    White,
    /// 1/f, equal energy per octave
    Pink,
    /// 1/f², integrated white noise
    Brown,
}

impl NoiseKind {
    /// Map the generator selector index (0 = white, 1 = pink, 2 = brown).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(NoiseKind::White),
            1 => Some(NoiseKind::Pink),
            2 => Some(NoiseKind::Brown),
            _ => None,
        }
    }
}

/// Noise source drawing white noise from any `rand` generator.
pub struct NoiseGenerator<R> {
    rng: R,
    kind: NoiseKind,
    pink: [f32; 7],
    brown: f32,
}

impl<R: Rng> NoiseGenerator<R> {
    pub fn new(kind: NoiseKind, rng: R) -> Self {
        Self {
            rng,
            kind,
            pink: [0.0; 7],
            brown: 0.0,
        }
    }

    fn white(&mut self) -> f32 {
        self.rng.gen_range(-1.0f32..=1.0)
    }

    /// Next value in [-1.0, 1.0].
    pub fn next_value(&mut self) -> f32 {
        let white = self.white();
        match self.kind {
            NoiseKind::White => white,
            NoiseKind::Pink => {
                // Paul Kellet's refined filter
                let b = &mut self.pink;
                b[0] = 0.99886 * b[0] + white * 0.055_517_9;
                b[1] = 0.99332 * b[1] + white * 0.075_075_9;
                b[2] = 0.96900 * b[2] + white * 0.153_852;
                b[3] = 0.86650 * b[3] + white * 0.310_485_6;
                b[4] = 0.55000 * b[4] + white * 0.532_952_2;
                b[5] = -0.7616 * b[5] - white * 0.016_898;
                let pink = b[0] + b[1] + b[2] + b[3] + b[4] + b[5] + b[6] + white * 0.5362;
                b[6] = white * 0.115_926;
                (pink * 0.11).clamp(-1.0, 1.0)
            }
            NoiseKind::Brown => {
                self.brown += white * 0.1;
                // leak so the walk does not drift off
                self.brown *= 0.9999;
                self.brown = self.brown.clamp(-1.0, 1.0);
                self.brown
            }
        }
    }
}
