//! Bit-depth-aware access to raw PCM bytes.
//!
//! Sample memory is an opaque byte block. `BitDepth` says how to read it,
//! and the `PcmRead`/`PcmWrite` traits keep element decoding, bounds and the
//! float mapping in one place. 16-bit frames are stored little-endian.

use alloc::vec;
use alloc::vec::Vec;

/// Storage width of one sample frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BitDepth {
    /// Signed 8-bit frames (-128..=127)
    #[default]
    Eight,
    /// Signed 16-bit little-endian frames (-32768..=32767)
    Sixteen,
}

impl BitDepth {
    /// Map a bit count to a depth. Only 8 and 16 are valid.
    pub fn from_bits(bits: u8) -> Option<Self> {
        match bits {
            8 => Some(BitDepth::Eight),
            16 => Some(BitDepth::Sixteen),
            _ => None,
        }
    }

    pub fn bits(self) -> u8 {
        match self {
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
        }
    }

    /// Bytes occupied by one frame.
    pub fn bytes_per_frame(self) -> usize {
        match self {
            BitDepth::Eight => 1,
            BitDepth::Sixteen => 2,
        }
    }

    /// Largest positive native value.
    pub fn max_value(self) -> i32 {
        match self {
            BitDepth::Eight => i8::MAX as i32,
            BitDepth::Sixteen => i16::MAX as i32,
        }
    }

    /// Most negative native value.
    pub fn min_value(self) -> i32 {
        match self {
            BitDepth::Eight => i8::MIN as i32,
            BitDepth::Sixteen => i16::MIN as i32,
        }
    }
}

/// Convert a native value to the [-1.0, 1.0] range.
///
/// Positive values divide by the largest positive value, negative values by
/// the magnitude of the most negative one, so both extremes map to exactly
/// +1.0 and -1.0.
pub fn decode_float(depth: BitDepth, value: i32) -> f32 {
    if value > 0 {
        value as f32 / depth.max_value() as f32
    } else {
        value as f32 / -(depth.min_value() as f32)
    }
}

/// Convert a float to a native value, clamping to [-1.0, 1.0] and rounding
/// half away from zero.
pub fn encode_float(depth: BitDepth, value: f32) -> i32 {
    let value = value.clamp(-1.0, 1.0);
    if value > 0.0 {
        (value * depth.max_value() as f32 + 0.5) as i32
    } else {
        (value * -(depth.min_value() as f32) - 0.5) as i32
    }
}

/// Read access to a run of PCM frames.
pub trait PcmRead {
    /// Storage width of the frames.
    fn depth(&self) -> BitDepth;

    /// Raw frame bytes. Only the first `frames() * bytes_per_frame` are meaningful.
    fn raw(&self) -> &[u8];

    /// Number of addressable frames.
    fn frames(&self) -> usize {
        self.raw().len() / self.depth().bytes_per_frame()
    }

    /// Native signed value at `index`. Out-of-range reads return 0.
    fn value(&self, index: usize) -> i32 {
        if index >= self.frames() {
            return 0;
        }
        let raw = self.raw();
        match self.depth() {
            BitDepth::Eight => raw[index] as i8 as i32,
            BitDepth::Sixteen => i16::from_le_bytes([raw[index * 2], raw[index * 2 + 1]]) as i32,
        }
    }

    /// Float value at `index`, clamping the index into the buffer.
    fn float(&self, index: usize) -> f32 {
        let frames = self.frames();
        if frames == 0 {
            return 0.0;
        }
        decode_float(self.depth(), self.value(index.min(frames - 1)))
    }

    /// Float value at a signed index, clamped to `[0, frames - 1]`.
    fn float_clamped(&self, index: i64) -> f32 {
        self.float(index.max(0) as usize)
    }
}

/// Write access to a run of PCM frames.
pub trait PcmWrite: PcmRead {
    fn raw_mut(&mut self) -> &mut [u8];

    /// Store a native value, saturating to the depth's range. Writes past the
    /// last frame are ignored.
    fn set_value(&mut self, index: usize, value: i32) {
        if index >= self.frames() {
            return;
        }
        let depth = self.depth();
        let value = value.clamp(depth.min_value(), depth.max_value());
        let raw = self.raw_mut();
        match depth {
            BitDepth::Eight => raw[index] = value as i8 as u8,
            BitDepth::Sixteen => {
                let [lo, hi] = (value as i16).to_le_bytes();
                raw[index * 2] = lo;
                raw[index * 2 + 1] = hi;
            }
        }
    }

    /// Store a float value through `encode_float`.
    fn set_float(&mut self, index: usize, value: f32) {
        let depth = self.depth();
        self.set_value(index, encode_float(depth, value));
    }
}

/// Borrowed read-only view over PCM bytes.
#[derive(Clone, Copy, Debug)]
pub struct PcmSlice<'a> {
    bytes: &'a [u8],
    depth: BitDepth,
}

impl<'a> PcmSlice<'a> {
    pub fn new(bytes: &'a [u8], depth: BitDepth) -> Self {
        Self { bytes, depth }
    }
}

impl PcmRead for PcmSlice<'_> {
    fn depth(&self) -> BitDepth {
        self.depth
    }

    fn raw(&self) -> &[u8] {
        self.bytes
    }
}

/// Borrowed writable view over PCM bytes, e.g. a freshly acquired memory
/// block being filled before it is installed.
#[derive(Debug)]
pub struct PcmSliceMut<'a> {
    bytes: &'a mut [u8],
    depth: BitDepth,
}

impl<'a> PcmSliceMut<'a> {
    pub fn new(bytes: &'a mut [u8], depth: BitDepth) -> Self {
        Self { bytes, depth }
    }
}

impl PcmRead for PcmSliceMut<'_> {
    fn depth(&self) -> BitDepth {
        self.depth
    }

    fn raw(&self) -> &[u8] {
        self.bytes
    }
}

impl PcmWrite for PcmSliceMut<'_> {
    fn raw_mut(&mut self) -> &mut [u8] {
        self.bytes
    }
}

/// Owned scratch buffer of PCM frames.
///
/// Used for work copies that never become committed sample memory
/// (pre-edit copies, clip contents, format conversion staging).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PcmBuffer {
    bytes: Vec<u8>,
    depth: BitDepth,
}

impl PcmBuffer {
    /// A silent buffer of `frames` frames.
    pub fn silent(frames: usize, depth: BitDepth) -> Self {
        Self {
            bytes: vec![0; frames * depth.bytes_per_frame()],
            depth,
        }
    }

    /// Copy `range` frames out of `source`.
    pub fn copy_from(source: &impl PcmRead, range: core::ops::Range<usize>) -> Self {
        let bpf = source.depth().bytes_per_frame();
        let end = range.end.min(source.frames());
        let start = range.start.min(end);
        Self {
            bytes: source.raw()[start * bpf..end * bpf].to_vec(),
            depth: source.depth(),
        }
    }

    pub fn from_bytes(bytes: Vec<u8>, depth: BitDepth) -> Self {
        Self { bytes, depth }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

impl PcmRead for PcmBuffer {
    fn depth(&self) -> BitDepth {
        self.depth
    }

    fn raw(&self) -> &[u8] {
        &self.bytes
    }
}

impl PcmWrite for PcmBuffer {
    fn raw_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn float_mapping_is_asymmetric() {
        assert_eq!(decode_float(BitDepth::Eight, 127), 1.0);
        assert_eq!(decode_float(BitDepth::Eight, -128), -1.0);
        assert_eq!(decode_float(BitDepth::Sixteen, 32767), 1.0);
        assert_eq!(decode_float(BitDepth::Sixteen, -32768), -1.0);
        assert!((decode_float(BitDepth::Eight, 64) - 64.0 / 127.0).abs() < 1e-6);
        assert!((decode_float(BitDepth::Eight, -64) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn encode_clamps_and_rounds() {
        assert_eq!(encode_float(BitDepth::Eight, 2.0), 127);
        assert_eq!(encode_float(BitDepth::Eight, -2.0), -128);
        assert_eq!(encode_float(BitDepth::Sixteen, 1.0), 32767);
        assert_eq!(encode_float(BitDepth::Sixteen, -1.0), -32768);
        assert_eq!(encode_float(BitDepth::Eight, 0.0), 0);
        // 0.5 * 127 + 0.5 = 64.0
        assert_eq!(encode_float(BitDepth::Eight, 0.5), 64);
    }

    #[test]
    fn native_values_round_trip_through_float() {
        for v in -128..=127 {
            let f = decode_float(BitDepth::Eight, v);
            assert_eq!(encode_float(BitDepth::Eight, f), v);
        }
        for v in [-32768, -12345, -1, 0, 1, 999, 32767] {
            let f = decode_float(BitDepth::Sixteen, v);
            assert_eq!(encode_float(BitDepth::Sixteen, f), v);
        }
    }

    #[test]
    fn sixteen_bit_is_little_endian() {
        let mut buf = PcmBuffer::silent(2, BitDepth::Sixteen);
        buf.set_value(1, -2);
        assert_eq!(buf.raw(), &[0, 0, 0xFE, 0xFF]);
        assert_eq!(buf.value(1), -2);
    }

    #[test]
    fn out_of_range_access_is_inert() {
        let mut buf = PcmBuffer::silent(2, BitDepth::Eight);
        buf.set_value(5, 100);
        assert_eq!(buf.value(5), 0);
        assert_eq!(buf.raw(), &[0, 0]);
    }

    #[test]
    fn set_value_saturates() {
        let mut buf = PcmBuffer::silent(1, BitDepth::Eight);
        buf.set_value(0, 1000);
        assert_eq!(buf.value(0), 127);
        buf.set_value(0, -1000);
        assert_eq!(buf.value(0), -128);
    }

    #[test]
    fn float_clamps_index() {
        let buf = PcmBuffer::from_bytes(vec![127, 0, 0x80], BitDepth::Eight);
        assert_eq!(buf.float_clamped(-4), 1.0);
        assert_eq!(buf.float(99), -1.0);
        assert_eq!(PcmBuffer::default().float(0), 0.0);
    }

    #[test]
    fn copy_from_clamps_range() {
        let buf = PcmBuffer::from_bytes(vec![1, 2, 3, 4], BitDepth::Eight);
        let part = PcmBuffer::copy_from(&buf, 2..10);
        assert_eq!(part.raw(), &[3, 4]);
    }
}
