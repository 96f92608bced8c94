//! Sample data types.

use alloc::vec;
use alloc::vec::Vec;
use arrayvec::ArrayString;

use crate::pcm::{BitDepth, PcmRead, PcmWrite};

slotmap::new_key_type! {
    /// Key identifying a sample inside its owning module.
    pub struct SampleKey;
}

/// A block of committed sample memory.
///
/// Blocks are handed out and taken back by the owning module's allocator;
/// a `Sample` holds at most one at a time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleMemory(Vec<u8>);

impl SampleMemory {
    /// A zero-filled block of `bytes` bytes.
    pub fn zeroed(bytes: usize) -> Self {
        Self(vec![0; bytes])
    }

    /// Like `zeroed`, but `None` if the allocator cannot provide the block.
    pub fn try_zeroed(bytes: usize) -> Option<Self> {
        let mut block = Vec::new();
        block.try_reserve_exact(bytes).ok()?;
        block.resize(bytes, 0);
        Some(Self(block))
    }

    /// Size of the block in bytes.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.0
    }
}

/// A sample definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sample {
    /// Sample name
    pub name: ArrayString<22>,
    /// Committed memory; `None` when the sample is empty
    memory: Option<SampleMemory>,
    /// Length in frames
    len: u32,
    /// Frame storage width
    depth: BitDepth,
    /// Loop start position (in frames)
    pub loop_start: u32,
    /// Loop length (in frames)
    pub loop_len: u32,
    /// Loop type
    pub loop_type: LoopType,
    /// Transpose relative to C-4, in semitones
    pub relative_note: i8,
    /// Fine tuning in 1/128 semitone steps
    pub finetune: i8,
    /// Default volume (0-255)
    pub volume: u8,
    /// Default panning (0-255, 128 = center)
    pub panning: u8,
}

impl Default for Sample {
    fn default() -> Self {
        Self {
            name: ArrayString::new(),
            memory: None,
            len: 0,
            depth: BitDepth::Eight,
            loop_start: 0,
            loop_len: 0,
            loop_type: LoopType::None,
            relative_note: 0,
            finetune: 0,
            volume: 255,
            panning: 128,
        }
    }
}

impl Sample {
    /// Create a new empty sample.
    pub fn new(name: &str) -> Self {
        let mut sample = Self::default();
        let _ = sample.name.try_push_str(name);
        sample
    }

    /// Length in frames.
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Returns true if the sample has no data.
    pub fn is_empty(&self) -> bool {
        self.len == 0 || self.memory.is_none()
    }

    pub fn bit_depth(&self) -> BitDepth {
        self.depth
    }

    pub fn is_16bit(&self) -> bool {
        self.depth == BitDepth::Sixteen
    }

    /// Size in bytes of the frames currently in use.
    pub fn byte_len(&self) -> usize {
        self.len as usize * self.depth.bytes_per_frame()
    }

    pub fn memory(&self) -> Option<&SampleMemory> {
        self.memory.as_ref()
    }

    /// Install new memory and length, handing back the previous block.
    ///
    /// `memory` must hold at least `len` frames at `depth`. Installing zero
    /// frames always leaves the sample without memory; any block passed in
    /// alongside is handed back too, so callers release both.
    pub fn install(
        &mut self,
        memory: Option<SampleMemory>,
        len: u32,
        depth: BitDepth,
    ) -> (Option<SampleMemory>, Option<SampleMemory>) {
        debug_assert!(memory
            .as_ref()
            .map_or(len == 0, |m| m.size() >= len as usize * depth.bytes_per_frame()));
        let old = self.memory.take();
        self.depth = depth;
        if len == 0 {
            self.len = 0;
            return (old, memory);
        }
        self.memory = memory;
        self.len = len;
        (old, None)
    }

    /// Detach the memory block, leaving an empty sample.
    pub fn take_memory(&mut self) -> Option<SampleMemory> {
        self.len = 0;
        self.memory.take()
    }

    /// Shrink the logical length without touching memory.
    pub fn truncate(&mut self, len: u32) {
        self.len = self.len.min(len);
    }

    /// Reinterpret the existing bytes at another depth.
    ///
    /// The frame count becomes whatever fits in the bytes in use; loop
    /// points are rescaled by the same factor. Returns false, leaving the
    /// sample alone, if the depth is unchanged or the frame count would not
    /// fit in a `u32`.
    pub fn reinterpret(&mut self, depth: BitDepth) -> bool {
        if depth == self.depth {
            return false;
        }
        match depth {
            BitDepth::Eight => {
                let (Some(len), Some(loop_start), Some(loop_len)) = (
                    self.len.checked_mul(2),
                    self.loop_start.checked_mul(2),
                    self.loop_len.checked_mul(2),
                ) else {
                    return false;
                };
                self.len = len;
                self.loop_start = loop_start;
                self.loop_len = loop_len;
            }
            BitDepth::Sixteen => {
                self.len >>= 1;
                self.loop_start >>= 1;
                self.loop_len >>= 1;
            }
        }
        self.depth = depth;
        true
    }

    /// Loop end position (exclusive).
    pub fn loop_end(&self) -> u32 {
        self.loop_start + self.loop_len
    }

    /// Returns true if the sample has a loop.
    pub fn has_loop(&self) -> bool {
        self.loop_type != LoopType::None && self.loop_len > 0
    }

    /// Bring the loop back inside the sample after a structural change.
    ///
    /// A loop start past the end resets to 0, a loop end past the end is
    /// pulled in, and a one-shot loop not starting at 0 becomes a plain
    /// forward loop.
    pub fn clamp_loop(&mut self) {
        if self.loop_start > self.len {
            self.loop_start = 0;
        }
        if self.loop_end() > self.len {
            self.loop_len = self.len - self.loop_start;
        }
        if self.loop_type == LoopType::OneShot && self.loop_start != 0 {
            self.loop_type = LoopType::Forward;
        }
    }

    /// Metadata fingerprint, used to detect whether a sample changed.
    pub fn header(&self) -> SampleHeader {
        SampleHeader {
            len: self.len,
            depth: self.depth,
            loop_start: self.loop_start,
            loop_len: self.loop_len,
            loop_type: self.loop_type,
            relative_note: self.relative_note,
            finetune: self.finetune,
            volume: self.volume,
            panning: self.panning,
        }
    }
}

impl PcmRead for Sample {
    fn depth(&self) -> BitDepth {
        self.depth
    }

    fn raw(&self) -> &[u8] {
        match &self.memory {
            Some(mem) => &mem.as_bytes()[..self.byte_len()],
            None => &[],
        }
    }
}

impl PcmWrite for Sample {
    fn raw_mut(&mut self) -> &mut [u8] {
        let byte_len = self.byte_len();
        match &mut self.memory {
            Some(mem) => &mut mem.as_bytes_mut()[..byte_len],
            None => &mut [],
        }
    }
}

/// Everything about a sample except its frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SampleHeader {
    pub len: u32,
    pub depth: BitDepth,
    pub loop_start: u32,
    pub loop_len: u32,
    pub loop_type: LoopType,
    pub relative_note: i8,
    pub finetune: i8,
    pub volume: u8,
    pub panning: u8,
}

/// Sample loop type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LoopType {
    /// No loop
    #[default]
    None,
    /// Forward loop
    Forward,
    /// Ping-pong (bidirectional) loop
    PingPong,
    /// Forward loop starting at 0 that plays the attack once
    OneShot,
}

impl LoopType {
    /// Map the editor's loop selector index (0 = off, 1 = forward,
    /// 2 = ping-pong, 3 = one-shot).
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(LoopType::None),
            1 => Some(LoopType::Forward),
            2 => Some(LoopType::PingPong),
            3 => Some(LoopType::OneShot),
            _ => None,
        }
    }

    pub fn index(self) -> u8 {
        match self {
            LoopType::None => 0,
            LoopType::Forward => 1,
            LoopType::PingPong => 2,
            LoopType::OneShot => 3,
        }
    }

    /// True for every type that repeats.
    pub fn is_looping(self) -> bool {
        self != LoopType::None
    }

    /// True when playback wraps forward (forward and one-shot).
    pub fn is_forward(self) -> bool {
        matches!(self, LoopType::Forward | LoopType::OneShot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_8bit(data: &[i8]) -> Sample {
        let mut sample = Sample::new("test");
        let bytes: Vec<u8> = data.iter().map(|&v| v as u8).collect();
        let mut mem = SampleMemory::zeroed(bytes.len());
        mem.as_bytes_mut().copy_from_slice(&bytes);
        sample.install(Some(mem), data.len() as u32, BitDepth::Eight);
        sample
    }

    #[test]
    fn new_sample_is_empty() {
        let sample = Sample::new("kick");
        assert!(sample.is_empty());
        assert_eq!(sample.name.as_str(), "kick");
        assert_eq!(sample.frames(), 0);
    }

    #[test]
    fn accessors_respect_logical_length() {
        let mut sample = sample_8bit(&[10, 20, 30, 40]);
        sample.truncate(2);
        assert_eq!(sample.frames(), 2);
        assert_eq!(sample.value(1), 20);
        assert_eq!(sample.value(2), 0);
        assert_eq!(sample.memory().map(SampleMemory::size), Some(4));
    }

    #[test]
    fn install_zero_frames_hands_back_everything() {
        let mut sample = sample_8bit(&[1, 2]);
        let (old, unused) = sample.install(None, 0, BitDepth::Sixteen);
        assert!(old.is_some());
        assert!(unused.is_none());
        assert!(sample.is_empty());
        assert!(sample.memory().is_none());
        assert!(sample.is_16bit());
    }

    #[test]
    fn reinterpret_scales_length_and_loop() {
        let mut sample = sample_8bit(&[0; 8]);
        sample.loop_start = 2;
        sample.loop_len = 4;
        assert!(sample.reinterpret(BitDepth::Sixteen));
        assert_eq!((sample.len(), sample.loop_start, sample.loop_len), (4, 1, 2));
        assert!(sample.reinterpret(BitDepth::Eight));
        assert_eq!((sample.len(), sample.loop_start, sample.loop_len), (8, 2, 4));
        assert!(!sample.reinterpret(BitDepth::Eight));
    }

    #[test]
    fn reinterpret_refuses_length_past_u32() {
        let mut sample = sample_8bit(&[0; 4]);
        assert!(sample.reinterpret(BitDepth::Sixteen));
        sample.len = u32::MAX / 2 + 1;
        assert!(!sample.reinterpret(BitDepth::Eight));
        assert_eq!(sample.len(), u32::MAX / 2 + 1);
        assert_eq!(sample.bit_depth(), BitDepth::Sixteen);
    }

    #[test]
    fn clamp_loop_pulls_loop_inside() {
        let mut sample = sample_8bit(&[0; 10]);
        sample.loop_start = 4;
        sample.loop_len = 20;
        sample.clamp_loop();
        assert_eq!((sample.loop_start, sample.loop_len), (4, 6));

        sample.loop_start = 11;
        sample.loop_len = 0;
        sample.clamp_loop();
        assert_eq!(sample.loop_start, 0);
    }

    #[test]
    fn clamp_loop_clears_one_shot_off_zero() {
        let mut sample = sample_8bit(&[0; 10]);
        sample.loop_type = LoopType::OneShot;
        sample.loop_start = 3;
        sample.loop_len = 2;
        sample.clamp_loop();
        assert_eq!(sample.loop_type, LoopType::Forward);
    }

    #[test]
    fn loop_type_index_round_trip() {
        for i in 0..4 {
            assert_eq!(LoopType::from_index(i).map(LoopType::index), Some(i));
        }
        assert_eq!(LoopType::from_index(4), None);
    }
}
