//! Clipboard holding one copied region.

use std::cell::RefCell;
use std::ops::Range;
use std::rc::Rc;

use tw_ir::{decode_float, BitDepth, PcmBuffer, PcmRead, PcmSliceMut, PcmWrite, Sample, SampleKey};

use crate::error::{EditError, EditResult};
use crate::module::SampleModule;

/// Clipboard shared by every editor of a host.
///
/// The host creates one and hands clones of the handle to its editors. It
/// is not locked: only one editor may touch it at a time, under the same
/// serialization as the samples themselves.
pub type SharedClipboard = Rc<RefCell<Clipboard>>;

/// The last copied region, tagged with the depth it was copied at.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Clipboard {
    /// `width + 1` frames: the region plus the frame after it (0 past the
    /// end), so interpolating reads at the last frame have a neighbour.
    clip: Option<PcmBuffer>,
    width: u32,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new empty clipboard behind a shareable handle.
    pub fn shared() -> SharedClipboard {
        Rc::new(RefCell::new(Self::new()))
    }

    /// Copy `range` of `sample`. The range is ordered and clamped to the
    /// sample; an empty range leaves the clipboard as it was.
    pub fn copy(&mut self, sample: &Sample, range: Range<u32>) -> bool {
        let len = sample.len();
        let (start, end) = (range.start.min(len), range.end.min(len));
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        let width = end - start;
        if width == 0 {
            return false;
        }
        let mut clip = PcmBuffer::silent(width as usize + 1, sample.bit_depth());
        for i in 0..=width as usize {
            clip.set_value(i, sample.value(start as usize + i));
        }
        self.clip = Some(clip);
        self.width = width;
        true
    }

    pub fn is_empty(&self) -> bool {
        self.clip.is_none()
    }

    /// Number of copied frames.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Depth of the most recent copy.
    pub fn depth(&self) -> Option<BitDepth> {
        self.clip.as_ref().map(PcmBuffer::depth)
    }

    pub fn clear(&mut self) {
        self.clip = None;
        self.width = 0;
    }

    /// Element `index` scaled to `depth`.
    pub fn value_at(&self, index: usize, depth: BitDepth) -> i32 {
        let Some(clip) = &self.clip else {
            return 0;
        };
        let value = clip.value(index);
        match (clip.depth(), depth) {
            (BitDepth::Eight, BitDepth::Sixteen) => value << 8,
            (BitDepth::Sixteen, BitDepth::Eight) => value >> 8,
            _ => value,
        }
    }

    /// Element `index` as a 16-bit value.
    pub fn word(&self, index: usize) -> i32 {
        self.value_at(index, BitDepth::Sixteen)
    }

    /// Element `index` as an 8-bit value.
    pub fn byte(&self, index: usize) -> i32 {
        self.value_at(index, BitDepth::Eight)
    }

    /// Element `index` in [-1.0, 1.0].
    pub fn float(&self, index: usize) -> f32 {
        decode_float(BitDepth::Sixteen, self.word(index))
    }

    /// Insert the clip into sample `key` at frame `pos`.
    ///
    /// The sample gets a new block of `len + width` frames from the module;
    /// the old block goes back once the new one is installed. An empty
    /// destination receives the clip at 0. The loop moves with the frames
    /// after `pos`, and grows if `pos` falls inside it.
    pub fn paste<M: SampleModule + ?Sized>(&self, module: &mut M, key: SampleKey, pos: u32) -> EditResult {
        if self.is_empty() {
            return Ok(false);
        }
        let Some(sample) = module.sample(key) else {
            return Ok(false);
        };
        let (old_len, pos) = if sample.is_empty() {
            (0, 0)
        } else {
            (sample.len(), pos.min(sample.len()))
        };
        let depth = sample.bit_depth();
        let bpf = depth.bytes_per_frame();
        let new_len = old_len + self.width;
        let bytes = new_len as usize * bpf;
        let mut memory = module
            .alloc_sample_mem(bytes)
            .ok_or(EditError::OutOfMemory { bytes })?;

        let Some(sample) = module.sample(key) else {
            module.free_sample_mem(memory);
            return Ok(false);
        };
        {
            let (p, w) = (pos as usize * bpf, self.width as usize);
            let src = sample.raw();
            let mut dst = PcmSliceMut::new(memory.as_bytes_mut(), depth);
            dst.raw_mut()[..p].copy_from_slice(&src[..p]);
            for i in 0..w {
                dst.set_value(pos as usize + i, self.value_at(i, depth));
            }
            dst.raw_mut()[p + w * bpf..].copy_from_slice(&src[p..]);
        }

        let Some(sample) = module.sample_mut(key) else {
            module.free_sample_mem(memory);
            return Ok(false);
        };
        let (old, unused) = sample.install(Some(memory), new_len, depth);
        let mut loop_end = sample.loop_end();
        if loop_end > pos {
            if sample.loop_start >= pos {
                sample.loop_start += self.width;
            }
            loop_end += self.width;
        }
        sample.loop_len = loop_end - sample.loop_start;

        for block in [old, unused].into_iter().flatten() {
            module.free_sample_mem(block);
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::SampleBank;

    fn bank_with(data: &[i8]) -> (SampleBank, SampleKey) {
        let mut bank = SampleBank::new();
        let key = bank.create_sample("s", data.len() as u32, BitDepth::Eight).unwrap();
        let sample = bank.sample_mut(key).unwrap();
        for (i, &v) in data.iter().enumerate() {
            sample.set_value(i, v as i32);
        }
        (bank, key)
    }

    fn values(bank: &SampleBank, key: SampleKey) -> Vec<i32> {
        let sample = bank.sample(key).unwrap();
        (0..sample.len() as usize).map(|i| sample.value(i)).collect()
    }

    #[test]
    fn copy_keeps_guard_frame() {
        let (bank, key) = bank_with(&[1, 2, 3, 4, 5]);
        let mut clip = Clipboard::new();
        assert!(clip.copy(bank.sample(key).unwrap(), 1..3));
        assert_eq!(clip.width(), 2);
        assert_eq!(clip.byte(0), 2);
        assert_eq!(clip.byte(1), 3);
        assert_eq!(clip.byte(2), 4);

        assert!(clip.copy(bank.sample(key).unwrap(), 3..5));
        assert_eq!(clip.byte(2), 0);
    }

    #[test]
    fn copy_orders_and_clamps() {
        let (bank, key) = bank_with(&[1, 2, 3]);
        let mut clip = Clipboard::new();
        assert!(clip.copy(bank.sample(key).unwrap(), 10..1));
        assert_eq!(clip.width(), 2);
        assert_eq!(clip.byte(0), 2);
    }

    #[test]
    fn empty_copy_keeps_previous_clip() {
        let (bank, key) = bank_with(&[1, 2, 3]);
        let mut clip = Clipboard::new();
        clip.copy(bank.sample(key).unwrap(), 0..2);
        assert!(!clip.copy(bank.sample(key).unwrap(), 2..2));
        assert_eq!(clip.width(), 2);
    }

    #[test]
    fn width_aware_accessors() {
        let (bank, key) = bank_with(&[-128, 127]);
        let mut clip = Clipboard::new();
        clip.copy(bank.sample(key).unwrap(), 0..2);
        assert_eq!(clip.word(0), -32768);
        assert_eq!(clip.word(1), 127 << 8);
        assert_eq!(clip.float(0), -1.0);
    }

    #[test]
    fn paste_inserts_and_frees_old_block() {
        let (mut bank, key) = bank_with(&[1, 2, 3, 4]);
        let mut clip = Clipboard::new();
        clip.copy(bank.sample(key).unwrap(), 0..2);
        assert!(clip.paste(&mut bank, key, 2).unwrap());
        assert_eq!(values(&bank, key), vec![1, 2, 1, 2, 3, 4]);
        assert_eq!(bank.bytes_in_use(), 6);
    }

    #[test]
    fn paste_shifts_loop_after_position() {
        let (mut bank, key) = bank_with(&[0; 10]);
        {
            let sample = bank.sample_mut(key).unwrap();
            sample.loop_start = 4;
            sample.loop_len = 4;
        }
        let mut clip = Clipboard::new();
        clip.copy(bank.sample(key).unwrap(), 0..3);

        clip.paste(&mut bank, key, 2).unwrap();
        let sample = bank.sample(key).unwrap();
        assert_eq!((sample.loop_start, sample.loop_end()), (7, 11));

        clip.paste(&mut bank, key, 9).unwrap();
        let sample = bank.sample(key).unwrap();
        assert_eq!((sample.loop_start, sample.loop_end()), (7, 14));
    }

    #[test]
    fn paste_into_empty_sample_starts_at_zero() {
        let (src_bank, src) = bank_with(&[5, 6, 7]);
        let mut clip = Clipboard::new();
        clip.copy(src_bank.sample(src).unwrap(), 0..3);

        let mut bank = SampleBank::new();
        let key = bank.create_sample("dst", 0, BitDepth::Sixteen).unwrap();
        assert!(clip.paste(&mut bank, key, 50).unwrap());
        let sample = bank.sample(key).unwrap();
        assert_eq!(sample.len(), 3);
        assert_eq!(sample.value(0), 5 << 8);
    }

    #[test]
    fn paste_out_of_memory_leaves_sample() {
        let mut bank = SampleBank::with_memory_limit(4);
        let key = bank.create_sample("s", 4, BitDepth::Eight).unwrap();
        let mut clip = Clipboard::new();
        clip.copy(bank.sample(key).unwrap(), 0..2);
        let err = clip.paste(&mut bank, key, 0).unwrap_err();
        assert!(matches!(err, EditError::OutOfMemory { bytes: 6 }));
        assert_eq!(bank.sample(key).unwrap().len(), 4);
    }
}
