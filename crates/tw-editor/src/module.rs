//! The module the editor works against: sample storage plus the allocator
//! that owns committed sample memory.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use slotmap::SlotMap;
use tw_ir::{BitDepth, Sample, SampleKey, SampleMemory};

/// Owner of samples and their memory.
///
/// The editor never allocates committed sample memory itself: it asks the
/// module for a block, fills it, installs it into the sample and hands the
/// replaced block back through `free_sample_mem`.
pub trait SampleModule {
    fn sample(&self, key: SampleKey) -> Option<&Sample>;

    fn sample_mut(&mut self, key: SampleKey) -> Option<&mut Sample>;

    /// Acquire a zeroed block of `bytes` bytes, or `None` if exhausted.
    fn alloc_sample_mem(&mut self, bytes: usize) -> Option<SampleMemory>;

    /// Take back a block previously handed out.
    fn free_sample_mem(&mut self, memory: SampleMemory);

    /// Called before the live buffer of a sample is replaced or resized.
    fn enter_critical_section(&mut self) {}

    /// Pairs with `enter_critical_section`.
    fn leave_critical_section(&mut self) {}
}

/// Reference module: a slot map of samples with byte accounting and an
/// optional memory budget.
///
/// Critical sections nest; while any is open the shared `editing` flag is
/// raised so a playback thread can skip the sample data.
#[derive(Debug, Default)]
pub struct SampleBank {
    samples: SlotMap<SampleKey, Sample>,
    bytes_in_use: usize,
    memory_limit: Option<usize>,
    critical_depth: u32,
    editing: Arc<AtomicBool>,
}

impl SampleBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// A bank that refuses allocations beyond `bytes` in total.
    pub fn with_memory_limit(bytes: usize) -> Self {
        Self {
            memory_limit: Some(bytes),
            ..Self::default()
        }
    }

    /// Add a sample. Any memory it already holds counts against the bank.
    pub fn insert(&mut self, sample: Sample) -> SampleKey {
        self.bytes_in_use += sample.memory().map_or(0, SampleMemory::size);
        self.samples.insert(sample)
    }

    /// Create a silent sample with memory acquired from the bank.
    pub fn create_sample(&mut self, name: &str, frames: u32, depth: BitDepth) -> Option<SampleKey> {
        let mut sample = Sample::new(name);
        if frames > 0 {
            let memory = self.alloc_sample_mem(frames as usize * depth.bytes_per_frame())?;
            sample.install(Some(memory), frames, depth);
        } else {
            sample.install(None, 0, depth);
        }
        Some(self.samples.insert(sample))
    }

    /// Remove a sample, releasing its memory.
    pub fn remove(&mut self, key: SampleKey) -> Option<Sample> {
        let mut sample = self.samples.remove(key)?;
        if let Some(memory) = sample.take_memory() {
            self.free_sample_mem(memory);
        }
        Some(sample)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SampleKey, &Sample)> {
        self.samples.iter()
    }

    /// Bytes currently handed out.
    pub fn bytes_in_use(&self) -> usize {
        self.bytes_in_use
    }

    /// True while a critical section is open.
    pub fn is_editing(&self) -> bool {
        self.critical_depth > 0
    }

    /// Flag shared with consumers on other threads; set while a critical
    /// section is open.
    pub fn editing_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.editing)
    }
}

impl SampleModule for SampleBank {
    fn sample(&self, key: SampleKey) -> Option<&Sample> {
        self.samples.get(key)
    }

    fn sample_mut(&mut self, key: SampleKey) -> Option<&mut Sample> {
        self.samples.get_mut(key)
    }

    fn alloc_sample_mem(&mut self, bytes: usize) -> Option<SampleMemory> {
        let within_limit = self
            .bytes_in_use
            .checked_add(bytes)
            .is_some_and(|total| self.memory_limit.map_or(true, |limit| total <= limit));
        if !within_limit {
            log::warn!(
                target: "editor",
                "sample bank exhausted: {} + {} bytes over limit",
                self.bytes_in_use,
                bytes
            );
            return None;
        }
        let Some(memory) = SampleMemory::try_zeroed(bytes) else {
            log::warn!(target: "editor", "allocator refused {bytes} bytes");
            return None;
        };
        self.bytes_in_use += bytes;
        Some(memory)
    }

    fn free_sample_mem(&mut self, memory: SampleMemory) {
        self.bytes_in_use = self.bytes_in_use.saturating_sub(memory.size());
    }

    fn enter_critical_section(&mut self) {
        self.critical_depth += 1;
        self.editing.store(true, Ordering::Release);
    }

    fn leave_critical_section(&mut self) {
        self.critical_depth = self.critical_depth.saturating_sub(1);
        if self.critical_depth == 0 {
            self.editing.store(false, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_and_remove_accounts_bytes() {
        let mut bank = SampleBank::new();
        let key = bank.create_sample("a", 100, BitDepth::Sixteen).unwrap();
        assert_eq!(bank.bytes_in_use(), 200);
        assert_eq!(bank.sample(key).unwrap().len(), 100);
        bank.remove(key);
        assert_eq!(bank.bytes_in_use(), 0);
        assert!(bank.is_empty());
    }

    #[test]
    fn memory_limit_refuses_allocation() {
        let mut bank = SampleBank::with_memory_limit(64);
        assert!(bank.alloc_sample_mem(64).is_some());
        assert!(bank.alloc_sample_mem(1).is_none());
        assert!(bank.create_sample("b", 10, BitDepth::Eight).is_none());
    }

    #[test]
    fn impossible_block_is_refused() {
        let mut bank = SampleBank::new();
        assert!(bank.alloc_sample_mem(usize::MAX).is_none());
        assert_eq!(bank.bytes_in_use(), 0);
    }

    #[test]
    fn empty_sample_takes_no_memory() {
        let mut bank = SampleBank::new();
        let key = bank.create_sample("empty", 0, BitDepth::Sixteen).unwrap();
        assert!(bank.sample(key).unwrap().is_empty());
        assert!(bank.sample(key).unwrap().is_16bit());
        assert_eq!(bank.bytes_in_use(), 0);
    }

    #[test]
    fn critical_sections_nest() {
        let mut bank = SampleBank::new();
        let flag = bank.editing_flag();
        bank.enter_critical_section();
        bank.enter_critical_section();
        bank.leave_critical_section();
        assert!(bank.is_editing());
        assert!(flag.load(Ordering::Acquire));
        bank.leave_critical_section();
        assert!(!bank.is_editing());
        assert!(!flag.load(Ordering::Acquire));
    }
}
