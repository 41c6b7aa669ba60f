//! Core data types flowing through the demodulation pipeline.

use num_complex::Complex32;

/// A single complex baseband sample: 32-bit float in-phase/quadrature components.
pub type Sample = Complex32;

/// A signed 8-bit soft bit. -127 = certainly 0, +127 = certainly 1.
pub type SoftBit = i8;

/// A fixed-capacity, move-only block of samples.
///
/// `SampleBlock` owns its storage; blocks are recycled by `Queue<T>` rather
/// than allocated per-block on the hot path. `capacity()` is the maximum the
/// block was minted with; `len()` is how much of it is currently valid data.
#[derive(Debug, Clone, Default)]
pub struct SampleBlock {
    samples: Vec<Sample>,
    capacity: usize,
}

impl SampleBlock {
    /// Create an empty block pre-allocated to `capacity` samples.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn as_slice(&self) -> &[Sample] {
        &self.samples
    }

    pub fn as_mut_vec(&mut self) -> &mut Vec<Sample> {
        &mut self.samples
    }

    pub fn push(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn extend_from_slice(&mut self, samples: &[Sample]) {
        self.samples.extend_from_slice(samples);
    }
}

/// A fixed-capacity, move-only block of soft bits.
#[derive(Debug, Clone, Default)]
pub struct SoftBitBlock {
    bits: Vec<SoftBit>,
    capacity: usize,
}

impl SoftBitBlock {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bits: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.bits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn as_slice(&self) -> &[SoftBit] {
        &self.bits
    }

    pub fn push(&mut self, bit: SoftBit) {
        self.bits.push(bit);
    }

    pub fn clear(&mut self) {
        self.bits.clear();
    }
}
