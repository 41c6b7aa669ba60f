//! Sample sources, external to the DSP pipeline proper.
//!
//! A `Source` is the pipeline's only producer: it mints buffers from its
//! output queue, fills them with samples read from wherever (an SDR, a
//! file, a test generator), and closes the queue once exhausted. Everything
//! downstream reacts to that close by draining and cascading its own queue
//! closure; a `Source` never needs to know who, if anyone, is listening.

use crate::queue::Queue;
use crate::types::SampleBlock;

/// Produces `SampleBlock`s onto a queue until exhausted.
pub trait Source: Send {
    /// Run to completion, closing `qout` when no more samples are available.
    fn run(&mut self, qout: &Queue<SampleBlock>);
}

/// A source that replays a fixed, in-memory sequence of samples.
///
/// Used by tests and by callers embedding `goesrecv-core` directly (rather
/// than through a real-time input device) to drive the pipeline from
/// pre-recorded or synthetic data.
pub struct VecSource {
    samples: Vec<crate::types::Sample>,
    block_size: usize,
}

impl VecSource {
    pub fn new(samples: Vec<crate::types::Sample>, block_size: usize) -> Self {
        assert!(block_size > 0, "block_size must be positive");
        Self {
            samples,
            block_size,
        }
    }
}

impl Source for VecSource {
    fn run(&mut self, qout: &Queue<SampleBlock>) {
        for chunk in self.samples.chunks(self.block_size) {
            let mut block = qout.pop_for_write();
            block.clear();
            block.extend_from_slice(chunk);
            qout.push_write(block);
        }
        qout.close();
    }
}
