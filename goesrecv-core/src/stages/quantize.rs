//! Soft-bit quantization, the terminal DSP stage.
//!
//! Stateless aside from its optional publisher: each recovered symbol's
//! in-phase component (the BPSK decision axis after Costas de-rotation) is
//! scaled to the full `i8` range and clamped.

use std::sync::Arc;

use crate::metrics::SharedMetrics;
use crate::publisher::SoftBitPublisher;
use crate::queue::Queue;
use crate::types::{SampleBlock, SoftBit, SoftBitBlock};

/// Converts recovered complex symbols into signed 8-bit soft bits.
pub struct Quantize {
    metrics: Arc<SharedMetrics>,
    soft_bit_publisher: Option<Box<dyn SoftBitPublisher>>,
}

impl Quantize {
    pub fn new(metrics: Arc<SharedMetrics>) -> Self {
        Self {
            metrics,
            soft_bit_publisher: None,
        }
    }

    pub fn set_soft_bit_publisher(&mut self, publisher: Box<dyn SoftBitPublisher>) {
        self.soft_bit_publisher = Some(publisher);
    }

    fn quantize_one(re: f32) -> SoftBit {
        (re.clamp(-1.0, 1.0) * i8::MAX as f32).round() as SoftBit
    }

    fn process_block(&self, input: &SampleBlock, output: &mut SoftBitBlock) {
        output.clear();
        for sample in input.as_slice() {
            output.push(Self::quantize_one(sample.re));
        }
        self.metrics.add_soft_bits(output.len() as u64);
    }

    /// Drain `qin` until EOF, writing quantized blocks to `qout`.
    pub fn run(&mut self, qin: &Queue<SampleBlock>, qout: &Queue<SoftBitBlock>) {
        loop {
            let Some(block) = qin.pop_for_read() else {
                break;
            };

            let mut out = qout.pop_for_write();
            self.process_block(&block, &mut out);

            if let Some(publisher) = &self.soft_bit_publisher {
                publisher.publish(&out);
            }

            qin.push_read(block);
            qout.push_write(out);
        }
        qout.close();
    }
}
