//! Automatic gain control.
//!
//! A single running gain scales every sample, then nudges itself towards a
//! unit-magnitude output using a simple exponential update. There is no
//! lookahead and no separate attack/decay rate -- the same `alpha` pulls the
//! gain up or down depending on the sign of `1 - |y|`.

use std::sync::Arc;

use crate::config::AgcConfig;
use crate::metrics::SharedMetrics;
use crate::publisher::SamplePublisher;
use crate::queue::Queue;
use crate::types::SampleBlock;

/// Automatic gain control stage.
pub struct Agc {
    gain: f32,
    min: f32,
    max: f32,
    alpha: f32,
    metrics: Arc<SharedMetrics>,
    sample_publisher: Option<Box<dyn SamplePublisher>>,
}

impl Agc {
    pub fn new(config: AgcConfig, metrics: Arc<SharedMetrics>) -> Self {
        let stage = Self {
            gain: 1.0,
            min: config.min,
            max: config.max,
            alpha: config.alpha,
            metrics,
            sample_publisher: None,
        };
        stage.metrics.set_agc_gain(stage.gain);
        stage
    }

    pub fn set_sample_publisher(&mut self, publisher: Box<dyn SamplePublisher>) {
        self.sample_publisher = Some(publisher);
    }

    pub fn gain(&self) -> f32 {
        self.gain
    }

    /// Apply AGC to one block in place, updating `self.gain` per sample.
    fn process_block(&mut self, block: &mut SampleBlock) {
        for sample in block.as_mut_vec().iter_mut() {
            let y = *sample * self.gain;
            self.gain = (self.gain + self.alpha * (1.0 - y.norm())).clamp(self.min, self.max);
            *sample = y;
        }
        self.metrics.set_agc_gain(self.gain);
    }

    /// Drain `qin` until EOF, writing gain-adjusted blocks to `qout`.
    ///
    /// Closes `qout` and returns once `qin` is exhausted, cascading shutdown
    /// to the next stage.
    pub fn run(&mut self, qin: &Queue<SampleBlock>, qout: &Queue<SampleBlock>) {
        loop {
            let Some(mut block) = qin.pop_for_read() else {
                break;
            };

            self.process_block(&mut block);

            if let Some(publisher) = &self.sample_publisher {
                publisher.publish(&block);
            }

            let mut out = qout.pop_for_write();
            std::mem::swap(&mut out, &mut block);
            qin.push_read(block);
            qout.push_write(out);
        }
        qout.close();
    }
}
