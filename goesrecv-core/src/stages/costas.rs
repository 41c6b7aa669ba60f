//! Costas carrier-tracking loop for BPSK.
//!
//! A second-order PLL: the BPSK phase detector (in-phase times quadrature)
//! drives a proportional+integral loop filter that steers a free-running
//! NCO used to de-rotate the incoming samples. `alpha`/`beta` (the
//! proportional/integral gains) are derived once from `bandwidth`/`damping`
//! at construction time using the standard second-order loop-filter design.

use std::sync::Arc;

use crate::config::CostasConfig;
use crate::metrics::SharedMetrics;
use crate::publisher::SamplePublisher;
use crate::queue::Queue;
use crate::types::{Sample, SampleBlock};

/// Wrap a phase in radians to `(-pi, pi]`.
fn wrap_phase(phase: f32) -> f32 {
    let pi = std::f32::consts::PI;
    let wrapped = (phase + pi).rem_euclid(2.0 * pi) - pi;
    if wrapped <= -pi {
        wrapped + 2.0 * pi
    } else {
        wrapped
    }
}

/// BPSK Costas carrier-recovery loop.
pub struct Costas {
    phase: f32,
    freq: f32,
    alpha: f32,
    beta: f32,
    max_deviation: f32,
    metrics: Arc<SharedMetrics>,
    sample_publisher: Option<Box<dyn SamplePublisher>>,
}

impl Costas {
    pub fn new(config: CostasConfig, metrics: Arc<SharedMetrics>) -> Self {
        let omega_n = config.bandwidth * 8.0 * config.damping / (4.0 * config.damping * config.damping + 1.0);
        let alpha = 2.0 * config.damping * omega_n;
        let beta = omega_n * omega_n;

        let stage = Self {
            phase: 0.0,
            freq: 0.0,
            alpha,
            beta,
            max_deviation: config.max_deviation,
            metrics,
            sample_publisher: None,
        };
        stage.metrics.set_costas_frequency(stage.freq);
        stage.metrics.set_costas_phase(stage.phase);
        stage
    }

    pub fn set_sample_publisher(&mut self, publisher: Box<dyn SamplePublisher>) {
        self.sample_publisher = Some(publisher);
    }

    pub fn frequency(&self) -> f32 {
        self.freq
    }

    fn process_sample(&mut self, sample: Sample) -> Sample {
        let nco = Sample::new(self.phase.cos(), -self.phase.sin());
        let corrected = sample * nco;

        // BPSK phase detector: in-phase times quadrature, zero at perfect lock.
        let error = corrected.re * corrected.im;

        self.freq = (self.freq + self.beta * error).clamp(-self.max_deviation, self.max_deviation);
        self.phase += self.alpha * error + self.freq;
        self.phase = wrap_phase(self.phase);

        corrected
    }

    fn process_block(&mut self, block: &mut SampleBlock) {
        for sample in block.as_mut_vec().iter_mut() {
            *sample = self.process_sample(*sample);
        }
        self.metrics.set_costas_frequency(self.freq);
        self.metrics.set_costas_phase(self.phase);
    }

    /// Drain `qin` until EOF, writing de-rotated blocks to `qout`.
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
