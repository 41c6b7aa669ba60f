//! Root-raised-cosine matched filter with integer decimation.
//!
//! Fixed at `NTAPS = 31`. Taps are designed once at construction from
//! `(decimation, sample_rate, symbol_rate)` using the standard root-raised-
//! cosine impulse response, rolloff fixed at 0.5 to match GOES LRIT/HRIT
//! downlink framing. A history buffer of the last `NTAPS - 1` samples
//! carries the filter state across block boundaries so decimation phase is
//! continuous across calls to `run`.

use std::sync::Arc;

use crate::errors::DspError;
use crate::metrics::SharedMetrics;
use crate::publisher::SamplePublisher;
use crate::queue::Queue;
use crate::types::{Sample, SampleBlock};

const NTAPS: usize = 31;
const ROLLOFF: f64 = 0.5;

/// Root-raised-cosine matched filter + decimator.
pub struct Rrc {
    decimation: usize,
    taps: [f32; NTAPS],
    /// Sliding window of the most recent input samples, oldest first.
    history: Vec<Sample>,
    /// Count of input samples seen since the last emitted output, mod `decimation`.
    phase: usize,
    #[allow(dead_code)]
    metrics: Arc<SharedMetrics>,
    sample_publisher: Option<Box<dyn SamplePublisher>>,
}

impl Rrc {
    pub fn new(
        decimation: usize,
        sample_rate: f64,
        symbol_rate: f64,
        metrics: Arc<SharedMetrics>,
    ) -> Result<Self, DspError> {
        let taps = design_taps(sample_rate, symbol_rate)?;
        Ok(Self {
            decimation,
            taps,
            history: vec![Sample::new(0.0, 0.0); NTAPS - 1],
            phase: 0,
            metrics,
            sample_publisher: None,
        })
    }

    pub fn set_sample_publisher(&mut self, publisher: Box<dyn SamplePublisher>) {
        self.sample_publisher = Some(publisher);
    }

    pub fn decimation(&self) -> usize {
        self.decimation
    }

    /// Feed one input sample; returns `Some(output)` every `decimation`-th
    /// call once the history window has filled.
    fn process_sample(&mut self, sample: Sample) -> Option<Sample> {
        self.history.push(sample);
        if self.history.len() > NTAPS {
            self.history.remove(0);
        }

        let emit = self.phase == 0;
        self.phase = (self.phase + 1) % self.decimation;

        if !emit || self.history.len() < NTAPS {
            return None;
        }

        let mut acc = Sample::new(0.0, 0.0);
        for (tap, sample) in self.taps.iter().zip(self.history.iter()) {
            acc += *sample * *tap;
        }
        Some(acc)
    }

    fn process_block(&mut self, input: &SampleBlock, output: &mut SampleBlock) {
        output.clear();
        for &sample in input.as_slice() {
            if let Some(filtered) = self.process_sample(sample) {
                output.push(filtered);
            }
        }
    }

    /// Drain `qin` until EOF, writing filtered/decimated blocks to `qout`.
    pub fn run(&mut self, qin: &Queue<SampleBlock>, qout: &Queue<SampleBlock>) {
        loop {
            let Some(block) = qin.pop_for_read() else {
                break;
            };

            let mut out = qout.pop_for_write();
            self.process_block(&block, &mut out);

            if let Some(publisher) = &self.sample_publisher {
                publisher.publish(&out);
            }

            qin.push_read(block);
            qout.push_write(out);
        }
        qout.close();
    }
}

/// Design a unit-energy root-raised-cosine filter of `NTAPS` taps.
fn design_taps(sample_rate: f64, symbol_rate: f64) -> Result<[f32; NTAPS], DspError> {
    if !(sample_rate > 0.0) || !(symbol_rate > 0.0) {
        return Err(DspError::FilterDesignFailed {
            reason: format!(
                "sample_rate={sample_rate} and symbol_rate={symbol_rate} must both be positive"
            ),
        });
    }

    let ts = 1.0 / symbol_rate;
    let beta = ROLLOFF;
    let half = (NTAPS / 2) as f64;

    let mut taps = [0.0_f32; NTAPS];
    for (n, tap) in taps.iter_mut().enumerate() {
        let t = (n as f64 - half) / sample_rate;
        let value = if t.abs() < 1e-12 {
            1.0 - beta + 4.0 * beta / std::f64::consts::PI
        } else if (4.0 * beta * t / ts).abs() - 1.0 < 1e-9
            && (4.0 * beta * t / ts).abs() - 1.0 > -1e-9
        {
            (beta / std::f64::consts::SQRT_2)
                * ((1.0 + 2.0 / std::f64::consts::PI) * (std::f64::consts::PI / (4.0 * beta)).sin()
                    + (1.0 - 2.0 / std::f64::consts::PI) * (std::f64::consts::PI / (4.0 * beta)).cos())
        } else {
            let num = (std::f64::consts::PI * t / ts * (1.0 - beta)).sin()
                + 4.0 * beta * t / ts * (std::f64::consts::PI * t / ts * (1.0 + beta)).cos();
            let den = std::f64::consts::PI * t / ts * (1.0 - (4.0 * beta * t / ts).powi(2));
            num / den
        };
        *tap = value as f32;
    }

    let energy: f32 = taps.iter().map(|t| t * t).sum::<f32>().sqrt();
    if !(energy > 0.0) {
        return Err(DspError::FilterDesignFailed {
            reason: "filter energy collapsed to zero".to_string(),
        });
    }
    for tap in taps.iter_mut() {
        *tap /= energy;
    }

    Ok(taps)
}
