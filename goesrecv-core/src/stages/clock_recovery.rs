//! Mueller & Müller symbol-timing recovery.
//!
//! The classic `p0T`/`p1T`/`p2T` + `c0T`/`c1T`/`c2T` Mueller & Müller
//! timing-error detector: three trailing interpolated samples and their sign
//! decisions
//! feed a timing-error estimate that steers both a fast phase (`mu`) and a
//! slow rate (`omega`) loop. Interpolation between input samples uses a
//! 4-tap Farrow cubic, rather than the simpler linear interpolator, so the
//! estimated strobe position can fall anywhere within a sample period.

use std::sync::Arc;

use crate::metrics::SharedMetrics;
use crate::publisher::SamplePublisher;
use crate::queue::Queue;
use crate::types::{Sample, SampleBlock};

/// Mueller & Müller timing-recovery stage.
///
/// Consumes samples at the RRC's output rate and emits one interpolated
/// sample per recovered symbol.
pub struct ClockRecovery {
    omega: f32,
    omega_mid: f32,
    omega_rel_limit: f32,
    omega_gain: f32,
    mu: f32,
    mu_gain: f32,

    p0t: Sample,
    p1t: Sample,
    p2t: Sample,
    c0t: Sample,
    c1t: Sample,
    c2t: Sample,

    /// Samples not yet consumed by the strobe, carried across `run` calls.
    buffer: Vec<Sample>,
    /// Index into `buffer` of the base sample for the next interpolation.
    read_pos: usize,

    metrics: Arc<SharedMetrics>,
    sample_publisher: Option<Box<dyn SamplePublisher>>,
}

impl ClockRecovery {
    pub fn new(
        samples_per_symbol: f64,
        bandwidth: f32,
        damping: f32,
        omega_relative_limit: f32,
        metrics: Arc<SharedMetrics>,
    ) -> Self {
        let omega_mid = samples_per_symbol as f32;
        let omega_n = bandwidth * 8.0 * damping / (4.0 * damping * damping + 1.0);
        let omega_gain = omega_n * omega_n;
        let mu_gain = 2.0 * damping * omega_n;

        let stage = Self {
            omega: omega_mid,
            omega_mid,
            omega_rel_limit: omega_relative_limit,
            omega_gain,
            mu: 0.0,
            mu_gain,
            p0t: Sample::new(0.0, 0.0),
            p1t: Sample::new(0.0, 0.0),
            p2t: Sample::new(0.0, 0.0),
            c0t: Sample::new(0.0, 0.0),
            c1t: Sample::new(0.0, 0.0),
            c2t: Sample::new(0.0, 0.0),
            buffer: Vec::new(),
            read_pos: 1,
            metrics,
            sample_publisher: None,
        };
        stage.metrics.set_clock_omega(stage.omega);
        stage.metrics.set_clock_mu(stage.mu);
        stage
    }

    pub fn set_sample_publisher(&mut self, publisher: Box<dyn SamplePublisher>) {
        self.sample_publisher = Some(publisher);
    }

    pub fn omega(&self) -> f32 {
        self.omega
    }

    fn slice(sample: Sample) -> Sample {
        Sample::new(sample.re.signum(), sample.im.signum())
    }

    /// Farrow cubic interpolation through `buffer[read_pos-1..=read_pos+2]`
    /// at fractional offset `mu` within `[read_pos, read_pos+1)`.
    fn interpolate(&self) -> Sample {
        let im1 = self.buffer[self.read_pos - 1];
        let i0 = self.buffer[self.read_pos];
        let i1 = self.buffer[self.read_pos + 1];
        let i2 = self.buffer[self.read_pos + 2];

        let mu = self.mu;
        let c0 = i0;
        let c1 = 0.5 * (i1 - im1);
        let c2 = im1 - 2.5 * i0 + 2.0 * i1 - 0.5 * i2;
        let c3 = 0.5 * (i2 - im1) + 1.5 * (i0 - i1);

        ((c3 * mu + c2) * mu + c1) * mu + c0
    }

    /// Advance the strobe by one symbol, updating the M&M timing loop.
    fn strobe(&mut self) -> Sample {
        let interp = self.interpolate();

        self.p2t = self.p1t;
        self.p1t = self.p0t;
        self.p0t = interp;
        self.c2t = self.c1t;
        self.c1t = self.c0t;
        self.c0t = Self::slice(self.p0t);

        let x = (self.c0t.re - self.c2t.re) * self.p1t.re;
        let y = (self.p0t.re - self.p2t.re) * self.c1t.re;
        let error = (y - x).clamp(-1.0, 1.0);

        self.omega = (self.omega + self.omega_gain * error).clamp(
            self.omega_mid * (1.0 - self.omega_rel_limit),
            self.omega_mid * (1.0 + self.omega_rel_limit),
        );
        self.mu += self.omega + self.mu_gain * error;

        let step = self.mu.floor();
        self.read_pos += step as usize;
        self.mu -= step;

        self.metrics.set_clock_omega(self.omega);
        self.metrics.set_clock_mu(self.mu);

        interp
    }

    fn process_block(&mut self, input: &SampleBlock, output: &mut SampleBlock) {
        output.clear();
        self.buffer.extend_from_slice(input.as_slice());

        while self.read_pos + 2 < self.buffer.len() {
            output.push(self.strobe());
        }

        // Keep one sample of left-context so interpolation stays correct
        // across the block boundary. A strobe's step can carry read_pos past
        // the end of the buffer, so never drain more than is actually there;
        // the next block's extend_from_slice supplies the missing context.
        if self.read_pos > 1 {
            let keep_from = (self.read_pos - 1).min(self.buffer.len());
            self.buffer.drain(0..keep_from);
            self.read_pos -= keep_from;
        }
    }

    /// Drain `qin` until EOF, writing one recovered symbol per output sample.
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

#[cfg(test)]
mod tests {
    use super::*;

    fn clock_recovery(samples_per_symbol: f64) -> ClockRecovery {
        ClockRecovery::new(
            samples_per_symbol,
            0.02,
            std::f32::consts::FRAC_1_SQRT_2,
            0.05,
            Arc::new(SharedMetrics::new()),
        )
    }

    #[test]
    fn omega_stays_within_relative_limit_of_nominal() {
        let mut stage = clock_recovery(4.0);
        let mut block = SampleBlock::with_capacity(4000);
        for n in 0..4000 {
            let bit = if (n / 4) % 2 == 0 { 1.0 } else { -1.0 };
            block.push(Sample::new(bit, 0.0));
        }
        let mut out = SampleBlock::with_capacity(1100);
        stage.process_block(&block, &mut out);

        assert!(stage.omega() >= 4.0 * 0.95 && stage.omega() <= 4.0 * 1.05);
    }

    #[test]
    fn emits_roughly_one_symbol_per_samples_per_symbol_input_samples() {
        let mut stage = clock_recovery(4.0);
        let mut block = SampleBlock::with_capacity(4000);
        for n in 0..4000 {
            let bit = if (n / 4) % 2 == 0 { 1.0 } else { -1.0 };
            block.push(Sample::new(bit, 0.0));
        }
        let mut out = SampleBlock::with_capacity(1100);
        stage.process_block(&block, &mut out);

        assert!(
            (out.len() as i64 - 1000).abs() < 50,
            "expected roughly 1000 symbols, got {}",
            out.len()
        );
    }

    #[test]
    fn run_propagates_close_to_output_queue() {
        let mut stage = clock_recovery(4.0);
        let qin: Queue<SampleBlock> = Queue::new(2);
        let qout: Queue<SampleBlock> = Queue::new(2);
        qin.close();

        stage.run(&qin, &qout);
        assert!(qout.is_closed());
    }

    #[test]
    fn survives_non_integer_samples_per_symbol_across_many_small_blocks() {
        // Non-integer omega (the LRIT default is ~4.08) lets `mu` accumulate
        // past a whole sample on some strobes, carrying `read_pos` past the
        // end of a small block's buffer. This must not panic, and it must
        // not silently drop the overshoot samples (they reappear once the
        // next block's extend_from_slice supplies them).
        let mut stage = clock_recovery(4.083);
        let mut total = 0;
        for block_idx in 0..200 {
            let mut block = SampleBlock::with_capacity(16);
            for n in 0..16 {
                let sample_idx = block_idx * 16 + n;
                let bit = if (sample_idx / 4) % 2 == 0 { 1.0 } else { -1.0 };
                block.push(Sample::new(bit, 0.0));
            }
            let mut out = SampleBlock::with_capacity(8);
            stage.process_block(&block, &mut out);
            total += out.len();
        }

        assert!(total > 0, "expected some recovered symbols across block boundaries");
    }

    proptest::proptest! {
        #[test]
        fn omega_never_leaves_its_relative_limit(sps in 2.0f64..8.0) {
            let mut stage = clock_recovery(sps);
            let mut block = SampleBlock::with_capacity(2000);
            for n in 0..2000 {
                let bit = if (n as f64 / sps) as i64 % 2 == 0 { 1.0 } else { -1.0 };
                block.push(Sample::new(bit, 0.0));
            }
            let mut out = SampleBlock::with_capacity(600);
            stage.process_block(&block, &mut out);

            let lo = sps as f32 * 0.95;
            let hi = sps as f32 * 1.05;
            proptest::prop_assert!(stage.omega() >= lo && stage.omega() <= hi);
        }
    }
}
