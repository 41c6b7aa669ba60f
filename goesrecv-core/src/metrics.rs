//! Lock-free metrics snapshot shared between DSP stages and a `StatsPublisher`.
//!
//! Each stage owns one field here and updates it once per block with a
//! relaxed store; a `StatsPublisher` reads the same fields with a relaxed
//! load on its own schedule. Relaxed ordering is correct because these are
//! independent scalars read for display/telemetry, not used to synchronise
//! access to anything else -- a torn read of "gain is currently between two
//! successive values" is indistinguishable from sampling a millisecond
//! earlier or later.

use std::sync::atomic::{AtomicU64, Ordering};

use atomic_float::AtomicF32;

/// Current loop state of the running pipeline, as exposed to telemetry.
///
/// One `SharedMetrics` is created per `Demodulator` and handed by reference
/// to every stage at construction time and to the `StatsPublisher` driver.
/// `costas_frequency` is stored here in the loop's native unit (radians per
/// sample, the same unit `Costas`'s own `freq` field uses); [`snapshot`](Self::snapshot)
/// converts it to Hz on the way out for the `StatsPublisher` contract.
#[derive(Debug, Default)]
pub struct SharedMetrics {
    agc_gain: AtomicF32,
    costas_frequency: AtomicF32,
    costas_phase: AtomicF32,
    clock_omega: AtomicF32,
    clock_mu: AtomicF32,
    soft_bits_emitted: AtomicU64,
}

impl SharedMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_agc_gain(&self, value: f32) {
        self.agc_gain.store(value, Ordering::Relaxed);
    }

    pub fn agc_gain(&self) -> f32 {
        self.agc_gain.load(Ordering::Relaxed)
    }

    pub fn set_costas_frequency(&self, value: f32) {
        self.costas_frequency.store(value, Ordering::Relaxed);
    }

    pub fn costas_frequency(&self) -> f32 {
        self.costas_frequency.load(Ordering::Relaxed)
    }

    pub fn set_costas_phase(&self, value: f32) {
        self.costas_phase.store(value, Ordering::Relaxed);
    }

    pub fn costas_phase(&self) -> f32 {
        self.costas_phase.load(Ordering::Relaxed)
    }

    pub fn set_clock_omega(&self, value: f32) {
        self.clock_omega.store(value, Ordering::Relaxed);
    }

    pub fn clock_omega(&self) -> f32 {
        self.clock_omega.load(Ordering::Relaxed)
    }

    pub fn set_clock_mu(&self, value: f32) {
        self.clock_mu.store(value, Ordering::Relaxed);
    }

    pub fn clock_mu(&self) -> f32 {
        self.clock_mu.load(Ordering::Relaxed)
    }

    /// Accumulate `n` more soft bits into the running total. Called once per
    /// emitted block by `Quantize`, the only stage that ever bumps this.
    pub fn add_soft_bits(&self, n: u64) {
        self.soft_bits_emitted.fetch_add(n, Ordering::Relaxed);
    }

    pub fn soft_bits_emitted(&self) -> u64 {
        self.soft_bits_emitted.load(Ordering::Relaxed)
    }

    /// Take a consistent-enough point-in-time copy for a `StatsPublisher`.
    ///
    /// `sample_rate` converts the Costas loop's native radians-per-sample
    /// frequency into Hz: `freq * sample_rate / (2*pi)`.
    pub fn snapshot(&self, sample_rate: f64) -> StatsRecord {
        let freq_hz = self.costas_frequency() as f64 * sample_rate / (2.0 * std::f64::consts::PI);
        StatsRecord {
            agc_gain: self.agc_gain(),
            costas_frequency_hz: freq_hz as f32,
            costas_phase: self.costas_phase(),
            clock_omega: self.clock_omega(),
            clock_mu: self.clock_mu(),
            soft_bits_emitted: self.soft_bits_emitted(),
        }
    }
}

/// An owned, serialisable copy of a `SharedMetrics` snapshot, as published by
/// the `StatsPublisher` worker.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StatsRecord {
    pub agc_gain: f32,
    /// Residual carrier frequency, in Hz (`freq · sampleRate / (2π)`).
    pub costas_frequency_hz: f32,
    pub costas_phase: f32,
    pub clock_omega: f32,
    pub clock_mu: f32,
    pub soft_bits_emitted: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_latest_writes() {
        let metrics = SharedMetrics::new();
        metrics.set_agc_gain(2.5);
        metrics.set_costas_frequency(-0.01);
        metrics.set_clock_omega(4.0);
        metrics.add_soft_bits(128);

        let snap = metrics.snapshot(2_400_000.0);
        assert_eq!(snap.agc_gain, 2.5);
        assert_eq!(snap.clock_omega, 4.0);
        assert_eq!(snap.soft_bits_emitted, 128);
    }

    #[test]
    fn costas_frequency_is_converted_from_radians_per_sample_to_hz() {
        let metrics = SharedMetrics::new();
        let sample_rate = 2_400_000.0_f64;
        // One full turn every 1000 samples: freq = 2*pi/1000 rad/sample.
        metrics.set_costas_frequency((2.0 * std::f64::consts::PI / 1000.0) as f32);

        let snap = metrics.snapshot(sample_rate);
        let expected_hz = (sample_rate / 1000.0) as f32;
        assert!(
            (snap.costas_frequency_hz - expected_hz).abs() < 1.0,
            "expected ~{expected_hz} Hz, got {}",
            snap.costas_frequency_hz
        );
    }

    #[test]
    fn default_is_all_zero() {
        let metrics = SharedMetrics::new();
        let snap = metrics.snapshot(2_400_000.0);
        assert_eq!(snap.agc_gain, 0.0);
        assert_eq!(snap.costas_phase, 0.0);
        assert_eq!(snap.clock_mu, 0.0);
        assert_eq!(snap.soft_bits_emitted, 0);
    }
}
