//! Configuration types for the demodulation pipeline.

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

/// GOES downlink signal profile. Selects the symbol rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalType {
    /// Low-Rate Information Transmission: 293,883 sym/s.
    Lrit,
    /// High-Rate Information Transmission: 927,000 sym/s.
    Hrit,
}

impl SignalType {
    /// Symbol rate in symbols/second for this profile.
    pub fn symbol_rate(self) -> f64 {
        match self {
            SignalType::Lrit => 293_883.0,
            SignalType::Hrit => 927_000.0,
        }
    }
}

/// AGC gain clamp configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AgcConfig {
    pub min: f32,
    pub max: f32,
    /// Adaptation constant `alpha`, typically ~1e-2.
    pub alpha: f32,
}

impl Default for AgcConfig {
    fn default() -> Self {
        Self {
            min: 1e-5,
            max: 1e3,
            alpha: 1e-2,
        }
    }
}

/// Costas carrier-tracking loop configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CostasConfig {
    /// Per-sample frequency bound, in radians/sample.
    pub max_deviation: f32,
    /// Loop bandwidth, in radians/sample, used to derive alpha/beta gains.
    pub bandwidth: f32,
    /// Damping factor for the second-order loop filter design.
    pub damping: f32,
}

impl Default for CostasConfig {
    fn default() -> Self {
        Self {
            max_deviation: 0.01,
            bandwidth: 0.005,
            damping: std::f32::consts::FRAC_1_SQRT_2,
        }
    }
}

/// Mueller & Müller clock-recovery loop configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ClockConfig {
    /// Loop bandwidth used to derive `omega_gain`/`mu_gain`.
    pub bandwidth: f32,
    pub damping: f32,
    /// Fractional clamp width around `omega_init`, e.g. 0.005 for +-0.5%.
    pub omega_relative_limit: f32,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            bandwidth: 0.02,
            damping: std::f32::consts::FRAC_1_SQRT_2,
            omega_relative_limit: 0.005,
        }
    }
}

/// Hand-off queue sizing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Max buffers in flight per queue.
    pub capacity: usize,
    /// Samples per `SampleBlock`.
    pub block_size: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            capacity: 32,
            block_size: 32 * 1024,
        }
    }
}

/// Full pipeline configuration, as recognised by `Demodulator::initialize`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemodulatorConfig {
    pub signal_type: SignalType,
    /// Source sample rate in Hz.
    pub sample_rate: f64,
    /// RRC integer decimation factor.
    pub decimation: usize,
    pub agc: AgcConfig,
    pub costas: CostasConfig,
    pub clock: ClockConfig,
    pub queue: QueueConfig,
}

impl Default for DemodulatorConfig {
    fn default() -> Self {
        Self {
            signal_type: SignalType::Lrit,
            sample_rate: 2_400_000.0,
            decimation: 2,
            agc: AgcConfig::default(),
            costas: CostasConfig::default(),
            clock: ClockConfig::default(),
            queue: QueueConfig::default(),
        }
    }
}

impl DemodulatorConfig {
    /// Symbol rate implied by `signal_type`.
    pub fn symbol_rate(&self) -> f64 {
        self.signal_type.symbol_rate()
    }

    /// Samples per symbol at the RRC's output rate, i.e. `sample_rate / (symbol_rate * decimation)`.
    pub fn samples_per_symbol(&self) -> f64 {
        self.sample_rate / (self.symbol_rate() * self.decimation as f64)
    }

    /// Validate configuration against the `ConfigError` taxonomy.
    ///
    /// Called unconditionally from `Demodulator::initialize`: configuration
    /// errors are fatal and reported to the caller before any worker thread
    /// is spawned, so a running pipeline never has a configuration-failure
    /// surface to handle.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.sample_rate > 0.0) {
            return Err(ConfigError::InvalidSampleRate {
                rate: self.sample_rate,
            });
        }
        let symbol_rate = self.symbol_rate();
        if !(symbol_rate > 0.0) {
            return Err(ConfigError::InvalidSymbolRate { rate: symbol_rate });
        }
        if self.decimation == 0 {
            return Err(ConfigError::InvalidDecimation { df: self.decimation });
        }

        let product = symbol_rate * self.decimation as f64;
        let residual = (self.sample_rate / product).fract().min(1.0 - (self.sample_rate / product).fract());
        // Allow up to 1% relative deviation from an exact integer ratio:
        // real SDR clocks never line up perfectly.
        if residual > 0.01 {
            return Err(ConfigError::NonDivisibleRates {
                sample_rate: self.sample_rate,
                symbol_rate,
                df: self.decimation,
                product,
                residual,
            });
        }

        if self.agc.min > self.agc.max {
            return Err(ConfigError::InvalidAgcRange {
                min: self.agc.min,
                max: self.agc.max,
            });
        }
        if !(self.costas.max_deviation > 0.0) {
            return Err(ConfigError::InvalidCostasDeviation {
                max_deviation: self.costas.max_deviation,
            });
        }
        if !(self.costas.bandwidth > 0.0) {
            return Err(ConfigError::InvalidLoopBandwidth {
                bandwidth: self.costas.bandwidth,
            });
        }
        if !(self.clock.bandwidth > 0.0) {
            return Err(ConfigError::InvalidLoopBandwidth {
                bandwidth: self.clock.bandwidth,
            });
        }
        if self.queue.capacity == 0 {
            return Err(ConfigError::InvalidQueueCapacity {
                capacity: self.queue.capacity,
            });
        }
        if self.queue.block_size == 0 {
            return Err(ConfigError::InvalidBlockSize {
                size: self.queue.block_size,
            });
        }

        let samples_per_symbol = self.samples_per_symbol();
        const NTAPS: usize = 31;
        if samples_per_symbol < 1.0 || !samples_per_symbol.is_finite() {
            return Err(ConfigError::ImpossibleRrcParameters {
                ntaps: NTAPS,
                samples_per_symbol,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_lrit_config_is_valid() {
        assert!(DemodulatorConfig::default().validate().is_ok());
    }

    #[test]
    fn default_hrit_config_is_valid() {
        let config = DemodulatorConfig {
            signal_type: SignalType::Hrit,
            sample_rate: 4_000_000.0,
            decimation: 2,
            ..DemodulatorConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_inverted_agc_range() {
        let config = DemodulatorConfig {
            agc: AgcConfig {
                min: 10.0,
                max: 1.0,
                alpha: 0.01,
            },
            ..DemodulatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidAgcRange { .. })
        ));
    }

    #[test]
    fn rejects_non_divisible_rates() {
        let config = DemodulatorConfig {
            sample_rate: 1_000_000.0,
            decimation: 2,
            ..DemodulatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonDivisibleRates { .. })
        ));
    }

    #[test]
    fn rejects_zero_decimation() {
        let config = DemodulatorConfig {
            decimation: 0,
            ..DemodulatorConfig::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDecimation { .. })
        ));
    }
}
