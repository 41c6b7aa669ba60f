//! GOES receiver error types, with granular per-category variants.
//!
//! A closed-queue misuse is deliberately *not* a variant here: it is a
//! programming bug with no recovery path, and is raised as a `panic!` at the
//! point of misuse (see `Queue::pop_for_write`) rather than threaded through
//! `Result`.

use thiserror::Error;

/// Top-level error type for all `goesrecv-core` operations.
#[derive(Debug, Error)]
pub enum GoesRecvError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("source error: {0}")]
    Source(#[from] SourceError),

    #[error("DSP processing error: {0}")]
    Dsp(#[from] DspError),
}

/// Errors detected while validating a `DemodulatorConfig` at `initialize` time.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid sample rate: {rate} Hz (must be > 0)")]
    InvalidSampleRate { rate: f64 },

    #[error("invalid symbol rate: {rate} (must be > 0)")]
    InvalidSymbolRate { rate: f64 },

    #[error("invalid decimation factor: {df} (must be > 0)")]
    InvalidDecimation { df: usize },

    #[error(
        "sample rate {sample_rate} Hz is not evenly divisible by decimation*symbol_rate \
         ({df} * {symbol_rate} = {product}); residual {residual} exceeds tolerance"
    )]
    NonDivisibleRates {
        sample_rate: f64,
        symbol_rate: f64,
        df: usize,
        product: f64,
        residual: f64,
    },

    #[error("AGC gain clamp is inverted: min={min} > max={max}")]
    InvalidAgcRange { min: f32, max: f32 },

    #[error("Costas max deviation must be > 0, got {max_deviation}")]
    InvalidCostasDeviation { max_deviation: f32 },

    #[error("loop bandwidth must be > 0, got {bandwidth}")]
    InvalidLoopBandwidth { bandwidth: f32 },

    #[error("queue capacity must be > 0, got {capacity}")]
    InvalidQueueCapacity { capacity: usize },

    #[error("block size must be > 0, got {size}")]
    InvalidBlockSize { size: usize },

    #[error("RRC filter span of {ntaps} taps cannot be constructed for samples_per_symbol={samples_per_symbol}")]
    ImpossibleRrcParameters { ntaps: usize, samples_per_symbol: f64 },
}

/// Errors surfaced by a `Source` implementation.
///
/// A source error is translated to closing the source's output queue
/// rather than aborting the pipeline; the cascade then drains normally.
/// This variant exists so a `Source::run` can report *why* it
/// stopped (for logging) even though the pipeline itself treats any
/// termination the same way.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("source I/O failure: {reason}")]
    Io { reason: String },

    #[error("source exhausted")]
    Exhausted,
}

/// DSP-stage construction errors (distinct from per-sample processing,
/// which is infallible given valid configuration).
#[derive(Debug, Error)]
pub enum DspError {
    #[error("filter design failed: {reason}")]
    FilterDesignFailed { reason: String },
}

/// Errors from a telemetry publisher.
///
/// Publisher failures are logged and suppressed; they never propagate as a
/// `GoesRecvError` since nothing downstream depends on them succeeding.
#[derive(Debug, Error)]
pub enum PublisherError {
    #[error("publisher channel full, block dropped")]
    BackPressureDropped,

    #[error("publisher disconnected")]
    Disconnected,
}

/// Result type alias for fallible `goesrecv-core` operations.
pub type Result<T> = std::result::Result<T, GoesRecvError>;
