//! Real-time BPSK demodulation core for GOES LRIT/HRIT downlinks.
//!
//! A `Demodulator` wires five DSP stages -- AGC, Costas carrier recovery,
//! RRC matched filtering, Mueller & Müller clock recovery, and soft-bit
//! quantization -- into a one-thread-per-stage pipeline connected by bounded
//! [`Queue`](queue::Queue)s. A [`Source`](source::Source) feeds raw complex
//! samples in; a stream of [`SoftBitBlock`](types::SoftBitBlock)s comes out
//! the other end for a downstream frame decoder to consume.
//!
//! This crate is the signal-processing core only: reading from an SDR,
//! decoding VCDUs/CADUs from soft bits, and writing decoded products to disk
//! are all out of scope here (see `goesrecv-cli` for a runnable demonstration
//! around this core).

pub mod config;
pub mod demodulator;
pub mod errors;
pub mod metrics;
pub mod publisher;
pub mod queue;
pub mod source;
pub mod stages;
pub mod types;

pub use config::{AgcConfig, ClockConfig, CostasConfig, DemodulatorConfig, QueueConfig, SignalType};
pub use demodulator::Demodulator;
pub use errors::{ConfigError, DspError, GoesRecvError, PublisherError, Result, SourceError};
pub use metrics::{SharedMetrics, StatsRecord};
pub use publisher::{ChannelPublisher, SamplePublisher, SoftBitPublisher, StatsPublisher};
pub use queue::Queue;
pub use source::{Source, VecSource};
pub use types::{Sample, SampleBlock, SoftBit, SoftBitBlock};
