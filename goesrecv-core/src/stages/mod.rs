//! The five DSP stages of the demodulation pipeline.
//!
//! Each stage is a plain value owning its loop state and exposing a single
//! `run(qin, qout)` entry point that a pipeline worker thread drives to
//! completion. There is no shared base class: the stages share a shape
//! (`run` over a `Queue<SampleBlock>` pair), not behaviour.

pub mod agc;
pub mod clock_recovery;
pub mod costas;
pub mod quantize;
pub mod rrc;

pub use agc::Agc;
pub use clock_recovery::ClockRecovery;
pub use costas::Costas;
pub use quantize::Quantize;
pub use rrc::Rrc;
