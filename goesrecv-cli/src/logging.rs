//! Structured log events for pipeline statistics, distinct from the `log`
//! crate's free-text lines the core emits for error/debug conditions.

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use goesrecv_core::StatsRecord;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};

use crate::config::{LogFormat, LogTarget, LoggingConfig};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LogEvent {
    /// A periodic loop-state snapshot while the pipeline runs.
    Stats(StatsEvent),
    /// Final summary once the pipeline has drained.
    Summary(SummaryEvent),
    Info { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsEvent {
    pub timestamp: DateTime<Utc>,
    pub agc_gain: f32,
    pub costas_frequency_hz: f32,
    pub clock_omega: f32,
    pub soft_bits_emitted: u64,
}

impl StatsEvent {
    pub fn from_snapshot(snapshot: StatsRecord) -> Self {
        Self {
            timestamp: Utc::now(),
            agc_gain: snapshot.agc_gain,
            costas_frequency_hz: snapshot.costas_frequency_hz,
            clock_omega: snapshot.clock_omega,
            soft_bits_emitted: snapshot.soft_bits_emitted,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryEvent {
    pub timestamp: DateTime<Utc>,
    pub duration_secs: f64,
    pub total_soft_bits: u64,
}

pub struct StructuredLogger {
    format: LogFormat,
    writer: Box<dyn Write + Send>,
    start_time: DateTime<Utc>,
}

impl StructuredLogger {
    pub fn new(config: &LoggingConfig) -> Result<Self> {
        let writer: Box<dyn Write + Send> = match config.target {
            LogTarget::Stdout => Box::new(io::stdout()),
            LogTarget::Stderr => Box::new(io::stderr()),
            LogTarget::File => {
                let path = config.file_path.as_ref().ok_or_else(|| {
                    color_eyre::eyre::eyre!("file_path required when logging.target = \"file\"")
                })?;
                Box::new(BufWriter::new(File::create(path)?))
            }
        };

        Ok(Self {
            format: config.format,
            writer,
            start_time: Utc::now(),
        })
    }

    pub fn log(&mut self, event: LogEvent) -> Result<()> {
        let line = match self.format {
            LogFormat::Json => serde_json::to_string(&event)?,
            LogFormat::Pretty => Self::format_pretty(&event),
        };
        writeln!(self.writer, "{line}")?;
        self.writer.flush()?;
        Ok(())
    }

    fn format_pretty(event: &LogEvent) -> String {
        let ts = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
        match event {
            LogEvent::Stats(s) => format!(
                "[{ts}] STATS: gain={:.4} freq_hz={:.2} omega={:.4} bits={}",
                s.agc_gain, s.costas_frequency_hz, s.clock_omega, s.soft_bits_emitted
            ),
            LogEvent::Summary(s) => format!(
                "[{ts}] SUMMARY: {:.2}s, {} soft bits recovered",
                s.duration_secs, s.total_soft_bits
            ),
            LogEvent::Info { message } => format!("[{ts}] INFO: {message}"),
        }
    }

    pub fn elapsed(&self) -> f64 {
        (Utc::now() - self.start_time).num_milliseconds() as f64 / 1000.0
    }
}
