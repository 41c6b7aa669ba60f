//! Pipeline façade wiring the five DSP stages together.
//!
//! One OS thread per stage (plus one for the `Source`), connected by
//! `Queue`s in series. `new` validates
//! configuration and constructs every stage up front so that a configuration
//! mistake is reported before any thread exists; `start` consumes the
//! supplied `Source` and spawns the pipeline; `stop` joins every thread,
//! which only happens once the `Source` stops producing and queue closure
//! has cascaded all the way to `soft_bits_queue`.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::config::DemodulatorConfig;
use crate::errors::Result;
use crate::metrics::SharedMetrics;
use crate::publisher::{SamplePublisher, SoftBitPublisher, StatsPublisher};
use crate::queue::Queue;
use crate::source::Source;
use crate::stages::{Agc, ClockRecovery, Costas, Quantize, Rrc};
use crate::types::{SampleBlock, SoftBitBlock};

/// Cadence at which the stats worker snapshots `SharedMetrics`.
const STATS_INTERVAL: Duration = Duration::from_secs(1);

/// The running (or not-yet-started) demodulation pipeline.
pub struct Demodulator {
    metrics: Arc<SharedMetrics>,
    sample_rate: f64,
    stats_publisher: Option<Box<dyn StatsPublisher>>,

    source_queue: Arc<Queue<SampleBlock>>,
    agc_queue: Arc<Queue<SampleBlock>>,
    costas_queue: Arc<Queue<SampleBlock>>,
    rrc_queue: Arc<Queue<SampleBlock>>,
    clock_queue: Arc<Queue<SampleBlock>>,
    soft_bits_queue: Arc<Queue<SoftBitBlock>>,

    agc: Option<Agc>,
    costas: Option<Costas>,
    rrc: Option<Rrc>,
    clock_recovery: Option<ClockRecovery>,
    quantize: Option<Quantize>,

    handles: Vec<JoinHandle<()>>,
}

impl Demodulator {
    /// Validate `config` and construct every stage. Does not start any thread.
    pub fn new(config: &DemodulatorConfig) -> Result<Self> {
        config.validate()?;

        let metrics = Arc::new(SharedMetrics::new());
        let capacity = config.queue.capacity;

        let rrc = Rrc::new(
            config.decimation,
            config.sample_rate,
            config.symbol_rate(),
            Arc::clone(&metrics),
        )?;
        let clock_recovery = ClockRecovery::new(
            config.samples_per_symbol(),
            config.clock.bandwidth,
            config.clock.damping,
            config.clock.omega_relative_limit,
            Arc::clone(&metrics),
        );

        Ok(Self {
            source_queue: Arc::new(Queue::new(capacity)),
            agc_queue: Arc::new(Queue::new(capacity)),
            costas_queue: Arc::new(Queue::new(capacity)),
            rrc_queue: Arc::new(Queue::new(capacity)),
            clock_queue: Arc::new(Queue::new(capacity)),
            soft_bits_queue: Arc::new(Queue::new(capacity)),
            agc: Some(Agc::new(config.agc, Arc::clone(&metrics))),
            costas: Some(Costas::new(config.costas, Arc::clone(&metrics))),
            rrc: Some(rrc),
            clock_recovery: Some(clock_recovery),
            quantize: Some(Quantize::new(Arc::clone(&metrics))),
            sample_rate: config.sample_rate,
            stats_publisher: None,
            metrics,
            handles: Vec::new(),
        })
    }

    pub fn metrics(&self) -> Arc<SharedMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Attach a telemetry publisher for periodic `StatsRecord` snapshots.
    /// Must be called before [`start`](Self::start).
    pub fn set_stats_publisher(&mut self, publisher: Box<dyn StatsPublisher>) {
        self.stats_publisher = Some(publisher);
    }

    /// The pipeline's terminal queue. Clone before calling `start` if a
    /// caller needs to read soft bits from a different thread while the
    /// pipeline runs -- the returned `Arc` stays valid after `stop`.
    pub fn soft_bits_queue(&self) -> Arc<Queue<SoftBitBlock>> {
        Arc::clone(&self.soft_bits_queue)
    }

    /// Attach a telemetry publisher to the AGC stage. Must be called before [`start`](Self::start).
    pub fn set_agc_publisher(&mut self, publisher: Box<dyn SamplePublisher>) {
        self.agc
            .as_mut()
            .expect("set_agc_publisher called after start")
            .set_sample_publisher(publisher);
    }

    /// Attach a telemetry publisher to the Costas stage. Must be called before [`start`](Self::start).
    pub fn set_costas_publisher(&mut self, publisher: Box<dyn SamplePublisher>) {
        self.costas
            .as_mut()
            .expect("set_costas_publisher called after start")
            .set_sample_publisher(publisher);
    }

    /// Attach a telemetry publisher to the RRC stage. Must be called before [`start`](Self::start).
    pub fn set_rrc_publisher(&mut self, publisher: Box<dyn SamplePublisher>) {
        self.rrc
            .as_mut()
            .expect("set_rrc_publisher called after start")
            .set_sample_publisher(publisher);
    }

    /// Attach a telemetry publisher to the clock-recovery stage. Must be called before [`start`](Self::start).
    pub fn set_clock_recovery_publisher(&mut self, publisher: Box<dyn SamplePublisher>) {
        self.clock_recovery
            .as_mut()
            .expect("set_clock_recovery_publisher called after start")
            .set_sample_publisher(publisher);
    }

    /// Attach the soft-bit telemetry publisher. Must be called before [`start`](Self::start).
    pub fn set_soft_bit_publisher(&mut self, publisher: Box<dyn SoftBitPublisher>) {
        self.quantize
            .as_mut()
            .expect("set_soft_bit_publisher called after start")
            .set_soft_bit_publisher(publisher);
    }

    /// Spawn the source and all five stage threads.
    ///
    /// Consumes `source`: a `Demodulator` only ever runs once. Panics if
    /// called twice.
    pub fn start(&mut self, mut source: Box<dyn Source>) {
        assert!(self.handles.is_empty(), "Demodulator::start called twice");

        let source_queue = Arc::clone(&self.source_queue);
        self.handles
            .push(thread::spawn(move || source.run(&source_queue)));

        let mut agc = self.agc.take().expect("stage already consumed");
        let (qin, qout) = (Arc::clone(&self.source_queue), Arc::clone(&self.agc_queue));
        self.handles
            .push(thread::spawn(move || agc.run(&qin, &qout)));

        let mut costas = self.costas.take().expect("stage already consumed");
        let (qin, qout) = (Arc::clone(&self.agc_queue), Arc::clone(&self.costas_queue));
        self.handles
            .push(thread::spawn(move || costas.run(&qin, &qout)));

        let mut rrc = self.rrc.take().expect("stage already consumed");
        let (qin, qout) = (Arc::clone(&self.costas_queue), Arc::clone(&self.rrc_queue));
        self.handles
            .push(thread::spawn(move || rrc.run(&qin, &qout)));

        let mut clock_recovery = self.clock_recovery.take().expect("stage already consumed");
        let (qin, qout) = (Arc::clone(&self.rrc_queue), Arc::clone(&self.clock_queue));
        self.handles
            .push(thread::spawn(move || clock_recovery.run(&qin, &qout)));

        let mut quantize = self.quantize.take().expect("stage already consumed");
        let (qin, qout) = (Arc::clone(&self.clock_queue), Arc::clone(&self.soft_bits_queue));
        self.handles
            .push(thread::spawn(move || quantize.run(&qin, &qout)));

        if let Some(publisher) = self.stats_publisher.take() {
            let metrics = Arc::clone(&self.metrics);
            let sample_rate = self.sample_rate;
            let soft_bits_queue = Arc::clone(&self.soft_bits_queue);
            self.handles.push(thread::spawn(move || {
                stats_worker(&metrics, sample_rate, &soft_bits_queue, publisher.as_ref())
            }));
        }
    }

    /// Join every stage thread.
    ///
    /// Threads only exit once the `Source` closes `source_queue` and
    /// closure cascades stage-to-stage, so this blocks until the source is
    /// exhausted (or its queue is closed externally) and every in-flight
    /// block has drained.
    pub fn stop(&mut self) {
        for handle in self.handles.drain(..) {
            if handle.join().is_err() {
                log::error!("a pipeline stage thread panicked");
            }
        }
    }
}

impl Drop for Demodulator {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Periodically snapshot `metrics` and hand it to `publisher`.
///
/// Has no queue of its own to read, so it rides the terminal queue's closure
/// as its cooperative shutdown signal: once `soft_bits_queue` closes, every
/// stage has drained, and this worker publishes one final snapshot and
/// returns.
fn stats_worker(
    metrics: &SharedMetrics,
    sample_rate: f64,
    soft_bits_queue: &Queue<SoftBitBlock>,
    publisher: &dyn StatsPublisher,
) {
    while !soft_bits_queue.is_closed() {
        thread::sleep(STATS_INTERVAL);
        publisher.publish(metrics.snapshot(sample_rate));
    }
    publisher.publish(metrics.snapshot(sample_rate));
}
