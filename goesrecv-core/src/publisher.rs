//! Telemetry side-channels (`SamplePublisher`/`SoftBitPublisher`).
//!
//! Publishers are optional, best-effort sinks a stage mirrors its output to
//! for out-of-band inspection. They must never block the DSP path: the
//! shipped `ChannelPublisher` uses a bounded `crossbeam_channel` and a
//! `try_send`, silently dropping the block when the channel is full rather
//! than applying back-pressure to the stage that owns it.

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::errors::PublisherError;
use crate::metrics::StatsRecord;
use crate::types::{SampleBlock, SoftBitBlock};

/// Sink for intermediate sample blocks emitted by a DSP stage.
pub trait SamplePublisher: Send {
    fn publish(&self, block: &SampleBlock);
}

/// Sink for soft-bit blocks emitted by the terminal stage.
pub trait SoftBitPublisher: Send {
    fn publish(&self, block: &SoftBitBlock);
}

/// Sink for periodic `StatsRecord` snapshots.
pub trait StatsPublisher: Send {
    fn publish(&self, record: StatsRecord);
}

/// A non-blocking publisher backed by a bounded channel.
///
/// Cloning an emitted block costs an allocation, but only ever on the
/// publish path of a stage that opted in; the DSP hot loop itself performs
/// no allocation. The receiving half is handed to whatever out-of-band
/// consumer cares to read it (a CLI progress display, a websocket relay,
/// a test harness); if nobody reads, the channel fills up and further
/// publishes are dropped rather than stalling the stage.
pub struct ChannelPublisher<T> {
    tx: Sender<T>,
}

impl<T: Clone + Send + 'static> ChannelPublisher<T> {
    /// Create a linked publisher/receiver pair with the given channel depth.
    pub fn new(capacity: usize) -> (Self, Receiver<T>) {
        let (tx, rx) = crossbeam_channel::bounded(capacity);
        (Self { tx }, rx)
    }

    fn try_publish(&self, value: T) -> Result<(), PublisherError> {
        match self.tx.try_send(value) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(PublisherError::BackPressureDropped),
            Err(TrySendError::Disconnected(_)) => Err(PublisherError::Disconnected),
        }
    }
}

impl SamplePublisher for ChannelPublisher<SampleBlock> {
    fn publish(&self, block: &SampleBlock) {
        if let Err(err) = self.try_publish(block.clone()) {
            log::debug!("sample publisher: {err}");
        }
    }
}

impl SoftBitPublisher for ChannelPublisher<SoftBitBlock> {
    fn publish(&self, block: &SoftBitBlock) {
        if let Err(err) = self.try_publish(block.clone()) {
            log::debug!("soft-bit publisher: {err}");
        }
    }
}

impl StatsPublisher for ChannelPublisher<StatsRecord> {
    fn publish(&self, record: StatsRecord) {
        if let Err(err) = self.try_publish(record) {
            log::debug!("stats publisher: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_channel_drops_instead_of_blocking() {
        let (publisher, rx) = ChannelPublisher::<SampleBlock>::new(1);
        let block = SampleBlock::with_capacity(4);

        publisher.publish(&block);
        // Channel now full (capacity 1, nothing drained yet); this must
        // return immediately rather than block.
        publisher.publish(&block);

        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn disconnected_receiver_is_reported_but_does_not_panic() {
        let (publisher, rx) = ChannelPublisher::<SampleBlock>::new(1);
        drop(rx);
        publisher.publish(&SampleBlock::with_capacity(1));
    }

    #[test]
    fn stats_publisher_delivers_records_in_order() {
        let (publisher, rx) = ChannelPublisher::<StatsRecord>::new(4);
        let record = StatsRecord {
            agc_gain: 1.0,
            costas_frequency_hz: 10.0,
            costas_phase: 0.0,
            clock_omega: 4.0,
            clock_mu: 0.1,
            soft_bits_emitted: 1000,
        };
        StatsPublisher::publish(&publisher, record);

        let received = rx.try_recv().unwrap();
        assert_eq!(received, record);
    }
}
