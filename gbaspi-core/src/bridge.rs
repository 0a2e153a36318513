//! BridgeDecoder: turns controller packets into input events.

use crate::input::{Axis, InputSink, Key};
use crate::transport::{Transport, TransportError};
use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use gbaspi_proto::{DecodedInputState, Packet};
use portable_atomic::{AtomicBool, Ordering};

/// Wakes the decoder and tells it when to stop.
///
/// `notify` is meant to be called from whatever sees the controller's
/// data-ready line. Notifications collapse into one pending wake-up, so a
/// burst of edges while a decode is in flight triggers one more decode, not
/// a backlog.
pub struct DecoderControl<M: RawMutex> {
    ready: Signal<M, ()>,
    stopping: AtomicBool,
}

impl<M: RawMutex> DecoderControl<M> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            ready: Signal::new(),
            stopping: AtomicBool::new(false),
        }
    }

    /// The controller has a packet ready.
    pub fn notify(&self) {
        self.ready.signal(());
    }

    /// Begin teardown. The decoder finishes any read in flight and then
    /// never touches the transport again.
    pub fn shutdown(&self) {
        self.stopping.store(true, Ordering::Release);
        self.ready.signal(());
    }

    #[inline]
    #[must_use]
    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }

    async fn wait_ready(&self) {
        self.ready.wait().await;
    }
}

impl<M: RawMutex> Default for DecoderControl<M> {
    fn default() -> Self {
        Self::new()
    }
}

/// Diagnostic counters kept by the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecoderStats {
    /// Packets read and published.
    pub packets: u32,
    /// Reads that failed and were skipped.
    pub transport_errors: u32,
    /// Published packets that had an invalid hat encoding.
    pub ambiguous: u32,
}

/// Reads packets from a [`Transport`] and publishes them to an [`InputSink`].
///
/// # Error Handling
///
/// A failed read is counted, logged and skipped: nothing is published for
/// that cycle, so consumers keep the last good snapshot. An invalid hat
/// encoding is published as neutral on that axis and counted.
pub struct BridgeDecoder<T, S> {
    transport: T,
    sink: S,
    stats: DecoderStats,
}

impl<T: Transport, S: InputSink> BridgeDecoder<T, S> {
    /// Create a new decoder from a transport and sink.
    pub fn new(transport: T, sink: S) -> Self {
        Self {
            transport,
            sink,
            stats: DecoderStats::default(),
        }
    }

    /// Decode on every notification until `control` is shut down.
    pub async fn run<M: RawMutex>(&mut self, control: &DecoderControl<M>) {
        loop {
            control.wait_ready().await;
            if let Err(BridgeError::Stopped) = self.process_if_running(control).await {
                info!("decoder stopped");
                return;
            }
        }
    }

    /// Like [`process_one`](Self::process_one), but refuses to touch the
    /// transport once teardown has begun.
    pub async fn process_if_running<M: RawMutex>(
        &mut self,
        control: &DecoderControl<M>,
    ) -> Result<DecodedInputState, BridgeError> {
        if control.is_stopping() {
            return Err(BridgeError::Stopped);
        }
        self.process_one().await
    }

    /// Read, decode and publish one packet.
    ///
    /// Returns the published snapshot for testing purposes.
    pub async fn process_one(&mut self) -> Result<DecodedInputState, BridgeError> {
        let mut bytes = [0u8; Packet::SIZE];
        if let Err(e) = self.transport.receive(&mut bytes).await {
            self.stats.transport_errors = self.stats.transport_errors.wrapping_add(1);
            warn!("packet read failed: {:?}", e);
            return Err(BridgeError::Transport(e));
        }

        let packet = Packet::from_le_bytes(bytes);
        if packet.is_ambiguous() {
            self.stats.ambiguous = self.stats.ambiguous.wrapping_add(1);
            debug!("ambiguous hat bits in packet {:?}", packet);
        }

        let state = packet.decode();
        self.publish(&state);
        self.stats.packets = self.stats.packets.wrapping_add(1);
        trace!("published {:?}", state);
        Ok(state)
    }

    fn publish(&mut self, state: &DecodedInputState) {
        for key in Key::ALL {
            self.sink.report_key(key, key.is_pressed_in(state));
        }
        self.sink.report_axis(Axis::HatX, state.hat_x);
        self.sink.report_axis(Axis::HatY, state.hat_y);
        self.sink.sync();
    }

    #[inline]
    #[must_use]
    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    /// Get a reference to the input sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Get a mutable reference to the input sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Decompose the decoder into its transport and sink.
    pub fn into_parts(self) -> (T, S) {
        (self.transport, self.sink)
    }
}

/// Error type for decoder operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BridgeError {
    /// Reading the packet failed; the cycle was skipped.
    Transport(TransportError),
    /// Teardown has begun; the transport was not touched.
    Stopped,
}

impl From<TransportError> for BridgeError {
    fn from(e: TransportError) -> Self {
        BridgeError::Transport(e)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::input::SignalInputSink;
    use crate::testing::block_on;
    use core::future::Future;
    use embassy_sync::blocking_mutex::raw::NoopRawMutex;
    use gbaspi_proto::Buttons;
    use std::collections::VecDeque;
    use std::vec;
    use std::vec::Vec;

    // Hands out queued packets, then fails with Nack
    struct MockTransport {
        packets: VecDeque<Result<u16, TransportError>>,
        reads: usize,
    }

    impl MockTransport {
        fn new(packets: Vec<Result<u16, TransportError>>) -> Self {
            Self {
                packets: packets.into(),
                reads: 0,
            }
        }
    }

    impl Transport for MockTransport {
        fn send(&mut self, _bytes: &[u8]) -> impl Future<Output = Result<(), TransportError>> {
            core::future::ready(Ok(()))
        }

        fn receive(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<(), TransportError>> {
            self.reads += 1;
            let result = match self.packets.pop_front() {
                Some(Ok(raw)) => {
                    buf.copy_from_slice(&raw.to_le_bytes());
                    Ok(())
                }
                Some(Err(e)) => Err(e),
                None => Err(TransportError::Nack),
            };
            core::future::ready(result)
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    enum Event {
        Key(Key, bool),
        Axis(Axis, i8),
        Sync,
    }

    struct RecordingSink {
        events: Vec<Event>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self { events: Vec::new() }
        }
    }

    impl InputSink for RecordingSink {
        fn report_key(&mut self, key: Key, pressed: bool) {
            self.events.push(Event::Key(key, pressed));
        }

        fn report_axis(&mut self, axis: Axis, value: i8) {
            self.events.push(Event::Axis(axis, value));
        }

        fn sync(&mut self) {
            self.events.push(Event::Sync);
        }
    }

    #[test]
    fn test_power_key_packet() {
        let transport = MockTransport::new(vec![Ok(0x0001)]);
        let mut bridge = BridgeDecoder::new(transport, RecordingSink::new());

        let state = block_on(bridge.process_one()).unwrap();
        assert!(state.power_key);
        assert!(state.buttons.is_empty());
        assert_eq!((state.hat_x, state.hat_y), (0, 0));

        let events = &bridge.sink().events;
        assert_eq!(
            events.as_slice(),
            &[
                Event::Key(Key::Power, true),
                Event::Key(Key::A, false),
                Event::Key(Key::B, false),
                Event::Key(Key::L, false),
                Event::Key(Key::R, false),
                Event::Axis(Axis::HatX, 0),
                Event::Axis(Axis::HatY, 0),
                Event::Sync,
            ]
        );
    }

    #[test]
    fn test_button_a_packet() {
        let transport = MockTransport::new(vec![Ok(0x0002)]);
        let mut bridge = BridgeDecoder::new(transport, RecordingSink::new());

        let state = block_on(bridge.process_one()).unwrap();
        assert_eq!(state.buttons, Buttons::A);
        assert!(!state.power_key);
        assert!(bridge.sink().events.contains(&Event::Key(Key::A, true)));
    }

    #[test]
    fn test_sync_is_last_and_only_once() {
        let packet = Packet::BUTTON_B | Packet::HAT_X_NEG | Packet::HAT_Y_POS;
        let transport = MockTransport::new(vec![Ok(packet)]);
        let mut bridge = BridgeDecoder::new(transport, RecordingSink::new());

        block_on(bridge.process_one()).unwrap();
        let events = &bridge.sink().events;
        assert_eq!(events.iter().filter(|e| **e == Event::Sync).count(), 1);
        assert_eq!(events.last(), Some(&Event::Sync));
        assert!(events.contains(&Event::Axis(Axis::HatX, -1)));
        assert!(events.contains(&Event::Axis(Axis::HatY, 1)));
    }

    #[test]
    fn test_read_failure_publishes_nothing() {
        let signal: Signal<NoopRawMutex, DecodedInputState> = Signal::new();
        let transport = MockTransport::new(vec![Ok(0x0042), Err(TransportError::Bus)]);
        let mut bridge = BridgeDecoder::new(transport, SignalInputSink::new(&signal));

        block_on(bridge.process_one()).unwrap();
        let first = signal.try_take().unwrap();
        assert_eq!(first.buttons, Buttons::A | Buttons::L);

        let result = block_on(bridge.process_one());
        assert_eq!(result, Err(BridgeError::Transport(TransportError::Bus)));
        assert!(!signal.signaled());
        assert_eq!(*bridge.sink().staged(), first);

        let stats = bridge.stats();
        assert_eq!(stats.packets, 1);
        assert_eq!(stats.transport_errors, 1);
    }

    #[test]
    fn test_decoder_recovers_after_failure() {
        let transport = MockTransport::new(vec![Err(TransportError::Nack), Ok(0x0100)]);
        let mut bridge = BridgeDecoder::new(transport, RecordingSink::new());

        assert!(block_on(bridge.process_one()).is_err());
        assert!(bridge.sink().events.is_empty());

        let state = block_on(bridge.process_one()).unwrap();
        assert_eq!(state.buttons, Buttons::B);
    }

    #[test]
    fn test_ambiguous_packets_are_counted() {
        let both_x = Packet::HAT_X_NEG | Packet::HAT_X_POS;
        let transport = MockTransport::new(vec![Ok(both_x)]);
        let mut bridge = BridgeDecoder::new(transport, RecordingSink::new());

        let state = block_on(bridge.process_one()).unwrap();
        assert_eq!(state.hat_x, 0);
        assert_eq!(bridge.stats().ambiguous, 1);
    }

    #[test]
    fn test_stopped_decoder_does_not_read() {
        let control: DecoderControl<NoopRawMutex> = DecoderControl::new();
        let transport = MockTransport::new(vec![Ok(0x0001)]);
        let mut bridge = BridgeDecoder::new(transport, RecordingSink::new());

        control.shutdown();
        let result = block_on(bridge.process_if_running(&control));
        assert_eq!(result, Err(BridgeError::Stopped));

        let (transport, sink) = bridge.into_parts();
        assert_eq!(transport.reads, 0);
        assert!(sink.events.is_empty());
    }

    #[test]
    fn test_run_exits_on_shutdown() {
        let control: DecoderControl<NoopRawMutex> = DecoderControl::new();
        let transport = MockTransport::new(vec![]);
        let mut bridge = BridgeDecoder::new(transport, RecordingSink::new());

        control.shutdown();
        block_on(bridge.run(&control));
        assert_eq!(bridge.transport_mut().reads, 0);
    }

    #[test]
    fn test_notifications_coalesce() {
        let control: DecoderControl<NoopRawMutex> = DecoderControl::new();
        control.notify();
        control.notify();
        control.notify();

        let transport = MockTransport::new(vec![Ok(0x0002)]);
        let mut bridge = BridgeDecoder::new(transport, RecordingSink::new());
        block_on(control.wait_ready());
        block_on(bridge.process_if_running(&control)).unwrap();

        // Three edges, one pending wake-up
        assert!(!control.ready.signaled());
        assert_eq!(bridge.stats().packets, 1);
    }
}
