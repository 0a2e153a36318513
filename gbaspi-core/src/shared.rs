//! Packet hand-off between the controller's sampling side and its bus target.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use gbaspi_proto::Packet;
use portable_atomic::{AtomicU16, AtomicU32, Ordering};

/// Latest packet, written by the sampling task and read by the bus target.
///
/// Each publish bumps a generation counter; a served read records the
/// generation it covered. The packet is pending while the two differ, which
/// is what the attention line to the host reports.
pub struct SharedPacket<M: RawMutex> {
    raw: AtomicU16,
    published: AtomicU32,
    served: AtomicU32,
    update: Signal<M, ()>,
}

impl<M: RawMutex> SharedPacket<M> {
    pub const fn new() -> Self {
        Self {
            raw: AtomicU16::new(0),
            published: AtomicU32::new(0),
            served: AtomicU32::new(0),
            update: Signal::new(),
        }
    }

    /// Publish a new packet.
    pub fn publish(&self, packet: Packet) {
        self.raw.store(packet.raw(), Ordering::Release);
        self.published.fetch_add(1, Ordering::AcqRel);
        self.update.signal(());
    }

    #[must_use]
    pub fn load(&self) -> Packet {
        Packet(self.raw.load(Ordering::Acquire))
    }

    /// Whether a published packet has not been read yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.served.load(Ordering::Acquire) != self.published.load(Ordering::Acquire)
    }

    /// Packet for a host read, and the generation it covers.
    ///
    /// The generation is taken first, so a racing publish can only leave the
    /// packet pending, never mark a newer one as served.
    #[must_use]
    pub fn snapshot(&self) -> (Packet, u32) {
        let generation = self.published.load(Ordering::Acquire);
        (self.load(), generation)
    }

    /// Record that the host has read `generation`.
    pub fn mark_served(&self, generation: u32) {
        self.served.store(generation, Ordering::Release);
        self.update.signal(());
    }

    /// Wait for the next publish or served read.
    pub async fn wait_update(&self) {
        self.update.wait().await;
    }
}

impl<M: RawMutex> Default for SharedPacket<M> {
    fn default() -> Self {
        Self::new()
    }
}
