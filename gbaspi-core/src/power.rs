//! Power-off handler slot and chaining.
//!
//! The platform owns one [`PowerOffSlot`]: whatever handler sits in it runs
//! when the system powers off. [`PowerOffChain`] puts this bridge's handler in
//! the slot without losing the one that was there before:
//!
//! - `install` swaps itself in and remembers the previous handler,
//! - firing runs its own [`PowerOffAction`], hands the slot back, then calls
//!   the previous handler,
//! - `uninstall` restores the previous handler, unless someone else has
//!   installed on top in the meantime, in which case the slot is left alone.
//!
//! An uninstalled chain stays `Detached` and keeps `previous`: a handler
//! installed on top, or a dispatch that read the slot just before
//! `uninstall`, may still call into it, and the chain must still run once.
//! A chain that was never installed ignores power-off.
//!
//! ```text
//! Uninstalled --install--> Installed --power-off--> Firing --> Uninstalled
//!                           ^     |                    ^
//!                   install |     | uninstall          | power-off
//!                           |     v                    |
//!                           Detached ------------------+
//! ```

use crate::config::BridgeConfig;
use crate::transport::{send_indicator, Transport, TransportError};
use core::cell::Cell;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex as BlockingMutex;
use embassy_sync::mutex::Mutex;
use embedded_hal::delay::DelayNs;
use gbaspi_proto::IndicatorCommand;
use portable_atomic::{AtomicU8, Ordering};

/// Outcome of a power-off handler. Either way the sequence has finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerOffStatus {
    Completed,
    /// Finished, but some step failed (e.g. the indicator write).
    Degraded,
}

impl PowerOffStatus {
    /// Combine the status of two chained handlers.
    #[must_use]
    pub const fn merge(self, other: Self) -> Self {
        match (self, other) {
            (Self::Completed, Self::Completed) => Self::Completed,
            _ => Self::Degraded,
        }
    }
}

/// Something the platform can call at power-off.
///
/// Called with no context, possibly from a different execution context than
/// the one that installed it. Must return; a power-off handler never blocks
/// shutdown indefinitely.
pub trait PowerOffHandler: Sync {
    fn on_power_off(&self) -> PowerOffStatus;
}

/// Reference held by the slot.
pub type HandlerRef = &'static dyn PowerOffHandler;

#[inline]
fn is_handler<H: ?Sized>(handler: HandlerRef, candidate: *const H) -> bool {
    core::ptr::addr_eq(handler, candidate)
}

/// The process-wide power-off registration point.
///
/// Holds at most one handler. Reads and updates happen inside a critical
/// section, so a swap or compare-and-swap is atomic with respect to a
/// concurrent dispatch.
pub struct PowerOffSlot {
    active: BlockingMutex<CriticalSectionRawMutex, Cell<Option<HandlerRef>>>,
}

impl PowerOffSlot {
    /// An empty slot.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            active: BlockingMutex::new(Cell::new(None)),
        }
    }

    /// Handler that would run if the system powered off now.
    #[must_use]
    pub fn current(&self) -> Option<HandlerRef> {
        self.active.lock(Cell::get)
    }

    /// Put `handler` in the slot and return whatever was there.
    pub fn register(&self, handler: Option<HandlerRef>) -> Option<HandlerRef> {
        self.active.lock(|active| active.replace(handler))
    }

    /// Replace the active handler with `new` only if it is still `expected`.
    ///
    /// Handlers are compared by address. Returns `true` if the swap happened.
    pub fn compare_and_swap(
        &self,
        expected: &dyn PowerOffHandler,
        new: Option<HandlerRef>,
    ) -> bool {
        self.active.lock(|active| match active.get() {
            Some(current) if is_handler(current, expected) => {
                active.set(new);
                true
            }
            _ => false,
        })
    }

    /// Run the active handler, as the platform does at power-off.
    ///
    /// Returns `None` if the slot is empty.
    pub fn dispatch(&self) -> Option<PowerOffStatus> {
        // Copy out first: the handler may touch the slot itself.
        let handler = self.current()?;
        Some(handler.on_power_off())
    }

    fn with_active<R>(&self, f: impl FnOnce(&Cell<Option<HandlerRef>>) -> R) -> R {
        self.active.lock(f)
    }
}

impl Default for PowerOffSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// This bridge's own part of the power-off sequence.
pub trait PowerOffAction: Sync {
    /// Called once the handler is installed.
    fn arm(&self) {}

    /// Called when the system powers off.
    fn power_off(&self) -> PowerOffStatus;

    /// Called once the handler is uninstalled.
    fn release(&self) {}
}

/// Lifecycle state of a [`PowerOffChain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChainState {
    /// Never installed, or has already fired.
    Uninstalled,
    Installed,
    /// Out of the slot, but still fires if called through a stale reference.
    Detached,
    Firing,
}

const UNINSTALLED: u8 = 0;
const INSTALLED: u8 = 1;
const DETACHED: u8 = 2;
const FIRING: u8 = 3;

impl ChainState {
    const fn from_raw(raw: u8) -> Self {
        match raw {
            INSTALLED => Self::Installed,
            DETACHED => Self::Detached,
            FIRING => Self::Firing,
            _ => Self::Uninstalled,
        }
    }
}

/// Registration conflicts reported by [`PowerOffChain`].
///
/// None of these change the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ChainError {
    /// `install` called while already installed.
    AlreadyInstalled,
    /// `uninstall` called while not installed.
    NotInstalled,
    /// The handler is running; install/uninstall must wait for it.
    Firing,
}

/// What `uninstall` did with the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UninstallOutcome {
    /// The previous handler (possibly none) is active again.
    Restored,
    /// Another handler was installed on top of ours and was left in place.
    Superseded,
}

/// Installs a [`PowerOffAction`] into a [`PowerOffSlot`], chaining to the
/// handler that was there before.
///
/// Needs a `'static` home (e.g. a `StaticCell`) because the slot keeps a
/// reference to it.
pub struct PowerOffChain<A> {
    slot: &'static PowerOffSlot,
    action: A,
    previous: BlockingMutex<CriticalSectionRawMutex, Cell<Option<HandlerRef>>>,
    state: AtomicU8,
}

impl<A: PowerOffAction + 'static> PowerOffChain<A> {
    #[must_use]
    pub const fn new(slot: &'static PowerOffSlot, action: A) -> Self {
        Self {
            slot,
            action,
            previous: BlockingMutex::new(Cell::new(None)),
            state: AtomicU8::new(UNINSTALLED),
        }
    }

    #[must_use]
    pub fn state(&self) -> ChainState {
        ChainState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Handler captured at install time. Kept after `uninstall`.
    #[must_use]
    pub fn previous(&self) -> Option<HandlerRef> {
        self.previous.lock(Cell::get)
    }

    #[inline]
    pub fn action(&self) -> &A {
        &self.action
    }

    /// Make this chain the active power-off handler.
    pub fn install(&'static self) -> Result<(), ChainError> {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| match state {
                UNINSTALLED | DETACHED => Some(INSTALLED),
                _ => None,
            })
            .map_err(|state| match state {
                FIRING => ChainError::Firing,
                _ => ChainError::AlreadyInstalled,
            })?;

        let own: HandlerRef = self;
        // Capture and record `previous` under the slot lock so a dispatch
        // never sees us active with a stale `previous`.
        let previous = self.slot.with_active(|active| {
            let previous = active.replace(Some(own));
            self.previous.lock(|p| p.set(previous));
            previous
        });
        info!(
            "power-off handler installed, chaining to previous: {}",
            previous.is_some()
        );

        self.action.arm();
        Ok(())
    }

    /// Step out of the slot, restoring the previous handler if nobody has
    /// installed on top of us.
    pub fn uninstall(&'static self) -> Result<UninstallOutcome, ChainError> {
        self.state
            .compare_exchange(INSTALLED, DETACHED, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|state| match state {
                FIRING => ChainError::Firing,
                _ => ChainError::NotInstalled,
            })?;

        // `previous` stays set: a dispatch may already hold a reference to us.
        let outcome = if self.slot.compare_and_swap(self, self.previous()) {
            info!("power-off handler uninstalled, previous restored");
            UninstallOutcome::Restored
        } else {
            warn!("power-off slot taken over by another handler, leaving it in place");
            UninstallOutcome::Superseded
        };

        self.action.release();
        Ok(outcome)
    }
}

impl<A: PowerOffAction + 'static> PowerOffHandler for PowerOffChain<A> {
    fn on_power_off(&self) -> PowerOffStatus {
        let entered = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| match state {
                INSTALLED | DETACHED => Some(FIRING),
                _ => None,
            });
        match entered {
            Ok(_) => {}
            Err(FIRING) => {
                warn!("power-off handler re-entered, skipping");
                return PowerOffStatus::Completed;
            }
            Err(_) => {
                debug!("power-off handler not installed, skipping");
                return PowerOffStatus::Completed;
            }
        }

        let status = self.action.power_off();

        let previous = self.previous();
        self.slot.compare_and_swap(self, previous);

        let status = match previous {
            Some(handler) => status.merge(handler.on_power_off()),
            None => status,
        };

        self.state.store(UNINSTALLED, Ordering::Release);
        info!("power-off sequence finished: {:?}", status);
        status
    }
}

struct Parts<T, D> {
    transport: T,
    delay: D,
}

/// Power-off action that switches the controller's indicator off and waits
/// for it to drop the power rail.
///
/// Also switches the indicator on when armed, and off when released, so the
/// controller keeps the rail up exactly while the host has a handler
/// installed.
pub struct IndicatorPowerOff<T, D> {
    parts: Mutex<CriticalSectionRawMutex, Parts<T, D>>,
    settle_delay_ms: u32,
}

impl<T: Transport, D: DelayNs> IndicatorPowerOff<T, D> {
    #[must_use]
    pub const fn new(transport: T, delay: D, config: &BridgeConfig) -> Self {
        Self {
            parts: Mutex::new(Parts { transport, delay }),
            settle_delay_ms: config.settle_delay_ms,
        }
    }

    #[inline]
    #[must_use]
    pub fn settle_delay_ms(&self) -> u32 {
        self.settle_delay_ms
    }

    /// Send a command and, if it went out, wait `settle_ms`.
    ///
    /// Never waits for the transport: if it is held elsewhere the command is
    /// dropped and reported as [`TransportError::Busy`].
    fn command(&self, command: IndicatorCommand, settle_ms: u32) -> Result<(), TransportError> {
        let mut parts = self.parts.try_lock().map_err(|_| TransportError::Busy)?;
        embassy_futures::block_on(send_indicator(&mut parts.transport, command))?;
        if settle_ms > 0 {
            parts.delay.delay_ms(settle_ms);
        }
        Ok(())
    }
}

impl<T, D> PowerOffAction for IndicatorPowerOff<T, D>
where
    T: Transport + Send,
    D: DelayNs + Send,
{
    fn arm(&self) {
        if let Err(e) = self.command(IndicatorCommand::On, 0) {
            warn!("indicator on failed: {:?}", e);
        }
    }

    fn power_off(&self) -> PowerOffStatus {
        match self.command(IndicatorCommand::Off, self.settle_delay_ms) {
            Ok(()) => PowerOffStatus::Completed,
            Err(e) => {
                error!("indicator off failed, controller may keep power: {:?}", e);
                PowerOffStatus::Degraded
            }
        }
    }

    fn release(&self) {
        if let Err(e) = self.command(IndicatorCommand::Off, 0) {
            warn!("indicator off failed: {:?}", e);
        }
    }
}
