//! Input-event sink trait and the events the bridge publishes.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::signal::Signal;
use gbaspi_proto::{Buttons, DecodedInputState};

/// Keys the bridge reports. All are level-triggered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Key {
    A,
    B,
    L,
    R,
    Power,
}

impl Key {
    /// Every key, in the order the bridge publishes them.
    pub const ALL: [Key; 5] = [Key::Power, Key::A, Key::B, Key::L, Key::R];

    /// Linux input event code (`BTN_A`, `BTN_B`, `BTN_TL`, `BTN_TR`, `KEY_POWER`).
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Key::A => 0x130,
            Key::B => 0x131,
            Key::L => 0x136,
            Key::R => 0x137,
            Key::Power => 116,
        }
    }

    /// Button bit backing this key, if it is a button.
    #[must_use]
    pub const fn button(self) -> Option<Buttons> {
        match self {
            Key::A => Some(Buttons::A),
            Key::B => Some(Buttons::B),
            Key::L => Some(Buttons::L),
            Key::R => Some(Buttons::R),
            Key::Power => None,
        }
    }

    /// Current level of this key in a decoded snapshot.
    #[must_use]
    pub const fn is_pressed_in(self, state: &DecodedInputState) -> bool {
        match self.button() {
            Some(button) => state.buttons.contains(button),
            None => state.power_key,
        }
    }
}

/// Absolute axes the bridge reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    HatX,
    HatY,
}

impl Axis {
    pub const MIN: i8 = -1;
    pub const MAX: i8 = 1;

    /// Linux input event code (`ABS_HAT0X`, `ABS_HAT0Y`).
    #[must_use]
    pub const fn code(self) -> u16 {
        match self {
            Axis::HatX => 0x10,
            Axis::HatY => 0x11,
        }
    }
}

/// How the host should present the controller as an input device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub name: &'static str,
    pub bus_type: u16,
    pub vendor: u16,
    pub product: u16,
    pub version: u16,
}

/// Identity of the gamepad input device (bus type is `BUS_I2C`).
pub const GAMEPAD_DEVICE: DeviceIdentity = DeviceIdentity {
    name: "Gameboy controller",
    bus_type: 0x18,
    vendor: 0xcafe,
    product: 0xbabe,
    version: 1,
};

/// Destination for decoded input events.
///
/// Reports are staged; nothing becomes visible to consumers until [`sync`]
/// commits the batch.
///
/// [`sync`]: InputSink::sync
pub trait InputSink {
    /// Stage the level of one key.
    fn report_key(&mut self, key: Key, pressed: bool);

    /// Stage an axis value. Values outside [`Axis::MIN`]..=[`Axis::MAX`] are clamped.
    fn report_axis(&mut self, axis: Axis, value: i8);

    /// Publish every staged report at once.
    fn sync(&mut self);
}

impl<S: InputSink> InputSink for &mut S {
    fn report_key(&mut self, key: Key, pressed: bool) {
        (**self).report_key(key, pressed);
    }

    fn report_axis(&mut self, axis: Axis, value: i8) {
        (**self).report_axis(axis, value);
    }

    fn sync(&mut self) {
        (**self).sync();
    }
}

/// [`InputSink`] that publishes whole snapshots through an embassy [`Signal`].
///
/// The signal has "latest value wins" semantics, so a slow consumer sees the
/// most recent committed snapshot and never a half-applied one.
pub struct SignalInputSink<'a, M: RawMutex> {
    staged: DecodedInputState,
    signal: &'a Signal<M, DecodedInputState>,
}

impl<'a, M: RawMutex> SignalInputSink<'a, M> {
    #[must_use]
    pub fn new(signal: &'a Signal<M, DecodedInputState>) -> Self {
        Self {
            staged: DecodedInputState::neutral(),
            signal,
        }
    }

    /// Snapshot that the next `sync` will publish.
    #[inline]
    #[must_use]
    pub fn staged(&self) -> &DecodedInputState {
        &self.staged
    }
}

impl<M: RawMutex> InputSink for SignalInputSink<'_, M> {
    fn report_key(&mut self, key: Key, pressed: bool) {
        match key.button() {
            Some(button) => self.staged.buttons.set(button, pressed),
            None => self.staged.power_key = pressed,
        }
    }

    fn report_axis(&mut self, axis: Axis, value: i8) {
        let value = value.clamp(Axis::MIN, Axis::MAX);
        match axis {
            Axis::HatX => self.staged.hat_x = value,
            Axis::HatY => self.staged.hat_y = value,
        }
    }

    fn sync(&mut self) {
        self.signal.signal(self.staged);
    }
}
