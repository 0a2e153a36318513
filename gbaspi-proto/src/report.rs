//! USB HID reports published by the controller.
//!
//! Two report streams share one interface and are told apart by report ID:
//! the gamepad (buttons + hat) and a system-control collection carrying the
//! "System Power Down" usage. Every report starts with its ID byte.

use crate::types::{Buttons, HatDirection};

/// Which report stream a report belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportKind {
    Gamepad,
    Power,
}

impl ReportKind {
    /// HID report ID used as the first byte of every report of this kind.
    #[inline]
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Gamepad => 0x55,
            Self::Power => 0xAA,
        }
    }

    #[must_use]
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            0x55 => Some(Self::Gamepad),
            0xAA => Some(Self::Power),
            _ => None,
        }
    }
}

/// Gamepad report: six buttons and a hat switch.
///
/// Wire layout: `[0x55, buttons, hat]`, hat in the low nibble with `0x0F`
/// meaning centered.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GamepadReport {
    pub buttons: Buttons,
    pub hat: HatDirection,
}

impl GamepadReport {
    /// Size of the report in bytes, including the report ID.
    pub const SIZE: usize = 3;

    /// Convert the report to bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> [u8; Self::SIZE] {
        [
            ReportKind::Gamepad.id(),
            self.buttons.raw() & Buttons::ALL.raw(),
            self.hat.raw(),
        ]
    }

    /// Neutral report: nothing pressed, hat centered.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            buttons: Buttons::NONE,
            hat: HatDirection::Centered,
        }
    }
}

/// System-control report carrying the power-down flag.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PowerReport {
    pub power_down: bool,
}

impl PowerReport {
    /// Size of the report in bytes, including the report ID.
    pub const SIZE: usize = 2;

    #[must_use]
    pub const fn as_bytes(&self) -> [u8; Self::SIZE] {
        [ReportKind::Power.id(), self.power_down as u8]
    }
}

/// Largest report on the interface, for sizing HID endpoints.
pub const MAX_REPORT_SIZE: usize = GamepadReport::SIZE;

/// HID report descriptor covering both report streams.
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Gamepad)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x55, //   Report ID (0x55)
    //
    // --- Buttons (A, B, Select, Start, L, R) ---
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x06, //   Usage Maximum (Button 6)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x95, 0x06, //   Report Count (6)
    0x75, 0x01, //   Report Size (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x95, 0x01, //   Report Count (1)
    0x75, 0x02, //   Report Size (2)
    0x81, 0x03, //   Input (Constant) - padding
    //
    // --- Hat switch ---
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x39, //   Usage (Hat Switch)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x07, //   Logical Maximum (7)
    0x35, 0x00, //   Physical Minimum (0)
    0x46, 0x3B, 0x01, //   Physical Maximum (315)
    0x65, 0x14, //   Unit (Degrees)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x42, //   Input (Data, Variable, Absolute, Null State)
    0x65, 0x00, //   Unit (None)
    0x75, 0x04, //   Report Size (4)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x03, //   Input (Constant) - padding
    0xC0, // End Collection
    //
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x80, // Usage (System Control)
    0xA1, 0x01, // Collection (Application)
    0x85, 0xAA, //   Report ID (0xAA)
    0x09, 0x81, //   Usage (System Power Down)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    0x75, 0x07, //   Report Size (7)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x03, //   Input (Constant) - padding
    0xC0, // End Collection
];
