//! Wire formats shared by the GBASPi button/power controller and its host.
//!
//! The controller is a small microcontroller sitting on the host's I2C bus at
//! address [`BUS_ADDRESS`]. Two formats cross that bus:
//!
//! - **[`Packet`]** (controller → host): a 16-bit snapshot of the power key,
//!   the four face/shoulder buttons and the hat switch, sent LSB first.
//! - **[`IndicatorCommand`]** (host → controller): one byte switching the
//!   controller's LED/power-hold line on or off.
//!
//! A third format, the USB HID reports in [`report`], is what the controller
//! publishes on its own USB port.
//!
//! # Packet Layout
//!
//! ```text
//! bit  15..9      8   7   6   5    4    3    2    1   0
//!      reserved   B   R   L   X+   X-   Y+   Y-   A   PWR
//! ```
//!
//! Each hat axis is a disjoint pair of bits. Setting both bits of one pair is
//! not a valid encoding; decoding treats it as neutral and
//! [`Packet::is_ambiguous`] reports it.
//!
//! # Example
//!
//! ```
//! use gbaspi_proto::{Buttons, Packet};
//!
//! let state = Packet::from_le_bytes([0x02, 0x00]).decode();
//! assert!(state.buttons.is_pressed(Buttons::A));
//! assert!(!state.power_key);
//! assert_eq!((state.hat_x, state.hat_y), (0, 0));
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod indicator;
pub mod packet;
pub mod report;
pub mod types;

pub use indicator::IndicatorCommand;
pub use packet::Packet;
pub use report::{GamepadReport, PowerReport, ReportKind, REPORT_DESCRIPTOR};
pub use types::{Buttons, DecodedInputState, HatDirection};

/// 7-bit I2C address the controller answers on.
pub const BUS_ADDRESS: u8 = 0x08;
