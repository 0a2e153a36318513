//! GBASPi button/power controller firmware for RP2040.
//!
//! Samples the handheld's buttons and publishes them twice: as USB HID
//! reports on the controller's own USB port, and as a 16-bit packet the host
//! reads over I2C. The host answers with indicator commands that drive the
//! power-hold/LED line.
//!
//! # Pins
//!
//! | GPIO | Function                              |
//! |------|---------------------------------------|
//! | 0    | I2C0 SDA (host bus)                   |
//! | 1    | I2C0 SCL (host bus)                   |
//! | 2    | Attention to host, active low         |
//! | 3    | Power hold / LED                      |
//! | 4-7  | D-pad up, down, left, right           |
//! | 8-13 | A, B, Select, Start, L, R             |
//! | 14   | Power key                             |
//!
//! All button inputs are active low with internal pull-ups.

#![no_std]

// Re-export core types for convenience
pub use gbaspi_core::{ControllerEncoder, ReportError, ReportSink};
pub use gbaspi_proto::{Buttons, HatDirection, IndicatorCommand, Packet};

pub mod buttons;
pub mod i2c_target;
pub mod usb_output;

pub use buttons::ButtonPins;
pub use i2c_target::{target_config, AttentionLine, I2cTarget, SharedPacket};
pub use usb_output::{configure_usb_hid, UsbHidOutput};
