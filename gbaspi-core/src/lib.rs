//! Platform-agnostic logic for the GBASPi button/power controller bridge.
//!
//! Both ends of the I2C link live here, written against small traits so the
//! same code runs on the firmware and in host tests.
//!
//! # Overview
//!
//! - [`transport`]: byte transport to the controller ([`Transport`], [`I2cTransport`])
//! - [`bridge`]: host-side decoder turning packets into input events ([`BridgeDecoder`])
//! - [`input`]: input event sink and key/axis identities ([`InputSink`], [`Key`], [`Axis`])
//! - [`power`]: power-off slot and chained handler ([`PowerOffChain`], [`IndicatorPowerOff`])
//! - [`encoder`]: controller-side state recorder ([`ControllerEncoder`])
//! - [`shared`]: packet hand-off to the controller's bus target ([`SharedPacket`])
//! - [`output`]: HID report sink ([`ReportSink`])
//! - [`config`]: compile-time settings ([`BridgeConfig`])
//!
//! # Host Flow
//!
//! ```text
//! controller --notify--> DecoderControl --> BridgeDecoder::process_one
//!                                              | read 2 bytes (Transport)
//!                                              | Packet::decode
//!                                              v
//!                                           InputSink: 5 keys, 2 axes, sync
//! ```
//!
//! At power-off the platform dispatches its [`PowerOffSlot`]; the installed
//! [`PowerOffChain`] writes the indicator-off command, waits for the
//! controller to drop power, then runs whatever handler it displaced.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt (for embedded targets)
//! - **`log`**: Log through the `log` crate (for hosted targets)

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

// Must come first so the logging macros are visible to the other modules.
mod fmt;

pub mod bridge;
pub mod config;
pub mod encoder;
pub mod input;
pub mod output;
pub mod power;
pub mod shared;
pub mod transport;

// Re-export main types at crate root
pub use bridge::{BridgeDecoder, BridgeError, DecoderControl, DecoderStats};
pub use config::{BridgeConfig, DEFAULT_CONFIG};
pub use encoder::ControllerEncoder;
pub use input::{Axis, DeviceIdentity, InputSink, Key, SignalInputSink, GAMEPAD_DEVICE};
pub use output::{ReportError, ReportSink};
pub use power::{
    ChainError, ChainState, HandlerRef, IndicatorPowerOff, PowerOffAction, PowerOffChain,
    PowerOffHandler, PowerOffSlot, PowerOffStatus, UninstallOutcome,
};
pub use shared::SharedPacket;
pub use transport::{send_indicator, I2cTransport, Transport, TransportError};
