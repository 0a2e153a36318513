//! Compile-time bridge configuration.

use gbaspi_proto::BUS_ADDRESS;

/// Host-side bridge settings.
///
/// Customize at compile time by building your own const, as with
/// [`DEFAULT_CONFIG`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BridgeConfig {
    /// 7-bit I2C address of the controller.
    pub address: u8,
    /// How long to wait after switching the indicator off so the controller
    /// can drop the power rail.
    pub settle_delay_ms: u32,
}

/// Settle delay used by the GBASPi board.
pub const SETTLE_DELAY_MS: u32 = 200;

/// Shorter settle delay that is enough for the GBAPi board.
pub const SETTLE_DELAY_SHORT_MS: u32 = 100;

/// Default bridge configuration for the GBASPi board.
pub const DEFAULT_CONFIG: BridgeConfig = BridgeConfig {
    address: BUS_ADDRESS,
    settle_delay_ms: SETTLE_DELAY_MS,
};

impl Default for BridgeConfig {
    fn default() -> Self {
        DEFAULT_CONFIG
    }
}
