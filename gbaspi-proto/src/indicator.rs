//! Host → controller indicator command.

/// One-byte instruction for the controller's LED/power-hold output.
///
/// Switching the indicator off is what lets the controller cut the host's
/// power rail at the end of a shutdown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum IndicatorCommand {
    Off = 0x00,
    On = 0x01,
}

impl IndicatorCommand {
    /// Size on the wire in bytes.
    pub const SIZE: usize = 1;

    /// Decode a received byte. Any non-zero value means on.
    #[inline]
    #[must_use]
    pub const fn from_byte(byte: u8) -> Self {
        if byte == 0 {
            Self::Off
        } else {
            Self::On
        }
    }

    #[inline]
    #[must_use]
    pub const fn as_byte(self) -> u8 {
        self as u8
    }

    #[inline]
    #[must_use]
    pub const fn to_bytes(self) -> [u8; Self::SIZE] {
        [self as u8]
    }

    #[inline]
    #[must_use]
    pub const fn is_on(self) -> bool {
        matches!(self, Self::On)
    }
}

impl From<bool> for IndicatorCommand {
    fn from(on: bool) -> Self {
        if on {
            Self::On
        } else {
            Self::Off
        }
    }
}
