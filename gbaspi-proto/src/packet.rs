//! The 16-bit controller → host packet.

use crate::types::{Buttons, DecodedInputState};

/// Raw 16-bit input snapshot read from the controller.
///
/// See the [crate docs](crate) for the bit layout. The packet carries no
/// framing or checksum, so every 16-bit value decodes to *some* state;
/// invalid hat encodings fall back to neutral.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Packet(pub u16);

impl Packet {
    /// Size on the wire in bytes.
    pub const SIZE: usize = 2;

    pub const POWER_KEY: u16 = 1 << 0;
    pub const BUTTON_A: u16 = 1 << 1;
    pub const HAT_Y_NEG: u16 = 1 << 2;
    pub const HAT_Y_POS: u16 = 1 << 3;
    pub const HAT_X_NEG: u16 = 1 << 4;
    pub const HAT_X_POS: u16 = 1 << 5;
    pub const BUTTON_L: u16 = 1 << 6;
    pub const BUTTON_R: u16 = 1 << 7;
    pub const BUTTON_B: u16 = 1 << 8;

    /// Mask of all bits with a defined meaning. Bits 9..=15 are reserved.
    pub const DEFINED: u16 = 0x01FF;

    /// Packet bit for each button carried on the bus.
    const BUTTON_BITS: [(Buttons, u16); 4] = [
        (Buttons::A, Self::BUTTON_A),
        (Buttons::B, Self::BUTTON_B),
        (Buttons::L, Self::BUTTON_L),
        (Buttons::R, Self::BUTTON_R),
    ];

    /// Build a packet from the two bytes as they arrive on the bus.
    #[inline]
    #[must_use]
    pub const fn from_le_bytes(bytes: [u8; Self::SIZE]) -> Self {
        Self(u16::from_le_bytes(bytes))
    }

    /// Bytes in transmission order (low byte first).
    #[inline]
    #[must_use]
    pub const fn to_le_bytes(self) -> [u8; Self::SIZE] {
        self.0.to_le_bytes()
    }

    /// Get the raw u16 value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    #[inline]
    const fn bit(self, mask: u16) -> bool {
        self.0 & mask != 0
    }

    /// Map one axis' bit pair to -1, 0 or 1.
    const fn axis(self, neg: u16, pos: u16) -> i8 {
        match (self.bit(neg), self.bit(pos)) {
            (true, false) => -1,
            (false, true) => 1,
            // 00 is neutral, 11 is reserved and read as neutral
            _ => 0,
        }
    }

    /// Horizontal hat axis: -1 left, 0 neutral, 1 right.
    #[inline]
    #[must_use]
    pub const fn hat_x(self) -> i8 {
        self.axis(Self::HAT_X_NEG, Self::HAT_X_POS)
    }

    /// Vertical hat axis: -1 up, 0 neutral, 1 down.
    #[inline]
    #[must_use]
    pub const fn hat_y(self) -> i8 {
        self.axis(Self::HAT_Y_NEG, Self::HAT_Y_POS)
    }

    #[inline]
    #[must_use]
    pub const fn power_key(self) -> bool {
        self.bit(Self::POWER_KEY)
    }

    /// True if either hat axis has both of its bits set.
    #[must_use]
    pub const fn is_ambiguous(self) -> bool {
        let x = Self::HAT_X_NEG | Self::HAT_X_POS;
        let y = Self::HAT_Y_NEG | Self::HAT_Y_POS;
        self.0 & x == x || self.0 & y == y
    }

    /// Decode into a full input snapshot. Reserved bits are ignored.
    #[must_use]
    pub fn decode(self) -> DecodedInputState {
        let mut buttons = Buttons::NONE;
        for (button, mask) in Self::BUTTON_BITS {
            buttons.set(button, self.bit(mask));
        }

        DecodedInputState {
            buttons,
            hat_x: self.hat_x(),
            hat_y: self.hat_y(),
            power_key: self.power_key(),
        }
    }

    /// Encode a snapshot. Buttons without a packet bit (Select, Start) are
    /// dropped and axis values are reduced to their sign.
    #[must_use]
    pub fn encode(state: &DecodedInputState) -> Self {
        let mut raw = 0u16;
        if state.power_key {
            raw |= Self::POWER_KEY;
        }
        for (button, mask) in Self::BUTTON_BITS {
            if state.buttons.contains(button) {
                raw |= mask;
            }
        }
        raw |= match state.hat_x.signum() {
            -1 => Self::HAT_X_NEG,
            1 => Self::HAT_X_POS,
            _ => 0,
        };
        raw |= match state.hat_y.signum() {
            -1 => Self::HAT_Y_NEG,
            1 => Self::HAT_Y_POS,
            _ => 0,
        };
        Self(raw)
    }
}

impl From<&DecodedInputState> for Packet {
    fn from(state: &DecodedInputState) -> Self {
        Self::encode(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_key_only() {
        let state = Packet(0x0001).decode();
        assert_eq!(
            state,
            DecodedInputState {
                power_key: true,
                ..DecodedInputState::neutral()
            }
        );
    }

    #[test]
    fn test_button_a_only() {
        let state = Packet(0x0002).decode();
        assert_eq!(
            state,
            DecodedInputState {
                buttons: Buttons::A,
                ..DecodedInputState::neutral()
            }
        );
    }

    #[test]
    fn test_button_b_in_high_byte() {
        let packet = Packet::from_le_bytes([0x00, 0x01]);
        assert_eq!(packet.decode().buttons, Buttons::B);
    }

    #[test]
    fn test_shoulder_buttons() {
        let state = Packet(Packet::BUTTON_L | Packet::BUTTON_R).decode();
        assert_eq!(state.buttons, Buttons::L | Buttons::R);
    }

    #[test]
    fn test_hat_directions() {
        assert_eq!(Packet(Packet::HAT_Y_NEG).hat_y(), -1);
        assert_eq!(Packet(Packet::HAT_Y_POS).hat_y(), 1);
        assert_eq!(Packet(Packet::HAT_X_NEG).hat_x(), -1);
        assert_eq!(Packet(Packet::HAT_X_POS).hat_x(), 1);

        let diagonal = Packet(Packet::HAT_X_POS | Packet::HAT_Y_NEG).decode();
        assert_eq!((diagonal.hat_x, diagonal.hat_y), (1, -1));
    }

    #[test]
    fn test_both_axis_bits_is_neutral_and_ambiguous() {
        let packet = Packet(Packet::HAT_X_NEG | Packet::HAT_X_POS | Packet::HAT_Y_POS);
        assert!(packet.is_ambiguous());
        assert_eq!(packet.hat_x(), 0);
        assert_eq!(packet.hat_y(), 1);
        assert!(!Packet(Packet::HAT_X_NEG | Packet::HAT_Y_POS).is_ambiguous());
    }

    #[test]
    fn test_reserved_bits_ignored() {
        assert_eq!(Packet(0xFE00).decode(), DecodedInputState::neutral());
        assert_eq!(Packet(0xFE02).decode(), Packet(0x0002).decode());
    }

    #[test]
    fn test_every_packet_selects_one_state_per_axis() {
        for raw in 0..=u16::MAX {
            let state = Packet(raw).decode();
            assert!((-1..=1).contains(&state.hat_x));
            assert!((-1..=1).contains(&state.hat_y));
        }
    }

    #[test]
    fn test_reencode_defined_fields() {
        for raw in 0..=Packet::DEFINED {
            let packet = Packet(raw);
            if packet.is_ambiguous() {
                continue;
            }
            assert_eq!(Packet::encode(&packet.decode()), packet, "packet {:#06x}", raw);
        }
    }

    #[test]
    fn test_encode_drops_usb_only_buttons() {
        let state = DecodedInputState {
            buttons: Buttons::SELECT | Buttons::START | Buttons::B,
            hat_x: -5,
            hat_y: 0,
            power_key: false,
        };
        assert_eq!(
            Packet::from(&state),
            Packet(Packet::BUTTON_B | Packet::HAT_X_NEG)
        );
    }

    #[test]
    fn test_byte_order() {
        assert_eq!(Packet(0x0102).to_le_bytes(), [0x02, 0x01]);
        assert_eq!(Packet::from_le_bytes([0x02, 0x01]), Packet(0x0102));
    }
}
