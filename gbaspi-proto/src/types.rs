//! Core controller types: Buttons, HatDirection, DecodedInputState.

use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

/// Button state represented as a bitfield.
///
/// The bit positions match byte 0 of the HID gamepad report, so the raw value
/// can be copied straight into a [`GamepadReport`](crate::GamepadReport).
/// Only A, B, L and R travel over the I2C packet; Select and Start are
/// USB-only.
///
/// # Example
///
/// ```
/// use gbaspi_proto::Buttons;
///
/// let buttons = Buttons::A | Buttons::L;
/// assert!(buttons.contains(Buttons::A));
/// assert!(!buttons.contains(Buttons::B));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Buttons(pub u8);

impl Buttons {
    pub const A: Self = Self(1 << 0);
    pub const B: Self = Self(1 << 1);
    pub const SELECT: Self = Self(1 << 2);
    pub const START: Self = Self(1 << 3);
    pub const L: Self = Self(1 << 4); // Left shoulder
    pub const R: Self = Self(1 << 5); // Right shoulder

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Every button the controller has.
    pub const ALL: Self = Self(0x3F);

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, button: Buttons) -> bool {
        (self.0 & button.0) == button.0
    }

    /// Check if the given button is pressed (alias for contains).
    #[inline]
    #[must_use]
    pub const fn is_pressed(self, button: Buttons) -> bool {
        self.contains(button)
    }

    /// Set or clear button(s).
    #[inline]
    pub fn set(&mut self, button: Buttons, pressed: bool) {
        if pressed {
            self.0 |= button.0;
        } else {
            self.0 &= !button.0;
        }
    }

    /// Get the raw u8 value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }

    /// Check if no buttons are pressed.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Buttons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Buttons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Buttons {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Buttons {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for Buttons {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0 & Self::ALL.0)
    }
}

/// Eight-way hat switch position.
///
/// Discriminants are the HID hat values (0 = north, clockwise in 45° steps);
/// `Centered` is the HID null value `0x0F`.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum HatDirection {
    Up = 0x00,
    UpRight = 0x01,
    Right = 0x02,
    DownRight = 0x03,
    Down = 0x04,
    DownLeft = 0x05,
    Left = 0x06,
    UpLeft = 0x07,
    #[default]
    Centered = 0x0F,
}

impl HatDirection {
    /// Build a direction from four d-pad switches.
    ///
    /// Opposing switches pressed together cancel out on that axis.
    #[must_use]
    pub const fn from_dpad(up: bool, down: bool, left: bool, right: bool) -> Self {
        let x = right as i8 - left as i8;
        let y = down as i8 - up as i8;
        Self::from_axes(x, y)
    }

    /// Build a direction from signed axis values.
    ///
    /// Only the sign of each axis matters. Negative Y is up, negative X is
    /// left, matching the input layer's `ABS_HAT0X`/`ABS_HAT0Y` convention.
    #[must_use]
    pub const fn from_axes(x: i8, y: i8) -> Self {
        match (x.signum(), y.signum()) {
            (0, -1) => Self::Up,
            (1, -1) => Self::UpRight,
            (1, 0) => Self::Right,
            (1, 1) => Self::DownRight,
            (0, 1) => Self::Down,
            (-1, 1) => Self::DownLeft,
            (-1, 0) => Self::Left,
            (-1, -1) => Self::UpLeft,
            _ => Self::Centered,
        }
    }

    /// Split the direction into `(x, y)` axis values in {-1, 0, 1}.
    #[must_use]
    pub const fn axes(self) -> (i8, i8) {
        match self {
            Self::Up => (0, -1),
            Self::UpRight => (1, -1),
            Self::Right => (1, 0),
            Self::DownRight => (1, 1),
            Self::Down => (0, 1),
            Self::DownLeft => (-1, 1),
            Self::Left => (-1, 0),
            Self::UpLeft => (-1, -1),
            Self::Centered => (0, 0),
        }
    }

    /// Interpret a raw HID hat value. Anything outside 0..=7 is centered.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            0x00 => Self::Up,
            0x01 => Self::UpRight,
            0x02 => Self::Right,
            0x03 => Self::DownRight,
            0x04 => Self::Down,
            0x05 => Self::DownLeft,
            0x06 => Self::Left,
            0x07 => Self::UpLeft,
            _ => Self::Centered,
        }
    }

    /// Get the raw HID hat value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as u8
    }
}

/// Host-side view of one packet.
///
/// Always a complete snapshot; nothing is carried over from the previous
/// packet.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DecodedInputState {
    pub buttons: Buttons,
    /// -1 left, 0 neutral, 1 right.
    pub hat_x: i8,
    /// -1 up, 0 neutral, 1 down.
    pub hat_y: i8,
    pub power_key: bool,
}

impl DecodedInputState {
    /// No buttons, hat centered, power key released.
    #[must_use]
    pub const fn neutral() -> Self {
        Self {
            buttons: Buttons::NONE,
            hat_x: 0,
            hat_y: 0,
            power_key: false,
        }
    }

    /// Hat position as a single direction.
    #[inline]
    #[must_use]
    pub const fn hat(&self) -> HatDirection {
        HatDirection::from_axes(self.hat_x, self.hat_y)
    }
}
