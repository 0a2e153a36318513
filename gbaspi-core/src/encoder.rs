//! Controller-side state recorder and report encoder.

use crate::output::{ReportError, ReportSink};
use gbaspi_proto::{
    Buttons, DecodedInputState, GamepadReport, HatDirection, Packet, PowerReport, ReportKind,
};

/// Records the controller's physical state and encodes it for the host.
///
/// Setters only record; nothing is transmitted until one of the `send_*`
/// methods runs. The same recorded state backs both the USB HID reports and
/// the I2C [`Packet`] served to the host.
///
/// # Example
///
/// ```
/// use gbaspi_core::ControllerEncoder;
/// use gbaspi_proto::{Buttons, HatDirection, Packet};
///
/// let mut encoder = ControllerEncoder::new();
/// encoder.set_button(Buttons::A, true);
/// encoder.set_hat(HatDirection::Up);
/// assert_eq!(encoder.packet(), Packet(Packet::BUTTON_A | Packet::HAT_Y_NEG));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ControllerEncoder {
    buttons: Buttons,
    hat: HatDirection,
    power_key: bool,
    power_down: bool,
}

impl ControllerEncoder {
    /// Nothing pressed, hat centered, no power-down request.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buttons: Buttons::NONE,
            hat: HatDirection::Centered,
            power_key: false,
            power_down: false,
        }
    }

    /// Record one button.
    #[inline]
    pub fn set_button(&mut self, button: Buttons, pressed: bool) {
        self.buttons.set(button, pressed);
    }

    /// Record the hat position.
    #[inline]
    pub fn set_hat(&mut self, direction: HatDirection) {
        self.hat = direction;
    }

    /// Record the power key level (bit 0 of the bus packet).
    #[inline]
    pub fn set_power_key(&mut self, pressed: bool) {
        self.power_key = pressed;
    }

    /// Record whether a power-down request is being honored.
    #[inline]
    pub fn set_power_down_ack(&mut self, flag: bool) {
        self.power_down = flag;
    }

    #[inline]
    #[must_use]
    pub fn buttons(&self) -> Buttons {
        self.buttons
    }

    #[inline]
    #[must_use]
    pub fn hat(&self) -> HatDirection {
        self.hat
    }

    #[inline]
    #[must_use]
    pub fn power_down_ack(&self) -> bool {
        self.power_down
    }

    /// Recorded state as the host will decode it.
    #[must_use]
    pub fn snapshot(&self) -> DecodedInputState {
        let (hat_x, hat_y) = self.hat.axes();
        DecodedInputState {
            buttons: self.buttons,
            hat_x,
            hat_y,
            power_key: self.power_key,
        }
    }

    /// Bus packet for the recorded state.
    #[must_use]
    pub fn packet(&self) -> Packet {
        Packet::encode(&self.snapshot())
    }

    #[must_use]
    pub fn gamepad_report(&self) -> GamepadReport {
        GamepadReport {
            buttons: self.buttons,
            hat: self.hat,
        }
    }

    #[must_use]
    pub fn power_report(&self) -> PowerReport {
        PowerReport {
            power_down: self.power_down,
        }
    }

    /// Transmit the gamepad report.
    pub async fn send_gamepad<S: ReportSink>(&self, sink: &mut S) -> Result<(), ReportError> {
        sink.send_report(ReportKind::Gamepad, &self.gamepad_report().as_bytes())
            .await
    }

    /// Transmit the power-down report.
    pub async fn send_power<S: ReportSink>(&self, sink: &mut S) -> Result<(), ReportError> {
        sink.send_report(ReportKind::Power, &self.power_report().as_bytes())
            .await
    }

    /// Transmit both reports. The power report is still attempted if the
    /// gamepad report fails; the first error is returned.
    pub async fn send_state<S: ReportSink>(&self, sink: &mut S) -> Result<(), ReportError> {
        let gamepad = self.send_gamepad(sink).await;
        let power = self.send_power(sink).await;
        if let Err(e) = gamepad {
            warn!("gamepad report failed: {:?}", e);
        }
        if let Err(e) = power {
            warn!("power report failed: {:?}", e);
        }
        gamepad.and(power)
    }

    /// Announce the initial state once the sink is up.
    pub async fn begin<S: ReportSink>(&self, sink: &mut S) -> Result<(), ReportError> {
        debug!("sending initial controller state");
        self.send_state(sink).await
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::testing::block_on;
    use core::future::Future;
    use std::vec::Vec;

    struct MockSink {
        sent: Vec<(ReportKind, Vec<u8>)>,
        fail: Option<ReportKind>,
    }

    impl MockSink {
        fn new() -> Self {
            Self {
                sent: Vec::new(),
                fail: None,
            }
        }
    }

    impl ReportSink for MockSink {
        fn send_report(
            &mut self,
            kind: ReportKind,
            report: &[u8],
        ) -> impl Future<Output = Result<(), ReportError>> {
            let result = if self.fail == Some(kind) {
                Err(ReportError::Io)
            } else {
                self.sent.push((kind, report.to_vec()));
                Ok(())
            };
            core::future::ready(result)
        }

        fn is_ready(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_setters_are_sent_once_as_recorded() {
        let mut encoder = ControllerEncoder::new();
        let mut sink = MockSink::new();
        encoder.set_button(Buttons::B, true);
        encoder.set_hat(HatDirection::Right);
        encoder.set_hat(HatDirection::Down);
        encoder.set_power_down_ack(true);

        block_on(encoder.send_gamepad(&mut sink)).unwrap();

        // One report for all the setter calls, carrying the last recorded state
        assert_eq!(
            sink.sent,
            std::vec![(ReportKind::Gamepad, std::vec![0x55, 0b0000_0010, 0x04])]
        );
    }

    #[test]
    fn test_send_state_emits_both_streams() {
        let mut encoder = ControllerEncoder::new();
        encoder.set_button(Buttons::A, true);
        encoder.set_button(Buttons::START, true);
        encoder.set_hat(HatDirection::UpLeft);
        encoder.set_power_down_ack(true);

        let mut sink = MockSink::new();
        block_on(encoder.send_state(&mut sink)).unwrap();

        assert_eq!(
            sink.sent,
            std::vec![
                (ReportKind::Gamepad, std::vec![0x55, 0b0000_1001, 0x07]),
                (ReportKind::Power, std::vec![0xAA, 0x01]),
            ]
        );
    }

    #[test]
    fn test_send_state_continues_after_failure() {
        let encoder = ControllerEncoder::new();
        let mut sink = MockSink::new();
        sink.fail = Some(ReportKind::Gamepad);

        let result = block_on(encoder.send_state(&mut sink));
        assert_eq!(result, Err(ReportError::Io));
        assert_eq!(sink.sent.len(), 1);
        assert_eq!(sink.sent[0].0, ReportKind::Power);
    }

    #[test]
    fn test_packet_matches_recorded_state() {
        let mut encoder = ControllerEncoder::new();
        encoder.set_power_key(true);
        encoder.set_button(Buttons::R, true);
        encoder.set_button(Buttons::SELECT, true);
        encoder.set_hat(HatDirection::DownRight);

        let packet = encoder.packet();
        assert_eq!(
            packet,
            Packet(Packet::POWER_KEY | Packet::BUTTON_R | Packet::HAT_X_POS | Packet::HAT_Y_POS)
        );

        // What the host decodes is the recorded state minus USB-only buttons
        let decoded = packet.decode();
        assert_eq!(decoded.buttons, Buttons::R);
        assert_eq!(decoded.hat(), HatDirection::DownRight);
        assert!(decoded.power_key);
    }

    #[test]
    fn test_release_clears_button() {
        let mut encoder = ControllerEncoder::new();
        encoder.set_button(Buttons::L, true);
        encoder.set_button(Buttons::L, false);
        assert!(encoder.buttons().is_empty());
        assert_eq!(encoder.gamepad_report(), GamepadReport::neutral());
    }
}
