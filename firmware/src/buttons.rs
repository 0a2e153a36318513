//! GPIO button sampling.

use embedded_hal::digital::InputPin;
use gbaspi_core::ControllerEncoder;
use gbaspi_proto::{Buttons, HatDirection};

/// The controller's physical inputs. Every pin is active low.
pub struct ButtonPins<P> {
    pub a: P,
    pub b: P,
    pub select: P,
    pub start: P,
    pub l: P,
    pub r: P,
    pub up: P,
    pub down: P,
    pub left: P,
    pub right: P,
    pub power: P,
}

impl<P: InputPin> ButtonPins<P> {
    /// Record the current level of every input in `encoder`.
    ///
    /// Returns `true` if the recorded state changed.
    pub fn sample(&mut self, encoder: &mut ControllerEncoder) -> bool {
        let before = *encoder;

        for (button, pin) in [
            (Buttons::A, &mut self.a),
            (Buttons::B, &mut self.b),
            (Buttons::SELECT, &mut self.select),
            (Buttons::START, &mut self.start),
            (Buttons::L, &mut self.l),
            (Buttons::R, &mut self.r),
        ] {
            encoder.set_button(button, is_pressed(pin));
        }

        encoder.set_hat(HatDirection::from_dpad(
            is_pressed(&mut self.up),
            is_pressed(&mut self.down),
            is_pressed(&mut self.left),
            is_pressed(&mut self.right),
        ));

        // The power key drives both the bus bit and the USB power-down report
        let power = is_pressed(&mut self.power);
        encoder.set_power_key(power);
        encoder.set_power_down_ack(power);

        *encoder != before
    }
}

fn is_pressed<P: InputPin>(pin: &mut P) -> bool {
    pin.is_low().unwrap_or(false)
}
