//! I2C target answering the host at the controller's bus address.
//!
//! Reads return the latest [`Packet`](gbaspi_proto::Packet), LSB first. A
//! write is an [`IndicatorCommand`]: the last byte written decides the level
//! of the power-hold/LED line. Whenever the packet changes the attention line
//! is pulled low until the host has read it. [`AttentionLine`] drives it from
//! its own task so the target never abandons a bus transaction.

use defmt::{debug, info, warn};
use embassy_rp::gpio::Output;
use embassy_rp::i2c_slave::{self, Command, I2cSlave};
use embassy_rp::peripherals::I2C0;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use gbaspi_proto::{IndicatorCommand, BUS_ADDRESS};

/// Packet hand-off used by the firmware's tasks.
pub type SharedPacket = gbaspi_core::SharedPacket<CriticalSectionRawMutex>;

/// Target configuration for the controller's bus address.
pub fn target_config() -> i2c_slave::Config {
    let mut config = i2c_slave::Config::default();
    config.addr = u16::from(BUS_ADDRESS);
    config
}

/// Active-low line asking the host to read the packet.
pub struct AttentionLine<'d> {
    pin: Output<'d>,
}

impl<'d> AttentionLine<'d> {
    /// `pin` should start high.
    pub fn new(pin: Output<'d>) -> Self {
        Self { pin }
    }

    /// Track the pending state of `packet` forever.
    pub async fn run(&mut self, packet: &SharedPacket) -> ! {
        loop {
            if packet.is_pending() {
                self.pin.set_low();
            } else {
                self.pin.set_high();
            }
            packet.wait_update().await;
        }
    }
}

pub struct I2cTarget<'d> {
    device: I2cSlave<'d, I2C0>,
    power_hold: Output<'d>,
}

impl<'d> I2cTarget<'d> {
    pub fn new(device: I2cSlave<'d, I2C0>, power_hold: Output<'d>) -> Self {
        Self { device, power_hold }
    }

    /// Drive the power-hold/LED line. Switching it off lets the board drop
    /// the host's power rail.
    pub fn apply(&mut self, command: IndicatorCommand) {
        if command.is_on() {
            self.power_hold.set_high();
        } else {
            self.power_hold.set_low();
        }
    }

    /// Serve the host forever.
    pub async fn serve(&mut self, packet: &SharedPacket) -> ! {
        let mut buf = [0u8; 8];
        loop {
            match self.device.listen(&mut buf).await {
                Ok(Command::Read) => self.respond(packet).await,
                Ok(Command::WriteRead(len)) => {
                    self.handle_write(&buf[..len]);
                    self.respond(packet).await;
                }
                Ok(Command::Write(len)) => self.handle_write(&buf[..len]),
                Ok(Command::GeneralCall(len)) => {
                    debug!("ignoring general call ({} bytes)", len);
                }
                Err(e) => warn!("i2c target error: {:?}", e),
            }
        }
    }

    async fn respond(&mut self, packet: &SharedPacket) {
        let (current, generation) = packet.snapshot();
        match self
            .device
            .respond_and_fill(&current.to_le_bytes(), 0x00)
            .await
        {
            Ok(_) => packet.mark_served(generation),
            Err(e) => warn!("packet read failed: {:?}", e),
        }
    }

    fn handle_write(&mut self, bytes: &[u8]) {
        let Some(&byte) = bytes.last() else {
            return;
        };
        let command = IndicatorCommand::from_byte(byte);
        info!("indicator {:?}", command);
        self.apply(command);
    }
}
