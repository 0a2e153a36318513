//! Byte transport to the controller and its error type.

use core::future::Future;
use embedded_hal_async::i2c::{Error as _, ErrorKind, I2c};
use gbaspi_proto::{IndicatorCommand, BUS_ADDRESS};

/// Error type for bus operations.
///
/// Every variant is transient: callers retry on the next cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Controller did not acknowledge its address or a data byte.
    Nack,
    /// Bus fault or lost arbitration.
    Bus,
    /// Receive overrun.
    Overrun,
    /// Transport is in use elsewhere (e.g. the decoder mid-transaction).
    Busy,
    /// Any other I/O failure.
    Io,
}

impl TransportError {
    /// Classify an `embedded-hal` I2C error.
    #[must_use]
    pub fn from_i2c<E: embedded_hal_async::i2c::Error>(err: &E) -> Self {
        match err.kind() {
            ErrorKind::NoAcknowledge(_) => Self::Nack,
            ErrorKind::Bus | ErrorKind::ArbitrationLoss => Self::Bus,
            ErrorKind::Overrun => Self::Overrun,
            _ => Self::Io,
        }
    }
}

/// Async byte channel to the controller.
///
/// Addressing is the implementation's concern: callers only ever exchange
/// whole messages.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait Transport {
    /// Send `bytes` as one transaction.
    fn send(&mut self, bytes: &[u8]) -> impl Future<Output = Result<(), TransportError>>;

    /// Fill `buf` completely from one transaction.
    fn receive(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<(), TransportError>>;
}

impl<T: Transport> Transport for &mut T {
    fn send(&mut self, bytes: &[u8]) -> impl Future<Output = Result<(), TransportError>> {
        (**self).send(bytes)
    }

    fn receive(&mut self, buf: &mut [u8]) -> impl Future<Output = Result<(), TransportError>> {
        (**self).receive(buf)
    }
}

/// Send one indicator command.
pub async fn send_indicator<T: Transport>(
    transport: &mut T,
    command: IndicatorCommand,
) -> Result<(), TransportError> {
    transport.send(&command.to_bytes()).await
}

/// [`Transport`] over an `embedded-hal-async` I2C bus.
///
/// To share one bus between the decoder and the power-off handler, wrap it in
/// `embassy_embedded_hal::shared_bus::asynch::i2c::I2cDevice` and give each
/// user its own `I2cTransport`.
pub struct I2cTransport<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> I2cTransport<I2C> {
    /// Transport talking to the controller at [`BUS_ADDRESS`].
    #[must_use]
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, BUS_ADDRESS)
    }

    /// Transport talking to a controller strapped to another address.
    #[must_use]
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    #[inline]
    #[must_use]
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Give back the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> Transport for I2cTransport<I2C> {
    async fn send(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        self.i2c
            .write(self.address, bytes)
            .await
            .map_err(|e| TransportError::from_i2c(&e))
    }

    async fn receive(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        self.i2c
            .read(self.address, buf)
            .await
            .map_err(|e| TransportError::from_i2c(&e))
    }
}
