//! USB HID report output.

use defmt::trace;
use embassy_usb::class::hid::{HidWriter, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::Builder;
use gbaspi_core::{ReportError, ReportSink};
use gbaspi_proto::report::{MAX_REPORT_SIZE, REPORT_DESCRIPTOR};
use gbaspi_proto::ReportKind;

type UsbDriver<'d> = embassy_rp::usb::Driver<'d, embassy_rp::peripherals::USB>;

/// USB HID output for both report streams.
///
/// Wraps an embassy-usb HID writer. Reports already carry their report ID,
/// so they are written as-is.
pub struct UsbHidOutput<'d> {
    writer: HidWriter<'d, UsbDriver<'d>, MAX_REPORT_SIZE>,
    ready: bool,
}

impl<'d> UsbHidOutput<'d> {
    /// Create a new USB HID output from the given HID writer.
    pub fn new(writer: HidWriter<'d, UsbDriver<'d>, MAX_REPORT_SIZE>) -> Self {
        Self {
            writer,
            ready: false,
        }
    }

    /// Wait until the device is ready (USB enumerated).
    pub async fn wait_ready(&mut self) {
        self.writer.ready().await;
        self.ready = true;
    }
}

impl ReportSink for UsbHidOutput<'_> {
    async fn send_report(&mut self, kind: ReportKind, report: &[u8]) -> Result<(), ReportError> {
        if !self.ready {
            return Err(ReportError::NotReady);
        }
        trace!("{:?} report: {=[u8]:x}", kind, report);
        let result = self.writer.write(report).await;
        result.map_err(|e| match e {
            EndpointError::Disabled => {
                self.ready = false;
                ReportError::NotReady
            }
            _ => ReportError::Io,
        })
    }

    fn is_ready(&self) -> bool {
        self.ready
    }
}

/// Configure the USB HID class in the USB builder.
///
/// Returns the HID writer for use by the application.
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, UsbDriver<'d>>,
    state: &'d mut State<'d>,
) -> HidWriter<'d, UsbDriver<'d>, MAX_REPORT_SIZE> {
    let config = embassy_usb::class::hid::Config {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: None,
        poll_ms: 10,
        max_packet_size: 8,
        hid_subclass: embassy_usb::class::hid::HidSubclass::No,
        hid_boot_protocol: embassy_usb::class::hid::HidBootProtocol::None,
    };

    HidWriter::new(builder, state, config)
}
