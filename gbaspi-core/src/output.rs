//! Report sink trait and error types.

use core::future::Future;
use gbaspi_proto::ReportKind;

/// Error type for report output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportError {
    /// USB/communication I/O error.
    Io,
    /// Device not ready (e.g., USB not enumerated).
    NotReady,
    /// Endpoint busy.
    Busy,
}

/// Async sink for HID reports leaving the controller.
///
/// Both report streams go through the same sink; `kind` tells the
/// implementation which stream a report belongs to. The report bytes already
/// start with the report ID.
pub trait ReportSink {
    /// Send one report.
    fn send_report(
        &mut self,
        kind: ReportKind,
        report: &[u8],
    ) -> impl Future<Output = Result<(), ReportError>>;

    /// Check if the sink is ready to accept reports.
    fn is_ready(&self) -> bool;
}
