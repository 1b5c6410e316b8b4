//! Simple UEFI backend for the [`log`] crate.
//!
//! Records go straight to the firmware text console. Scan-time warnings therefore land above
//! the menu, which repaints over them on the next draw.

use core::fmt::Write;

use log::{Level, Metadata, Record};
use uefi::{runtime, system::with_stdout};

/// A simple logging backend for UEFI.
#[derive(Default)]
pub struct UefiLogger;

impl UefiLogger {
    /// Constructs a new [`UefiLogger`].
    #[must_use = "Has no effect if the result is unused"]
    pub const fn new() -> Self {
        Self
    }
}

impl log::Log for UefiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Info
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let time = runtime::get_time().unwrap_or(runtime::Time::invalid());
            let level = record.level();
            let args = record.args();
            with_stdout(|stdout| {
                let _ = stdout.write_fmt(format_args!("[{time}] {level}: {args}\r\n"));
            });
        }
    }

    fn flush(&self) {}
}
