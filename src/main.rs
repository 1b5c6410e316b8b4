// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! The `zbl-rs` application.
//!
//! This wires the library together: initialize the UEFI helpers and the logger, run discovery,
//! then hand control to the menu loop. Because UEFI applications may only return a `Status`,
//! unrecoverable errors panic into the red-screen handler.

#![cfg_attr(target_os = "uefi", no_main)]
#![cfg_attr(target_os = "uefi", no_std)]

#[cfg(target_os = "uefi")]
mod uefi_main {
    use uefi::prelude::*;
    use zbl_rs::{app::App, system::log_backend::UefiLogger};

    /// The global logging instance.
    static LOGGER: UefiLogger = UefiLogger::new();

    /// The main function of the program.
    ///
    /// # Panics
    ///
    /// Will panic if discovery or the menu fail in a way the menu loop cannot absorb.
    #[entry]
    fn main() -> Status {
        uefi::helpers::init().expect("Failed to initialize UEFI helpers");
        let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(log::LevelFilter::Warn));

        let mut app =
            App::new().unwrap_or_else(|e| panic!("Error occurred while initializing: {e}"));

        match app.run() {
            Ok(()) => Status::SUCCESS,
            Err(e) => panic!("Error occurred while running: {e}"),
        }
    }
}

/// Placates the host toolchain; the real entry point is firmware-only.
#[cfg(not(target_os = "uefi"))]
fn main() {}
