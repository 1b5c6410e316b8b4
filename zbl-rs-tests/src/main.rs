// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Integration tests for zbl-rs, run interactively inside a VM.
//!
//! Each test exercises one subsystem against real firmware services, which the host unit tests
//! cannot reach. A failed assertion panics into the library's red-screen handler.

#![no_main]
#![no_std]

extern crate alloc;

use log::error;
use uefi::{
    prelude::*,
    println,
    proto::console::text::{Input, Key},
};
use zbl_rs::system::log_backend::UefiLogger;

use crate::{
    device_path::test_device_path, fs::test_filesystem, load::test_loading, roots::test_roots,
    variables::test_variables,
};

mod device_path;
mod fs;
mod load;
mod roots;
mod variables;

/// The global logging instance.
static LOGGER: UefiLogger = UefiLogger::new();

#[entry]
fn main() -> Status {
    uefi::helpers::init().expect("Failed to initialize UEFI helpers");
    let _ = log::set_logger(&LOGGER).map(|()| log::set_max_level(log::LevelFilter::Info));

    println!("Select the test you would like to do:");
    println!("1. Device path test");
    println!("2. Filesystem test");
    println!("3. Root map test");
    println!("4. Variables test");
    println!("5. Load image test");

    loop {
        if let Key::Printable(char) = read_key() {
            let result = match char::from(char) {
                '1' => test_device_path(),
                '2' => test_filesystem(),
                '3' => test_roots(),
                '4' => test_variables(),
                '5' => test_loading(),
                _ => continue,
            };
            match result {
                Ok(()) => println!("Test passed, select another or reset"),
                Err(e) => error!("Test failed: {e}"),
            }
        }
    }
}

/// Blocks until one keystroke arrives.
fn read_key() -> Key {
    let handle = boot::get_handle_for_protocol::<Input>().unwrap();
    let mut input = boot::open_protocol_exclusive::<Input>(handle).unwrap();
    let mut events = [input.wait_for_key_event().unwrap()];
    boot::wait_for_event(&mut events).unwrap();
    input.read_key().unwrap().unwrap()
}
