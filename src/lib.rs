// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! The `zbl-rs` library crate.
//!
//! This holds everything except the UEFI entry point: loader discovery across
//! every attached filesystem, GPT partition introspection for
//! `root=PARTUUID=` synthesis, device path handling, the chain-loader, and
//! the interactive menu. The binary in `src/main.rs` is a thin wrapper that
//! wires these together.
//!
//! Keeping the logic in a library keeps the unit tests runnable on the host:
//! the crate is only `no_std` outside of test builds.
//!
//! ## MSRV
//!
//! The minimum supported rust version is 1.88.0.

#![cfg_attr(not(any(test, doctest)), no_std)]

/// The primary result type that wraps around [`crate::error::BootError`].
pub type BootResult<T> = Result<T, crate::error::BootError>;

pub mod app;
pub mod boot;
pub mod device_path;
pub mod error;
pub mod gpt;
pub mod loader;
pub mod scan;
pub mod system;
pub mod ui;

extern crate alloc;
