// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Provides [`BootError`], which encapsulates other errors

use thiserror::Error;

/// An `Error` resulting from the program.
#[derive(Error, Debug)]
pub enum BootError {
    /// An error with UEFI, or a service from the [`uefi`] crate.
    #[error("UEFI Error")]
    Uefi(#[from] uefi::Error),

    /// A `String` could not be converted into a `CString16`.
    #[error("String Conversion Error")]
    StrError(#[from] crate::system::helper::StrError),

    /// An error occurred while performing filesystem operations.
    #[error("Filesystem Error")]
    FsError(#[from] crate::system::fs::FsError),

    /// An error occurred while building a `DevicePath`.
    #[error("DevicePath Error")]
    DevicePathError(#[from] crate::device_path::DevicePathError),

    /// A disk's partition metadata could not be parsed.
    #[error("GPT Error")]
    Gpt(#[from] crate::gpt::GptError),

    /// An error occurred while loading an image.
    #[error("Load Image Error")]
    LoadError(#[from] crate::boot::loader::LoadError),

    /// An error occurred while loading a driver.
    #[error("Load Driver Error")]
    DriverError(#[from] crate::system::drivers::DriverError),

    /// An error occurred while running the menu.
    #[error("Menu Error")]
    MenuError(#[from] crate::ui::MenuError),
}
