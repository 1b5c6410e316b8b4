// SPDX-FileCopyrightText: 2025 some100 <ootinnyoo@outlook.com>
// SPDX-License-Identifier: MIT

//! Loads drivers located in `\EFI\zbl\drivers` on the boot volume.
//!
//! Drivers run before volume scanning so that filesystems the firmware cannot read natively
//! still show up in discovery. Loaded images are checked to actually be drivers and not random
//! EFI executables, and every handle is reconnected afterwards so the new drivers take effect.

use alloc::{string::String, vec::Vec};

use log::error;
use thiserror::Error;
use uefi::{
    CStr16, Status, boot, cstr16,
    proto::{device_path::DevicePath, loaded_image::LoadedImage, media::file::FileInfo},
};

use crate::{
    BootResult,
    device_path::with_file_path,
    system::{
        fs::UefiFileSystem,
        helper::{get_path_cstr, image_device_handle},
    },
};

/// The directory drivers are loaded from, on the same volume as the boot menu.
const DRIVER_PATH: &CStr16 = cstr16!("\\EFI\\zbl\\drivers");

/// An `Error` that may result from loading drivers.
#[derive(Error, Debug)]
pub enum DriverError {
    /// An EFI file is not a supported driver type
    #[error("Unsupported EFI file: \"{0}\"")]
    Unsupported(String),
}

/// Loads a driver from a given [`FileInfo`], then starts the driver using `StartImage`.
///
/// A started driver that returns [`Status::ABORTED`] is treated as loaded: drivers commonly
/// register their protocols and then abort.
///
/// # Errors
///
/// May return an `Error` if the driver (image) could not be loaded, the image is not a valid
/// driver, or the image could not be started.
fn load_driver(device_path: &DevicePath, file: &FileInfo, buf: &mut Vec<u8>) -> BootResult<()> {
    let path_cstr = get_path_cstr(DRIVER_PATH, file.file_name())?;

    let path = with_file_path(device_path, &path_cstr, buf)?;

    let src = boot::LoadImageSource::FromDevicePath {
        device_path: &path,
        boot_policy: uefi::proto::BootPolicy::ExactMatch,
    };

    let handle = boot::load_image(boot::image_handle(), src)?;

    let image = boot::open_protocol_exclusive::<LoadedImage>(handle)?;

    if image.code_type() != boot::MemoryType::BOOT_SERVICES_CODE
        && image.code_type() != boot::MemoryType::RUNTIME_SERVICES_CODE
    {
        return Err(DriverError::Unsupported(file.file_name().into()).into());
    }

    match boot::start_image(handle) {
        Err(e) if e.status() != Status::ABORTED => Err(e.into()),
        _ => Ok(()),
    }
}

/// Loads every driver from the same filesystem that the boot menu was loaded from.
///
/// A missing driver directory is not an error; neither is any single driver that fails to load.
///
/// # Errors
///
/// May return an `Error` if the image handle does not support `SimpleFileSystem`, or the image
/// was not loaded from a device.
pub fn load_drivers() -> BootResult<()> {
    let device_handle = image_device_handle()?;
    let device_path = boot::open_protocol_exclusive::<DevicePath>(device_handle)?;
    let mut fs = UefiFileSystem::from_image_fs()?;

    let dir = fs.read_filtered_dir(DRIVER_PATH, ".efi");

    // it should be rare for a devicepath to be greater than 2048 bytes. this is a generous amount
    // that should cover for most cases
    let mut buf = Vec::with_capacity(2048);
    let mut driver_loaded = false;

    // dir is an alphanumerically sorted directory. a driver that depends on another driver should
    // be named so it sorts after that driver.
    for file in dir {
        buf.clear();
        if let Err(e) = load_driver(&device_path, &file, &mut buf) {
            error!("Failed to load driver {}: {e}", file.file_name());
        } else {
            driver_loaded = true;
        }
    }
    if driver_loaded {
        reconnect_drivers()?; // only reconnect drivers when a driver was loaded
    }
    Ok(())
}

/// Reconnects every handle so that drivers can take effect
///
/// # Errors
///
/// May return an `Error` if there is literally no handle on the system, of literally any kind.
fn reconnect_drivers() -> BootResult<()> {
    let handles = boot::locate_handle_buffer(boot::SearchType::AllHandles)?;
    for handle in handles.iter() {
        let _ = boot::connect_controller(*handle, None, None, true);
    }
    Ok(())
}
