#![allow(clippy::cast_possible_truncation)]
//! The chain-loader for EFI executables.
//!
//! Given a [`Loader`], this joins the volume's device path with the file path, asks the firmware
//! to load the image, points its load options at the recorded command line, and starts it.

use alloc::{boxed::Box, string::String, vec::Vec};
use thiserror::Error;
use uefi::{
    CStr16, CString16, Handle, Status,
    boot::{self, image_handle},
    proto::{device_path::DevicePath, loaded_image::LoadedImage},
};

use crate::{BootResult, device_path::with_file_path, loader::Loader, system::helper::str_to_cstr};

/// An `Error` that may result from loading an image.
#[derive(Error, Debug)]
pub enum LoadError {
    /// A [`Loader`] did not have a filesystem [`Handle`] when required.
    #[error("Entry \"{0}\" attempted to boot without a filesystem handle")]
    MissingHandle(String),

    /// A [`Loader`] did not have an image path when required.
    #[error("Entry \"{0}\" attempted to boot without an EFI executable")]
    MissingEfi(String),
}

/// Loads the image a [`Loader`] names, returning a handle to it.
///
/// The image's load options point at the recorded options as UTF-16, nul terminator included.
/// Entries without options get their load options cleared.
///
/// # Errors
///
/// May return an `Error` if the entry names no filesystem or image, the path could not be
/// converted, or the firmware failed to load the image.
pub fn load_boot_option(loader: &Loader) -> BootResult<Handle> {
    let handle = loader
        .fs_handle
        .ok_or_else(|| LoadError::MissingHandle(loader.title.clone()))?;
    let efi_path = loader
        .efi_path
        .as_deref()
        .ok_or_else(|| LoadError::MissingEfi(loader.title.clone()))?;

    let path = str_to_cstr(efi_path)?;
    let image = load_image_from_path(handle, &path)?;

    set_load_options(image, loader.options.as_deref())?;
    Ok(image)
}

/// Starts a loaded image.
///
/// [`Status::ABORTED`] is treated as a benign completion: drivers and some applications abort
/// after registering themselves.
///
/// # Errors
///
/// May return an `Error` if the image failed to start for any other reason.
pub fn start_boot_option(image: Handle) -> BootResult<()> {
    match boot::start_image(image) {
        Err(e) if e.status() != Status::ABORTED => Err(e.into()),
        _ => Ok(()),
    }
}

/// Loads an image from a file path on the volume behind `handle`.
fn load_image_from_path(handle: Handle, path: &CStr16) -> BootResult<Handle> {
    let dev_path = boot::open_protocol_exclusive::<DevicePath>(handle)?;
    let mut buf = Vec::new();
    let path = with_file_path(&dev_path, path, &mut buf)?;

    let src = boot::LoadImageSource::FromDevicePath {
        device_path: &path,
        boot_policy: uefi::proto::BootPolicy::ExactMatch,
    };
    Ok(boot::load_image(image_handle(), src)?)
}

/// Points the image's load options at the recorded command line, or clears them.
fn set_load_options(image: Handle, options: Option<&str>) -> BootResult<()> {
    let mut loaded_image = boot::open_protocol_exclusive::<LoadedImage>(image)?;

    match options {
        Some(options) => {
            let load_options = Box::new(str_to_cstr(options)?);
            let load_options_size = load_options.num_bytes() as u32;

            // the load options must outlive this function, up until the image is started. the
            // easiest way to do that is to leak the Box so it becomes static.
            let load_options_ptr: &'static CString16 = Box::leak(load_options);

            // SAFETY: the options were just leaked, so the pointer stays valid for as long as
            // the loaded image can read it.
            unsafe {
                loaded_image
                    .set_load_options(load_options_ptr.as_ptr().cast(), load_options_size);
            }
        }
        None => {
            // SAFETY: a null pointer with a zero size is the documented "no options" state.
            unsafe {
                loaded_image.set_load_options(core::ptr::null(), 0);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BootError;

    #[test]
    fn test_missing_handle() {
        let loader = Loader {
            fs_handle: None,
            ..Loader::default()
        };
        assert!(matches!(
            load_boot_option(&loader),
            Err(BootError::LoadError(LoadError::MissingHandle(_)))
        ));
    }
}
