//! An auto detector for the Windows Boot Manager.

use alloc::{format, vec::Vec};
use uefi::cstr16;

use crate::{
    loader::{Loader, LoaderBuilder},
    scan::{Scanner, Volume},
};

/// Where the Windows Boot Manager lives on its ESP.
const BOOTMGFW_PATH: &str = "EFI\\Microsoft\\Boot\\bootmgfw.efi";

/// A "parser" for detecting Windows boot configurations.
pub struct WindowsScanner;

impl Scanner for WindowsScanner {
    fn scan(
        fs: &mut crate::system::fs::UefiFileSystem,
        volume: &Volume,
        loaders: &mut Vec<Loader>,
    ) {
        if fs.exists(cstr16!("EFI\\Microsoft\\Boot\\bootmgfw.efi")) {
            let loader = LoaderBuilder::new(format!("{}: {BOOTMGFW_PATH}", volume.label))
                .efi_path(BOOTMGFW_PATH)
                .fs_handle(volume.fs_handle)
                .build();

            loaders.push(loader);
        }
    }
}
