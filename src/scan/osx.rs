//! An auto detector for the macOS boot loader.

use alloc::{format, vec::Vec};
use uefi::cstr16;

use crate::{
    loader::{Loader, LoaderBuilder},
    scan::{Scanner, Volume},
};

/// Where `boot.efi` lives on a macOS system volume.
const BOOTEFI_PATH: &str = "System\\Library\\CoreServices\\boot.efi";

/// A "parser" for detecting macOS boot configurations.
pub struct OsxScanner;

impl Scanner for OsxScanner {
    fn scan(
        fs: &mut crate::system::fs::UefiFileSystem,
        volume: &Volume,
        loaders: &mut Vec<Loader>,
    ) {
        if fs.exists(cstr16!("System\\Library\\CoreServices\\boot.efi")) {
            let loader = LoaderBuilder::new(format!("{}: {BOOTEFI_PATH}", volume.label))
                .efi_path(BOOTEFI_PATH)
                .fs_handle(volume.fs_handle)
                .build();

            loaders.push(loader);
        }
    }
}
