//! Provides [`BootMenu`], which runs the discovery pipeline and owns the resulting entries.

use alloc::vec::Vec;
use log::warn;
use uefi::Handle;

use crate::{
    BootResult,
    boot::{action::add_special_entries, loader::load_boot_option},
    gpt::{RootMap, find_roots},
    loader::Loader,
    scan::scan_loaders,
    system::drivers::load_drivers,
};

pub mod action;
pub mod loader;

/// The discovered boot entries and the partition root map.
pub struct BootMenu {
    /// The boot entries, discovered entries first, fixed entries at the tail.
    loaders: Vec<Loader>,

    /// Map from partition-unique GUID to partition name, for `root=PARTUUID=` synthesis.
    pub roots: RootMap,
}

impl BootMenu {
    /// Runs the discovery pipeline and creates a new [`BootMenu`].
    ///
    /// Drivers are loaded first so that driver-provided filesystems are visible to the scan,
    /// then the root map is built from raw disks, then every filesystem is scanned, and the
    /// fixed entries are appended at the tail.
    ///
    /// # Errors
    ///
    /// May return an `Error` if no handle in the system supports `SimpleFileSystem`. Driver
    /// loading failures and per-volume scan failures are logged and skipped.
    pub fn new() -> BootResult<Self> {
        if let Err(e) = load_drivers() {
            warn!("Failed to load drivers: {e}");
        }

        let roots = find_roots();
        let mut loaders = scan_loaders(&roots)?;
        add_special_entries(&mut loaders);

        Ok(Self { loaders, roots })
    }

    /// Loads a boot entry given its index, returning a handle to the loaded image.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the entry does not name an image, or the image could not be
    /// loaded.
    pub fn load(&self, selected: usize) -> BootResult<Handle> {
        load_boot_option(&self.loaders[selected])
    }

    /// Returns a reference to the inner [`Vec<Loader>`].
    #[must_use = "Has no effect if the result is unused"]
    pub fn list(&self) -> &Vec<Loader> {
        &self.loaders
    }
}
