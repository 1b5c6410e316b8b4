//! Volume scanning: finds every candidate loader on every filesystem.
//!
//! Each handle exposing a filesystem is labeled (volume label, root-map name, or partition GUID
//! as a fallback) and handed to every [`Scanner`] in turn. A volume that cannot be labeled or
//! opened is skipped; discovery continues on the rest.

use alloc::{format, string::String, vec::Vec};
use log::{debug, warn};
use uefi::{
    Guid, Handle,
    boot::{self, SearchType},
    proto::{device_path::DevicePath, media::fs::SimpleFileSystem},
};

use crate::{
    BootResult,
    device_path::{guid_text, partition_guid, to_text},
    gpt::RootMap,
    loader::Loader,
    system::fs::UefiFileSystem,
};

pub mod efi_files;
pub mod linux;
pub mod osx;
pub mod windows;

/// One scannable filesystem with its display label.
pub struct Volume {
    /// The handle the filesystem was opened from.
    pub fs_handle: Handle,

    /// The composed display label, prefixed onto every entry found here.
    pub label: String,
}

/// Discovers loaders on one volume.
pub trait Scanner {
    /// Pushes a [`Loader`] for every candidate found on the volume.
    ///
    /// Implementations are per-file tolerant: anything unreadable is skipped, never fatal.
    fn scan(fs: &mut UefiFileSystem, volume: &Volume, loaders: &mut Vec<Loader>);
}

/// Scans every filesystem in the system for boot candidates.
///
/// # Errors
///
/// May return an `Error` if there are no handles in the system that support
/// [`SimpleFileSystem`]. Per-volume failures are logged and skipped.
pub fn scan_loaders(roots: &RootMap) -> BootResult<Vec<Loader>> {
    let mut loaders = Vec::with_capacity(4); // a system is likely to have up to 4 boot entries
    let handles =
        boot::locate_handle_buffer(SearchType::from_proto::<SimpleFileSystem>())?.to_vec();

    for handle in handles {
        if let Err(e) = scan_volume(handle, roots, &mut loaders) {
            warn!("Skipping volume: {e}");
        }
    }

    Ok(loaders)
}

/// Labels one volume and runs every scanner over it.
fn scan_volume(handle: Handle, roots: &RootMap, loaders: &mut Vec<Loader>) -> BootResult<()> {
    let guid = {
        let device_path = boot::open_protocol_exclusive::<DevicePath>(handle)?;
        debug!("Scanning {}", to_text(&device_path));
        partition_guid(&device_path)
    };
    let Some(guid) = guid else {
        debug!("Volume has no GPT partition signature, skipping");
        return Ok(());
    };

    let mut fs = UefiFileSystem::from_handle(handle)?;

    let label = fs
        .volume_label()
        .map(|label| String::from(&label))
        .unwrap_or_default();
    let volume = Volume {
        fs_handle: handle,
        label: compose_label(&label, &guid, roots),
    };

    efi_files::EfiFileScanner::scan(&mut fs, &volume, loaders);
    linux::LinuxScanner::scan(&mut fs, &volume, loaders);
    windows::WindowsScanner::scan(&mut fs, &volume, loaders);
    osx::OsxScanner::scan(&mut fs, &volume, loaders);

    Ok(())
}

/// Composes the display label for one volume.
///
/// The volume label is used as-is; an empty label falls back to the partition GUID rendered as
/// text. When the partition appears in the root map, the mapped name is appended after a dash.
fn compose_label(volume_label: &str, guid: &Guid, roots: &RootMap) -> String {
    let base = if volume_label.is_empty() {
        guid_text(guid)
    } else {
        String::from(volume_label)
    };

    match roots.get(guid) {
        Some(name) => format!("{base} - {name}"),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uefi::guid;

    const PART: Guid = guid!("11111111-1111-1111-1111-111111111111");

    #[test]
    fn test_label_prefers_volume_label() {
        let roots = RootMap::new();
        assert_eq!(compose_label("ESP", &PART, &roots), "ESP");
    }

    #[test]
    fn test_empty_label_falls_back_to_guid() {
        let roots = RootMap::new();
        assert_eq!(
            compose_label("", &PART, &roots),
            "11111111-1111-1111-1111-111111111111"
        );
    }

    #[test]
    fn test_label_appends_root_name() {
        let mut roots = RootMap::new();
        roots.insert(PART, String::from("root"));
        assert_eq!(compose_label("fedora", &PART, &roots), "fedora - root");
    }
}
