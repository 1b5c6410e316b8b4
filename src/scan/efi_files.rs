//! Discovery of plain EFI executables: the volume root and `EFI\<vendor>` directories.

use alloc::{format, string::String, vec::Vec};
use log::warn;
use uefi::{cstr16, proto::media::file::FileAttribute};

use crate::{
    loader::{Loader, LoaderBuilder},
    scan::{Scanner, Volume},
    system::{fs::UefiFileSystem, helper::str_to_cstr},
};

/// A scanner for loose `.efi` executables.
pub struct EfiFileScanner;

impl Scanner for EfiFileScanner {
    fn scan(fs: &mut UefiFileSystem, volume: &Volume, loaders: &mut Vec<Loader>) {
        scan_root(fs, volume, loaders);
        scan_vendor_dirs(fs, volume, loaders);
    }
}

/// Emits a [`Loader`] for each `.efi`/`.EFI` file in the volume root.
fn scan_root(fs: &mut UefiFileSystem, volume: &Volume, loaders: &mut Vec<Loader>) {
    let entries = match fs.read_dir_entries(cstr16!("\\")) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Could not list volume root: {e}");
            return;
        }
    };

    for info in entries {
        let name = String::from(info.file_name());
        if !info.attribute().contains(FileAttribute::DIRECTORY) && is_loader_name(&name) {
            loaders.push(make_loader(volume, &name));
        }
    }
}

/// Emits a [`Loader`] for each `.efi`/`.EFI` file one level below `EFI\`.
fn scan_vendor_dirs(fs: &mut UefiFileSystem, volume: &Volume, loaders: &mut Vec<Loader>) {
    let Ok(subdirs) = fs.read_dir_entries(cstr16!("EFI")) else {
        return; // no EFI directory on this volume
    };

    for dir in subdirs
        .iter()
        .filter(|x| x.attribute().contains(FileAttribute::DIRECTORY))
    {
        let dir_name = String::from(dir.file_name());
        let Ok(dir_path) = str_to_cstr(&format!("EFI\\{dir_name}")) else {
            continue;
        };
        let Ok(entries) = fs.read_dir_entries(&dir_path) else {
            continue;
        };

        for info in entries {
            let name = String::from(info.file_name());
            if !info.attribute().contains(FileAttribute::DIRECTORY) && is_loader_name(&name) {
                loaders.push(make_loader(volume, &format!("EFI\\{dir_name}\\{name}")));
            }
        }
    }
}

/// Checks whether a file name looks like a bootable image.
///
/// Names starting with `._` are AppleDouble sidecars left behind by macOS, not executables.
fn is_loader_name(name: &str) -> bool {
    !name.starts_with("._") && (name.ends_with(".efi") || name.ends_with(".EFI"))
}

/// Builds the entry for one discovered path.
fn make_loader(volume: &Volume, path: &str) -> Loader {
    LoaderBuilder::new(format!("{}: {path}", volume.label))
        .efi_path(path)
        .fs_handle(volume.fs_handle)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loader_names() {
        assert!(is_loader_name("grubx64.efi"));
        assert!(is_loader_name("SHELL.EFI"));
        assert!(!is_loader_name("._shell.efi"));
        assert!(!is_loader_name("vmlinuz-6.1"));
        assert!(!is_loader_name("readme.txt"));
    }
}
