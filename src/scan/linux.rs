//! Discovery of Linux kernels with their initrds and optional argument sidecars.
//!
//! A kernel is any file whose name starts with a kernel prefix (`vmlinuz-`, `vmlinuz`) and does
//! not end in `.conf`. A kernel only becomes an entry when a matching initrd sits next to it.
//! A `<kernel>.conf` sidecar supplies the command line; without one, the entry opens a submenu
//! of root partitions and the command line is synthesized from the chosen partition GUID.
//!
//! The same scan runs over the volume root and, when present, the `boot` directory.

use alloc::{
    collections::BTreeSet,
    format,
    string::{String, ToString},
    vec::Vec,
};
use log::warn;
use thiserror::Error;

use crate::{
    boot::action::BootAction,
    loader::{Loader, LoaderBuilder},
    scan::{Scanner, Volume},
    system::{
        fs::{FsError, UefiFileSystem},
        helper::{StrError, str_to_cstr},
    },
};

/// Name prefixes that mark a file as a kernel. Matched in order; the dashed form must come
/// first so that `vmlinuz-6.1` derives the suffix `6.1` and not `-6.1`.
const KERNEL_PREFIXES: [&str; 2] = ["vmlinuz-", "vmlinuz"];

/// The directory the root scan is repeated in.
const BOOT_DIR: &str = "boot";

/// An `Error` that may result from reading a kernel argument sidecar.
#[derive(Error, Debug)]
pub enum ConfError {
    /// The sidecar content is not valid UTF-8.
    #[error("Sidecar is not valid UTF-8")]
    NotUtf8,

    /// The sidecar path could not be converted for the firmware.
    #[error("Invalid sidecar path")]
    Path(#[from] StrError),

    /// The sidecar could not be read.
    #[error("Could not read sidecar")]
    Fs(#[from] FsError),
}

/// A scanner for Linux kernel/initrd pairs.
pub struct LinuxScanner;

impl Scanner for LinuxScanner {
    fn scan(fs: &mut UefiFileSystem, volume: &Volume, loaders: &mut Vec<Loader>) {
        scan_kernels(fs, volume, None, loaders);
        scan_kernels(fs, volume, Some(BOOT_DIR), loaders);
    }
}

/// Scans one directory for kernels. `dir` of [`None`] means the volume root.
fn scan_kernels(
    fs: &mut UefiFileSystem,
    volume: &Volume,
    dir: Option<&str>,
    loaders: &mut Vec<Loader>,
) {
    let Ok(dir_path) = str_to_cstr(dir.unwrap_or("\\")) else {
        return;
    };

    let Ok(entries) = fs.read_dir_entries(&dir_path) else {
        return; // no boot directory on this volume, or the root is unreadable
    };

    let files: BTreeSet<String> = entries
        .iter()
        .filter(|x| {
            !x.attribute()
                .contains(uefi::proto::media::file::FileAttribute::DIRECTORY)
        })
        .map(|x| String::from(x.file_name()))
        .collect();

    for name in &files {
        let Some(suffix) = kernel_suffix(name) else {
            continue;
        };
        let Some(initrd) = initrd_candidates(suffix)
            .into_iter()
            .find(|candidate| files.contains(candidate))
        else {
            continue; // a kernel without an initrd is not bootable from here
        };

        let kernel_path = prefixed(dir, name);
        let initrd_path = prefixed(dir, &initrd);
        let conf_name = format!("{name}.conf");

        let loader = if files.contains(&conf_name) {
            match read_conf(fs, &prefixed(dir, &conf_name)) {
                Ok(conf) => LoaderBuilder::new(format!("{}: {kernel_path}", volume.label))
                    .efi_path(&kernel_path)
                    .options(conf_options(&conf, &initrd_path))
                    .fs_handle(volume.fs_handle)
                    .build(),
                Err(e) => {
                    warn!("Could not read {conf_name}: {e}");
                    pick_root_loader(volume, &kernel_path, &initrd_path)
                }
            }
        } else {
            pick_root_loader(volume, &kernel_path, &initrd_path)
        };
        loaders.push(loader);
    }
}

/// Builds the entry for a kernel whose root partition the user will pick from a submenu.
fn pick_root_loader(volume: &Volume, kernel_path: &str, initrd_path: &str) -> Loader {
    LoaderBuilder::new(format!("{}: {kernel_path}", volume.label))
        .efi_path(kernel_path)
        .initrd(initrd_path)
        .fs_handle(volume.fs_handle)
        .action(BootAction::PickRoot)
        .build()
}

/// Derives the kernel's version suffix from its file name, or [`None`] if the name is not a
/// kernel. `.conf` sidecars share the kernel's prefix and are excluded here.
fn kernel_suffix(file_name: &str) -> Option<&str> {
    if file_name.ends_with(".conf") {
        return None;
    }
    KERNEL_PREFIXES
        .iter()
        .find_map(|prefix| file_name.strip_prefix(prefix))
}

/// The initrd file names that pair with a kernel suffix, in match order. First hit wins.
fn initrd_candidates(suffix: &str) -> [String; 4] {
    [
        format!("initramfs-{suffix}.img"),
        format!("initrd-{suffix}.img"),
        format!("init-{suffix}.img"),
        format!("init{suffix}.img"),
    ]
}

/// Joins a directory prefix onto a file name with the firmware's path separator.
fn prefixed(dir: Option<&str>, name: &str) -> String {
    match dir {
        Some(dir) => format!("{dir}\\{name}"),
        None => name.to_string(),
    }
}

/// Reads a `.conf` sidecar as UTF-8 with one trailing line terminator removed.
fn read_conf(fs: &mut UefiFileSystem, path: &str) -> Result<String, ConfError> {
    let path = str_to_cstr(path)?;

    let mut buf = [0; 4096]; // preallocated buffer big enough for most sidecars
    let read_result = fs.read_into(&path, &mut buf);

    // if the file was too big for the buffer, read again through the heap
    let content = match read_result {
        Ok(bytes) => Vec::from(&buf[..bytes]),
        Err(FsError::BufTooSmall(_)) => fs.read(&path)?,
        Err(e) => return Err(e.into()),
    };

    let content = core::str::from_utf8(&content).map_err(|_| ConfError::NotUtf8)?;
    Ok(strip_newline(content).to_string())
}

/// Removes one trailing `\r\n` or `\n`.
fn strip_newline(s: &str) -> &str {
    s.strip_suffix("\r\n")
        .or_else(|| s.strip_suffix('\n'))
        .unwrap_or(s)
}

/// Joins sidecar content and the initrd argument into one command line.
fn conf_options(conf: &str, initrd_path: &str) -> String {
    if conf.is_empty() {
        format!("initrd={initrd_path}")
    } else {
        format!("{conf} initrd={initrd_path}")
    }
}

/// Synthesizes the command line for a kernel booted with a picked root partition.
#[must_use = "Has no effect if the result is unused"]
pub fn root_options(guid_text: &str, initrd_path: &str) -> String {
    format!("ro root=PARTUUID={guid_text} initrd={initrd_path}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kernel_suffix() {
        assert_eq!(kernel_suffix("vmlinuz-6.1"), Some("6.1"));
        assert_eq!(kernel_suffix("vmlinuz"), Some(""));
        assert_eq!(kernel_suffix("vmlinuz-6.1.conf"), None);
        assert_eq!(kernel_suffix("initramfs-6.1.img"), None);
        assert_eq!(kernel_suffix("bzImage"), None);
    }

    #[test]
    fn test_initrd_candidates() {
        assert_eq!(
            initrd_candidates("6.1"),
            [
                String::from("initramfs-6.1.img"),
                String::from("initrd-6.1.img"),
                String::from("init-6.1.img"),
                String::from("init6.1.img"),
            ]
        );
    }

    #[test]
    fn test_versionless_kernel_matches_plain_initrd() {
        // "vmlinuz" derives an empty suffix, and "init.img" is the candidate seen in practice
        assert_eq!(initrd_candidates("")[3], "init.img");
    }

    #[test]
    fn test_strip_newline() {
        assert_eq!(strip_newline("quiet splash\n"), "quiet splash");
        assert_eq!(strip_newline("quiet splash\r\n"), "quiet splash");
        assert_eq!(strip_newline("quiet splash"), "quiet splash");
        // only one terminator comes off
        assert_eq!(strip_newline("quiet\n\n"), "quiet\n");
    }

    #[test]
    fn test_strip_newline_idempotent_once_stripped() {
        let stripped = strip_newline("quiet splash\n");
        assert_eq!(strip_newline(stripped), stripped);
    }

    #[test]
    fn test_conf_options() {
        assert_eq!(
            conf_options("quiet splash", "initramfs-6.1.img"),
            "quiet splash initrd=initramfs-6.1.img"
        );
        assert_eq!(conf_options("", "initrd-6.1.img"), "initrd=initrd-6.1.img");
    }

    #[test]
    fn test_root_options() {
        assert_eq!(
            root_options(
                "11111111-1111-1111-1111-111111111111",
                "initramfs-6.1.img"
            ),
            "ro root=PARTUUID=11111111-1111-1111-1111-111111111111 initrd=initramfs-6.1.img"
        );
    }

    #[test]
    fn test_prefixed() {
        assert_eq!(prefixed(Some("boot"), "vmlinuz-6.1"), "boot\\vmlinuz-6.1");
        assert_eq!(prefixed(None, "vmlinuz-6.1"), "vmlinuz-6.1");
    }
}
