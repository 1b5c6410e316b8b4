//! Filesystem helper functions for other modules.
//!
//! These wrap around the UEFI [`SimpleFileSystem`] protocol to make an interface that is a little
//! more in line with the Rust standard library.
//!
//! Firmwares are only required to expose FAT filesystems this way, but any filesystem driver that
//! publishes [`SimpleFileSystem`] (efifs, Ext4Pkg, and so on) works the same. Drivers placed in
//! `\EFI\zbl\drivers` of the boot volume are loaded before scanning, so volumes in other formats
//! can be discovered as well.

use alloc::{borrow::ToOwned, boxed::Box, string::String, vec, vec::Vec};
use thiserror::Error;
use uefi::{
    CStr16, CString16, Handle, Status,
    boot::{self, ScopedProtocol},
    fs::{COMMON_SKIP_DIRS, UefiDirectoryIter},
    proto::media::{
        file::{Directory, File, FileAttribute, FileInfo, FileMode, FileSystemVolumeLabel},
        fs::SimpleFileSystem,
    },
};

use crate::BootResult;

/// The size of one gigabyte in bytes. This is the fallback size if a file reports a size too big
/// for the platform, and a reasonable maximum for anything this program reads.
pub(crate) const ONE_GIGABYTE: usize = 1024 * 1024 * 1024;

/// An error that may result from performing filesystem operations
#[derive(Error, Debug)]
pub enum FsError {
    /// The provided buffer was too small.
    #[error("Buffer too small (require {0} bytes)")]
    BufTooSmall(usize),

    /// A file could not be opened.
    #[error("Failed to open file")]
    OpenErr(Status),

    /// A file could not be read.
    #[error("Failed to read file")]
    ReadErr(Status),

    /// Failed to get a volume label on a partition.
    #[error("Could not get volume label of a partition")]
    VolumeLabelErr,
}

/// A rust-ier wrapper around [`SimpleFileSystem`].
pub struct UefiFileSystem(ScopedProtocol<SimpleFileSystem>);

impl UefiFileSystem {
    /// Create a new [`UefiFileSystem`].
    #[must_use = "Has no effect if the result is unused"]
    pub const fn new(fs: ScopedProtocol<SimpleFileSystem>) -> Self {
        Self(fs)
    }

    /// Create a new [`UefiFileSystem`] from a handle that supports [`SimpleFileSystem`].
    ///
    /// # Errors
    ///
    /// May return an `Error` if the handle does not actually support [`SimpleFileSystem`].
    pub fn from_handle(handle: Handle) -> BootResult<Self> {
        let fs = boot::open_protocol_exclusive(handle)?;
        Ok(Self(fs))
    }

    /// Create a new [`UefiFileSystem`] from the same filesystem as the boot menu itself.
    ///
    /// This is used when reading from the volume this program was loaded from, such as when
    /// pre-loading drivers.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the boot image's filesystem does not support
    /// [`SimpleFileSystem`] for some reason.
    pub fn from_image_fs() -> BootResult<Self> {
        let fs = boot::get_image_file_system(boot::image_handle())?;
        Ok(Self(fs))
    }

    /// Gets the volume label from a [`SimpleFileSystem`].
    ///
    /// An unset label is returned as an empty string, not an error.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the volume could not be opened, or the volume does not support
    /// [`FileSystemVolumeLabel`]
    pub fn volume_label(&mut self) -> Result<CString16, FsError> {
        let mut root = self
            .0
            .open_volume()
            .map_err(|e| FsError::OpenErr(e.status()))?;
        let info = root
            .get_boxed_info::<FileSystemVolumeLabel>()
            .map_err(|_| FsError::VolumeLabelErr)?;
        Ok(info.volume_label().to_owned())
    }

    /// Checks if a file exists on this volume.
    ///
    /// It makes no distinction between a file that could not be verified to exist and a file that
    /// really does not exist. Both will return `false`.
    pub fn exists(&mut self, path: &CStr16) -> bool {
        let Ok(mut root) = self.0.open_volume() else {
            return false;
        };

        root.open(path, FileMode::Read, FileAttribute::empty())
            .is_ok()
    }

    /// Returns a [`UefiDirectoryIter`] of files in the path on this volume.
    ///
    /// Every yielded entry is copied into its own allocation, so entries may be held across
    /// further reads.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the path does not exist or is not a directory.
    pub fn read_dir(&mut self, path: &CStr16) -> Result<UefiDirectoryIter, FsError> {
        Ok(UefiDirectoryIter::new(self.directory(path)?))
    }

    /// Collects a directory into a vector of [`FileInfo`]s, with "." and ".." removed.
    ///
    /// The scanners iterate a directory more than once (loaders first, then kernels, then
    /// companion files), which an iterator over live protocol reads cannot do.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the path does not exist or is not a directory.
    pub fn read_dir_entries(&mut self, path: &CStr16) -> Result<Vec<Box<FileInfo>>, FsError> {
        Ok(self
            .read_dir(path)?
            .filter_map(Result::ok)
            .filter(|x| !COMMON_SKIP_DIRS.contains(&x.file_name()))
            .collect())
    }

    /// Returns an iterator of [`FileInfo`]s that filter out non-matching files.
    ///
    /// "." and ".." are displayed in directory lists, so they are skipped. Then the filename's
    /// suffix is compared case-insensitively to the provided extension, and empty files are
    /// skipped. A nonexistent directory yields an empty iterator.
    pub fn read_filtered_dir(
        &mut self,
        path: &CStr16,
        ext: &'static str,
    ) -> impl Iterator<Item = Box<FileInfo>> + use<> {
        // use<> needed due to rust 2024
        self.read_dir(path)
            .into_iter()
            .flatten()
            .filter_map(Result::ok)
            .filter(|x| !COMMON_SKIP_DIRS.contains(&x.file_name())) // excludes "." and ".."
            .filter(move |x| {
                String::from(x.file_name())
                    .to_ascii_lowercase()
                    .ends_with(ext)
            })
            .filter(|x| x.file_size() > 0)
    }

    /// Attempts to read as much as possible of a file into a byte buffer.
    /// On success it will also return the amount of bytes read.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the volume couldn't be opened, the path does not point to a valid
    /// file, the file could not be read for any reason, or the buffer was too small. If the
    /// buffer was too small, the amount of bytes required is returned.
    pub fn read_into(&mut self, path: &CStr16, buf: &mut [u8]) -> Result<usize, FsError> {
        let mut file = self.regular_file(path)?;

        let info = file
            .get_boxed_info::<FileInfo>()
            .map_err(|e| FsError::ReadErr(e.status()))?;

        let size = usize::try_from(info.file_size()).unwrap_or(ONE_GIGABYTE);

        let read = file.read(buf).map_err(|e| FsError::ReadErr(e.status()))?;
        if read != size {
            return Err(FsError::BufTooSmall(size));
        }

        Ok(read)
    }

    /// Reads the entire content of a file into a [`Vec<u8>`].
    ///
    /// You may want to use [`core::str::from_utf8`] to convert the content into an &str.
    ///
    /// # Errors
    ///
    /// May return an `Error` if the volume couldn't be opened, the path does not point to a valid
    /// file, or the file could not be read for any reason.
    pub fn read(&mut self, path: &CStr16) -> Result<Vec<u8>, FsError> {
        let mut file = self.regular_file(path)?;

        let info = file
            .get_boxed_info::<FileInfo>()
            .map_err(|e| FsError::ReadErr(e.status()))?;

        let size = usize::try_from(info.file_size()).unwrap_or(ONE_GIGABYTE);

        let mut buf = vec![0; size];
        file.read(&mut buf)
            .map_err(|e| FsError::ReadErr(e.status()))?;

        Ok(buf)
    }

    /// Gets a handle to a [`uefi::proto::media::file::RegularFile`] in the filesystem.
    fn regular_file(
        &mut self,
        path: &CStr16,
    ) -> Result<uefi::proto::media::file::RegularFile, FsError> {
        let mut root = self
            .0
            .open_volume()
            .map_err(|e| FsError::OpenErr(e.status()))?;
        root.open(path, FileMode::Read, FileAttribute::empty())
            .map_err(|e| FsError::OpenErr(e.status()))?
            .into_regular_file()
            .ok_or(FsError::OpenErr(Status::INVALID_PARAMETER))
    }

    /// Gets a handle to a [`Directory`] in the filesystem.
    fn directory(&mut self, path: &CStr16) -> Result<Directory, FsError> {
        let mut root = self
            .0
            .open_volume()
            .map_err(|e| FsError::OpenErr(e.status()))?;
        root.open(path, FileMode::Read, FileAttribute::empty())
            .map_err(|e| FsError::OpenErr(e.status()))?
            .into_directory()
            .ok_or(FsError::OpenErr(Status::INVALID_PARAMETER))
    }
}
