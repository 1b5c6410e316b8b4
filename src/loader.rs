//! Provides [`Loader`], the record behind every menu entry.
//!
//! A [`Loader`] either names a bootable image discovered on some volume, or one of the fixed
//! tail entries (reboot into firmware, exit, and so on) distinguished by its
//! [`BootAction`].

use alloc::string::String;
use uefi::Handle;

use crate::boot::action::BootAction;

/// A candidate bootable image, or a special menu entry.
#[derive(Clone, Debug, Default)]
pub struct Loader {
    /// The menu description, `"<disk label>: <file name>"` for discovered images.
    pub title: String,

    /// The path of the image on its volume, if the entry boots one.
    pub efi_path: Option<String>,

    /// The load options (command line) handed to the image.
    pub options: Option<String>,

    /// The initrd path remembered for kernels that still need a root partition picked.
    pub initrd: Option<String>,

    /// The filesystem the image lives on, if the entry boots one.
    pub fs_handle: Option<Handle>,

    /// The [`BootAction`] of the entry, deciding what dispatch does with it.
    pub action: BootAction,
}

/// A builder to configure a [`Loader`].
#[must_use = "Has no effect if the result is unused"]
pub struct LoaderBuilder {
    /// The inner [`Loader`] that the builder operates on.
    loader: Loader,
}

impl LoaderBuilder {
    /// Constructs a new [`Loader`] with the given menu title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            loader: Loader {
                title: title.into(),
                ..Loader::default()
            },
        }
    }

    /// Sets the image path of a [`Loader`].
    pub fn efi_path(mut self, efi_path: impl Into<String>) -> Self {
        self.loader.efi_path = Some(efi_path.into());
        self
    }

    /// Sets the load options of a [`Loader`].
    ///
    /// This is what ends up as the image's command line.
    pub fn options(mut self, options: impl Into<String>) -> Self {
        self.loader.options = Some(options.into());
        self
    }

    /// Sets the remembered initrd path of a [`Loader`].
    pub fn initrd(mut self, initrd: impl Into<String>) -> Self {
        self.loader.initrd = Some(initrd.into());
        self
    }

    /// Sets the filesystem [`Handle`] of a [`Loader`].
    pub const fn fs_handle(mut self, fs_handle: Handle) -> Self {
        self.loader.fs_handle = Some(fs_handle);
        self
    }

    /// Sets the [`BootAction`] of a [`Loader`].
    pub const fn action(mut self, action: BootAction) -> Self {
        self.loader.action = action;
        self
    }

    /// Builds a [`Loader`].
    #[must_use = "Has no effect if the result is unused"]
    pub fn build(self) -> Loader {
        self.loader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::borrow::ToOwned;

    #[test]
    fn test_basic_loader() {
        let loader = LoaderBuilder::new("ESP: vmlinuz-6.1")
            .efi_path("vmlinuz-6.1")
            .options("quiet splash initrd=initramfs-6.1.img")
            .build();

        assert_eq!(loader.title, "ESP: vmlinuz-6.1".to_owned());
        assert_eq!(loader.efi_path.as_deref(), Some("vmlinuz-6.1"));
        assert_eq!(
            loader.options.as_deref(),
            Some("quiet splash initrd=initramfs-6.1.img")
        );
        assert_eq!(loader.action, BootAction::BootEfi);
        assert!(loader.fs_handle.is_none());
    }

    #[test]
    fn test_special_loader() {
        let loader = LoaderBuilder::new("Exit")
            .action(BootAction::Exit)
            .build();

        assert_eq!(loader.action, BootAction::Exit);
        assert!(loader.efi_path.is_none());
    }
}
