use anyhow::anyhow;
use uefi::{
    CStr16, boot, cstr16, println,
    proto::{device_path::DevicePath, media::fs::SimpleFileSystem},
};
use zbl_rs::{
    boot::loader::{load_boot_option, start_boot_option},
    loader::LoaderBuilder,
    system::{fs::UefiFileSystem, helper::image_device_handle},
};

const SHELL_PATH: &CStr16 = cstr16!("shellx64.efi");
const FALLBACK_PATH: &CStr16 = cstr16!("EFI\\BOOT\\BOOTx64.efi");

/// Tests chain-loading an image from the same filesystem as this binary.
///
/// The started image gets a marker command line, so a shell started this way shows it in its
/// arguments. Control returns here when that image exits.
pub fn test_loading() -> anyhow::Result<()> {
    println!("Will try to load either {SHELL_PATH} or {FALLBACK_PATH} on the same filesystem");

    let efi_path = {
        let mut fs = UefiFileSystem::from_image_fs().map_err(|e| anyhow!("{e}"))?;

        if fs.exists(SHELL_PATH) {
            "shellx64.efi"
        } else if fs.exists(FALLBACK_PATH) {
            "EFI\\BOOT\\BOOTx64.efi"
        } else {
            println!("Cannot test loading, neither {SHELL_PATH} nor {FALLBACK_PATH} exists");
            return Ok(());
        }
    }; // fs dropped here so the handle can be opened again for loading

    let fs_handle = {
        let device_handle = image_device_handle().map_err(|e| anyhow!("{e}"))?;
        let device_path = boot::open_protocol_exclusive::<DevicePath>(device_handle)?;
        boot::locate_device_path::<SimpleFileSystem>(&mut &*device_path)?
    };

    let loader = LoaderBuilder::new("load test")
        .efi_path(efi_path)
        .options("loaded-by=zbl-tests")
        .fs_handle(fs_handle)
        .build();

    let image = load_boot_option(&loader).map_err(|e| anyhow!("{e}"))?;
    start_boot_option(image).map_err(|e| anyhow!("{e}"))?;

    Ok(())
}
