use alloc::vec::Vec;
use anyhow::anyhow;
use uefi::{boot, cstr16, println, proto::device_path::DevicePath};
use zbl_rs::{
    device_path::{to_text, with_file_path},
    system::helper::image_device_handle,
};

/// Tests file-path synthesis against this image's own device path.
///
/// The joined path must render as the base path plus exactly one appended token.
pub fn test_device_path() -> anyhow::Result<()> {
    let device_handle = image_device_handle().map_err(|e| anyhow!("{e}"))?;
    let base = boot::open_protocol_exclusive::<DevicePath>(device_handle)?;

    let base_text = to_text(&base);
    println!("Image device path: {base_text}");
    assert!(!base_text.is_empty());

    let mut buf = Vec::new();
    let joined = with_file_path(&base, cstr16!("EFI\\Boot\\bootx64.efi"), &mut buf)
        .map_err(|e| anyhow!("{e}"))?;
    let joined_text = to_text(&joined);
    println!("Joined device path: {joined_text}");

    assert!(joined_text.starts_with(&base_text));
    assert!(joined_text.ends_with("\\EFI\\Boot\\bootx64.efi"));

    Ok(())
}
