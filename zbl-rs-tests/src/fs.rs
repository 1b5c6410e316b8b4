use alloc::string::String;
use anyhow::anyhow;
use uefi::{cstr16, println};
use zbl_rs::system::fs::UefiFileSystem;

/// Tests the read-only filesystem surface against the image's own volume.
pub fn test_filesystem() -> anyhow::Result<()> {
    let mut fs = UefiFileSystem::from_image_fs().map_err(|e| anyhow!("{e}"))?;

    let label = fs.volume_label().map_err(|e| anyhow!("{e}"))?;
    println!("Volume label: \"{label}\"");

    let entries = fs
        .read_dir_entries(cstr16!("\\"))
        .map_err(|e| anyhow!("{e}"))?;
    println!("Root directory holds {} entries:", entries.len());
    for info in &entries {
        println!("  {}", info.file_name());
    }
    // "." and ".." are filtered, and a volume carrying this test binary is not empty
    assert!(!entries.is_empty());
    assert!(
        entries
            .iter()
            .all(|x| String::from(x.file_name()) != "." && String::from(x.file_name()) != "..")
    );

    assert!(fs.exists(cstr16!("\\")));
    assert!(!fs.exists(cstr16!("no-such-file.anywhere")));

    Ok(())
}
