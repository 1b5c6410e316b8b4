use std::{fs, path::Path};

use crate::build;

/// Stages the directory layout of an EFI System Partition.
///
/// The firmware's default-loader fallback looks for `EFI\Boot\bootx64.efi`, so the binary is
/// placed there; copying this tree onto a FAT-formatted ESP is the whole installation. An empty
/// `EFI/zbl/drivers` directory is created as the spot for filesystem drivers.
pub fn stage(release: bool, out: &str) -> anyhow::Result<()> {
    build::build(release, "x86_64-unknown-uefi")?;

    let boot_dir = Path::new(out).join("EFI").join("Boot");
    let driver_dir = Path::new(out).join("EFI").join("zbl").join("drivers");
    fs::create_dir_all(&boot_dir)?;
    fs::create_dir_all(&driver_dir)?;

    fs::copy(build::binary_path(release), boot_dir.join("bootx64.efi"))?;

    println!("Staged ESP layout in {out}/");
    Ok(())
}
