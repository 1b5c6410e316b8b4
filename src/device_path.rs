//! Device path handling: display formatting, file-path synthesis, and partition lookup.
//!
//! A device path is a chain of variable-length records, each carrying a type, subtype, and
//! length, terminated by an end-entire record. The [`uefi`] crate exposes the chain as
//! [`DevicePath`] with a validating node cursor, which everything here builds on rather than
//! walking raw pointers.

use alloc::{
    string::{String, ToString},
    vec::Vec,
};
use thiserror::Error;
use uefi::{
    CStr16, Guid,
    proto::device_path::{
        DevicePath, DevicePathNodeEnum, DeviceSubType, DeviceType, PoolDevicePath, build,
        media::PartitionSignature,
    },
};

/// An `Error` that may result from building a [`DevicePath`]
#[derive(Error, Debug)]
pub enum DevicePathError {
    /// A device path node could not be built. This can happen if the buffer was too small.
    #[error("Could not build DevicePath")]
    Build(#[from] build::BuildError),

    /// The device path could not be appended to an existing one for some reason.
    #[error("Could not append DevicePath to another DevicePath")]
    DevPathUtil(#[from] uefi::proto::device_path::DevicePathUtilitiesError),
}

/// Formats a [`DevicePath`] as display text.
///
/// Each record contributes one token and tokens are separated by `\`. File path records
/// contribute their embedded path text verbatim; every other recognized record contributes its
/// tag name; unrecognized records contribute `?`. The end-entire terminator contributes nothing.
#[must_use = "Has no effect if the result is unused"]
pub fn to_text(device_path: &DevicePath) -> String {
    let mut out = String::new();
    for node in device_path.node_iter() {
        if !out.is_empty() {
            out.push('\\');
        }
        if let Ok(DevicePathNodeEnum::MediaFilePath(file_path)) = node.as_enum() {
            match file_path.path_name().to_cstring16() {
                Ok(name) => out.push_str(&String::from(&name)),
                Err(_) => out.push('?'),
            }
        } else {
            out.push_str(tag_name(node.full_type()));
        }
    }
    out
}

/// Gets the joined [`DevicePath`] given an existing [`DevicePath`] (likely to a partition) and a
/// file's path.
///
/// This appends one file-path record holding `path` and a fresh terminator, so the result names
/// the file on the same device. The provided buffer backs the intermediate file-path node.
///
/// # Errors
///
/// May return an `Error` if the device path is finalized before the file's [`DevicePath`] could
/// be pushed. Though, this should be quite unlikely.
pub fn with_file_path(
    device_path: &DevicePath,
    path: &CStr16,
    buf: &mut Vec<u8>,
) -> Result<PoolDevicePath, DevicePathError> {
    let file: &DevicePath = build::DevicePathBuilder::with_vec(buf)
        .push(&build::media::FilePath { path_name: path })?
        .finalize()?;
    Ok(device_path.append_path(file)?)
}

/// Finds the GPT partition GUID in a [`DevicePath`], if there is one.
///
/// This walks the chain for a hard-drive record whose signature type is GPT. Paths that describe
/// whole disks, optical media, or MBR partitions have no such record and yield [`None`].
#[must_use = "Has no effect if the result is unused"]
pub fn partition_guid(device_path: &DevicePath) -> Option<Guid> {
    device_path.node_iter().find_map(|node| {
        if let Ok(DevicePathNodeEnum::MediaHardDrive(hd)) = node.as_enum()
            && let PartitionSignature::Guid(guid) = hd.partition_signature()
        {
            Some(guid)
        } else {
            None
        }
    })
}

/// Renders a GPT partition GUID the way the kernel expects it in `root=PARTUUID=`.
#[must_use = "Has no effect if the result is unused"]
pub fn guid_text(guid: &Guid) -> String {
    guid.to_string().to_ascii_lowercase()
}

/// The display tag for a recognized record type, or `?`.
fn tag_name(full_type: (DeviceType, DeviceSubType)) -> &'static str {
    match full_type {
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_PCI) => "Pci",
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_PCCARD) => "Pccard",
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_MEMORY_MAPPED) => "MemoryMapped",
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_VENDOR) => "VendorHw",
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_CONTROLLER) => "Controller",
        (DeviceType::HARDWARE, DeviceSubType::HARDWARE_BMC) => "Bmc",
        (DeviceType::ACPI, DeviceSubType::ACPI) => "Acpi",
        (DeviceType::ACPI, DeviceSubType::ACPI_EXPANDED) => "AcpiEx",
        (DeviceType::ACPI, DeviceSubType::ACPI_ADR) => "AcpiAdr",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_ATAPI) => "Atapi",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_SCSI) => "Scsi",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_USB) => "Usb",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_MAC_ADDRESS) => "MacAddress",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_IPV4) => "Ipv4",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_IPV6) => "Ipv6",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_USB_CLASS) => "UsbClass",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_USB_WWID) => "UsbWwid",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_DEVICE_LOGICAL_UNIT) => "Lun",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_SATA) => "Sata",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_NVME_NAMESPACE) => "NvmeNamespace",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_SD) => "Sd",
        (DeviceType::MESSAGING, DeviceSubType::MESSAGING_EMMC) => "Emmc",
        (DeviceType::MEDIA, DeviceSubType::MEDIA_HARD_DRIVE) => "HardDrive",
        (DeviceType::MEDIA, DeviceSubType::MEDIA_CD_ROM) => "CdRom",
        (DeviceType::MEDIA, DeviceSubType::MEDIA_VENDOR) => "VendorMedia",
        (DeviceType::MEDIA, DeviceSubType::MEDIA_PROTOCOL) => "Protocol",
        (DeviceType::MEDIA, DeviceSubType::MEDIA_RAM_DISK) => "RamDisk",
        (DeviceType::BIOS_BOOT_SPEC, DeviceSubType::BIOS_BOOT_SPECIFICATION) => "BiosBootSpec",
        _ => "?",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use uefi::{cstr16, guid, proto::device_path::media::PartitionFormat};

    #[test]
    fn test_display_tags() {
        let mut buf = Vec::new();
        let dp = build::DevicePathBuilder::with_vec(&mut buf)
            .push(&build::acpi::Acpi {
                hid: 0x0a03_41d0, // PNP0A03, a PCI root bridge
                uid: 0,
            })
            .unwrap()
            .push(&build::hardware::Pci {
                function: 0,
                device: 2,
            })
            .unwrap()
            .finalize()
            .expect("sample device path should build");
        assert_eq!(to_text(dp), "Acpi\\Pci");
    }

    #[test]
    fn test_display_file_path_verbatim() {
        let mut buf = Vec::new();
        let dp = build::DevicePathBuilder::with_vec(&mut buf)
            .push(&build::acpi::Acpi {
                hid: 0x0a03_41d0,
                uid: 0,
            })
            .unwrap()
            .push(&build::hardware::Pci {
                function: 0,
                device: 2,
            })
            .unwrap()
            .push(&build::media::FilePath {
                path_name: cstr16!("EFI\\BOOT\\BOOTX64.EFI"),
            })
            .unwrap()
            .finalize()
            .expect("sample device path should build");

        // appending a file-path record extends the display of the base path by one token
        assert_eq!(to_text(dp), "Acpi\\Pci\\EFI\\BOOT\\BOOTX64.EFI");
    }

    #[test]
    fn test_node_lengths_cover_allocation() {
        let mut buf = Vec::new();
        let dp = build::DevicePathBuilder::with_vec(&mut buf)
            .push(&build::acpi::Acpi {
                hid: 0x0a03_41d0,
                uid: 0,
            })
            .unwrap()
            .push(&build::media::FilePath {
                path_name: cstr16!("vmlinuz-6.1"),
            })
            .unwrap()
            .finalize()
            .expect("sample device path should build");

        let mut total = 0usize;
        for node in dp.node_iter() {
            assert!(node.length() >= 4);
            total += usize::from(node.length());
        }
        total += 4; // the end-entire record the node iterator does not yield
        assert_eq!(total, buf.len());
    }

    #[test]
    fn test_partition_guid_found() {
        const PART: Guid = guid!("11111111-1111-1111-1111-111111111111");
        let mut buf = Vec::new();
        let dp = build::DevicePathBuilder::with_vec(&mut buf)
            .push(&build::acpi::Acpi {
                hid: 0x0a03_41d0,
                uid: 0,
            })
            .unwrap()
            .push(&build::media::HardDrive {
                partition_number: 1,
                partition_start: 2048,
                partition_size: 262_144,
                partition_signature: PartitionSignature::Guid(PART),
                partition_format: PartitionFormat::GPT,
            })
            .unwrap()
            .finalize()
            .expect("sample device path should build");

        assert_eq!(partition_guid(dp), Some(PART));
    }

    #[test]
    fn test_partition_guid_absent_without_gpt_signature() {
        let mut buf = Vec::new();
        let dp = build::DevicePathBuilder::with_vec(&mut buf)
            .push(&build::media::HardDrive {
                partition_number: 1,
                partition_start: 63,
                partition_size: 262_144,
                partition_signature: PartitionSignature::Mbr([0xde, 0xad, 0xbe, 0xef]),
                partition_format: PartitionFormat::MBR,
            })
            .unwrap()
            .finalize()
            .expect("sample device path should build");

        assert_eq!(partition_guid(dp), None);
    }

    #[test]
    fn test_guid_text() {
        const PART: Guid = guid!("0FC63DAF-8483-4772-8E79-3D69D8477DE4");
        assert_eq!(guid_text(&PART), "0fc63daf-8483-4772-8e79-3d69d8477de4");
    }
}
