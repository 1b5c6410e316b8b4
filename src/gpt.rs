//! GPT partition introspection over raw block devices.
//!
//! This reads the protective MBR and GPT header off every whole-disk block device, then walks
//! the partition entry array to build a map from partition-unique GUID to partition name. The
//! map backs `root=PARTUUID=` argument synthesis and the volume labels in the menu.
//!
//! A disk that is not GPT partitioned, or that fails any read, is skipped; a single bad device
//! never poisons the map.

use alloc::{collections::BTreeMap, format, string::String, vec};
use log::{debug, warn};
use thiserror::Error;
use uefi::{
    Guid, Handle,
    boot::{self, SearchType},
    proto::media::block::BlockIO,
};

use crate::BootResult;

/// Map from partition-unique GUID to a human readable partition name.
pub type RootMap = BTreeMap<Guid, String>;

/// The MBR boot signature, at byte offset 510.
const MBR_SIGNATURE: u16 = 0xAA55;

/// The partition type a protective MBR declares for the whole disk.
const PROTECTIVE_OS_TYPE: u8 = 0xEE;

/// The GPT header magic, "EFI PART" read as a little-endian u64.
const GPT_SIGNATURE: u64 = 0x5452_4150_2049_4645;

/// The most partition entries read per disk. On-disk counts above this are truncated.
const MAX_ENTRIES: u32 = 128;

/// The partition name length in UTF-16 code units.
const GPT_NAME_LEN: usize = 36;

/// An `Error` that may result from reading partition metadata off one disk.
#[derive(Error, Debug)]
pub enum GptError {
    /// The device's first sectors are smaller than the structures they must hold.
    #[error("Sector too small for partition metadata")]
    Truncated,

    /// Sector 0 is not a protective MBR, so the disk is not GPT partitioned.
    #[error("Missing protective MBR")]
    NotProtective,

    /// The GPT header magic did not match.
    #[error("Invalid GPT signature {0:#018x}")]
    InvalidSignature(u64),

    /// The header describes entries smaller than the defined entry layout.
    #[error("Partition entry size {0} too small")]
    EntrySizeTooSmall(u32),
}

/// One of the four partition records inside an MBR.
#[repr(C, packed)]
#[derive(Clone, Copy)]
struct MbrPartitionRecord {
    boot_indicator: u8,
    starting_chs: [u8; 3],
    os_type: u8,
    ending_chs: [u8; 3],
    starting_lba: u32,
    size_in_lba: u32,
}

/// Sector 0 of a GPT disk: legacy-looking boot record declaring the disk as one `0xEE` partition.
#[repr(C, packed)]
struct ProtectiveMbr {
    boot_code: [u8; 440],
    unique_mbr_disk_signature: u32,
    unknown: u16,
    partition_records: [MbrPartitionRecord; 4],
    signature: u16,
}

/// Sector 1 of a GPT disk.
#[repr(C, packed)]
#[derive(Clone, Copy)]
struct GptHeader {
    signature: u64,
    revision: u32,
    header_size: u32,
    header_crc32: u32,
    reserved: u32,
    my_lba: u64,
    alternate_lba: u64,
    first_usable_lba: u64,
    last_usable_lba: u64,
    disk_guid: [u8; 16],
    partition_entry_lba: u64,
    number_of_partition_entries: u32,
    size_of_partition_entry: u32,
    partition_entry_array_crc32: u32,
}

/// One record of the partition entry array.
#[repr(C, packed)]
#[derive(Clone, Copy)]
struct GptEntry {
    partition_type_guid: [u8; 16],
    unique_partition_guid: [u8; 16],
    starting_lba: u64,
    ending_lba: u64,
    attributes: u64,
    partition_name: [u16; GPT_NAME_LEN],
}

/// Builds the root map from every block device in the system.
///
/// Failures are per-device: a handle that cannot be opened, read, or parsed is skipped. The map
/// may come back empty.
#[must_use = "Has no effect if the result is unused"]
pub fn find_roots() -> RootMap {
    let mut map = RootMap::new();

    let handles = match boot::locate_handle_buffer(SearchType::from_proto::<BlockIO>()) {
        Ok(handles) => handles.to_vec(),
        Err(e) => {
            warn!("No block devices found: {e}");
            return map;
        }
    };

    for handle in handles {
        if let Err(e) = scan_disk(handle, &mut map) {
            debug!("Skipping block device: {e}");
        }
    }

    map
}

/// Reads one disk's partition metadata into the map.
fn scan_disk(handle: Handle, map: &mut RootMap) -> BootResult<()> {
    let block_io = boot::open_protocol_exclusive::<BlockIO>(handle)?;
    let media = block_io.media();

    // GPT lives on the whole-disk device. Partition handles re-expose BlockIO but start at the
    // partition, where sector 0 is filesystem data.
    if media.is_logical_partition() || !media.is_media_present() {
        return Ok(());
    }

    let media_id = media.media_id();
    let block_size = media.block_size() as usize;
    if block_size < 512 {
        return Ok(());
    }

    let mut block = vec![0u8; block_size];
    block_io.read_blocks(media_id, 0, &mut block)?;
    parse_protective_mbr(&block)?;

    block_io.read_blocks(media_id, 1, &mut block)?;
    let header = parse_header(&block)?;

    let on_disk_count = header.number_of_partition_entries;
    let entry_count = on_disk_count.min(MAX_ENTRIES);
    let entry_size = header.size_of_partition_entry;
    if usize::try_from(entry_size).unwrap_or(0) < size_of::<GptEntry>() {
        return Err(crate::error::BootError::Gpt(GptError::EntrySizeTooSmall(
            entry_size,
        )));
    }
    if on_disk_count > MAX_ENTRIES {
        debug!("Disk declares {on_disk_count} partition entries, reading first {MAX_ENTRIES}");
    }

    let table_bytes = entry_count as usize * entry_size as usize;
    let entry_lba = header.partition_entry_lba;
    let mut table = vec![0u8; table_bytes.div_ceil(block_size) * block_size];
    block_io.read_blocks(media_id, entry_lba, &mut table)?;

    collect_entries(
        &table[..table_bytes],
        entry_size as usize,
        media.block_size(),
        map,
    );
    Ok(())
}

/// Validates a protective MBR sector.
fn parse_protective_mbr(block: &[u8]) -> Result<(), GptError> {
    if block.len() < size_of::<ProtectiveMbr>() {
        return Err(GptError::Truncated);
    }

    // SAFETY: the length was checked above, and every field of ProtectiveMbr is valid for any
    // bit pattern. read_unaligned copies out of the unaligned buffer.
    let mbr = unsafe { core::ptr::read_unaligned(block.as_ptr().cast::<ProtectiveMbr>()) };

    let signature = mbr.signature;
    if signature != MBR_SIGNATURE || mbr.partition_records[0].os_type != PROTECTIVE_OS_TYPE {
        return Err(GptError::NotProtective);
    }
    Ok(())
}

/// Validates a GPT header sector.
fn parse_header(block: &[u8]) -> Result<GptHeader, GptError> {
    if block.len() < size_of::<GptHeader>() {
        return Err(GptError::Truncated);
    }

    // SAFETY: the length was checked above, and every field of GptHeader is valid for any bit
    // pattern. read_unaligned copies out of the unaligned buffer.
    let header = unsafe { core::ptr::read_unaligned(block.as_ptr().cast::<GptHeader>()) };

    let signature = header.signature;
    if signature != GPT_SIGNATURE {
        return Err(GptError::InvalidSignature(signature));
    }
    Ok(header)
}

/// Walks the partition entry array, inserting one map entry per used partition.
///
/// Iteration stops at the first unused entry (all-zero partition type GUID). Unnamed partitions
/// get a size-derived label instead.
fn collect_entries(table: &[u8], entry_size: usize, block_size: u32, map: &mut RootMap) {
    for chunk in table.chunks(entry_size) {
        if chunk.len() < size_of::<GptEntry>() {
            break;
        }

        // SAFETY: the length was checked above, and every field of GptEntry is valid for any bit
        // pattern. read_unaligned copies out of the unaligned buffer.
        let entry = unsafe { core::ptr::read_unaligned(chunk.as_ptr().cast::<GptEntry>()) };

        if entry.partition_type_guid == [0u8; 16] {
            break;
        }

        let unique = Guid::from_bytes(entry.unique_partition_guid);
        let name = entry_name(&entry).unwrap_or_else(|| {
            size_label(entry.starting_lba, entry.ending_lba, block_size)
        });
        map.insert(unique, name);
    }
}

/// Decodes the partition name, trimmed at the first NUL. Empty names yield [`None`].
fn entry_name(entry: &GptEntry) -> Option<String> {
    let name = { entry.partition_name };
    let len = name
        .iter()
        .position(|&unit| unit == 0)
        .unwrap_or(GPT_NAME_LEN);
    if len == 0 {
        return None;
    }
    Some(
        char::decode_utf16(name[..len].iter().copied())
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect(),
    )
}

/// Synthesizes a label from the partition size when the name field is empty.
fn size_label(starting_lba: u64, ending_lba: u64, block_size: u32) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * KIB;
    const GIB: u64 = 1024 * MIB;

    let bytes = ending_lba
        .saturating_sub(starting_lba)
        .saturating_mul(u64::from(block_size));

    if bytes < MIB {
        format!("unknown {}KiB volume", bytes / KIB)
    } else if bytes < GIB {
        format!("unknown {}MiB volume", bytes / MIB)
    } else {
        format!("unknown {}GiB volume", bytes / GIB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use uefi::guid;

    fn protective_mbr_bytes() -> Vec<u8> {
        let mut block = vec![0u8; 512];
        block[450] = PROTECTIVE_OS_TYPE; // first partition record's os_type, offset 446 + 4
        block[510] = 0x55;
        block[511] = 0xAA;
        block
    }

    fn header_bytes(entry_lba: u64, entry_count: u32, entry_size: u32) -> Vec<u8> {
        let mut block = Vec::with_capacity(512);
        block.extend_from_slice(b"EFI PART"); // signature
        block.extend_from_slice(&0x0001_0000_u32.to_le_bytes()); // revision 1.0
        block.extend_from_slice(&92_u32.to_le_bytes()); // header_size
        block.extend_from_slice(&0_u32.to_le_bytes()); // header_crc32
        block.extend_from_slice(&0_u32.to_le_bytes()); // reserved
        block.extend_from_slice(&1_u64.to_le_bytes()); // my_lba
        block.extend_from_slice(&0_u64.to_le_bytes()); // alternate_lba
        block.extend_from_slice(&34_u64.to_le_bytes()); // first_usable_lba
        block.extend_from_slice(&0_u64.to_le_bytes()); // last_usable_lba
        block.extend_from_slice(&[0u8; 16]); // disk_guid
        block.extend_from_slice(&entry_lba.to_le_bytes());
        block.extend_from_slice(&entry_count.to_le_bytes());
        block.extend_from_slice(&entry_size.to_le_bytes());
        block.extend_from_slice(&0_u32.to_le_bytes()); // partition_entry_array_crc32
        block.resize(512, 0);
        block
    }

    fn entry_bytes(type_guid: &Guid, unique_guid: &Guid, name: &str, lbas: (u64, u64)) -> Vec<u8> {
        let mut entry = Vec::with_capacity(128);
        entry.extend_from_slice(&type_guid.to_bytes());
        entry.extend_from_slice(&unique_guid.to_bytes());
        entry.extend_from_slice(&lbas.0.to_le_bytes());
        entry.extend_from_slice(&lbas.1.to_le_bytes());
        entry.extend_from_slice(&0_u64.to_le_bytes()); // attributes
        let mut units: Vec<u16> = name.encode_utf16().collect();
        units.resize(GPT_NAME_LEN, 0);
        for unit in units {
            entry.extend_from_slice(&unit.to_le_bytes());
        }
        entry
    }

    const LINUX_FS: Guid = guid!("0fc63daf-8483-4772-8e79-3d69d8477de4");
    const ROOT_PART: Guid = guid!("11111111-1111-1111-1111-111111111111");

    #[test]
    fn test_protective_mbr_valid() {
        assert!(parse_protective_mbr(&protective_mbr_bytes()).is_ok());
    }

    #[test]
    fn test_protective_mbr_rejects_plain_mbr() {
        let mut block = protective_mbr_bytes();
        block[450] = 0x83; // a linux partition instead of the protective entry
        assert!(matches!(
            parse_protective_mbr(&block),
            Err(GptError::NotProtective)
        ));
    }

    #[test]
    fn test_protective_mbr_rejects_missing_signature() {
        let mut block = protective_mbr_bytes();
        block[510] = 0;
        assert!(matches!(
            parse_protective_mbr(&block),
            Err(GptError::NotProtective)
        ));
    }

    #[test]
    fn test_header_valid() {
        let header = parse_header(&header_bytes(2, 128, 128)).expect("header should parse");
        assert_eq!({ header.partition_entry_lba }, 2);
        assert_eq!({ header.number_of_partition_entries }, 128);
        assert_eq!({ header.size_of_partition_entry }, 128);
    }

    #[test]
    fn test_header_rejects_corrupt_magic() {
        let mut block = header_bytes(2, 128, 128);
        block[0] = b'X';
        assert!(matches!(
            parse_header(&block),
            Err(GptError::InvalidSignature(_))
        ));
    }

    #[test]
    fn test_collect_single_named_entry() {
        let mut table = entry_bytes(&LINUX_FS, &ROOT_PART, "root", (2048, 1_050_624));
        table.extend_from_slice(&vec![0u8; 128]); // terminating unused entry

        let mut map = RootMap::new();
        collect_entries(&table, 128, 512, &mut map);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&ROOT_PART).map(String::as_str), Some("root"));
    }

    #[test]
    fn test_collect_stops_at_unused_entry() {
        let mut table = entry_bytes(&LINUX_FS, &ROOT_PART, "root", (2048, 4096));
        table.extend_from_slice(&vec![0u8; 128]);
        let after = guid!("22222222-2222-2222-2222-222222222222");
        table.extend_from_slice(&entry_bytes(&LINUX_FS, &after, "ignored", (4096, 8192)));

        let mut map = RootMap::new();
        collect_entries(&table, 128, 512, &mut map);
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&after));
    }

    #[test]
    fn test_collect_unnamed_entry_gets_size_label() {
        // 2048 sectors of 512 bytes = 1 MiB exactly
        let table = entry_bytes(&LINUX_FS, &ROOT_PART, "", (0, 2048));

        let mut map = RootMap::new();
        collect_entries(&table, 128, 512, &mut map);
        assert_eq!(
            map.get(&ROOT_PART).map(String::as_str),
            Some("unknown 1MiB volume")
        );
    }

    #[test]
    fn test_size_label_thresholds() {
        assert_eq!(size_label(0, 8, 512), "unknown 4KiB volume");
        assert_eq!(size_label(0, 2047, 512), "unknown 1023KiB volume");
        assert_eq!(size_label(0, 2048, 512), "unknown 1MiB volume");
        assert_eq!(size_label(0, 2 * 1024 * 1024, 512), "unknown 1GiB volume");
    }

    #[test]
    fn test_size_label_saturates_on_inverted_range() {
        assert_eq!(size_label(2048, 0, 512), "unknown 0KiB volume");
    }

    proptest! {
        #[test]
        fn mbr_parse_doesnt_panic(x in any::<Vec<u8>>()) {
            let _ = parse_protective_mbr(&x);
        }

        #[test]
        fn header_parse_doesnt_panic(x in any::<Vec<u8>>()) {
            let _ = parse_header(&x);
        }

        #[test]
        fn collect_doesnt_panic(x in any::<Vec<u8>>()) {
            let mut map = RootMap::new();
            collect_entries(&x, 128, 512, &mut map);
        }
    }
}
