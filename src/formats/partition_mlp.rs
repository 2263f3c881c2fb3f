//! partition.mlp format - packed multi-level partition
//!
//! Stores the per-level cell counts and the packed ids (sentinel included).
//! Offsets, masks and the bit → level table are re-derived on load.
//!
//! Layout (little-endian):
//! - header (24 bytes): magic, version, reserved, n_levels, reserved, n_ids
//! - `level_to_num_cells`: n_levels × u32
//! - `partition_ids`: n_ids × u64
//! - footer: CRC-64 of everything above

use crc::{Crc, CRC_64_GO_ISO};
use log::debug;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::{PartitionError, Result};
use crate::partition::PackedMultiLevelPartition;

const MAGIC: u32 = 0x4D4C5054; // "MLPT"
const VERSION: u16 = 1;
const HEADER_SIZE: usize = 24;

const CRC64: Crc<u64> = Crc::<u64>::new(&CRC_64_GO_ISO);

pub struct PartitionMlpFile;

impl PartitionMlpFile {
    /// Write a packed partition to `path`
    pub fn write<P: AsRef<Path>>(path: P, mlp: &PackedMultiLevelPartition) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        write_to(&mut writer, mlp)?;
        writer.flush()?;
        Ok(())
    }

    /// Read a packed partition from `path`, verifying magic, version and CRC
    pub fn read<P: AsRef<Path>>(path: P) -> Result<PackedMultiLevelPartition> {
        let mut reader = BufReader::new(File::open(path)?);
        read_from(&mut reader)
    }
}

pub fn write_to<W: Write>(writer: &mut W, mlp: &PackedMultiLevelPartition) -> Result<()> {
    let mut crc_digest = CRC64.digest();
    let counts = mlp.geometry().level_to_num_cells();
    let ids = mlp.partition_ids();

    let mut header = Vec::with_capacity(HEADER_SIZE);
    header.extend_from_slice(&MAGIC.to_le_bytes());
    header.extend_from_slice(&VERSION.to_le_bytes());
    header.extend_from_slice(&0u16.to_le_bytes());
    header.extend_from_slice(&(counts.len() as u32).to_le_bytes());
    header.extend_from_slice(&0u32.to_le_bytes());
    header.extend_from_slice(&(ids.len() as u64).to_le_bytes());
    writer.write_all(&header)?;
    crc_digest.update(&header);

    for &count in counts {
        let bytes = count.to_le_bytes();
        writer.write_all(&bytes)?;
        crc_digest.update(&bytes);
    }

    for &id in ids {
        let bytes = id.to_le_bytes();
        writer.write_all(&bytes)?;
        crc_digest.update(&bytes);
    }

    let body_crc = crc_digest.finalize();
    writer.write_all(&body_crc.to_le_bytes())?;

    debug!(
        "Wrote partition.mlp: {} levels, {} ids, crc 0x{:016X}",
        counts.len(),
        ids.len(),
        body_crc
    );
    Ok(())
}

pub fn read_from<R: Read>(reader: &mut R) -> Result<PackedMultiLevelPartition> {
    let mut crc_digest = CRC64.digest();

    let mut header = [0u8; HEADER_SIZE];
    reader.read_exact(&mut header)?;
    crc_digest.update(&header);

    let magic = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
    if magic != MAGIC {
        return Err(PartitionError::Format(format!(
            "invalid magic: expected 0x{:08X}, got 0x{:08X}",
            MAGIC, magic
        )));
    }
    let version = u16::from_le_bytes([header[4], header[5]]);
    if version != VERSION {
        return Err(PartitionError::Format(format!(
            "unsupported version {} (expected {})",
            version, VERSION
        )));
    }
    let n_levels = u32::from_le_bytes([header[8], header[9], header[10], header[11]]);
    let n_ids = u64::from_le_bytes([
        header[16], header[17], header[18], header[19], header[20], header[21], header[22],
        header[23],
    ]);

    let mut counts = Vec::with_capacity(n_levels.min(u8::MAX as u32) as usize);
    for _ in 0..n_levels {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        crc_digest.update(&buf);
        counts.push(u32::from_le_bytes(buf));
    }

    // cap the reservation, a corrupt header must not trigger a huge allocation
    let mut ids = Vec::with_capacity(n_ids.min(1 << 20) as usize);
    for _ in 0..n_ids {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        crc_digest.update(&buf);
        ids.push(u64::from_le_bytes(buf));
    }

    let computed_crc = crc_digest.finalize();
    let mut footer = [0u8; 8];
    reader.read_exact(&mut footer)?;
    let stored_crc = u64::from_le_bytes(footer);
    if computed_crc != stored_crc {
        return Err(PartitionError::Format(format!(
            "CRC64 mismatch in partition.mlp: computed 0x{:016X}, stored 0x{:016X}",
            computed_crc, stored_crc
        )));
    }

    PackedMultiLevelPartition::from_parts(&counts, ids)
}
