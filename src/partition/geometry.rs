//! Bit layout of packed partition ids
//!
//! Level `l` owns the bit field `[level_offsets[l - 1], level_offsets[l])` of
//! every partition id. Fields are laid out in ascending level order, so the
//! most significant differing bit of two ids always lies in the field of the
//! highest level at which they differ.

use log::debug;

use super::LevelID;
use crate::error::{PartitionError, Result};

/// Width of a packed partition id in bits
pub const NUM_PARTITION_BITS: usize = u64::BITS as usize;

/// Offsets, masks and the reverse bit → level table for one level layout.
///
/// A pure function of `level_to_num_cells`: rebuilding from the same counts
/// yields an identical value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelGeometry {
    level_to_num_cells: Vec<u32>,
    /// One offset per stored level plus a trailing entry holding the total
    level_offsets: Vec<u32>,
    level_masks: Vec<u64>,
    bit_to_level: [LevelID; NUM_PARTITION_BITS],
}

/// Bits needed to number `num_cells` cells: `ceil(log2(num_cells))`.
///
/// A single cell needs no bits. `num_cells` must be non-zero.
pub fn bits_for_cells(num_cells: u32) -> u32 {
    debug_assert!(num_cells > 0);
    u32::BITS - (num_cells - 1).leading_zeros()
}

impl LevelGeometry {
    /// Build the layout for levels `1..=level_to_num_cells.len()`.
    ///
    /// Fails if a level declares zero cells or if the fields together would not
    /// leave at least one bit of the partition id unused.
    pub fn new(level_to_num_cells: &[u32]) -> Result<Self> {
        if level_to_num_cells.is_empty() {
            return Err(PartitionError::NoLevels);
        }
        if level_to_num_cells.len() > LevelID::MAX as usize {
            return Err(PartitionError::TooManyLevels {
                levels: level_to_num_cells.len(),
            });
        }

        let level_offsets = make_level_offsets(level_to_num_cells)?;
        let level_masks = make_level_masks(&level_offsets);
        let bit_to_level = make_bit_to_level(&level_offsets);

        debug!(
            "Level geometry: {} levels, offsets {:?}, {} bits used",
            level_to_num_cells.len(),
            level_offsets,
            level_offsets.last().copied().unwrap_or(0)
        );

        Ok(Self {
            level_to_num_cells: level_to_num_cells.to_vec(),
            level_offsets,
            level_masks,
            bit_to_level,
        })
    }

    /// Number of stored levels (excluding the base level)
    pub fn num_levels(&self) -> usize {
        self.level_masks.len()
    }

    pub fn level_to_num_cells(&self) -> &[u32] {
        &self.level_to_num_cells
    }

    pub fn level_offsets(&self) -> &[u32] {
        &self.level_offsets
    }

    pub fn level_masks(&self) -> &[u64] {
        &self.level_masks
    }

    pub fn bit_to_level(&self) -> &[LevelID; NUM_PARTITION_BITS] {
        &self.bit_to_level
    }

    /// Bits used by all levels together
    pub fn total_bits(&self) -> u32 {
        self.level_offsets[self.num_levels()]
    }

    /// Field width of a stored level
    pub fn bits(&self, level: LevelID) -> u32 {
        let idx = self.level_index(level);
        self.level_offsets[idx + 1] - self.level_offsets[idx]
    }

    pub fn offset(&self, level: LevelID) -> u32 {
        self.level_offsets[self.level_index(level)]
    }

    pub fn mask(&self, level: LevelID) -> u64 {
        self.level_masks[self.level_index(level)]
    }

    /// Level owning bit `bit` of a partition id
    #[inline]
    pub fn level_of_bit(&self, bit: u32) -> LevelID {
        self.bit_to_level[bit as usize]
    }

    /// Extract the cell id of `level` from a packed id
    #[inline]
    pub fn decode(&self, level: LevelID, id: u64) -> u64 {
        let idx = self.level_index(level);
        (id & self.level_masks[idx]) >> self.level_offsets[idx]
    }

    /// Replace the field of `level` in `id` with `cell`
    #[inline]
    pub fn encode(&self, level: LevelID, id: u64, cell: u64) -> u64 {
        let idx = self.level_index(level);
        let shifted = cell << self.level_offsets[idx];
        debug_assert_eq!(shifted & !self.level_masks[idx], 0);
        (id & !self.level_masks[idx]) | shifted
    }

    #[inline]
    fn level_index(&self, level: LevelID) -> usize {
        assert!(
            level >= 1 && (level as usize) <= self.num_levels(),
            "level {} is not a stored level (1..={})",
            level,
            self.num_levels()
        );
        level as usize - 1
    }
}

/// Cumulative bit offsets, one per level plus the total as sentinel
fn make_level_offsets(level_to_num_cells: &[u32]) -> Result<Vec<u32>> {
    let mut offsets = Vec::with_capacity(level_to_num_cells.len() + 1);

    let mut sum_bits = 0u32;
    for (idx, &num_cells) in level_to_num_cells.iter().enumerate() {
        if num_cells == 0 {
            return Err(PartitionError::ZeroCells { level: idx + 1 });
        }
        offsets.push(sum_bits);
        sum_bits += bits_for_cells(num_cells);
        if sum_bits as usize >= NUM_PARTITION_BITS {
            return Err(PartitionError::BitBudgetExceeded {
                required: level_to_num_cells.iter().map(|&n| bits_for_cells(n.max(1))).sum(),
                capacity: NUM_PARTITION_BITS as u32,
            });
        }
    }
    offsets.push(sum_bits);

    Ok(offsets)
}

fn make_level_masks(level_offsets: &[u32]) -> Vec<u64> {
    level_offsets
        .windows(2)
        .map(|pair| {
            // 000011
            let mask = (1u64 << pair[0]) - 1;
            // 001111
            let next_mask = (1u64 << pair[1]) - 1;
            // 001100
            next_mask ^ mask
        })
        .collect()
}

fn make_bit_to_level(level_offsets: &[u32]) -> [LevelID; NUM_PARTITION_BITS] {
    let mut bit_to_level = [0; NUM_PARTITION_BITS];

    // Later levels start at higher offsets and overwrite the tail, leaving
    // every bit mapped to the level whose field contains it.
    let num_levels = level_offsets.len() - 1;
    for (idx, &offset) in level_offsets[..num_levels].iter().enumerate() {
        for entry in &mut bit_to_level[offset as usize..] {
            *entry = (idx + 1) as LevelID;
        }
    }

    bit_to_level
}
