//! Multi-level partition index
//!
//! Answers two questions for a hierarchical (multi-level Dijkstra) search:
//! which cell a node belongs to at a level, and the highest level at which two
//! nodes are still separated.
//!
//! Level 0 is the base graph (one node per cell). Levels `1..=L` are stored,
//! and a higher level is a coarser grouping: every cell at level `l + 1` is a
//! union of cells at level `l`.

mod compact;
mod geometry;
mod packed;
mod unpacked;

pub use compact::{compact_cells, sort_hierarchically};
pub use geometry::{bits_for_cells, LevelGeometry, NUM_PARTITION_BITS};
pub use packed::{PackedMultiLevelPartition, PartitionID};
pub use unpacked::UnpackedMultiLevelPartition;

use crate::error::{PartitionError, Result};

/// Dense zero-based graph node id
pub type NodeID = u32;
/// Hierarchy level, 0 is the base graph
pub type LevelID = u8;
/// Cell id, contiguous from 0 within one level
pub type CellID = u32;

pub const INVALID_CELL_ID: CellID = CellID::MAX;

/// Query contract shared by all partition representations
pub trait MultiLevelPartition: Send + Sync {
    /// Cell of `node` at `level`
    fn cell(&self, level: LevelID, node: NodeID) -> CellID;

    /// Highest level at which `first` and `second` are in different cells,
    /// 0 if they share a cell on every stored level
    fn highest_different_level(&self, first: NodeID, second: NodeID) -> LevelID;

    /// Level at which `node` is relevant for a query from `start` to `target`
    fn query_level(&self, start: NodeID, target: NodeID, node: NodeID) -> LevelID {
        self.highest_different_level(start, node)
            .min(self.highest_different_level(target, node))
    }

    /// Number of levels including the base level
    fn num_levels(&self) -> usize;

    fn num_cells(&self, level: LevelID) -> usize;

    fn num_nodes(&self) -> usize;
}

/// Checks the constructor inputs shared by all representations.
///
/// Returns the number of real nodes.
pub(crate) fn validate_input(
    partitions: &[Vec<CellID>],
    level_to_num_cells: &[u32],
) -> Result<usize> {
    if partitions.is_empty() || level_to_num_cells.is_empty() {
        return Err(PartitionError::NoLevels);
    }
    if partitions.len() != level_to_num_cells.len() {
        return Err(PartitionError::LevelCountMismatch {
            partitions: partitions.len(),
            level_to_num_cells: level_to_num_cells.len(),
        });
    }
    // stored levels are addressed as 1..=L
    if partitions.len() > LevelID::MAX as usize {
        return Err(PartitionError::TooManyLevels {
            levels: partitions.len(),
        });
    }

    let num_nodes = partitions[0].len();
    if num_nodes == 0 {
        return Err(PartitionError::NoNodes);
    }
    // node ids are u32 and one more slot is taken by the sentinel
    if num_nodes >= NodeID::MAX as usize {
        return Err(PartitionError::TooManyNodes { nodes: num_nodes });
    }
    for (idx, level) in partitions.iter().enumerate() {
        if level.len() != num_nodes {
            return Err(PartitionError::NodeCountMismatch {
                level: idx + 1,
                expected: num_nodes,
                actual: level.len(),
            });
        }
    }
    for (idx, &cells) in level_to_num_cells.iter().enumerate() {
        if cells == 0 {
            return Err(PartitionError::ZeroCells { level: idx + 1 });
        }
    }

    Ok(num_nodes)
}
