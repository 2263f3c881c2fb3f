//! Packed multi-level partition: one 64-bit id per node

use log::info;

use super::compact::{compact_cells, sort_hierarchically};
use super::geometry::LevelGeometry;
use super::{validate_input, CellID, LevelID, MultiLevelPartition, NodeID};
use crate::error::{PartitionError, Result};

/// Concatenation of a node's cell ids over all stored levels
pub type PartitionID = u64;

/// Multi-level partition storing every node's cells in a single [`PartitionID`].
///
/// The last entry of the id array is a sentinel holding the highest cell id of
/// every level, from which the cell counts are derived.
#[derive(Debug, Clone)]
pub struct PackedMultiLevelPartition {
    partition: Vec<PartitionID>,
    geometry: LevelGeometry,
}

impl PackedMultiLevelPartition {
    /// Build from raw per-level groupings, finest level first.
    ///
    /// `partitions[l][node]` is the grouping of `node` at level `l + 1`; only
    /// equality and order of the values matter. `level_to_num_cells[l]` is an
    /// upper bound for the number of cells at level `l + 1` and sizes its field.
    pub fn new(partitions: &[Vec<CellID>], level_to_num_cells: &[u32]) -> Result<Self> {
        let num_nodes = validate_input(partitions, level_to_num_cells)?;
        let geometry = LevelGeometry::new(level_to_num_cells)?;

        let capacities: Vec<u64> = (1..=geometry.num_levels() as LevelID)
            .map(|level| 1u64 << geometry.bits(level))
            .collect();

        let permutation = sort_hierarchically(partitions);

        // We include a sentinel element at the end of the partition
        let mut partition = vec![0; num_nodes + 1];
        let max_cell_ids = compact_cells(partitions, &permutation, |level, node, cell| {
            // overflowing cells are reported below, never written
            if (cell as u64) < capacities[level as usize - 1] {
                let id = &mut partition[node as usize];
                *id = geometry.encode(level, *id, cell as u64);
            }
        });

        for (idx, &max_cell_id) in max_cell_ids.iter().enumerate() {
            let cells = max_cell_id as u64 + 1;
            if cells > capacities[idx] {
                return Err(PartitionError::CellOverflow {
                    level: idx + 1,
                    cells,
                    capacity: capacities[idx],
                });
            }
            let level = (idx + 1) as LevelID;
            partition[num_nodes] = geometry.encode(level, partition[num_nodes], max_cell_id as u64);
        }

        info!(
            "Packed multi-level partition: {} nodes, {} levels, {} of {} bits used",
            num_nodes,
            geometry.num_levels(),
            geometry.total_bits(),
            PartitionID::BITS
        );

        Ok(Self {
            partition,
            geometry,
        })
    }

    /// Rebuild from the persisted form: cell counts plus the packed ids
    /// (sentinel included). The geometry is derived again from the counts.
    pub fn from_parts(level_to_num_cells: &[u32], partition: Vec<PartitionID>) -> Result<Self> {
        let geometry = LevelGeometry::new(level_to_num_cells)?;

        if partition.len() < 2 {
            return Err(PartitionError::Format(format!(
                "expected at least one node and the sentinel, got {} ids",
                partition.len()
            )));
        }
        let num_nodes = partition.len() - 1;
        if num_nodes >= NodeID::MAX as usize {
            return Err(PartitionError::TooManyNodes { nodes: num_nodes });
        }

        let total_bits = geometry.total_bits();
        let used_bits = if total_bits == 0 {
            0
        } else {
            !0u64 >> (PartitionID::BITS - total_bits)
        };
        if let Some(node) = partition.iter().position(|&id| id & !used_bits != 0) {
            return Err(PartitionError::Format(format!(
                "partition id of node {} uses bits beyond the {} level bits",
                node,
                geometry.total_bits()
            )));
        }

        let sentinel = partition[num_nodes];
        for level in 1..=geometry.num_levels() as LevelID {
            let max_cell = geometry.decode(level, sentinel);
            if let Some(node) = partition[..num_nodes]
                .iter()
                .position(|&id| geometry.decode(level, id) > max_cell)
            {
                return Err(PartitionError::Format(format!(
                    "node {} exceeds the sentinel cell {} at level {}",
                    node, max_cell, level
                )));
            }
        }

        Ok(Self {
            partition,
            geometry,
        })
    }

    pub fn geometry(&self) -> &LevelGeometry {
        &self.geometry
    }

    /// Packed ids of all nodes followed by the sentinel
    pub fn partition_ids(&self) -> &[PartitionID] {
        &self.partition
    }

    #[inline]
    fn sentinel_node(&self) -> usize {
        self.partition.len() - 1
    }

    #[inline]
    fn id(&self, node: NodeID) -> PartitionID {
        assert!(
            (node as usize) < self.sentinel_node(),
            "node {} out of range (num_nodes = {})",
            node,
            self.sentinel_node()
        );
        self.partition[node as usize]
    }
}

impl MultiLevelPartition for PackedMultiLevelPartition {
    fn cell(&self, level: LevelID, node: NodeID) -> CellID {
        let id = self.id(node);
        if level == 0 {
            return node;
        }
        self.geometry.decode(level, id) as CellID
    }

    fn highest_different_level(&self, first: NodeID, second: NodeID) -> LevelID {
        let diff = self.id(first) ^ self.id(second);
        if diff == 0 {
            return 0;
        }

        let msb = PartitionID::BITS - 1 - diff.leading_zeros();
        self.geometry.level_of_bit(msb)
    }

    fn num_levels(&self) -> usize {
        self.geometry.num_levels() + 1
    }

    fn num_cells(&self, level: LevelID) -> usize {
        if level == 0 {
            return self.num_nodes();
        }
        let max_id = self.geometry.decode(level, self.partition[self.sentinel_node()]);
        max_id as usize + 1
    }

    fn num_nodes(&self) -> usize {
        self.sentinel_node()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn example() -> PackedMultiLevelPartition {
        let partitions = vec![vec![2, 1, 3, 4, 3, 4], vec![2, 2, 0, 1, 0, 1]];
        PackedMultiLevelPartition::new(&partitions, &[4, 3]).unwrap()
    }

    #[test]
    fn test_cells_and_counts() {
        let mlp = example();

        assert_eq!(mlp.num_nodes(), 6);
        assert_eq!(mlp.num_levels(), 3);
        assert_eq!(mlp.num_cells(1), 4);
        assert_eq!(mlp.num_cells(2), 3);

        let level1: Vec<CellID> = (0..6).map(|n| mlp.cell(1, n)).collect();
        let level2: Vec<CellID> = (0..6).map(|n| mlp.cell(2, n)).collect();
        assert_eq!(level1, vec![3, 2, 0, 1, 0, 1]);
        assert_eq!(level2, vec![2, 2, 0, 1, 0, 1]);
    }

    #[test]
    fn test_highest_different_level() {
        let mlp = example();

        // same cell everywhere
        assert_eq!(mlp.highest_different_level(2, 4), 0);
        assert_eq!(mlp.highest_different_level(3, 3), 0);
        // same level 2 cell, different level 1 cell
        assert_eq!(mlp.highest_different_level(0, 1), 1);
        // different level 2 cells
        assert_eq!(mlp.highest_different_level(0, 2), 2);
        assert_eq!(mlp.highest_different_level(5, 4), 2);
    }

    #[test]
    fn test_query_level() {
        let mlp = example();

        // node 1 shares the level 2 cell of start 0
        assert_eq!(mlp.query_level(0, 2, 1), 1);
        // node 4 shares every cell with target 2
        assert_eq!(mlp.query_level(0, 2, 4), 0);
        // node 3 is separated from both endpoints at level 2
        assert_eq!(mlp.query_level(0, 2, 3), 2);
    }

    #[test]
    fn test_level_zero_is_the_base_graph() {
        let mlp = example();
        assert_eq!(mlp.cell(0, 4), 4);
        assert_eq!(mlp.num_cells(0), 6);
    }

    #[test]
    fn test_cell_overflow_is_rejected() {
        let partitions = vec![vec![0, 1, 2, 3, 4]];
        assert!(matches!(
            PackedMultiLevelPartition::new(&partitions, &[4]),
            Err(PartitionError::CellOverflow {
                level: 1,
                cells: 5,
                capacity: 4
            })
        ));
        // rounding up to a power of two leaves room
        assert!(PackedMultiLevelPartition::new(&partitions, &[5]).is_ok());
    }

    #[test]
    fn test_single_cell_levels_use_no_bits() {
        let partitions = vec![vec![0, 1, 1], vec![9, 9, 9]];
        let mlp = PackedMultiLevelPartition::new(&partitions, &[2, 1]).unwrap();

        assert_eq!(mlp.geometry().total_bits(), 1);
        assert_eq!(mlp.num_cells(2), 1);
        assert_eq!(mlp.cell(2, 0), 0);
        assert_eq!(mlp.highest_different_level(0, 1), 1);
    }

    #[test]
    fn test_from_parts_roundtrip() {
        let mlp = example();
        let rebuilt = PackedMultiLevelPartition::from_parts(
            mlp.geometry().level_to_num_cells(),
            mlp.partition_ids().to_vec(),
        )
        .unwrap();

        assert_eq!(rebuilt.geometry(), mlp.geometry());
        assert_eq!(rebuilt.partition_ids(), mlp.partition_ids());
    }

    #[test]
    fn test_from_parts_rejects_garbage() {
        assert!(matches!(
            PackedMultiLevelPartition::from_parts(&[4], vec![0]),
            Err(PartitionError::Format(_))
        ));
        // bit 2 is outside a 2-bit layout
        assert!(matches!(
            PackedMultiLevelPartition::from_parts(&[4], vec![0b100, 0b11]),
            Err(PartitionError::Format(_))
        ));
        // node cell above the sentinel
        assert!(matches!(
            PackedMultiLevelPartition::from_parts(&[4], vec![3, 1]),
            Err(PartitionError::Format(_))
        ));
        // all-zero layout
        assert!(PackedMultiLevelPartition::from_parts(&[1], vec![0, 0]).is_ok());
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_sentinel_is_not_queryable() {
        let mlp = example();
        mlp.cell(1, 6);
    }

    #[test]
    #[should_panic(expected = "not a stored level")]
    fn test_level_above_hierarchy_panics() {
        let mlp = example();
        mlp.cell(3, 0);
    }
}
