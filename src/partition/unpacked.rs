//! Unpacked multi-level partition: one cell array per level
//!
//! No bit budget, so it also covers layouts that do not fit a 64-bit id.
//! Queries scan levels instead of using bit tricks.

use super::compact::{compact_cells, sort_hierarchically};
use super::{validate_input, CellID, LevelID, MultiLevelPartition, NodeID};
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct UnpackedMultiLevelPartition {
    /// `cells[level - 1][node]`
    cells: Vec<Vec<CellID>>,
    num_cells: Vec<usize>,
}

impl UnpackedMultiLevelPartition {
    /// Same inputs as [`PackedMultiLevelPartition::new`](super::PackedMultiLevelPartition::new).
    /// The declared cell counts are validated but not needed for storage.
    pub fn new(partitions: &[Vec<CellID>], level_to_num_cells: &[u32]) -> Result<Self> {
        let num_nodes = validate_input(partitions, level_to_num_cells)?;

        let permutation = sort_hierarchically(partitions);
        let mut cells = vec![vec![0; num_nodes]; partitions.len()];
        let max_cell_ids = compact_cells(partitions, &permutation, |level, node, cell| {
            cells[level as usize - 1][node as usize] = cell;
        });

        Ok(Self {
            cells,
            num_cells: max_cell_ids.iter().map(|&max| max as usize + 1).collect(),
        })
    }

    fn level_index(&self, level: LevelID) -> usize {
        assert!(
            level >= 1 && (level as usize) <= self.cells.len(),
            "level {} is not a stored level (1..={})",
            level,
            self.cells.len()
        );
        level as usize - 1
    }

    fn check_node(&self, node: NodeID) {
        assert!(
            (node as usize) < self.num_nodes(),
            "node {} out of range (num_nodes = {})",
            node,
            self.num_nodes()
        );
    }
}

impl MultiLevelPartition for UnpackedMultiLevelPartition {
    fn cell(&self, level: LevelID, node: NodeID) -> CellID {
        self.check_node(node);
        if level == 0 {
            return node;
        }
        self.cells[self.level_index(level)][node as usize]
    }

    fn highest_different_level(&self, first: NodeID, second: NodeID) -> LevelID {
        self.check_node(first);
        self.check_node(second);

        self.cells
            .iter()
            .rposition(|level| level[first as usize] != level[second as usize])
            .map_or(0, |idx| (idx + 1) as LevelID)
    }

    fn num_levels(&self) -> usize {
        self.cells.len() + 1
    }

    fn num_cells(&self, level: LevelID) -> usize {
        if level == 0 {
            return self.num_nodes();
        }
        self.num_cells[self.level_index(level)]
    }

    fn num_nodes(&self) -> usize {
        self.cells[0].len()
    }
}
