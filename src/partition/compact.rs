//! Hierarchical cell compaction
//!
//! Turns arbitrary per-level grouping ids into dense cell ids that nest across
//! levels. Nodes are sorted bottom-up so that every coarse cell is a contiguous
//! run of the permutation, subdivided into contiguous runs of finer cells:
//!
//! ```text
//! initial:
//! node:    0 1 2 3 4 5
//! level 1: 2 1 3 4 3 4
//! level 2: 2 2 0 1 0 1
//!
//! after sorting by level 1:
//! node:    1 0 2 4 3 5
//! level 1: 1 2 3 3 4 4  <
//! level 2: 2 2 0 0 1 1
//!
//! after sorting by level 2:
//! node:    2 4 3 5 1 0
//! level 1: 3 3 4 4 1 2
//! level 2: 0 0 1 1 2 2  <
//! ```

use log::debug;

use super::{CellID, LevelID, NodeID};

/// Node permutation sorted by the coarsest grouping, ties broken by
/// progressively finer groupings.
///
/// `partitions` is ordered finest level first.
pub fn sort_hierarchically(partitions: &[Vec<CellID>]) -> Vec<NodeID> {
    let num_nodes = partitions.first().map_or(0, Vec::len);
    let mut permutation: Vec<NodeID> = (0..num_nodes as NodeID).collect();

    // sort_by_key is stable, so each pass keeps the order of the finer passes
    for level in partitions {
        permutation.sort_by_key(|&node| level[node as usize]);
    }

    permutation
}

/// Assign dense cell ids top-down along a hierarchically sorted permutation.
///
/// Calls `sink(level, node, cell)` for every stored level and node and returns
/// the highest cell id of each level (index `level - 1`).
///
/// A new cell starts wherever the grouping of this level or of any coarser
/// level changes, so raw ids only need to be unique within their parent cell.
pub fn compact_cells<F>(partitions: &[Vec<CellID>], permutation: &[NodeID], mut sink: F) -> Vec<CellID>
where
    F: FnMut(LevelID, NodeID, CellID),
{
    let mut boundary = vec![false; permutation.len()];
    let mut max_cell_ids = vec![0; partitions.len()];

    for (idx, level_partition) in partitions.iter().enumerate().rev() {
        let level = (idx + 1) as LevelID;
        let mut cell_id: CellID = 0;

        for (pos, &node) in permutation.iter().enumerate() {
            if pos > 0 {
                let previous = permutation[pos - 1];
                if level_partition[previous as usize] != level_partition[node as usize] {
                    boundary[pos] = true;
                }
                if boundary[pos] {
                    cell_id += 1;
                }
            }
            sink(level, node, cell_id);
        }

        debug!("Level {}: {} cells", level, cell_id as u64 + 1);
        max_cell_ids[idx] = cell_id;
    }

    max_cell_ids
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compact_all(partitions: &[Vec<CellID>]) -> (Vec<Vec<CellID>>, Vec<CellID>) {
        let permutation = sort_hierarchically(partitions);
        let mut cells = vec![vec![INVALID; partitions[0].len()]; partitions.len()];
        let max = compact_cells(partitions, &permutation, |level, node, cell| {
            cells[level as usize - 1][node as usize] = cell;
        });
        (cells, max)
    }

    const INVALID: CellID = CellID::MAX;

    #[test]
    fn test_sort_hierarchically() {
        let partitions = vec![vec![2, 1, 3, 4, 3, 4], vec![2, 2, 0, 1, 0, 1]];
        assert_eq!(sort_hierarchically(&partitions), vec![2, 4, 3, 5, 1, 0]);
    }

    #[test]
    fn test_compact_example() {
        let partitions = vec![vec![2, 1, 3, 4, 3, 4], vec![2, 2, 0, 1, 0, 1]];
        let (cells, max) = compact_all(&partitions);

        assert_eq!(cells[1], vec![2, 2, 0, 1, 0, 1]);
        assert_eq!(cells[0], vec![3, 2, 0, 1, 0, 1]);
        assert_eq!(max, vec![3, 2]);
    }

    #[test]
    fn test_local_ids_are_split_by_parent() {
        // bisection style: level 1 ids restart under every level 2 cell
        let partitions = vec![vec![0, 1, 0, 1], vec![0, 0, 1, 1]];
        let (cells, max) = compact_all(&partitions);

        assert_eq!(cells[1], vec![0, 0, 1, 1]);
        assert_eq!(cells[0], vec![0, 1, 2, 3]);
        assert_eq!(max, vec![3, 1]);
    }

    #[test]
    fn test_sparse_raw_ids_become_dense() {
        let partitions = vec![vec![900, 17, 900, 17, 5]];
        let (cells, max) = compact_all(&partitions);

        assert_eq!(cells[0], vec![2, 1, 2, 1, 0]);
        assert_eq!(max, vec![2]);
    }

    #[test]
    fn test_single_node() {
        let partitions = vec![vec![42], vec![7]];
        let (cells, max) = compact_all(&partitions);
        assert_eq!(cells, vec![vec![0], vec![0]]);
        assert_eq!(max, vec![0, 0]);
    }
}
