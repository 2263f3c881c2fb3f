//! Partition invariant validation
//!
//! Fast-fail checks for a built multi-level partition:
//! - Cell ids below the per-level cell count
//! - Cell ids contiguous from 0
//! - Containment: a cell never straddles two coarser cells
//! - Highest-different-level agrees with the per-level cells

use log::info;
use rayon::prelude::*;

use crate::partition::{CellID, LevelID, MultiLevelPartition, NodeID, INVALID_CELL_ID};

/// Report at most this many offending nodes per check
const MAX_REPORTED: usize = 10;

/// Invariant check results
#[derive(Debug, Default)]
pub struct InvariantResult {
    pub passed: bool,
    pub checks_run: usize,
    pub checks_passed: usize,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl InvariantResult {
    fn new() -> Self {
        Self {
            passed: true,
            ..Default::default()
        }
    }

    fn warn(&mut self, msg: String) {
        self.warnings.push(msg);
    }

    /// Record one check, failing it if `errors` is non-empty
    fn record(&mut self, errors: Vec<String>) {
        self.checks_run += 1;
        if errors.is_empty() {
            self.checks_passed += 1;
        } else {
            self.passed = false;
            self.errors.extend(errors);
        }
    }
}

/// Run all invariant checks.
///
/// `sample_pairs` bounds the number of node pairs used to cross-check
/// `highest_different_level` against the per-level cells.
pub fn validate_partition(mlp: &dyn MultiLevelPartition, sample_pairs: usize) -> InvariantResult {
    let mut result = InvariantResult::new();
    let num_nodes = mlp.num_nodes();
    let levels: Vec<LevelID> = (1..mlp.num_levels()).map(|level| level as LevelID).collect();

    info!(
        "Validating partition: {} nodes, {} stored levels",
        num_nodes,
        levels.len()
    );

    for &level in &levels {
        if mlp.num_cells(level) == 1 && num_nodes > 1 {
            result.warn(format!("level {} has a single cell", level));
        }
    }

    // 1. Cell range + contiguity
    let errors: Vec<String> = levels
        .par_iter()
        .flat_map_iter(|&level| check_cell_range(mlp, level))
        .collect();
    result.record(errors);

    // 2. Containment between adjacent levels (transitive over the hierarchy)
    let errors: Vec<String> = levels
        .par_iter()
        .filter(|&&level| (level as usize) + 1 < mlp.num_levels())
        .flat_map_iter(|&level| check_containment(mlp, level))
        .collect();
    result.record(errors);

    // 3. Highest-different-level against the per-level cells
    let errors: Vec<String> = (0..sample_pairs.min(num_nodes.saturating_mul(num_nodes)))
        .into_par_iter()
        .filter_map(|idx| {
            let (first, second) = sample_pair(idx, num_nodes);
            check_pair(mlp, first, second)
        })
        .take_any(MAX_REPORTED)
        .collect();
    result.record(errors);

    info!(
        "Validation: {}/{} checks passed, {} errors, {} warnings",
        result.checks_passed,
        result.checks_run,
        result.errors.len(),
        result.warnings.len()
    );

    result
}

fn check_cell_range(mlp: &dyn MultiLevelPartition, level: LevelID) -> Vec<String> {
    let num_cells = mlp.num_cells(level);
    let mut used = vec![false; num_cells];
    let mut errors = Vec::new();

    for node in 0..mlp.num_nodes() as NodeID {
        let cell = mlp.cell(level, node) as usize;
        if cell >= num_cells {
            if errors.len() < MAX_REPORTED {
                errors.push(format!(
                    "level {}: node {} in cell {} but only {} cells",
                    level, node, cell, num_cells
                ));
            }
        } else {
            used[cell] = true;
        }
    }

    let unused = used.iter().filter(|&&u| !u).count();
    if unused > 0 {
        errors.push(format!(
            "level {}: {} of {} cell ids unused",
            level, unused, num_cells
        ));
    }

    errors
}

fn check_containment(mlp: &dyn MultiLevelPartition, level: LevelID) -> Vec<String> {
    let mut parent: Vec<CellID> = vec![INVALID_CELL_ID; mlp.num_cells(level)];
    let mut errors = Vec::new();

    for node in 0..mlp.num_nodes() as NodeID {
        let cell = mlp.cell(level, node) as usize;
        let coarse = mlp.cell(level + 1, node);
        // out-of-range cells are reported by the range check
        let Some(slot) = parent.get_mut(cell) else {
            continue;
        };
        if *slot == INVALID_CELL_ID {
            *slot = coarse;
        } else if *slot != coarse && errors.len() < MAX_REPORTED {
            errors.push(format!(
                "level {}: cell {} is split across level {} cells {} and {} (node {})",
                level,
                cell,
                level + 1,
                slot,
                coarse,
                node
            ));
        }
    }

    errors
}

fn check_pair(mlp: &dyn MultiLevelPartition, first: NodeID, second: NodeID) -> Option<String> {
    let expected = (1..mlp.num_levels())
        .rev()
        .map(|level| level as LevelID)
        .find(|&level| mlp.cell(level, first) != mlp.cell(level, second))
        .unwrap_or(0);

    let forward = mlp.highest_different_level(first, second);
    let backward = mlp.highest_different_level(second, first);
    let own = mlp.highest_different_level(first, first);

    if forward != expected || backward != expected || own != 0 {
        Some(format!(
            "nodes {} and {}: highest different level {}/{} (self {}), cells say {}",
            first, second, forward, backward, own, expected
        ))
    } else {
        None
    }
}

/// Deterministic spread of node pairs over the whole id range
fn sample_pair(idx: usize, num_nodes: usize) -> (NodeID, NodeID) {
    const STRIDE: usize = 7_919;
    let first = idx % num_nodes;
    let second = (idx / num_nodes + idx.wrapping_mul(STRIDE)) % num_nodes;
    (first as NodeID, second as NodeID)
}
