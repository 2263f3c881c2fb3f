use std::collections::HashMap;
use std::sync::Arc;

use butterfly_partition::partition::bits_for_cells;
use butterfly_partition::{
    validate_partition, CellID, LevelGeometry, LevelID, MultiLevelPartition, NodeID, PackedMultiLevelPartition,
    PartitionError, PartitionMlpFile, UnpackedMultiLevelPartition,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

/// Random groupings; finer ids are drawn from a small range so that the same
/// raw id shows up under many coarse cells.
fn random_partitions(rng: &mut StdRng, num_nodes: usize, level_ranges: &[u32]) -> Vec<Vec<CellID>> {
    level_ranges
        .iter()
        .map(|&range| (0..num_nodes).map(|_| rng.random_range(0..range)).collect())
        .collect()
}

fn levels(mlp: &dyn MultiLevelPartition) -> impl Iterator<Item = LevelID> {
    1..mlp.num_levels() as LevelID
}

#[test]
fn test_worked_example_groups() {
    let partitions = vec![vec![2, 1, 3, 4, 3, 4], vec![2, 2, 0, 1, 0, 1]];
    let mlp = PackedMultiLevelPartition::new(&partitions, &[4, 3]).unwrap();

    // level 2 groups follow the raw level 2 ids
    for a in 0..6 {
        for b in 0..6 {
            let same_raw = partitions[1][a as usize] == partitions[1][b as usize];
            assert_eq!(mlp.cell(2, a) == mlp.cell(2, b), same_raw, "nodes {a} {b}");
        }
    }
    assert_eq!(mlp.num_cells(2), 3);

    // level 1 splits every level 2 group by its raw level 1 id
    assert_eq!(mlp.cell(1, 2), mlp.cell(1, 4));
    assert_eq!(mlp.cell(1, 3), mlp.cell(1, 5));
    assert_ne!(mlp.cell(1, 0), mlp.cell(1, 1));
    assert_eq!(mlp.num_cells(1), 4);
}

#[test]
fn test_packed_matches_unpacked_oracle() {
    for seed in 0..8u64 {
        let mut rng = StdRng::seed_from_u64(seed);
        let num_nodes = rng.random_range(1..300);
        let partitions = random_partitions(&mut rng, num_nodes, &[6, 4, 3, 2]);
        let counts = vec![num_nodes as u32; partitions.len()];

        let packed = PackedMultiLevelPartition::new(&partitions, &counts).unwrap();
        let unpacked = UnpackedMultiLevelPartition::new(&partitions, &counts).unwrap();

        assert_eq!(packed.num_levels(), unpacked.num_levels());
        for level in levels(&packed) {
            assert_eq!(packed.num_cells(level), unpacked.num_cells(level));
            for node in 0..num_nodes as NodeID {
                assert_eq!(packed.cell(level, node), unpacked.cell(level, node));
            }
        }

        for _ in 0..500 {
            let a = rng.random_range(0..num_nodes) as NodeID;
            let b = rng.random_range(0..num_nodes) as NodeID;
            let c = rng.random_range(0..num_nodes) as NodeID;
            assert_eq!(
                packed.highest_different_level(a, b),
                unpacked.highest_different_level(a, b)
            );
            assert_eq!(packed.query_level(a, b, c), unpacked.query_level(a, b, c));
        }
    }
}

#[test]
fn test_cells_are_raw_suffix_classes() {
    // two nodes share a cell at level l iff their raw ids agree on l..=L
    let mut rng = StdRng::seed_from_u64(42);
    let num_nodes = 400;
    let partitions = random_partitions(&mut rng, num_nodes, &[5, 3, 2]);
    let mlp = PackedMultiLevelPartition::new(&partitions, &[64, 8, 2]).unwrap();

    for level in levels(&mlp) {
        let idx = level as usize - 1;
        let mut classes: HashMap<Vec<CellID>, CellID> = HashMap::new();
        for node in 0..num_nodes {
            let key: Vec<CellID> = partitions[idx..].iter().map(|p| p[node]).collect();
            let cell = mlp.cell(level, node as NodeID);
            assert_eq!(*classes.entry(key).or_insert(cell), cell);
        }
        assert_eq!(classes.len(), mlp.num_cells(level));
    }
}

#[test]
fn test_query_properties() {
    let mut rng = StdRng::seed_from_u64(7);
    let num_nodes = 120;
    let partitions = random_partitions(&mut rng, num_nodes, &[8, 4, 2]);
    let mlp = PackedMultiLevelPartition::new(&partitions, &[128, 32, 4]).unwrap();
    let n = num_nodes as NodeID;

    for a in 0..n {
        assert_eq!(mlp.highest_different_level(a, a), 0);
        for level in levels(&mlp) {
            assert!((mlp.cell(level, a) as usize) < mlp.num_cells(level));
        }
        for b in 0..n {
            let forward = mlp.highest_different_level(a, b);
            assert_eq!(forward, mlp.highest_different_level(b, a));

            // containment: sharing a cell at l means sharing every coarser cell
            for level in levels(&mlp) {
                if mlp.cell(level, a) == mlp.cell(level, b) {
                    assert!(forward < level);
                    for coarser in level..mlp.num_levels() as LevelID {
                        assert_eq!(mlp.cell(coarser, a), mlp.cell(coarser, b));
                    }
                }
            }
        }
    }

    for _ in 0..2000 {
        let s = rng.random_range(0..n);
        let t = rng.random_range(0..n);
        let v = rng.random_range(0..n);
        assert_eq!(
            mlp.query_level(s, t, v),
            mlp.highest_different_level(s, v)
                .min(mlp.highest_different_level(t, v))
        );
    }

    let result = validate_partition(&mlp, 10_000);
    assert!(result.passed, "{:?}", result.errors);
}

#[test]
fn test_geometry_roundtrip_through_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("partition.mlp");

    let mut rng = StdRng::seed_from_u64(3);
    let partitions = random_partitions(&mut rng, 250, &[50, 9, 3, 1]);
    let counts = [250, 27, 3, 1];
    let mlp = PackedMultiLevelPartition::new(&partitions, &counts).unwrap();

    PartitionMlpFile::write(&path, &mlp).unwrap();
    let loaded = PartitionMlpFile::read(&path).unwrap();

    let rebuilt = LevelGeometry::new(&counts).unwrap();
    assert_eq!(loaded.geometry(), mlp.geometry());
    assert_eq!(rebuilt.level_offsets(), mlp.geometry().level_offsets());
    assert_eq!(rebuilt.level_masks(), mlp.geometry().level_masks());
    assert_eq!(rebuilt.bit_to_level(), mlp.geometry().bit_to_level());

    for level in levels(&mlp) {
        assert_eq!(loaded.num_cells(level), mlp.num_cells(level));
        for node in 0..250 {
            assert_eq!(loaded.cell(level, node), mlp.cell(level, node));
        }
    }
}

#[test]
fn test_budget_rejection() {
    let mut rng = StdRng::seed_from_u64(11);
    for _ in 0..500 {
        let num_levels = rng.random_range(1..12);
        let counts: Vec<u32> = (0..num_levels)
            .map(|_| (1u32 << rng.random_range(0..16u32)) | rng.random_range(0..3u32))
            .collect();
        let total: u32 = counts.iter().map(|&c| bits_for_cells(c)).sum();

        let geometry = LevelGeometry::new(&counts);
        if total >= 64 {
            assert!(
                matches!(geometry, Err(PartitionError::BitBudgetExceeded { .. })),
                "{counts:?} needs {total} bits"
            );
        } else {
            assert_eq!(geometry.unwrap().total_bits(), total);
        }
    }
}

#[test]
fn test_invalid_inputs_are_rejected() {
    let ok = vec![vec![0, 1, 2], vec![0, 0, 1]];

    assert!(matches!(
        PackedMultiLevelPartition::new(&[], &[]),
        Err(PartitionError::NoLevels)
    ));
    assert!(matches!(
        PackedMultiLevelPartition::new(&ok, &[4]),
        Err(PartitionError::LevelCountMismatch { .. })
    ));
    assert!(matches!(
        PackedMultiLevelPartition::new(&ok, &[4, 0]),
        Err(PartitionError::ZeroCells { level: 2 })
    ));
    assert!(matches!(
        PackedMultiLevelPartition::new(&[vec![0, 1, 2], vec![0, 0]], &[4, 2]),
        Err(PartitionError::NodeCountMismatch { level: 2, .. })
    ));
    // declared count too small for the cells actually present
    assert!(matches!(
        PackedMultiLevelPartition::new(&ok, &[2, 2]),
        Err(PartitionError::CellOverflow { level: 1, .. })
    ));
}

#[test]
fn test_concurrent_queries() {
    let mut rng = StdRng::seed_from_u64(5);
    let num_nodes = 1000;
    let partitions = random_partitions(&mut rng, num_nodes, &[16, 4, 2]);
    let mlp: Arc<dyn MultiLevelPartition> =
        Arc::new(PackedMultiLevelPartition::new(&partitions, &[1024, 64, 8]).unwrap());

    let expected: Vec<LevelID> = (0..num_nodes as NodeID)
        .map(|n| mlp.query_level(0, 1, n))
        .collect();

    let shared = Arc::clone(&mlp);
    let actual: Vec<LevelID> = (0..num_nodes as NodeID)
        .into_par_iter()
        .map(|n| shared.query_level(0, 1, n))
        .collect();

    assert_eq!(actual, expected);
}
