//! # Butterfly-partition Library
//!
//! Packed multi-level partition index for hierarchical road routing.
//!
//! A multi-level search asks two things of its partition, millions of times
//! per query: which cell a node lies in at a level, and the highest level at
//! which two nodes are still separated. [`PackedMultiLevelPartition`] answers
//! both with a handful of bit operations on one `u64` per node.
//!
//! ## Basic Usage
//!
//! ```rust
//! use butterfly_partition::{MultiLevelPartition, PackedMultiLevelPartition};
//!
//! // raw groupings per level, finest first
//! let partitions = vec![
//!     vec![2, 1, 3, 4, 3, 4],
//!     vec![2, 2, 0, 1, 0, 1],
//! ];
//! let mlp = PackedMultiLevelPartition::new(&partitions, &[4, 3])?;
//!
//! assert_eq!(mlp.num_cells(2), 3);
//! assert_eq!(mlp.highest_different_level(0, 1), 1);
//! assert_eq!(mlp.highest_different_level(2, 4), 0);
//! # Ok::<(), butterfly_partition::PartitionError>(())
//! ```

pub mod error;
pub mod extractor;
pub mod formats;
pub mod partition;
pub mod validate;

pub use error::{PartitionError, Result};
pub use formats::{PartitionMlpFile, RawPartition};
pub use partition::{
    CellID, LevelGeometry, LevelID, MultiLevelPartition, NodeID, PackedMultiLevelPartition, PartitionID,
    UnpackedMultiLevelPartition,
};
pub use validate::{validate_partition, InvariantResult};
