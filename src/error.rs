//! Error types for butterfly-partition
//!
//! Construction and loading failures are reported through [`PartitionError`].
//! Query-time contract violations (bad level, bad node id) are not errors:
//! they panic, because a wrong cell id handed to a search is worse than a crash.

use thiserror::Error;

/// Main error type for partition construction and persistence
#[derive(Debug, Error)]
pub enum PartitionError {
    /// No hierarchy level was supplied
    #[error("Invalid input: at least one partition level is required")]
    NoLevels,

    /// Levels were supplied but they contain no nodes
    #[error("Invalid input: partition levels contain no nodes")]
    NoNodes,

    /// `partitions` and `level_to_num_cells` disagree on the number of levels
    #[error(
        "Invalid input: {partitions} partition levels but {level_to_num_cells} cell counts"
    )]
    LevelCountMismatch {
        partitions: usize,
        level_to_num_cells: usize,
    },

    /// A level assigns a different number of nodes than the finest level
    #[error("Invalid input: level {level} has {actual} nodes, expected {expected}")]
    NodeCountMismatch {
        level: usize,
        expected: usize,
        actual: usize,
    },

    /// A level declares zero cells, its bit width would be undefined
    #[error("Invalid input: level {level} declares zero cells")]
    ZeroCells { level: usize },

    /// The packed representation cannot hold all level fields
    #[error("Bit budget exceeded: levels need {required} bits, must stay below {capacity}")]
    BitBudgetExceeded { required: u32, capacity: u32 },

    /// More levels than a `LevelID` can address
    #[error("Invalid input: {levels} levels exceed the maximum level id")]
    TooManyLevels { levels: usize },

    /// Node ids (plus the sentinel) do not fit a `NodeID`
    #[error("Invalid input: {nodes} nodes exceed the node id range")]
    TooManyNodes { nodes: usize },

    /// Compaction produced more cells than the level's declared count allows
    #[error("Cell overflow: level {level} has {cells} cells, its field encodes at most {capacity}")]
    CellOverflow { level: usize, cells: u64, capacity: u64 },

    /// File I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Persisted data is malformed
    #[error("Format error: {0}")]
    Format(String),
}

/// Convenience result type for partition operations
pub type Result<T> = std::result::Result<T, PartitionError>;
