//! Raw partition input (JSON)
//!
//! Output of the upstream partitioner: one grouping id per node and level,
//! finest level first, plus an upper bound on the cell count of each level.
//!
//! ```json
//! {
//!   "level_to_num_cells": [4, 3],
//!   "partitions": [[2, 1, 3, 4, 3, 4], [2, 2, 0, 1, 0, 1]]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{PartitionError, Result};
use crate::partition::{CellID, PackedMultiLevelPartition};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPartition {
    pub level_to_num_cells: Vec<u32>,
    pub partitions: Vec<Vec<CellID>>,
}

impl RawPartition {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        serde_json::from_reader(reader)
            .map_err(|e| PartitionError::Format(format!("invalid raw partition JSON: {e}")))
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)
            .map_err(|e| PartitionError::Format(format!("cannot encode raw partition: {e}")))?;
        writer.flush()?;
        Ok(())
    }

    pub fn num_nodes(&self) -> usize {
        self.partitions.first().map_or(0, Vec::len)
    }

    /// Build the packed index
    pub fn build(&self) -> Result<PackedMultiLevelPartition> {
        PackedMultiLevelPartition::new(&self.partitions, &self.level_to_num_cells)
    }
}
