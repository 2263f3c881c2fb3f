//! On-disk formats: raw partitioner output in, packed partition out

pub mod partition_mlp;
pub mod raw_partition;

pub use partition_mlp::PartitionMlpFile;
pub use raw_partition::RawPartition;
