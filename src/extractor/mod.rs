//! Extraction records consumed upstream of the partition index.
//!
//! The index itself only sees the node ids these records define.

pub mod extraction_turn;
pub mod node_based_edge;

pub use extraction_turn::{ConnectedRoad, DirectionModifier, ExtractionTurn, TurnInstruction, TurnType};
pub use node_based_edge::{
    num_nodes, sort_edges, EdgeFlags, EdgeWeight, NodeBasedEdge, NodeBasedEdgeWithOsm, RoadClassification,
    TravelMode, SPECIAL_NODEID,
};
