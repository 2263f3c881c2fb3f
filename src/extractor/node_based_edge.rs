//! Node-based edge record produced by extraction
//!
//! Tens of millions of these are held in memory while the graph is built, so
//! the layout is fixed at 28 bytes and checked at compile time.

use std::cmp::Ordering;

use crate::partition::NodeID;

/// Edge weight / duration in deciseconds
pub type EdgeWeight = i32;
pub type LaneDescriptionID = u16;
pub type OsmNodeID = i64;

pub const SPECIAL_NODEID: NodeID = NodeID::MAX;
pub const INVALID_LANE_DESCRIPTIONID: LaneDescriptionID = LaneDescriptionID::MAX;

/// Per-edge flag byte
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EdgeFlags(u8);

impl EdgeFlags {
    pub const FORWARD: u8 = 1 << 0;
    pub const BACKWARD: u8 = 1 << 1;
    pub const ROUNDABOUT: u8 = 1 << 2;
    pub const CIRCULAR: u8 = 1 << 3;
    pub const STARTPOINT: u8 = 1 << 4;
    pub const LOCAL_ACCESS_ONLY: u8 = 1 << 5;
    pub const IS_SPLIT: u8 = 1 << 6;

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    #[inline]
    pub const fn contains(self, flag: u8) -> bool {
        self.0 & flag == flag
    }

    #[inline]
    pub fn set(&mut self, flag: u8, value: bool) {
        if value {
            self.0 |= flag;
        } else {
            self.0 &= !flag;
        }
    }
}

/// Travel mode tag (fits in 4 bits)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TravelMode {
    #[default]
    Inaccessible = 0,
    Driving = 1,
    Cycling = 2,
    Walking = 3,
    Ferry = 4,
    Train = 5,
    PushingBike = 6,
    StepsUp = 8,
    StepsDown = 9,
    RiverUp = 10,
    RiverDown = 11,
    Route = 12,
}

/// Road class packed into 16 bits:
/// bits 0-4 priority, bit 5 motorway, bit 6 link, bit 7 low priority,
/// bits 8-11 number of lanes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoadClassification(u16);

impl RoadClassification {
    const PRIORITY_MASK: u16 = 0x1F;
    const MOTORWAY: u16 = 1 << 5;
    const LINK: u16 = 1 << 6;
    const LOW_PRIORITY: u16 = 1 << 7;
    const LANES_SHIFT: u16 = 8;
    const LANES_MASK: u16 = 0xF << Self::LANES_SHIFT;

    pub fn new(priority: u8, motorway: bool, link: bool, low_priority: bool, lanes: u8) -> Self {
        let mut bits = priority as u16 & Self::PRIORITY_MASK;
        if motorway {
            bits |= Self::MOTORWAY;
        }
        if link {
            bits |= Self::LINK;
        }
        if low_priority {
            bits |= Self::LOW_PRIORITY;
        }
        bits |= ((lanes.min(15) as u16) << Self::LANES_SHIFT) & Self::LANES_MASK;
        Self(bits)
    }

    pub fn priority(self) -> u8 {
        (self.0 & Self::PRIORITY_MASK) as u8
    }

    pub fn is_motorway(self) -> bool {
        self.0 & Self::MOTORWAY != 0
    }

    pub fn is_link(self) -> bool {
        self.0 & Self::LINK != 0
    }

    pub fn is_low_priority(self) -> bool {
        self.0 & Self::LOW_PRIORITY != 0
    }

    pub fn lanes(self) -> u8 {
        ((self.0 & Self::LANES_MASK) >> Self::LANES_SHIFT) as u8
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct NodeBasedEdge {
    pub source: NodeID,
    pub target: NodeID,
    pub name_id: u32,
    pub weight: EdgeWeight,
    pub duration: EdgeWeight,
    pub flags: EdgeFlags,
    pub travel_mode: TravelMode,
    pub lane_description_id: LaneDescriptionID,
    pub road_classification: RoadClassification,
}

const _: () = assert!(
    std::mem::size_of::<NodeBasedEdge>() == 28,
    "NodeBasedEdge grew beyond 28 bytes, this multiplies into graph memory"
);

impl Default for NodeBasedEdge {
    fn default() -> Self {
        Self {
            source: SPECIAL_NODEID,
            target: SPECIAL_NODEID,
            name_id: 0,
            weight: 0,
            duration: 0,
            flags: EdgeFlags::from_bits(EdgeFlags::STARTPOINT),
            travel_mode: TravelMode::Inaccessible,
            lane_description_id: INVALID_LANE_DESCRIPTIONID,
            road_classification: RoadClassification::default(),
        }
    }
}

impl NodeBasedEdge {
    pub fn new(
        source: NodeID,
        target: NodeID,
        weight: EdgeWeight,
        duration: EdgeWeight,
        forward: bool,
        backward: bool,
    ) -> Self {
        let mut edge = Self {
            source,
            target,
            weight,
            duration,
            ..Self::default()
        };
        edge.flags.set(EdgeFlags::FORWARD, forward);
        edge.flags.set(EdgeFlags::BACKWARD, backward);
        edge
    }

    pub fn is_forward(&self) -> bool {
        self.flags.contains(EdgeFlags::FORWARD)
    }

    pub fn is_backward(&self) -> bool {
        self.flags.contains(EdgeFlags::BACKWARD)
    }

    pub fn is_bidirectional(&self) -> bool {
        self.is_forward() && self.is_backward()
    }

    pub fn is_roundabout(&self) -> bool {
        self.flags.contains(EdgeFlags::ROUNDABOUT)
    }

    pub fn is_local_access_only(&self) -> bool {
        self.flags.contains(EdgeFlags::LOCAL_ACCESS_ONLY)
    }

    /// Order by `(source, target, weight)`; among otherwise equal edges one
    /// usable in both directions sorts before a one-way edge, so deduplication
    /// keeps the more general edge.
    pub fn canonical_cmp(&self, other: &Self) -> Ordering {
        self.source
            .cmp(&other.source)
            .then(self.target.cmp(&other.target))
            .then(self.weight.cmp(&other.weight))
            .then_with(|| other.is_bidirectional().cmp(&self.is_bidirectional()))
    }
}

/// Sort edges into canonical order
pub fn sort_edges(edges: &mut [NodeBasedEdge]) {
    edges.sort_by(NodeBasedEdge::canonical_cmp);
}

/// Number of nodes referenced by `edges` (highest node id + 1)
pub fn num_nodes(edges: &[NodeBasedEdge]) -> usize {
    edges
        .iter()
        .flat_map(|e| [e.source, e.target])
        .filter(|&n| n != SPECIAL_NODEID)
        .max()
        .map_or(0, |max| max as usize + 1)
}

/// Edge still keyed by OSM node ids; `edge.source`/`edge.target` stay
/// `SPECIAL_NODEID` until the nodes are renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeBasedEdgeWithOsm {
    pub edge: NodeBasedEdge,
    pub osm_source_id: OsmNodeID,
    pub osm_target_id: OsmNodeID,
}

impl NodeBasedEdgeWithOsm {
    pub fn new(osm_source_id: OsmNodeID, osm_target_id: OsmNodeID, mut edge: NodeBasedEdge) -> Self {
        edge.source = SPECIAL_NODEID;
        edge.target = SPECIAL_NODEID;
        Self {
            edge,
            osm_source_id,
            osm_target_id,
        }
    }

    /// Resolve OSM ids to dense node ids
    pub fn renumber<F>(&self, mut lookup: F) -> Option<NodeBasedEdge>
    where
        F: FnMut(OsmNodeID) -> Option<NodeID>,
    {
        let mut edge = self.edge;
        edge.source = lookup(self.osm_source_id)?;
        edge.target = lookup(self.osm_target_id)?;
        Some(edge)
    }
}
