//! Turn record handed to cost assignment
//!
//! Geometry and classification are fixed when the turn is created; weight,
//! duration and the access flags are filled in by the cost passes before the
//! graph is frozen.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TurnType {
    Invalid,
    NewName,
    Continue,
    Turn,
    Merge,
    OnRamp,
    OffRamp,
    Fork,
    EndOfRoad,
    Notification,
    EnterRoundabout,
    EnterAndExitRoundabout,
    EnterRotary,
    EnterAndExitRotary,
    ExitRoundabout,
    ExitRotary,
    Suppressed,
    Sliproad,
    NoTurn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectionModifier {
    UTurn,
    SharpRight,
    Right,
    SlightRight,
    Straight,
    SlightLeft,
    Left,
    SharpLeft,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnInstruction {
    pub turn_type: TurnType,
    pub direction_modifier: DirectionModifier,
}

/// Outgoing road at an intersection as seen by the guidance classifier.
///
/// `angle` is measured from the incoming road: 180° is straight on,
/// 0°/360° a u-turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectedRoad {
    pub angle: f64,
    pub instruction: TurnInstruction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionTurn {
    angle: f64,
    turn_type: TurnType,
    direction_modifier: DirectionModifier,
    has_traffic_light: bool,
    pub weight: f64,
    pub duration: f64,
    pub source_local_access_only: bool,
    pub target_local_access_only: bool,
}

impl ExtractionTurn {
    pub fn new(turn: &ConnectedRoad, has_traffic_light: bool) -> Self {
        Self {
            // 0 is straight on, positive turns left of the heading
            angle: 180.0 - turn.angle,
            turn_type: turn.instruction.turn_type,
            direction_modifier: turn.instruction.direction_modifier,
            has_traffic_light,
            weight: 0.0,
            duration: 0.0,
            source_local_access_only: false,
            target_local_access_only: false,
        }
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn turn_type(&self) -> TurnType {
        self.turn_type
    }

    pub fn direction_modifier(&self) -> DirectionModifier {
        self.direction_modifier
    }

    pub fn has_traffic_light(&self) -> bool {
        self.has_traffic_light
    }

    pub fn is_u_turn(&self) -> bool {
        self.direction_modifier == DirectionModifier::UTurn
    }
}
