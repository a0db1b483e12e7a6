use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EngagementConfig;
use crate::error::SimError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Red,
    Blue,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::Red => Side::Blue,
            Side::Blue => Side::Red,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Red => f.write_str("red"),
            Side::Blue => f.write_str("blue"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    RedWin,
    BlueWin,
    Draw,
    Undetermined,
}

/// Why an episode ended. Carried next to the [`Outcome`] because several
/// reasons (fuel, collision, boundary exit) all report a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerminationReason {
    Advantage(Side),
    FuelExhausted,
    Collision,
    BoundaryExit(Side),
}

/// A discrete command set for one kinematics model.
///
/// Every model exposes a neutral command and the two turn commands so that
/// scripted policies can be written once for both models.
pub trait Command: Copy + fmt::Debug + PartialEq + Send + Sync + 'static {
    const MODEL: &'static str;
    const COUNT: u8;
    const HOLD: Self;
    const TURN_LEFT: Self;
    const TURN_RIGHT: Self;

    /// Decode a raw integer command, rejecting anything outside the set.
    fn decode(raw: i64) -> Result<Self, SimError>;

    fn index(self) -> u8;

    /// Command that brings the wings back toward level from `bank_deg`.
    fn leveling(bank_deg: f64) -> Self;
}

/// Planar turn-rate model commands. Discriminants are the wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanarCommand {
    RollLeft = 0,
    Hold = 1,
    RollRight = 2,
}

impl PlanarCommand {
    /// Bank-rate sign: -1 for left, 0 for hold, +1 for right.
    pub fn roll_sign(self) -> f64 {
        self as u8 as f64 - 1.0
    }
}

impl Command for PlanarCommand {
    const MODEL: &'static str = "planar";
    const COUNT: u8 = crate::PLANAR_COMMAND_COUNT;
    const HOLD: Self = PlanarCommand::Hold;
    const TURN_LEFT: Self = PlanarCommand::RollLeft;
    const TURN_RIGHT: Self = PlanarCommand::RollRight;

    fn decode(raw: i64) -> Result<Self, SimError> {
        match raw {
            0 => Ok(PlanarCommand::RollLeft),
            1 => Ok(PlanarCommand::Hold),
            2 => Ok(PlanarCommand::RollRight),
            other => Err(SimError::InvalidCommand {
                model: Self::MODEL,
                command: other,
                count: Self::COUNT,
            }),
        }
    }

    fn index(self) -> u8 {
        self as u8
    }

    fn leveling(bank_deg: f64) -> Self {
        if bank_deg > 0.0 {
            PlanarCommand::RollLeft
        } else if bank_deg < 0.0 {
            PlanarCommand::RollRight
        } else {
            PlanarCommand::Hold
        }
    }
}

/// Energy-maneuverability model commands. Discriminants are the wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ManeuverCommand {
    Hold = 0,
    MaxLeftTurn = 1,
    MaxRightTurn = 2,
    MaxClimb = 3,
    MaxDive = 4,
    MaxAccelerate = 5,
    MaxDecelerate = 6,
}

impl ManeuverCommand {
    pub fn is_turn(self) -> bool {
        matches!(self, ManeuverCommand::MaxLeftTurn | ManeuverCommand::MaxRightTurn)
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, ManeuverCommand::MaxClimb | ManeuverCommand::MaxDive)
    }
}

impl Command for ManeuverCommand {
    const MODEL: &'static str = "energy";
    const COUNT: u8 = crate::ENERGY_COMMAND_COUNT;
    const HOLD: Self = ManeuverCommand::Hold;
    const TURN_LEFT: Self = ManeuverCommand::MaxLeftTurn;
    const TURN_RIGHT: Self = ManeuverCommand::MaxRightTurn;

    fn decode(raw: i64) -> Result<Self, SimError> {
        match raw {
            0 => Ok(ManeuverCommand::Hold),
            1 => Ok(ManeuverCommand::MaxLeftTurn),
            2 => Ok(ManeuverCommand::MaxRightTurn),
            3 => Ok(ManeuverCommand::MaxClimb),
            4 => Ok(ManeuverCommand::MaxDive),
            5 => Ok(ManeuverCommand::MaxAccelerate),
            6 => Ok(ManeuverCommand::MaxDecelerate),
            other => Err(SimError::InvalidCommand {
                model: Self::MODEL,
                command: other,
                count: Self::COUNT,
            }),
        }
    }

    fn index(self) -> u8 {
        self as u8
    }

    // The model rolls back to level on its own under Hold.
    fn leveling(_bank_deg: f64) -> Self {
        ManeuverCommand::Hold
    }
}

/// Agent-visible feature vector produced by a state encoder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub data: Vec<f32>,
}

impl Observation {
    pub fn zeros(len: usize) -> Self {
        Self {
            data: vec![0.0; len],
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Renderer-facing view of one aircraft. Planar aircraft report zero
/// altitude and pitch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AircraftSnapshot {
    pub x: f64,
    pub y: f64,
    pub altitude: f64,
    pub heading: f64,
    pub pitch: f64,
    pub bank: f64,
    pub speed: f64,
    pub fuel: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub step: u32,
    pub red: AircraftSnapshot,
    pub blue: AircraftSnapshot,
    pub advantage_count: i32,
    pub reward_red: f64,
    pub reward_blue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeResult {
    pub outcome: Outcome,
    pub reason: Option<TerminationReason>,
    pub steps: u32,
    pub final_advantage: i32,
    pub return_red: f64,
    pub return_blue: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EpisodeReplay {
    pub config: EngagementConfig,
    pub red_policy: String,
    pub blue_policy: String,
    pub frames: Vec<ReplayFrame>,
    pub result: EpisodeResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_decode_roundtrip() {
        for raw in 0..PlanarCommand::COUNT as i64 {
            let cmd = PlanarCommand::decode(raw).unwrap();
            assert_eq!(cmd.index() as i64, raw);
        }
        assert_eq!(PlanarCommand::RollLeft.roll_sign(), -1.0);
        assert_eq!(PlanarCommand::Hold.roll_sign(), 0.0);
        assert_eq!(PlanarCommand::RollRight.roll_sign(), 1.0);
    }

    #[test]
    fn test_invalid_commands_rejected() {
        assert_eq!(
            PlanarCommand::decode(3),
            Err(SimError::InvalidCommand {
                model: "planar",
                command: 3,
                count: 3
            })
        );
        assert!(PlanarCommand::decode(-1).is_err());
        assert!(ManeuverCommand::decode(7).is_err());
        assert!(ManeuverCommand::decode(i64::MAX).is_err());
    }

    #[test]
    fn test_maneuver_classes() {
        assert!(ManeuverCommand::MaxLeftTurn.is_turn());
        assert!(ManeuverCommand::MaxRightTurn.is_turn());
        assert!(!ManeuverCommand::MaxClimb.is_turn());
        assert!(ManeuverCommand::MaxClimb.is_vertical());
        assert!(ManeuverCommand::MaxDive.is_vertical());
        assert!(!ManeuverCommand::Hold.is_vertical());
    }

    #[test]
    fn test_planar_leveling() {
        assert_eq!(PlanarCommand::leveling(30.0), PlanarCommand::RollLeft);
        assert_eq!(PlanarCommand::leveling(-30.0), PlanarCommand::RollRight);
        assert_eq!(PlanarCommand::leveling(0.0), PlanarCommand::Hold);
    }

    #[test]
    fn test_side_opponent() {
        assert_eq!(Side::Red.opponent(), Side::Blue);
        assert_eq!(Side::Blue.opponent(), Side::Red);
    }
}
