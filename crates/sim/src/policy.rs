use std::fmt;
use std::str::FromStr;

use aircombat_shared::{Command, Observation};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};

pub trait Policy<C: Command>: Send {
    fn name(&self) -> &str;
    fn act(&mut self, obs: &Observation) -> C;
}

/// Always flies the neutral command.
pub struct HoldPolicy;

impl<C: Command> Policy<C> for HoldPolicy {
    fn name(&self) -> &str {
        "hold"
    }

    fn act(&mut self, _obs: &Observation) -> C {
        C::HOLD
    }
}

/// Uniformly random commands from a seeded stream.
pub struct RandomPolicy {
    rng: Pcg64,
}

impl RandomPolicy {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg64::seed_from_u64(seed),
        }
    }
}

impl<C: Command> Policy<C> for RandomPolicy {
    fn name(&self) -> &str {
        "random"
    }

    fn act(&mut self, _obs: &Observation) -> C {
        let raw = self.rng.gen_range(0..C::COUNT);
        C::decode(raw as i64).unwrap_or(C::HOLD)
    }
}

const OWN_BANK: usize = 4;
const OFF_NOSE_SIN: usize = 13;
const OFF_NOSE_COS: usize = 14;

/// Turns toward the opponent until it is within `deadband` of the nose,
/// then rolls wings level.
pub struct PursuitPolicy {
    deadband: f32,
}

impl PursuitPolicy {
    /// sin of 5 degrees.
    pub const DEFAULT_DEADBAND: f32 = 0.087;

    pub fn new() -> Self {
        Self {
            deadband: Self::DEFAULT_DEADBAND,
        }
    }
}

impl Default for PursuitPolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Command> Policy<C> for PursuitPolicy {
    fn name(&self) -> &str {
        "pursuit"
    }

    /// Reads the off-nose and bank features of `RelativeGeometryEncoder`.
    /// Observations too narrow to carry them get the neutral command.
    fn act(&mut self, obs: &Observation) -> C {
        let (Some(&off_nose), Some(&off_nose_cos), Some(&bank)) = (
            obs.data.get(OFF_NOSE_SIN),
            obs.data.get(OFF_NOSE_COS),
            obs.data.get(OWN_BANK),
        ) else {
            return C::HOLD;
        };
        let ahead = off_nose_cos > 0.0;
        if ahead && off_nose.abs() < self.deadband {
            return C::leveling(bank as f64 * aircombat_shared::OBS_NORM_BANK);
        }
        if off_nose >= 0.0 {
            C::TURN_LEFT
        } else {
            C::TURN_RIGHT
        }
    }
}

/// Scripted policies selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
    Hold,
    Random,
    Pursuit,
}

impl PolicyKind {
    pub const ALL: [PolicyKind; 3] = [PolicyKind::Hold, PolicyKind::Random, PolicyKind::Pursuit];

    pub fn build<C: Command>(self, seed: u64) -> Box<dyn Policy<C>> {
        match self {
            PolicyKind::Hold => Box::new(HoldPolicy),
            PolicyKind::Random => Box::new(RandomPolicy::new(seed)),
            PolicyKind::Pursuit => Box::new(PursuitPolicy::new()),
        }
    }
}

impl fmt::Display for PolicyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PolicyKind::Hold => "hold",
            PolicyKind::Random => "random",
            PolicyKind::Pursuit => "pursuit",
        };
        f.write_str(name)
    }
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hold" => Ok(PolicyKind::Hold),
            "random" => Ok(PolicyKind::Random),
            "pursuit" => Ok(PolicyKind::Pursuit),
            other => Err(format!(
                "unknown policy '{other}'. Available: hold, random, pursuit"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aircombat_shared::{ManeuverCommand, PlanarCommand, OBS_SIZE};

    fn obs_with(off_nose_sin: f32, off_nose_cos: f32, bank_norm: f32) -> Observation {
        let mut obs = Observation::zeros(OBS_SIZE);
        obs.data[13] = off_nose_sin;
        obs.data[14] = off_nose_cos;
        obs.data[4] = bank_norm;
        obs
    }

    #[test]
    fn test_pursuit_turns_toward_opponent() {
        let mut p = PursuitPolicy::new();
        let left: PlanarCommand = p.act(&obs_with(0.5, 0.86, 0.0));
        let right: PlanarCommand = p.act(&obs_with(-0.5, 0.86, 0.0));
        assert_eq!(left, PlanarCommand::RollLeft);
        assert_eq!(right, PlanarCommand::RollRight);

        let energy: ManeuverCommand = p.act(&obs_with(-0.5, 0.86, 0.0));
        assert_eq!(energy, ManeuverCommand::MaxRightTurn);
    }

    #[test]
    fn test_pursuit_levels_when_on_nose() {
        let mut p = PursuitPolicy::new();
        let cmd: PlanarCommand = p.act(&obs_with(0.01, 1.0, 0.3));
        assert_eq!(cmd, PlanarCommand::RollLeft);
        let cmd: PlanarCommand = p.act(&obs_with(0.01, 1.0, 0.0));
        assert_eq!(cmd, PlanarCommand::Hold);
    }

    #[test]
    fn test_pursuit_turns_when_opponent_dead_astern() {
        let mut p = PursuitPolicy::new();
        let cmd: PlanarCommand = p.act(&obs_with(0.0, -1.0, 0.0));
        assert_eq!(cmd, PlanarCommand::RollLeft);
    }

    #[test]
    fn test_pursuit_holds_on_narrow_observation() {
        let mut p = PursuitPolicy::new();
        let planar: PlanarCommand = p.act(&Observation::zeros(2));
        let energy: ManeuverCommand = p.act(&Observation::zeros(0));
        assert_eq!(planar, PlanarCommand::Hold);
        assert_eq!(energy, ManeuverCommand::Hold);
    }

    #[test]
    fn test_random_policy_is_seeded() {
        let obs = Observation::zeros(OBS_SIZE);
        let mut a = RandomPolicy::new(5);
        let mut b = RandomPolicy::new(5);
        let xs: Vec<ManeuverCommand> = (0..50).map(|_| a.act(&obs)).collect();
        let ys: Vec<ManeuverCommand> = (0..50).map(|_| b.act(&obs)).collect();
        assert_eq!(xs, ys);
        assert!(xs.iter().any(|c| *c != xs[0]));
    }

    #[test]
    fn test_policy_kind_parse() {
        for kind in PolicyKind::ALL {
            assert_eq!(kind.to_string().parse::<PolicyKind>(), Ok(kind));
            let policy = kind.build::<PlanarCommand>(0);
            assert_eq!(policy.name(), kind.to_string());
        }
        assert!("ace".parse::<PolicyKind>().is_err());
    }
}
