use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::SimError;

/// Which kinematics model both aircraft fly in an engagement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Planar,
    Energy,
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "planar" => Ok(ModelKind::Planar),
            "energy" => Ok(ModelKind::Energy),
            other => Err(format!("unknown model '{other}' (expected planar or energy)")),
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Planar => f.write_str("planar"),
            ModelKind::Energy => f.write_str("energy"),
        }
    }
}

/// Initial posture layouts for `reset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioMode {
    Random,
    /// Blue starts in Red's rear quarter.
    Offense,
    /// Red starts in Blue's rear quarter.
    Defense,
    /// Line abreast, same heading.
    CoHeading,
    /// Line abreast, opposite headings.
    Neutral,
}

impl FromStr for ScenarioMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "random" => Ok(ScenarioMode::Random),
            "offense" => Ok(ScenarioMode::Offense),
            "defense" => Ok(ScenarioMode::Defense),
            "co_heading" | "co-heading" => Ok(ScenarioMode::CoHeading),
            "neutral" => Ok(ScenarioMode::Neutral),
            other => Err(format!(
                "unknown scenario '{other}' (expected random, offense, defense, co_heading or neutral)"
            )),
        }
    }
}

/// When a pitch/roll sign reversal inside one micro-step snaps the angle
/// back to zero.
///
/// `Unconditional` reproduces the legacy behaviour, whose guard condition
/// was always true. `ExemptCommandedAxis` skips the snap while the command
/// is actively driving that axis (climb/dive for pitch, left/right for roll).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebiasRule {
    #[default]
    Unconditional,
    ExemptCommandedAxis,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanarConfig {
    /// Macro step duration, seconds.
    pub macro_step: f64,
    pub micro_steps: u32,
    /// Bank-angle rate, deg/s.
    pub roll_rate: f64,
    pub bank_angle_max: f64,
    pub speed: f64,
}

impl Default for PlanarConfig {
    fn default() -> Self {
        Self {
            macro_step: PLANAR_MACRO_STEP,
            micro_steps: PLANAR_MICRO_STEPS,
            roll_rate: PLANAR_ROLL_RATE,
            bank_angle_max: PLANAR_BANK_ANGLE_MAX,
            speed: PLANAR_SPEED,
        }
    }
}

impl PlanarConfig {
    pub fn micro_step(&self) -> f64 {
        self.macro_step / self.micro_steps as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnergyConfig {
    /// Micro step duration, seconds.
    pub micro_step: f64,
    pub micro_steps: u32,
    pub initial_speed: f64,
    pub speed_min: f64,
    pub speed_max: f64,
    pub initial_altitude: f64,
    pub altitude_min: f64,
    pub altitude_max: f64,
    /// Hard |x|, |y| envelope checked before integrating.
    pub horizontal_limit: f64,
    pub pitch_max: f64,
    pub roll_max: f64,
    /// Roll rate, deg/s.
    pub roll_rate: f64,
    pub max_normal_load: f64,
    pub max_tangential_load: f64,
    pub debias: DebiasRule,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            micro_step: ENERGY_MICRO_STEP,
            micro_steps: ENERGY_MICRO_STEPS,
            initial_speed: ENERGY_INITIAL_SPEED,
            speed_min: ENERGY_SPEED_MIN,
            speed_max: ENERGY_SPEED_MAX,
            initial_altitude: ENERGY_INITIAL_ALTITUDE,
            altitude_min: ENERGY_ALTITUDE_MIN,
            altitude_max: ENERGY_ALTITUDE_MAX,
            horizontal_limit: ENERGY_HORIZONTAL_LIMIT,
            pitch_max: ENERGY_PITCH_MAX,
            roll_max: ENERGY_ROLL_MAX,
            roll_rate: ENERGY_ROLL_RATE,
            max_normal_load: ENERGY_MAX_NORMAL_LOAD,
            max_tangential_load: ENERGY_MAX_TANGENTIAL_LOAD,
            debias: DebiasRule::default(),
        }
    }
}

/// The geometric envelope a side must hold on its opponent to accrue
/// advantage, and the streak length that wins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvantageConfig {
    pub range_min: f64,
    pub range_max: f64,
    pub aspect_angle_max: f64,
    pub antenna_train_angle_max: f64,
    pub win_threshold: i32,
}

impl Default for AdvantageConfig {
    fn default() -> Self {
        Self {
            range_min: RANGE_MIN,
            range_max: RANGE_MAX,
            aspect_angle_max: ASPECT_ANGLE_MAX,
            antenna_train_angle_max: ANTENNA_TRAIN_ANGLE_MAX,
            win_threshold: ADVANTAGE_WIN_THRESHOLD,
        }
    }
}

impl AdvantageConfig {
    pub fn range_mid(&self) -> f64 {
        (self.range_max + self.range_min) / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShapingConfig {
    /// `c` in `phi = -c * RA * RD`.
    pub potential_scale: f64,
    /// `k` in `RD = exp(-|d - d_mid| / k)`, metres.
    pub distance_scale: f64,
    /// Per-step penalty subtracted from every shaped reward.
    pub time_cost: f64,
}

impl Default for ShapingConfig {
    fn default() -> Self {
        Self {
            potential_scale: POTENTIAL_SCALE,
            distance_scale: DISTANCE_SCALE,
            time_cost: TIME_COST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerminalRewards {
    pub win: f64,
    pub loss: f64,
    pub draw: f64,
    pub boundary: f64,
}

impl Default for TerminalRewards {
    fn default() -> Self {
        Self {
            win: REWARD_WIN,
            loss: REWARD_LOSS,
            draw: REWARD_DRAW,
            boundary: REWARD_BOUNDARY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    pub mode: ScenarioMode,
    /// Jitter red's nominal posture. Ignored in `Random` mode, which
    /// already draws both sides.
    pub randomize_red: bool,
    /// Same as `randomize_red`, for blue.
    pub randomize_blue: bool,
    /// Lateral spacing for line-abreast layouts.
    pub separation: f64,
    /// Nose-to-tail spacing for offense/defense layouts.
    pub trail_distance: f64,
    /// Half-width of the square random spawns are drawn from.
    pub spawn_half_extent: f64,
    pub position_jitter: f64,
    pub heading_jitter: f64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            mode: ScenarioMode::Neutral,
            randomize_red: false,
            randomize_blue: false,
            separation: SCENARIO_SEPARATION,
            trail_distance: SCENARIO_TRAIL_DISTANCE,
            spawn_half_extent: SCENARIO_SPAWN_HALF_EXTENT,
            position_jitter: SCENARIO_POSITION_JITTER,
            heading_jitter: SCENARIO_HEADING_JITTER,
        }
    }
}

/// Everything an engagement needs, fixed at construction time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementConfig {
    pub model: ModelKind,
    pub seed: u64,
    pub gravity: f64,
    pub map_half_extent: f64,
    pub fuel_budget: i32,
    pub planar: PlanarConfig,
    pub energy: EnergyConfig,
    pub advantage: AdvantageConfig,
    pub shaping: ShapingConfig,
    pub rewards: TerminalRewards,
    pub scenario: ScenarioConfig,
}

impl Default for EngagementConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Planar,
            seed: 0,
            gravity: GRAVITY,
            map_half_extent: MAP_HALF_EXTENT,
            fuel_budget: FUEL_BUDGET,
            planar: PlanarConfig::default(),
            energy: EnergyConfig::default(),
            advantage: AdvantageConfig::default(),
            shaping: ShapingConfig::default(),
            rewards: TerminalRewards::default(),
            scenario: ScenarioConfig::default(),
        }
    }
}

fn require(ok: bool, msg: &str) -> Result<(), SimError> {
    if ok {
        Ok(())
    } else {
        Err(SimError::InvalidConfig(msg.to_string()))
    }
}

impl ShapingConfig {
    /// Checked at construction and again on every runtime override.
    pub fn validate(&self) -> Result<(), SimError> {
        require(
            self.distance_scale > 0.0 && self.distance_scale.is_finite(),
            "shaping.distance_scale must be positive",
        )?;
        require(
            (0.0..f64::INFINITY).contains(&self.potential_scale)
                && (0.0..f64::INFINITY).contains(&self.time_cost),
            "shaping constants must be finite and non-negative",
        )
    }
}

impl EngagementConfig {
    pub fn with_model(model: ModelKind) -> Self {
        Self {
            model,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), SimError> {
        require(self.gravity > 0.0, "gravity must be positive")?;
        require(self.map_half_extent > 0.0, "map_half_extent must be positive")?;
        require(self.fuel_budget > 0, "fuel_budget must be positive")?;

        let p = &self.planar;
        require(p.macro_step > 0.0, "planar.macro_step must be positive")?;
        require(p.micro_steps > 0, "planar.micro_steps must be at least 1")?;
        require(p.speed > 0.0, "planar.speed must be positive")?;
        require(
            p.bank_angle_max > 0.0 && p.bank_angle_max < 90.0,
            "planar.bank_angle_max must lie in (0, 90)",
        )?;

        let e = &self.energy;
        require(e.micro_step > 0.0, "energy.micro_step must be positive")?;
        require(e.micro_steps > 0, "energy.micro_steps must be at least 1")?;
        require(
            e.speed_min > 0.0 && e.speed_min < e.speed_max,
            "energy speed envelope must satisfy 0 < speed_min < speed_max",
        )?;
        require(
            (e.speed_min..=e.speed_max).contains(&e.initial_speed),
            "energy.initial_speed must lie inside the speed envelope",
        )?;
        require(
            e.altitude_min < e.altitude_max
                && (e.altitude_min..=e.altitude_max).contains(&e.initial_altitude),
            "energy.initial_altitude must lie inside the altitude envelope",
        )?;
        require(e.horizontal_limit > 0.0, "energy.horizontal_limit must be positive")?;
        require(
            e.pitch_max > 0.0 && e.pitch_max <= 180.0,
            "energy.pitch_max must lie in (0, 180]",
        )?;
        require(e.roll_max > 0.0, "energy.roll_max must be positive")?;
        require(e.max_normal_load >= 1.0, "energy.max_normal_load must be at least 1")?;

        let a = &self.advantage;
        require(
            a.range_min >= 0.0 && a.range_min < a.range_max,
            "advantage range must satisfy 0 <= range_min < range_max",
        )?;
        require(a.win_threshold > 0, "advantage.win_threshold must be positive")?;

        self.shaping.validate()?;

        let s = &self.scenario;
        require(
            s.separation > 0.0 && s.trail_distance > 0.0,
            "scenario spacing must be positive",
        )?;
        require(
            s.spawn_half_extent > 0.0 && s.spawn_half_extent < self.map_half_extent,
            "scenario.spawn_half_extent must lie inside the map",
        )?;
        Ok(())
    }
}
