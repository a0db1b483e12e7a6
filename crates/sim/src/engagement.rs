use aircombat_shared::*;
use tracing::{debug, trace, warn};

use crate::advantage::AdvantageTracker;
use crate::geometry::Geometry;
use crate::kinematics::{Airframe, EnergyManeuverModel, Kinematics, PlanarTurnModel};
use crate::observation::{RelativeGeometryEncoder, StateEncoder};
use crate::reward::RewardShaper;
use crate::scenario::{PostureInitializer, ScenarioInitializer};

/// Everything that changes during one episode.
#[derive(Debug, Clone)]
pub struct EngagementState<S> {
    pub red: S,
    pub blue: S,
    /// Positive: blue holds the advantage. Negative: red.
    pub advantage_count: i32,
    pub potential_red: f64,
    pub potential_blue: f64,
    pub done: bool,
    pub outcome: Outcome,
    pub reason: Option<TerminationReason>,
    /// Macro steps taken since reset.
    pub step: u32,
}

/// Result of one macro step.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub obs_red: Observation,
    pub obs_blue: Observation,
    pub reward_blue: f64,
    pub reward_red: f64,
    pub done: bool,
    pub outcome: Outcome,
    pub reason: Option<TerminationReason>,
}

/// Caller-owned per-step record, filled by [`Engagement::step_traced`].
#[derive(Debug, Clone, Default)]
pub struct EpisodeTrace {
    pub advantages: Vec<i32>,
    /// `[blue, red]` wire values.
    pub commands: Vec<[u8; 2]>,
}

impl EpisodeTrace {
    pub fn clear(&mut self) {
        self.advantages.clear();
        self.commands.clear();
    }
}

/// Facts the termination rules look at after a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerminationInputs {
    pub winner: Option<Side>,
    pub fuel_red: i32,
    pub fuel_blue: i32,
    /// Aircraft effectively coincident.
    pub collision: bool,
    /// Outside the map or the kinematic envelope.
    pub blue_out: bool,
    pub red_out: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Verdict {
    pub done: bool,
    pub outcome: Outcome,
    pub reason: Option<TerminationReason>,
    pub reward_red: f64,
    pub reward_blue: f64,
}

/// Apply the termination rules in priority order. The first matching rule
/// decides both the outcome and the rewards; otherwise both sides get their
/// shaped reward.
pub fn judge(
    inputs: &TerminationInputs,
    shaped_red: f64,
    shaped_blue: f64,
    rewards: &TerminalRewards,
) -> Verdict {
    let end = |outcome, reason, reward_red, reward_blue| Verdict {
        done: true,
        outcome,
        reason: Some(reason),
        reward_red,
        reward_blue,
    };

    match inputs.winner {
        Some(Side::Blue) => {
            return end(
                Outcome::BlueWin,
                TerminationReason::Advantage(Side::Blue),
                rewards.loss,
                rewards.win,
            )
        }
        Some(Side::Red) => {
            return end(
                Outcome::RedWin,
                TerminationReason::Advantage(Side::Red),
                rewards.win,
                rewards.loss,
            )
        }
        None => {}
    }

    if inputs.fuel_red <= 0 && inputs.fuel_blue <= 0 {
        return end(
            Outcome::Draw,
            TerminationReason::FuelExhausted,
            rewards.draw,
            rewards.draw,
        );
    }
    if inputs.collision {
        return end(
            Outcome::Draw,
            TerminationReason::Collision,
            rewards.draw,
            rewards.draw,
        );
    }
    if inputs.blue_out {
        return end(
            Outcome::Draw,
            TerminationReason::BoundaryExit(Side::Blue),
            shaped_red,
            rewards.boundary,
        );
    }
    if inputs.red_out {
        return end(
            Outcome::Draw,
            TerminationReason::BoundaryExit(Side::Red),
            rewards.boundary,
            shaped_blue,
        );
    }

    Verdict {
        done: false,
        outcome: Outcome::Undetermined,
        reason: None,
        reward_red: shaped_red,
        reward_blue: shaped_blue,
    }
}

/// One red-versus-blue episode driver, generic over the kinematics model,
/// the scenario initializer and the observation encoder.
pub struct Engagement<K: Kinematics, P = ScenarioInitializer, E = RelativeGeometryEncoder> {
    config: EngagementConfig,
    model: K,
    initializer: P,
    encoder: E,
    tracker: AdvantageTracker,
    shaper: RewardShaper,
    state: EngagementState<K::State>,
}

impl<K: Kinematics> Engagement<K> {
    /// Validate `config` and build an engagement with the default scenario
    /// initializer and encoder. The episode is already reset.
    pub fn new(config: EngagementConfig) -> Result<Self, SimError> {
        config.validate()?;
        let initializer = ScenarioInitializer::new(config.scenario, config.seed);
        let encoder = RelativeGeometryEncoder::from_config(&config);
        Self::with_parts(config, initializer, encoder)
    }
}

impl<K, P, E> Engagement<K, P, E>
where
    K: Kinematics,
    P: PostureInitializer,
    E: StateEncoder,
{
    pub fn with_parts(config: EngagementConfig, initializer: P, encoder: E) -> Result<Self, SimError> {
        config.validate()?;
        let model = K::from_config(&config);
        let state = EngagementState {
            red: model.spawn(),
            blue: model.spawn(),
            advantage_count: 0,
            potential_red: 0.0,
            potential_blue: 0.0,
            done: false,
            outcome: Outcome::Undetermined,
            reason: None,
            step: 0,
        };
        let mut engagement = Self {
            tracker: AdvantageTracker::new(config.advantage),
            shaper: RewardShaper::new(config.shaping, &config.advantage),
            config,
            model,
            initializer,
            encoder,
            state,
        };
        engagement.reset();
        Ok(engagement)
    }

    pub fn config(&self) -> &EngagementConfig {
        &self.config
    }

    pub fn state(&self) -> &EngagementState<K::State> {
        &self.state
    }

    pub fn model(&self) -> &K {
        &self.model
    }

    pub fn encoder(&self) -> &E {
        &self.encoder
    }

    /// Replace the shaping constants. Takes effect on the next step; the
    /// retained potentials are recomputed so the next reward stays a pure
    /// difference under the new constants. Rejected constants leave the
    /// engagement untouched.
    pub fn set_shaping(&mut self, shaping: ShapingConfig) -> Result<(), SimError> {
        shaping.validate()?;
        self.config.shaping = shaping;
        self.shaper.set_config(shaping);
        let geometry = Geometry::of(&self.state.red, &self.state.blue);
        let (red, blue) = self.shaper.potentials(&geometry);
        self.state.potential_red = red;
        self.state.potential_blue = blue;
        Ok(())
    }

    /// Start a new episode and return `(obs_red, obs_blue)`.
    pub fn reset(&mut self) -> (Observation, Observation) {
        let mut red = self.model.spawn();
        let mut blue = self.model.spawn();
        let scenario = self.config.scenario;
        self.initializer.initialize(
            scenario.mode,
            &mut red,
            &mut blue,
            scenario.randomize_red,
            scenario.randomize_blue,
        );
        red.refuel(self.config.fuel_budget);
        blue.refuel(self.config.fuel_budget);

        self.tracker.reset();
        let geometry = Geometry::of(&red, &blue);
        let (potential_red, potential_blue) = self.shaper.potentials(&geometry);

        debug!(
            mode = ?scenario.mode,
            range = geometry.range,
            potential_red,
            potential_blue,
            "engagement reset"
        );

        self.state = EngagementState {
            red,
            blue,
            advantage_count: 0,
            potential_red,
            potential_blue,
            done: false,
            outcome: Outcome::Undetermined,
            reason: None,
            step: 0,
        };
        self.observe()
    }

    pub fn reset_with_seed(&mut self, seed: u64) -> (Observation, Observation) {
        self.initializer.reseed(seed);
        self.reset()
    }

    /// `(obs_red, obs_blue)` for the current state.
    pub fn observe(&self) -> (Observation, Observation) {
        let s = &self.state;
        (
            self.encoder.encode(&s.red, &s.blue, s.advantage_count),
            self.encoder.encode(&s.blue, &s.red, s.advantage_count),
        )
    }

    /// Decode raw wire commands without touching the engagement.
    pub fn decode_commands(blue: i64, red: i64) -> Result<(K::Command, K::Command), SimError> {
        Ok((K::Command::decode(blue)?, K::Command::decode(red)?))
    }

    /// Decode raw wire commands and step.
    pub fn step_raw(&mut self, blue: i64, red: i64) -> Result<StepOutcome, SimError> {
        let (blue, red) = Self::decode_commands(blue, red)?;
        self.step(blue, red)
    }

    pub fn step_traced(
        &mut self,
        blue: K::Command,
        red: K::Command,
        trace: &mut EpisodeTrace,
    ) -> Result<StepOutcome, SimError> {
        let outcome = self.step(blue, red)?;
        trace.advantages.push(self.state.advantage_count);
        trace.commands.push([blue.index(), red.index()]);
        Ok(outcome)
    }

    /// Advance both aircraft by one macro step (blue first) and score it.
    pub fn step(&mut self, blue: K::Command, red: K::Command) -> Result<StepOutcome, SimError> {
        if self.state.done {
            return Err(SimError::EpisodeFinished);
        }

        let blue_violation = self.advance(Side::Blue, blue)?;
        let red_violation = self.advance(Side::Red, red)?;
        if !K::METERS_FUEL {
            self.state.blue.burn_fuel();
            self.state.red.burn_fuel();
        }
        self.state.step += 1;

        let geometry = Geometry::of(&self.state.red, &self.state.blue);
        self.state.advantage_count = self.tracker.update(&geometry);

        let (potential_red, potential_blue) = self.shaper.potentials(&geometry);
        let shaped_red = self.shaper.shaped(self.state.potential_red, potential_red);
        let shaped_blue = self.shaper.shaped(self.state.potential_blue, potential_blue);
        self.state.potential_red = potential_red;
        self.state.potential_blue = potential_blue;

        let inputs = TerminationInputs {
            winner: self.tracker.winner(),
            fuel_red: self.state.red.fuel(),
            fuel_blue: self.state.blue.fuel(),
            collision: geometry.degenerate,
            blue_out: blue_violation || self.out_of_map(&self.state.blue),
            red_out: red_violation || self.out_of_map(&self.state.red),
        };
        let verdict = judge(&inputs, shaped_red, shaped_blue, &self.config.rewards);

        trace!(
            step = self.state.step,
            range = geometry.range,
            advantage = self.state.advantage_count,
            reward_red = verdict.reward_red,
            reward_blue = verdict.reward_blue,
            "step"
        );

        if verdict.done {
            self.state.done = true;
            self.state.outcome = verdict.outcome;
            self.state.reason = verdict.reason;
            debug!(
                step = self.state.step,
                outcome = ?verdict.outcome,
                reason = ?verdict.reason,
                "engagement terminated"
            );
        }

        let (obs_red, obs_blue) = self.observe();
        Ok(StepOutcome {
            obs_red,
            obs_blue,
            reward_blue: verdict.reward_blue,
            reward_red: verdict.reward_red,
            done: verdict.done,
            outcome: self.state.outcome,
            reason: self.state.reason,
        })
    }

    /// Returns true when the aircraft was already outside its kinematic
    /// envelope and could not be advanced.
    fn advance(&mut self, side: Side, command: K::Command) -> Result<bool, SimError> {
        let aircraft = match side {
            Side::Red => &mut self.state.red,
            Side::Blue => &mut self.state.blue,
        };
        match self.model.advance(aircraft, command) {
            Ok(()) => Ok(false),
            Err(err @ SimError::BoundaryViolation { .. }) => {
                warn!(%side, step = self.state.step, %err, "envelope violation");
                Ok(true)
            }
            Err(err) => Err(err),
        }
    }

    fn out_of_map(&self, aircraft: &K::State) -> bool {
        let p = aircraft.position_xy();
        let limit = self.config.map_half_extent;
        p.x.abs() > limit || p.y.abs() > limit
    }
}

/// Model-erased engagement for front ends that pick the model at runtime.
pub trait Environment: Send {
    fn config(&self) -> &EngagementConfig;
    fn command_count(&self) -> u8;
    fn obs_size(&self) -> usize;
    fn reset(&mut self) -> (Observation, Observation);
    fn reset_with_seed(&mut self, seed: u64) -> (Observation, Observation);
    /// Fails exactly when `step_raw` would reject the commands, without
    /// stepping.
    fn check_commands(&self, blue: i64, red: i64) -> Result<(), SimError>;
    fn step_raw(&mut self, blue: i64, red: i64) -> Result<StepOutcome, SimError>;
    fn set_shaping(&mut self, shaping: ShapingConfig) -> Result<(), SimError>;
    fn advantage_count(&self) -> i32;
    fn steps(&self) -> u32;
    fn is_done(&self) -> bool;
    /// `(red, blue)`
    fn snapshots(&self) -> (AircraftSnapshot, AircraftSnapshot);
}

impl<K, P, E> Environment for Engagement<K, P, E>
where
    K: Kinematics,
    P: PostureInitializer,
    E: StateEncoder,
{
    fn config(&self) -> &EngagementConfig {
        Engagement::config(self)
    }

    fn command_count(&self) -> u8 {
        K::Command::COUNT
    }

    fn obs_size(&self) -> usize {
        self.encoder.obs_size()
    }

    fn reset(&mut self) -> (Observation, Observation) {
        Engagement::reset(self)
    }

    fn reset_with_seed(&mut self, seed: u64) -> (Observation, Observation) {
        Engagement::reset_with_seed(self, seed)
    }

    fn check_commands(&self, blue: i64, red: i64) -> Result<(), SimError> {
        Self::decode_commands(blue, red).map(|_| ())
    }

    fn step_raw(&mut self, blue: i64, red: i64) -> Result<StepOutcome, SimError> {
        Engagement::step_raw(self, blue, red)
    }

    fn set_shaping(&mut self, shaping: ShapingConfig) -> Result<(), SimError> {
        Engagement::set_shaping(self, shaping)
    }

    fn advantage_count(&self) -> i32 {
        self.state.advantage_count
    }

    fn steps(&self) -> u32 {
        self.state.step
    }

    fn is_done(&self) -> bool {
        self.state.done
    }

    fn snapshots(&self) -> (AircraftSnapshot, AircraftSnapshot) {
        (self.state.red.snapshot(), self.state.blue.snapshot())
    }
}

/// Build an engagement for `config.model` with the default initializer and
/// encoder.
pub fn build_environment(config: EngagementConfig) -> Result<Box<dyn Environment>, SimError> {
    Ok(match config.model {
        ModelKind::Planar => Box::new(Engagement::<PlanarTurnModel>::new(config)?),
        ModelKind::Energy => Box::new(Engagement::<EnergyManeuverModel>::new(config)?),
    })
}
