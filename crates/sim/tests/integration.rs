use aircombat_shared::*;
use aircombat_sim::kinematics::{Airframe, EnergyManeuverModel, Kinematics, PlanarTurnModel};
use aircombat_sim::{
    run_episode, run_match, Engagement, EpisodeTrace, HoldPolicy, PolicyKind,
    PostureInitializer, PursuitPolicy, RelativeGeometryEncoder, ScenarioInitializer, StateEncoder,
};
use glam::DVec2;
use proptest::prelude::*;

/// Puts both aircraft at fixed postures regardless of mode.
struct FixedPostures {
    red: (DVec2, f64),
    blue: (DVec2, f64),
}

impl PostureInitializer for FixedPostures {
    fn reseed(&mut self, _seed: u64) {}

    fn initialize<S: Airframe>(
        &mut self,
        _mode: ScenarioMode,
        red: &mut S,
        blue: &mut S,
        _randomize_red: bool,
        _randomize_blue: bool,
    ) {
        red.place(self.red.0, self.red.1);
        blue.place(self.blue.0, self.blue.1);
    }
}

fn fixed<K: Kinematics>(
    config: EngagementConfig,
    red: (DVec2, f64),
    blue: (DVec2, f64),
) -> Engagement<K, FixedPostures> {
    let encoder = RelativeGeometryEncoder::from_config(&config);
    Engagement::with_parts(config, FixedPostures { red, blue }, encoder).unwrap()
}

fn scenario(mode: ScenarioMode) -> EngagementConfig {
    let mut config = EngagementConfig::default();
    config.scenario.mode = mode;
    config
}

#[test]
fn test_neutral_hold_costs_only_time() {
    let mut env = Engagement::<PlanarTurnModel>::new(scenario(ScenarioMode::Neutral)).unwrap();
    env.reset();
    for _ in 0..50 {
        let out = env.step(PlanarCommand::Hold, PlanarCommand::Hold).unwrap();
        assert!(!out.done);
        for r in [out.reward_blue, out.reward_red] {
            assert!(r < 0.0 && r > -0.002, "reward {r}");
        }
    }
    assert_eq!(env.state().advantage_count, 0);
    assert_eq!(env.state().step, 50);
}

#[test]
fn test_blue_boundary_exit_penalizes_blue_only() {
    let mut env = fixed::<PlanarTurnModel>(
        EngagementConfig::default(),
        (DVec2::ZERO, 180.0),
        (DVec2::new(9_950.0, 0.0), 0.0),
    );
    let potential_red = env.state().potential_red;

    let out = env.step(PlanarCommand::Hold, PlanarCommand::Hold).unwrap();

    assert!(out.done);
    assert_eq!(out.outcome, Outcome::Draw);
    assert_eq!(out.reason, Some(TerminationReason::BoundaryExit(Side::Blue)));
    assert_eq!(out.reward_blue, REWARD_BOUNDARY);
    let shaped = env.state().potential_red - potential_red - TIME_COST;
    assert!((out.reward_red - shaped).abs() < 1e-15);
}

#[test]
fn test_boundary_exit_on_second_step() {
    let mut env = fixed::<PlanarTurnModel>(
        EngagementConfig::default(),
        (DVec2::ZERO, 180.0),
        (DVec2::new(9_850.0, 0.0), 0.0),
    );
    let first = env.step(PlanarCommand::Hold, PlanarCommand::Hold).unwrap();
    assert!(!first.done);
    let second = env.step(PlanarCommand::Hold, PlanarCommand::Hold).unwrap();
    assert!(second.done);
    assert_eq!(env.state().step, 2);
}

#[test]
fn test_red_boundary_exit_is_symmetric() {
    let mut env = fixed::<PlanarTurnModel>(
        EngagementConfig::default(),
        (DVec2::new(0.0, -9_950.0), 270.0),
        (DVec2::ZERO, 90.0),
    );
    let out = env.step(PlanarCommand::Hold, PlanarCommand::Hold).unwrap();
    assert_eq!(out.reason, Some(TerminationReason::BoundaryExit(Side::Red)));
    assert_eq!(out.reward_red, REWARD_BOUNDARY);
    assert!(out.reward_blue > -1.0);
}

#[test]
fn test_shaped_rewards_telescope() {
    let mut env = Engagement::<PlanarTurnModel>::new(scenario(ScenarioMode::Neutral)).unwrap();
    env.reset();
    let start_blue = env.state().potential_blue;
    let start_red = env.state().potential_red;

    let mut sum_blue = 0.0;
    let mut sum_red = 0.0;
    for i in 0..30 {
        let blue = if i % 2 == 0 {
            PlanarCommand::RollLeft
        } else {
            PlanarCommand::RollRight
        };
        let out = env.step(blue, PlanarCommand::Hold).unwrap();
        assert!(!out.done);
        sum_blue += out.reward_blue;
        sum_red += out.reward_red;
    }

    let end = env.state();
    let expected_blue = end.potential_blue - start_blue - 30.0 * TIME_COST;
    let expected_red = end.potential_red - start_red - 30.0 * TIME_COST;
    assert!((sum_blue - expected_blue).abs() < 1e-12);
    assert!((sum_red - expected_red).abs() < 1e-12);
}

#[test]
fn test_advantage_beats_fuel_exhaustion() {
    let mut config = scenario(ScenarioMode::Offense);
    config.fuel_budget = ADVANTAGE_WIN_THRESHOLD;
    let mut env = Engagement::<PlanarTurnModel>::new(config).unwrap();
    env.reset();

    let mut trace = EpisodeTrace::default();
    let mut last = None;
    for _ in 0..ADVANTAGE_WIN_THRESHOLD {
        last = Some(
            env.step_traced(PlanarCommand::Hold, PlanarCommand::Hold, &mut trace)
                .unwrap(),
        );
    }
    let out = last.unwrap();

    assert!(out.done);
    assert_eq!(out.outcome, Outcome::BlueWin);
    assert_eq!(out.reason, Some(TerminationReason::Advantage(Side::Blue)));
    assert_eq!(out.reward_blue, REWARD_WIN);
    assert_eq!(out.reward_red, REWARD_LOSS);
    assert_eq!(env.state().blue.fuel, 0);
    assert_eq!(env.state().red.fuel, 0);
    assert_eq!(trace.advantages, (1..=ADVANTAGE_WIN_THRESHOLD).collect::<Vec<_>>());
}

#[test]
fn test_defense_is_red_win() {
    let mut env = Engagement::<PlanarTurnModel>::new(scenario(ScenarioMode::Defense)).unwrap();
    env.reset();
    let mut out = env.step(PlanarCommand::Hold, PlanarCommand::Hold).unwrap();
    while !out.done {
        out = env.step(PlanarCommand::Hold, PlanarCommand::Hold).unwrap();
    }
    assert_eq!(out.outcome, Outcome::RedWin);
    assert_eq!(env.state().step, ADVANTAGE_WIN_THRESHOLD as u32);
    assert_eq!(env.state().advantage_count, -ADVANTAGE_WIN_THRESHOLD);
}

#[test]
fn test_fuel_exhaustion_is_draw() {
    let mut config = scenario(ScenarioMode::Neutral);
    config.fuel_budget = 5;
    let mut env = Engagement::<PlanarTurnModel>::new(config).unwrap();
    for step in 1..=5 {
        let out = env.step(PlanarCommand::Hold, PlanarCommand::Hold).unwrap();
        assert_eq!(out.done, step == 5);
        if out.done {
            assert_eq!(out.reason, Some(TerminationReason::FuelExhausted));
            assert_eq!(out.reward_blue, REWARD_DRAW);
            assert_eq!(out.reward_red, REWARD_DRAW);
        }
    }
}

#[test]
fn test_coincident_aircraft_collide() {
    let mut env = fixed::<PlanarTurnModel>(
        EngagementConfig::default(),
        (DVec2::new(10.0, 10.0), 45.0),
        (DVec2::new(10.0, 10.0), 45.0),
    );
    let out = env.step(PlanarCommand::Hold, PlanarCommand::Hold).unwrap();
    assert!(out.done);
    assert_eq!(out.reason, Some(TerminationReason::Collision));
    assert_eq!(out.outcome, Outcome::Draw);
    assert!(out.obs_blue.data.iter().all(|v| v.is_finite()));
}

#[test]
fn test_stepping_finished_episode_fails() {
    let mut config = EngagementConfig::default();
    config.fuel_budget = 1;
    let mut env = Engagement::<PlanarTurnModel>::new(config).unwrap();
    let out = env.step(PlanarCommand::Hold, PlanarCommand::Hold).unwrap();
    assert!(out.done);
    assert_eq!(
        env.step(PlanarCommand::Hold, PlanarCommand::Hold).unwrap_err(),
        SimError::EpisodeFinished
    );

    env.reset();
    assert!(env.step(PlanarCommand::Hold, PlanarCommand::Hold).is_ok());
}

#[test]
fn test_invalid_raw_command_rejected_without_side_effects() {
    let mut env = Engagement::<PlanarTurnModel>::new(EngagementConfig::default()).unwrap();
    let before = env.state().blue.clone();
    let err = env.step_raw(3, 1).unwrap_err();
    assert!(matches!(err, SimError::InvalidCommand { command: 3, .. }));
    assert!(env.step_raw(1, -1).is_err());
    assert_eq!(env.state().blue, before);
    assert_eq!(env.state().step, 0);
    assert!(env.step_raw(0, 2).is_ok());

    let mut energy =
        Engagement::<EnergyManeuverModel>::new(EngagementConfig::with_model(ModelKind::Energy))
            .unwrap();
    assert!(energy.step_raw(6, 0).is_ok());
    assert!(energy.step_raw(7, 0).is_err());
}

#[test]
fn test_energy_envelope_violation_ends_episode() {
    let mut config = EngagementConfig::with_model(ModelKind::Energy);
    config.energy.initial_altitude = config.energy.altitude_max;
    let mut env = fixed::<EnergyManeuverModel>(
        config,
        (DVec2::new(0.0, 3_000.0), 0.0),
        (DVec2::new(0.0, -3_000.0), 0.0),
    );

    let first = env
        .step(ManeuverCommand::MaxClimb, ManeuverCommand::Hold)
        .unwrap();
    assert!(!first.done);
    assert!(env.state().blue.position.z > ENERGY_ALTITUDE_MAX);

    let second = env
        .step(ManeuverCommand::MaxClimb, ManeuverCommand::Hold)
        .unwrap();
    assert!(second.done);
    assert_eq!(second.reason, Some(TerminationReason::BoundaryExit(Side::Blue)));
    assert_eq!(second.reward_blue, REWARD_BOUNDARY);
}

#[test]
fn test_energy_episode_completes() {
    let config = EngagementConfig {
        seed: 4,
        ..EngagementConfig::with_model(ModelKind::Energy)
    };
    let replay = run_match(&config, PolicyKind::Pursuit, PolicyKind::Random).unwrap();
    assert_ne!(replay.result.outcome, Outcome::Undetermined);
    assert!(replay.result.steps <= FUEL_BUDGET as u32);
    assert_eq!(replay.frames[0].blue.altitude, ENERGY_INITIAL_ALTITUDE);
}

/// Two features only: horizontal range and the advantage counter.
struct RangeOnly;

impl StateEncoder for RangeOnly {
    fn obs_size(&self) -> usize {
        2
    }

    fn encode<S: Airframe>(&self, own: &S, opponent: &S, advantage: i32) -> Observation {
        let range = own.position_xy().distance(opponent.position_xy());
        Observation {
            data: vec![range as f32, advantage as f32],
        }
    }
}

#[test]
fn test_pursuit_flies_with_custom_encoder() {
    let config = EngagementConfig {
        fuel_budget: 30,
        ..scenario(ScenarioMode::Neutral)
    };
    let initializer = ScenarioInitializer::new(config.scenario, config.seed);
    let mut env =
        Engagement::<PlanarTurnModel, _, _>::with_parts(config, initializer, RangeOnly).unwrap();

    let replay = run_episode(&mut env, &mut PursuitPolicy::new(), &mut HoldPolicy).unwrap();

    assert_ne!(replay.result.outcome, Outcome::Undetermined);
    assert_eq!(replay.frames.len(), replay.result.steps as usize + 1);
    assert_eq!(env.observe().0.len(), 2);
}

#[test]
fn test_deterministic_replays() {
    let mut config = scenario(ScenarioMode::Random);
    config.seed = 123;
    config.scenario.randomize_blue = true;

    let a = run_match(&config, PolicyKind::Random, PolicyKind::Pursuit).unwrap();
    let b = run_match(&config, PolicyKind::Random, PolicyKind::Pursuit).unwrap();
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );

    config.seed = 124;
    let c = run_match(&config, PolicyKind::Random, PolicyKind::Pursuit).unwrap();
    assert_ne!(a.frames[0].blue, c.frames[0].blue);
}

#[test]
fn test_reset_with_seed_reproduces_layout() {
    let mut config = scenario(ScenarioMode::Random);
    config.seed = 1;
    let mut env = Engagement::<PlanarTurnModel>::new(config).unwrap();
    let first = env.reset_with_seed(77);
    env.reset();
    let again = env.reset_with_seed(77);
    assert_eq!(first, again);
}

#[test]
fn test_replay_serialization() {
    let config = EngagementConfig {
        fuel_budget: 20,
        ..Default::default()
    };
    let replay = run_match(&config, PolicyKind::Pursuit, PolicyKind::Hold).unwrap();

    let json = serde_json::to_string(&replay).expect("replay should serialize");
    assert!(json.len() > 100);

    let back: EpisodeReplay = serde_json::from_str(&json).expect("replay should deserialize");
    assert_eq!(back.result.steps, replay.result.steps);
    assert_eq!(back.result.outcome, replay.result.outcome);
    assert_eq!(back.frames.len(), replay.frames.len());
    assert_eq!(back.config, replay.config);
}

fn planar_commands() -> impl Strategy<Value = Vec<PlanarCommand>> {
    prop::collection::vec(
        prop_oneof![
            Just(PlanarCommand::RollLeft),
            Just(PlanarCommand::Hold),
            Just(PlanarCommand::RollRight),
        ],
        1..120,
    )
}

fn maneuver_commands() -> impl Strategy<Value = Vec<ManeuverCommand>> {
    prop::collection::vec((0i64..7).prop_map(|raw| ManeuverCommand::decode(raw).unwrap()), 1..60)
}

proptest! {
    #[test]
    fn prop_planar_state_stays_in_range(commands in planar_commands(), heading in 0.0f64..360.0) {
        let model = PlanarTurnModel::from_config(&EngagementConfig::default());
        let mut s = model.spawn();
        s.place(DVec2::ZERO, heading);
        for cmd in commands {
            model.advance(&mut s, cmd).unwrap();
            prop_assert!((0.0..360.0).contains(&s.heading));
            prop_assert!(s.bank_angle.abs() <= PLANAR_BANK_ANGLE_MAX);
            prop_assert_eq!(s.speed, PLANAR_SPEED);
        }
    }

    #[test]
    fn prop_energy_state_stays_in_range(commands in maneuver_commands(), heading in 0.0f64..360.0) {
        let model = EnergyManeuverModel::from_config(&EngagementConfig::with_model(ModelKind::Energy));
        let mut s = model.spawn();
        s.place(DVec2::ZERO, heading);
        for cmd in commands {
            if model.advance(&mut s, cmd).is_err() {
                break;
            }
            prop_assert!((0.0..360.0).contains(&s.heading));
            prop_assert!(s.pitch.abs() <= ENERGY_PITCH_MAX);
            prop_assert!(s.roll.abs() <= ENERGY_ROLL_MAX);
            prop_assert!((ENERGY_SPEED_MIN..=ENERGY_SPEED_MAX).contains(&s.speed));
            prop_assert!(s.position.is_finite());
        }
    }
}
