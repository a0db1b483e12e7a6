// Physics
pub const GRAVITY: f64 = 9.81;

// Map (horizontal half-extent, metres)
pub const MAP_HALF_EXTENT: f64 = 10_000.0;

// Fuel: one unit per macro step, so this is also the episode length cap
pub const FUEL_BUDGET: i32 = 100;

// Planar turn-rate model
pub const PLANAR_MACRO_STEP: f64 = 0.5;
pub const PLANAR_MICRO_STEPS: u32 = 4;
pub const PLANAR_ROLL_RATE: f64 = 40.0; // deg/s
pub const PLANAR_BANK_ANGLE_MAX: f64 = 80.0;
pub const PLANAR_SPEED: f64 = 200.0;
pub const PLANAR_COMMAND_COUNT: u8 = 3;

// Energy-maneuverability model
pub const ENERGY_MICRO_STEP: f64 = 0.5;
pub const ENERGY_MICRO_STEPS: u32 = 8;
pub const ENERGY_INITIAL_SPEED: f64 = 150.0;
pub const ENERGY_SPEED_MIN: f64 = 100.0;
pub const ENERGY_SPEED_MAX: f64 = 300.0;
pub const ENERGY_INITIAL_ALTITUDE: f64 = 4_000.0;
pub const ENERGY_ALTITUDE_MIN: f64 = 0.0;
pub const ENERGY_ALTITUDE_MAX: f64 = 8_000.0;
pub const ENERGY_HORIZONTAL_LIMIT: f64 = 40_000.0;
pub const ENERGY_PITCH_MAX: f64 = 60.0;
pub const ENERGY_ROLL_MAX: f64 = 80.0;
pub const ENERGY_ROLL_RATE: f64 = 40.0; // deg/s
pub const ENERGY_MAX_NORMAL_LOAD: f64 = 5.0;
pub const ENERGY_MAX_TANGENTIAL_LOAD: f64 = 2.0;
pub const ENERGY_COMMAND_COUNT: u8 = 7;

// Advantage envelope
pub const RANGE_MIN: f64 = 100.0;
pub const RANGE_MAX: f64 = 500.0;
pub const ASPECT_ANGLE_MAX: f64 = 60.0;
pub const ANTENNA_TRAIN_ANGLE_MAX: f64 = 30.0;
pub const ADVANTAGE_WIN_THRESHOLD: i32 = 9;

// Reward shaping
pub const POTENTIAL_SCALE: f64 = 0.01;
pub const DISTANCE_SCALE: f64 = 1_800.0; // exp(-|d - d_mid| / 180 * 0.1)
pub const TIME_COST: f64 = 0.001;

// Terminal rewards
pub const REWARD_WIN: f64 = 2.0;
pub const REWARD_LOSS: f64 = -2.0;
pub const REWARD_DRAW: f64 = -1.0;
pub const REWARD_BOUNDARY: f64 = -1.0;

// Scenario layout
pub const SCENARIO_SEPARATION: f64 = 200.0;
pub const SCENARIO_TRAIL_DISTANCE: f64 = 300.0;
pub const SCENARIO_SPAWN_HALF_EXTENT: f64 = 2_000.0;
pub const SCENARIO_POSITION_JITTER: f64 = 500.0;
pub const SCENARIO_HEADING_JITTER: f64 = 45.0;

// Observation
pub const OBS_SIZE: usize = 18;
pub const OBS_NORM_ANGLE: f64 = 180.0;
pub const OBS_NORM_BANK: f64 = 90.0;
pub const OBS_NORM_SPEED: f64 = 300.0;
pub const OBS_NORM_ALTITUDE: f64 = 10_000.0;
