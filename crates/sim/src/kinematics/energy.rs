use aircombat_shared::*;
use glam::{DVec2, DVec3};

use super::{wrap_heading, wrap_pitch, Airframe, Kinematics};

/// Pitch (deg) closer than this to +/-90 is treated as vertical flight.
const VERTICAL_EPSILON: f64 = 1e-9;

/// Load factors along the flight path (`nx`), the lift axis (`ny`) and the
/// lateral axis (`nz`), in g.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadFactors {
    pub nx: f64,
    pub ny: f64,
    pub nz: f64,
}

impl Default for LoadFactors {
    fn default() -> Self {
        Self {
            nx: 0.0,
            ny: 1.0,
            nz: 0.0,
        }
    }
}

/// Rates derived from the load factors for one micro-step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightRates {
    /// Tangential acceleration, m/s^2.
    pub acceleration: f64,
    /// rad/s
    pub pitch_rate: f64,
    /// rad/s, positive turns clockwise.
    pub turn_rate: f64,
}

/// Compute acceleration, pitch rate and turn rate from load factors.
///
/// Turn rate divides by `cos(pitch)`; at exactly vertical flight heading is
/// undefined and the turn rate is defined as zero.
pub fn flight_rates(load: &LoadFactors, pitch_deg: f64, speed: f64, gravity: f64) -> FlightRates {
    let theta = pitch_deg.to_radians();
    let acceleration = gravity * (load.nx - theta.sin());
    let pitch_rate = (load.ny - theta.cos()) * gravity / speed;
    let turn_rate = if (pitch_deg.abs() - 90.0).abs() < VERTICAL_EPSILON {
        0.0
    } else {
        load.nz * gravity / (speed * theta.cos())
    };
    FlightRates {
        acceleration,
        pitch_rate,
        turn_rate,
    }
}

/// Point-mass aircraft with attitude, flown through load-factor commands.
#[derive(Debug, Clone, PartialEq)]
pub struct EnergyState {
    /// x/y horizontal, z altitude.
    pub position: DVec3,
    pub heading: f64,
    pub pitch: f64,
    pub roll: f64,
    pub speed: f64,
    pub load: LoadFactors,
    pub fuel: i32,
}

impl Airframe for EnergyState {
    fn position_xy(&self) -> DVec2 {
        self.position.truncate()
    }

    fn heading(&self) -> f64 {
        self.heading
    }

    fn bank(&self) -> f64 {
        self.roll
    }

    fn speed(&self) -> f64 {
        self.speed
    }

    fn altitude(&self) -> f64 {
        self.position.z
    }

    fn fuel(&self) -> i32 {
        self.fuel
    }

    fn refuel(&mut self, fuel: i32) {
        self.fuel = fuel;
    }

    fn burn_fuel(&mut self) {
        self.fuel -= 1;
    }

    fn place(&mut self, position: DVec2, heading: f64) {
        self.position = position.extend(self.position.z);
        self.heading = wrap_heading(heading);
    }

    fn snapshot(&self) -> AircraftSnapshot {
        AircraftSnapshot {
            x: self.position.x,
            y: self.position.y,
            altitude: self.position.z,
            heading: self.heading,
            pitch: self.pitch,
            bank: self.roll,
            speed: self.speed,
            fuel: self.fuel,
        }
    }
}

/// Energy-maneuverability model with seven maximum-performance commands.
///
/// Every command drives one load-factor component to its limit; pitch and
/// roll otherwise relax toward level flight. Fuel is left to the caller.
#[derive(Debug, Clone)]
pub struct EnergyManeuverModel {
    config: EnergyConfig,
    gravity: f64,
}

impl EnergyManeuverModel {
    pub fn new(config: EnergyConfig, gravity: f64) -> Self {
        Self { config, gravity }
    }

    pub fn config(&self) -> &EnergyConfig {
        &self.config
    }

    /// Reject states already outside the hard envelope.
    pub fn check_envelope(&self, s: &EnergyState) -> Result<(), SimError> {
        let c = &self.config;
        let speed_ok = (c.speed_min..=c.speed_max).contains(&s.speed);
        let horizontal_ok =
            s.position.x.abs() <= c.horizontal_limit && s.position.y.abs() <= c.horizontal_limit;
        let altitude_ok = (c.altitude_min..=c.altitude_max).contains(&s.position.z);
        if speed_ok && horizontal_ok && altitude_ok {
            Ok(())
        } else {
            Err(SimError::BoundaryViolation {
                speed: s.speed,
                x: s.position.x,
                y: s.position.y,
                z: s.position.z,
            })
        }
    }

    /// Set the load factors for `command` and return the roll rate (deg/s).
    ///
    /// Decision table: without a command, roll relaxes toward zero, `ny`
    /// pushes pitch back toward level and `nz` follows the bank. Commands
    /// then override the component they drive.
    pub(crate) fn schedule_loads(&self, s: &mut EnergyState, command: ManeuverCommand) -> f64 {
        let nf = self.config.max_normal_load;
        let roll = s.roll.to_radians();
        let pitch = s.pitch.to_radians();

        let mut roll_rate = if s.roll < 0.0 {
            self.config.roll_rate
        } else if s.roll > 0.0 {
            -self.config.roll_rate
        } else {
            0.0
        };

        let mut load = s.load;
        load.ny = if s.pitch < 0.0 {
            nf * roll.cos()
        } else if s.pitch > 0.0 {
            -nf * roll.cos()
        } else {
            pitch.cos()
        };
        load.nz = if s.pitch == 0.0 { 0.0 } else { nf * roll.sin() };

        let level = s.pitch == 0.0;
        // Lateral load available once lift balances weight.
        let lateral = (nf * nf - load.ny * load.ny).max(0.0).sqrt();

        match command {
            ManeuverCommand::Hold => load.nx = pitch.sin(),
            ManeuverCommand::MaxLeftTurn => {
                load.nx = pitch.sin();
                if level {
                    load.nz = -lateral;
                }
                roll_rate = -self.config.roll_rate;
            }
            ManeuverCommand::MaxRightTurn => {
                load.nx = pitch.sin();
                if level {
                    load.nz = lateral;
                }
                roll_rate = self.config.roll_rate;
            }
            ManeuverCommand::MaxClimb => {
                load.nx = pitch.sin();
                load.ny = nf * roll.cos();
            }
            ManeuverCommand::MaxDive => {
                load.nx = pitch.sin();
                load.ny = -nf * roll.cos();
            }
            ManeuverCommand::MaxAccelerate => load.nx = self.config.max_tangential_load,
            ManeuverCommand::MaxDecelerate => load.nx = -self.config.max_tangential_load,
        }

        s.load = load;
        roll_rate
    }

    fn pitch_debias_applies(&self, command: ManeuverCommand) -> bool {
        match self.config.debias {
            DebiasRule::Unconditional => true,
            DebiasRule::ExemptCommandedAxis => !command.is_vertical(),
        }
    }

    fn roll_debias_applies(&self, command: ManeuverCommand) -> bool {
        match self.config.debias {
            DebiasRule::Unconditional => true,
            DebiasRule::ExemptCommandedAxis => !command.is_turn(),
        }
    }

    pub(crate) fn micro_step(&self, s: &mut EnergyState, command: ManeuverCommand) {
        let c = &self.config;
        let dt = c.micro_step;

        let roll_rate = self.schedule_loads(s, command);
        let rates = flight_rates(&s.load, s.pitch, s.speed, self.gravity);

        s.speed = (s.speed + rates.acceleration * dt).clamp(c.speed_min, c.speed_max);

        let last_pitch = s.pitch;
        s.pitch += rates.pitch_rate.to_degrees() * dt;
        if last_pitch * s.pitch < 0.0 && self.pitch_debias_applies(command) {
            s.pitch = 0.0;
        }
        s.pitch = wrap_pitch(s.pitch).clamp(-c.pitch_max, c.pitch_max);

        s.heading = wrap_heading(s.heading - rates.turn_rate.to_degrees() * dt);

        let last_roll = s.roll;
        s.roll = (s.roll + roll_rate * dt).clamp(-c.roll_max, c.roll_max);
        if last_roll * s.roll < 0.0 && self.roll_debias_applies(command) {
            s.roll = 0.0;
        }

        let (theta, psi) = (s.pitch.to_radians(), s.heading.to_radians());
        let velocity = DVec3::new(
            theta.cos() * psi.cos(),
            theta.cos() * psi.sin(),
            theta.sin(),
        ) * s.speed;
        s.position += velocity * dt;
    }
}

impl Kinematics for EnergyManeuverModel {
    type State = EnergyState;
    type Command = ManeuverCommand;

    const METERS_FUEL: bool = false;

    fn from_config(config: &EngagementConfig) -> Self {
        Self::new(config.energy, config.gravity)
    }

    fn spawn(&self) -> EnergyState {
        EnergyState {
            position: DVec3::new(0.0, 0.0, self.config.initial_altitude),
            heading: 0.0,
            pitch: 0.0,
            roll: 0.0,
            speed: self.config.initial_speed,
            load: LoadFactors::default(),
            fuel: 0,
        }
    }

    fn advance(&self, state: &mut EnergyState, command: ManeuverCommand) -> Result<(), SimError> {
        self.check_envelope(state)?;
        for _ in 0..self.config.micro_steps {
            self.micro_step(state, command);
        }
        Ok(())
    }
}
