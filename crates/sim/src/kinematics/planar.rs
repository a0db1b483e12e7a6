use aircombat_shared::*;
use glam::DVec2;

use super::{wrap_heading, Airframe, Kinematics};

/// Level-flight aircraft: constant speed, turn rate set by bank angle.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarState {
    pub position: DVec2,
    pub heading: f64,
    pub bank_angle: f64,
    pub speed: f64,
    pub fuel: i32,
}

impl PlanarState {
    pub fn forward(&self) -> DVec2 {
        let h = self.heading.to_radians();
        DVec2::new(h.cos(), h.sin())
    }
}

impl Airframe for PlanarState {
    fn position_xy(&self) -> DVec2 {
        self.position
    }

    fn heading(&self) -> f64 {
        self.heading
    }

    fn bank(&self) -> f64 {
        self.bank_angle
    }

    fn speed(&self) -> f64 {
        self.speed
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
        self.position = position;
        self.heading = wrap_heading(heading);
    }

    fn snapshot(&self) -> AircraftSnapshot {
        AircraftSnapshot {
            x: self.position.x,
            y: self.position.y,
            altitude: 0.0,
            heading: self.heading,
            pitch: 0.0,
            bank: self.bank_angle,
            speed: self.speed,
            fuel: self.fuel,
        }
    }
}

/// Planar turn-rate model.
///
/// Each micro-step rolls at a fixed rate in the commanded direction, turns at
/// `(g / v) * tan(bank)` and flies `v * dt` along the new heading. Positive
/// bank turns clockwise, so heading decreases.
#[derive(Debug, Clone)]
pub struct PlanarTurnModel {
    config: PlanarConfig,
    gravity: f64,
}

impl PlanarTurnModel {
    pub fn new(config: PlanarConfig, gravity: f64) -> Self {
        Self { config, gravity }
    }

    pub fn config(&self) -> &PlanarConfig {
        &self.config
    }

    /// Turn rate in deg/s at the given bank angle and speed.
    pub fn turn_rate(&self, bank_deg: f64, speed: f64) -> f64 {
        ((self.gravity / speed) * bank_deg.to_radians().tan()).to_degrees()
    }

    fn micro_step(&self, s: &mut PlanarState, command: PlanarCommand, dt: f64) {
        let max = self.config.bank_angle_max;
        s.bank_angle = (s.bank_angle + command.roll_sign() * self.config.roll_rate * dt)
            .clamp(-max, max);

        let omega = self.turn_rate(s.bank_angle, s.speed);
        s.heading = wrap_heading(s.heading - omega * dt);

        s.position += s.forward() * s.speed * dt;
    }
}

impl Kinematics for PlanarTurnModel {
    type State = PlanarState;
    type Command = PlanarCommand;

    const METERS_FUEL: bool = true;

    fn from_config(config: &EngagementConfig) -> Self {
        Self::new(config.planar, config.gravity)
    }

    fn spawn(&self) -> PlanarState {
        PlanarState {
            position: DVec2::ZERO,
            heading: 0.0,
            bank_angle: 0.0,
            speed: self.config.speed,
            fuel: 0,
        }
    }

    fn advance(&self, state: &mut PlanarState, command: PlanarCommand) -> Result<(), SimError> {
        let dt = self.config.micro_step();
        for _ in 0..self.config.micro_steps {
            self.micro_step(state, command, dt);
        }
        state.burn_fuel();
        Ok(())
    }
}
