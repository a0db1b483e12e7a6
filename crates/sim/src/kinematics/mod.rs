//! Aircraft kinematics. Two interchangeable models share no state shape;
//! the engagement controller is generic over [`Kinematics`].

pub mod energy;
pub mod planar;

pub use energy::{EnergyManeuverModel, EnergyState, LoadFactors};
pub use planar::{PlanarState, PlanarTurnModel};

use aircombat_shared::{AircraftSnapshot, Command, EngagementConfig, SimError};
use glam::DVec2;

/// Read/write view of an aircraft that the controller, the scenario
/// initializer and the state encoder need regardless of model.
///
/// Headings are degrees in [0, 360), measured counter-clockwise from +x,
/// the same frame the geometry solver uses.
pub trait Airframe: Clone + std::fmt::Debug + Send + Sync {
    /// Horizontal position, metres.
    fn position_xy(&self) -> DVec2;
    fn heading(&self) -> f64;
    fn bank(&self) -> f64;
    fn speed(&self) -> f64;
    fn altitude(&self) -> f64 {
        0.0
    }
    fn fuel(&self) -> i32;
    fn refuel(&mut self, fuel: i32);
    fn burn_fuel(&mut self);
    /// Put the aircraft at a horizontal position and heading. Altitude,
    /// speed and attitude keep their spawn values.
    fn place(&mut self, position: DVec2, heading: f64);
    fn snapshot(&self) -> AircraftSnapshot;
}

pub trait Kinematics: Send + Sync {
    type State: Airframe;
    type Command: Command;

    /// True when `advance` already burns the per-step fuel unit.
    const METERS_FUEL: bool;

    fn from_config(config: &EngagementConfig) -> Self
    where
        Self: Sized;

    /// A level, unfuelled aircraft at the origin.
    fn spawn(&self) -> Self::State;

    /// Integrate one macro step under `command`.
    fn advance(&self, state: &mut Self::State, command: Self::Command) -> Result<(), SimError>;
}

/// Wrap a heading into [0, 360).
pub fn wrap_heading(deg: f64) -> f64 {
    let h = deg.rem_euclid(360.0);
    // rem_euclid of a tiny negative rounds up to exactly 360.0
    if h >= 360.0 {
        0.0
    } else {
        h
    }
}

/// Wrap a pitch angle into [-180, 180].
pub fn wrap_pitch(deg: f64) -> f64 {
    if (-180.0..=180.0).contains(&deg) {
        deg
    } else {
        (deg + 180.0).rem_euclid(360.0) - 180.0
    }
}
