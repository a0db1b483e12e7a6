use aircombat_shared::{AdvantageConfig, ShapingConfig};

use crate::geometry::{AngleOff, Geometry};

/// Potential-based reward shaping.
///
/// `potential = -c * RA * RD` where RA rewards pointing at the opponent's
/// tail and RD peaks at the middle of the advantage range band. The
/// per-step reward is the potential difference minus a constant time cost,
/// so over an episode the shaped return telescopes to
/// `potential_end - potential_start - steps * time_cost`.
#[derive(Debug, Clone)]
pub struct RewardShaper {
    config: ShapingConfig,
    range_mid: f64,
}

impl RewardShaper {
    pub fn new(config: ShapingConfig, advantage: &AdvantageConfig) -> Self {
        Self {
            config,
            range_mid: advantage.range_mid(),
        }
    }

    pub fn config(&self) -> &ShapingConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: ShapingConfig) {
        self.config = config;
    }

    /// Angle term: -1 on the opponent's six, +1 with the opponent on own six.
    pub fn angle_term(angles: &AngleOff) -> f64 {
        1.0 - ((1.0 - angles.antenna_train.abs() / 180.0) + (1.0 - angles.aspect.abs() / 180.0))
    }

    pub fn range_term(&self, range: f64) -> f64 {
        (-(range - self.range_mid).abs() / self.config.distance_scale).exp()
    }

    pub fn potential(&self, angles: &AngleOff, range: f64) -> f64 {
        -self.config.potential_scale * Self::angle_term(angles) * self.range_term(range)
    }

    /// `(red, blue)` potentials.
    pub fn potentials(&self, geometry: &Geometry) -> (f64, f64) {
        (
            self.potential(&geometry.red, geometry.range),
            self.potential(&geometry.blue, geometry.range),
        )
    }

    pub fn shaped(&self, previous: f64, current: f64) -> f64 {
        (current - previous) - self.config.time_cost
    }
}
