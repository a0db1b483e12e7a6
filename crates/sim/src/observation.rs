use aircombat_shared::*;

use crate::geometry::{bearing, solve};
use crate::kinematics::Airframe;

/// Turns the engagement, seen from one aircraft, into an agent feature
/// vector. Must be pure: the same inputs always give the same observation.
pub trait StateEncoder: Send {
    fn obs_size(&self) -> usize;

    /// `advantage` is the raw signed counter (positive favours blue).
    fn encode<S: Airframe>(&self, own: &S, opponent: &S, advantage: i32) -> Observation;
}

/// Wrap an angle difference into [-180, 180).
fn signed_angle(deg: f64) -> f64 {
    (deg + 180.0).rem_euclid(360.0) - 180.0
}

/// Ego-centric relative geometry, every feature roughly in [-1, 1].
///
/// Layout:
/// * `[0..7)` own state: x, y, cos/sin heading, bank, altitude, speed
/// * `[7..10)` relative position and range
/// * `[10..13)` opponent cos/sin heading, bank
/// * `[13..15)` sin/cos of the bearing to the opponent off own nose
/// * `[15..17)` own ATA and AA
/// * `[17]` advantage counter relative to the win threshold
#[derive(Debug, Clone)]
pub struct RelativeGeometryEncoder {
    map_half_extent: f64,
    win_threshold: i32,
}

impl RelativeGeometryEncoder {
    pub fn new(map_half_extent: f64, win_threshold: i32) -> Self {
        Self {
            map_half_extent,
            win_threshold,
        }
    }

    pub fn from_config(config: &EngagementConfig) -> Self {
        Self::new(config.map_half_extent, config.advantage.win_threshold)
    }
}

impl StateEncoder for RelativeGeometryEncoder {
    fn obs_size(&self) -> usize {
        OBS_SIZE
    }

    fn encode<S: Airframe>(&self, own: &S, opponent: &S, advantage: i32) -> Observation {
        let mut data = vec![0.0f32; OBS_SIZE];
        let map = self.map_half_extent;
        let span = 2.0 * map;

        let own_pos = own.position_xy();
        let opp_pos = opponent.position_xy();
        let own_h = own.heading().to_radians();
        let opp_h = opponent.heading().to_radians();

        // OWN STATE [0..7)
        data[0] = (own_pos.x / map) as f32;
        data[1] = (own_pos.y / map) as f32;
        data[2] = own_h.cos() as f32;
        data[3] = own_h.sin() as f32;
        data[4] = (own.bank() / OBS_NORM_BANK) as f32;
        data[5] = (own.altitude() / OBS_NORM_ALTITUDE) as f32;
        data[6] = (own.speed() / OBS_NORM_SPEED) as f32;

        // RELATIVE POSITION [7..10)
        let rel = opp_pos - own_pos;
        data[7] = (rel.x / span) as f32;
        data[8] = (rel.y / span) as f32;
        data[9] = (rel.length() / span) as f32;

        // OPPONENT STATE [10..13)
        data[10] = opp_h.cos() as f32;
        data[11] = opp_h.sin() as f32;
        data[12] = (opponent.bank() / OBS_NORM_BANK) as f32;

        // Positive when the opponent is to the left (counter-clockwise).
        let off_nose = signed_angle(bearing(own_pos, opp_pos) - own.heading()).to_radians();
        data[13] = off_nose.sin() as f32;
        data[14] = off_nose.cos() as f32;

        // ANGLE-OFF [15..17)
        let angles = solve(opp_pos, own_pos, opponent.heading(), own.heading());
        data[15] = (angles.antenna_train.abs() / OBS_NORM_ANGLE) as f32;
        data[16] = (angles.aspect.abs() / OBS_NORM_ANGLE) as f32;

        // META [17]
        data[17] = (advantage as f64 / self.win_threshold as f64) as f32;

        Observation { data }
    }
}
