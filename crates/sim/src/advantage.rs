use aircombat_shared::{AdvantageConfig, Side};

use crate::geometry::{AngleOff, Geometry};

/// Signed advantage counter with hysteresis. Positive counts favour blue,
/// negative favour red; any step in which neither side qualifies resets it.
#[derive(Debug, Clone)]
pub struct AdvantageTracker {
    config: AdvantageConfig,
    count: i32,
}

/// Counter transition for one step. Blue is checked first, so blue wins when
/// both qualify.
pub fn next_count(count: i32, blue_qualifies: bool, red_qualifies: bool) -> i32 {
    if blue_qualifies {
        if count >= 0 {
            count + 1
        } else {
            1
        }
    } else if red_qualifies {
        if count <= 0 {
            count - 1
        } else {
            -1
        }
    } else {
        0
    }
}

impl AdvantageTracker {
    pub fn new(config: AdvantageConfig) -> Self {
        Self { config, count: 0 }
    }

    pub fn count(&self) -> i32 {
        self.count
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Whether an aircraft with these angles at this range holds a
    /// firing-position advantage.
    pub fn qualifies(&self, angles: &AngleOff, range: f64) -> bool {
        let c = &self.config;
        range > c.range_min
            && range < c.range_max
            && angles.aspect.abs() < c.aspect_angle_max
            && angles.antenna_train.abs() < c.antenna_train_angle_max
    }

    pub fn update(&mut self, geometry: &Geometry) -> i32 {
        let blue = self.qualifies(&geometry.blue, geometry.range);
        let red = self.qualifies(&geometry.red, geometry.range);
        self.count = next_count(self.count, blue, red);
        self.count
    }

    /// The side whose advantage has been held long enough to win.
    pub fn winner(&self) -> Option<Side> {
        let threshold = self.config.win_threshold;
        if self.count >= threshold {
            Some(Side::Blue)
        } else if self.count <= -threshold {
            Some(Side::Red)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aircombat_shared::{ADVANTAGE_WIN_THRESHOLD, RANGE_MAX, RANGE_MIN};
    use glam::DVec2;

    fn tracker() -> AdvantageTracker {
        AdvantageTracker::new(AdvantageConfig::default())
    }

    fn blue_on_six(range: f64) -> Geometry {
        Geometry::between(DVec2::new(0.0, range / 2.0), 90.0, DVec2::new(0.0, -range / 2.0), 90.0)
    }

    fn red_on_six(range: f64) -> Geometry {
        Geometry::between(DVec2::new(0.0, -range / 2.0), 90.0, DVec2::new(0.0, range / 2.0), 90.0)
    }

    #[test]
    fn test_next_count_table() {
        assert_eq!(next_count(0, true, false), 1);
        assert_eq!(next_count(4, true, false), 5);
        assert_eq!(next_count(-4, true, false), 1);
        assert_eq!(next_count(0, false, true), -1);
        assert_eq!(next_count(-4, false, true), -5);
        assert_eq!(next_count(4, false, true), -1);
        assert_eq!(next_count(7, false, false), 0);
        assert_eq!(next_count(-7, false, false), 0);
        // Blue takes priority.
        assert_eq!(next_count(-3, true, true), 1);
        assert_eq!(next_count(3, true, true), 4);
    }

    #[test]
    fn test_qualifying_envelope_is_strict() {
        let t = tracker();
        let dead_six = AngleOff {
            antenna_train: 0.0,
            aspect: 0.0,
        };
        assert!(t.qualifies(&dead_six, 300.0));
        assert!(!t.qualifies(&dead_six, RANGE_MIN));
        assert!(!t.qualifies(&dead_six, RANGE_MAX));
        assert!(!t.qualifies(&AngleOff { antenna_train: 30.0, aspect: 0.0 }, 300.0));
        assert!(!t.qualifies(&AngleOff { antenna_train: 0.0, aspect: -60.0 }, 300.0));
        assert!(t.qualifies(&AngleOff { antenna_train: -29.9, aspect: 59.9 }, 300.0));
    }

    #[test]
    fn test_hysteresis_builds_and_resets() {
        let mut t = tracker();
        for expected in 1..=5 {
            assert_eq!(t.update(&blue_on_six(300.0)), expected);
        }
        // Out of range: reset.
        assert_eq!(t.update(&blue_on_six(800.0)), 0);
        assert_eq!(t.update(&blue_on_six(300.0)), 1);
        // Reversal flips straight to -1.
        assert_eq!(t.update(&red_on_six(300.0)), -1);
        assert_eq!(t.update(&red_on_six(300.0)), -2);
        assert_eq!(t.winner(), None);
    }

    #[test]
    fn test_winner_at_threshold() {
        let mut t = tracker();
        for _ in 0..ADVANTAGE_WIN_THRESHOLD - 1 {
            t.update(&blue_on_six(300.0));
        }
        assert_eq!(t.winner(), None);
        t.update(&blue_on_six(300.0));
        assert_eq!(t.winner(), Some(Side::Blue));

        t.reset();
        assert_eq!(t.count(), 0);
        for _ in 0..ADVANTAGE_WIN_THRESHOLD {
            t.update(&red_on_six(300.0));
        }
        assert_eq!(t.winner(), Some(Side::Red));
    }
}
