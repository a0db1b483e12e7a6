use aircombat_shared::{ScenarioConfig, ScenarioMode};
use glam::DVec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

use crate::kinematics::Airframe;

/// Places both aircraft at the start of an episode.
///
/// Receives freshly spawned (level, unfuelled) aircraft and only sets their
/// horizontal position and heading.
pub trait PostureInitializer: Send {
    fn reseed(&mut self, seed: u64);

    fn initialize<S: Airframe>(
        &mut self,
        mode: ScenarioMode,
        red: &mut S,
        blue: &mut S,
        randomize_red: bool,
        randomize_blue: bool,
    );
}

/// Seeded initializer for the five scenario modes.
///
/// Layouts, with headings counter-clockwise from +x:
/// * `Neutral`: side by side, flying opposite directions.
/// * `CoHeading`: side by side, both heading +y.
/// * `Offense`: blue trailing red on the same heading.
/// * `Defense`: red trailing blue.
/// * `Random`: positions and headings drawn uniformly.
///
/// `randomize_red`/`randomize_blue` jitter the nominal posture of the fixed
/// layouts. `Random` overrides them: both sides are always drawn, so the
/// flags have no effect there.
#[derive(Debug, Clone)]
pub struct ScenarioInitializer {
    config: ScenarioConfig,
    rng: Pcg64,
}

/// Position and heading for one aircraft.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posture {
    pub position: DVec2,
    pub heading: f64,
}

impl Posture {
    fn new(x: f64, y: f64, heading: f64) -> Self {
        Self {
            position: DVec2::new(x, y),
            heading,
        }
    }

    fn apply<S: Airframe>(self, aircraft: &mut S) {
        aircraft.place(self.position, self.heading);
    }
}

impl ScenarioInitializer {
    pub fn new(config: ScenarioConfig, seed: u64) -> Self {
        Self {
            config,
            rng: Pcg64::seed_from_u64(seed),
        }
    }

    pub fn config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// Nominal `(red, blue)` postures for a mode, before any jitter.
    pub fn layout(&mut self, mode: ScenarioMode) -> (Posture, Posture) {
        let c = &self.config;
        let half_sep = c.separation / 2.0;
        let half_trail = c.trail_distance / 2.0;
        match mode {
            ScenarioMode::Neutral => (
                Posture::new(half_sep, 0.0, 270.0),
                Posture::new(-half_sep, 0.0, 90.0),
            ),
            ScenarioMode::CoHeading => (
                Posture::new(half_sep, 0.0, 90.0),
                Posture::new(-half_sep, 0.0, 90.0),
            ),
            ScenarioMode::Offense => (
                Posture::new(0.0, half_trail, 90.0),
                Posture::new(0.0, -half_trail, 90.0),
            ),
            ScenarioMode::Defense => (
                Posture::new(0.0, -half_trail, 90.0),
                Posture::new(0.0, half_trail, 90.0),
            ),
            ScenarioMode::Random => {
                let red = self.random_posture();
                let blue = self.random_posture();
                (red, blue)
            }
        }
    }

    fn random_posture(&mut self) -> Posture {
        let extent = self.config.spawn_half_extent;
        Posture::new(
            self.rng.gen_range(-extent..=extent),
            self.rng.gen_range(-extent..=extent),
            self.rng.gen_range(0.0..360.0),
        )
    }

    fn jitter(&mut self, posture: Posture) -> Posture {
        let p = self.config.position_jitter;
        let h = self.config.heading_jitter;
        Posture {
            position: posture.position
                + DVec2::new(self.rng.gen_range(-p..=p), self.rng.gen_range(-p..=p)),
            heading: posture.heading + self.rng.gen_range(-h..=h),
        }
    }
}

impl PostureInitializer for ScenarioInitializer {
    fn reseed(&mut self, seed: u64) {
        self.rng = Pcg64::seed_from_u64(seed);
    }

    fn initialize<S: Airframe>(
        &mut self,
        mode: ScenarioMode,
        red: &mut S,
        blue: &mut S,
        randomize_red: bool,
        randomize_blue: bool,
    ) {
        let (mut red_posture, mut blue_posture) = self.layout(mode);
        if mode != ScenarioMode::Random {
            if randomize_red {
                red_posture = self.jitter(red_posture);
            }
            if randomize_blue {
                blue_posture = self.jitter(blue_posture);
            }
        }
        red_posture.apply(red);
        blue_posture.apply(blue);
    }
}
