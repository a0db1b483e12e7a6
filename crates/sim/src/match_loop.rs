use aircombat_shared::*;

use crate::engagement::Engagement;
use crate::kinematics::{Airframe, EnergyManeuverModel, Kinematics, PlanarTurnModel};
use crate::observation::StateEncoder;
use crate::policy::{Policy, PolicyKind};
use crate::scenario::PostureInitializer;

fn frame<S: Airframe>(step: u32, red: &S, blue: &S, advantage: i32, rewards: (f64, f64)) -> ReplayFrame {
    ReplayFrame {
        step,
        red: red.snapshot(),
        blue: blue.snapshot(),
        advantage_count: advantage,
        reward_red: rewards.0,
        reward_blue: rewards.1,
    }
}

/// Reset `engagement` and fly one episode between two policies, recording a
/// frame per step. The episode always terminates because fuel runs out.
pub fn run_episode<K, P, E>(
    engagement: &mut Engagement<K, P, E>,
    blue: &mut dyn Policy<K::Command>,
    red: &mut dyn Policy<K::Command>,
) -> Result<EpisodeReplay, SimError>
where
    K: Kinematics,
    P: PostureInitializer,
    E: StateEncoder,
{
    let (mut obs_red, mut obs_blue) = engagement.reset();
    let mut frames = Vec::with_capacity(engagement.config().fuel_budget as usize + 1);
    let s = engagement.state();
    frames.push(frame(0, &s.red, &s.blue, 0, (0.0, 0.0)));

    let mut return_red = 0.0;
    let mut return_blue = 0.0;

    loop {
        let cmd_blue = blue.act(&obs_blue);
        let cmd_red = red.act(&obs_red);
        let out = engagement.step(cmd_blue, cmd_red)?;

        return_red += out.reward_red;
        return_blue += out.reward_blue;
        let s = engagement.state();
        frames.push(frame(
            s.step,
            &s.red,
            &s.blue,
            s.advantage_count,
            (out.reward_red, out.reward_blue),
        ));

        if out.done {
            break;
        }
        obs_red = out.obs_red;
        obs_blue = out.obs_blue;
    }

    let s = engagement.state();
    Ok(EpisodeReplay {
        config: engagement.config().clone(),
        red_policy: red.name().to_string(),
        blue_policy: blue.name().to_string(),
        frames,
        result: EpisodeResult {
            outcome: s.outcome,
            reason: s.reason,
            steps: s.step,
            final_advantage: s.advantage_count,
            return_red,
            return_blue,
        },
    })
}

fn run_with<K: Kinematics>(
    config: &EngagementConfig,
    blue: PolicyKind,
    red: PolicyKind,
) -> Result<EpisodeReplay, SimError> {
    let mut engagement = Engagement::<K>::new(config.clone())?;
    // Distinct policy streams per side, both derived from the episode seed.
    let mut blue = blue.build::<K::Command>(config.seed.wrapping_mul(2).wrapping_add(1));
    let mut red = red.build::<K::Command>(config.seed.wrapping_mul(2).wrapping_add(2));
    run_episode(&mut engagement, blue.as_mut(), red.as_mut())
}

/// Run one deterministic episode for `config.model` between two scripted
/// policies.
pub fn run_match(
    config: &EngagementConfig,
    blue: PolicyKind,
    red: PolicyKind,
) -> Result<EpisodeReplay, SimError> {
    match config.model {
        ModelKind::Planar => run_with::<PlanarTurnModel>(config, blue, red),
        ModelKind::Energy => run_with::<EnergyManeuverModel>(config, blue, red),
    }
}
