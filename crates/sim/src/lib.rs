pub mod advantage;
pub mod engagement;
pub mod geometry;
pub mod kinematics;
pub mod match_loop;
pub mod observation;
pub mod policy;
pub mod reward;
pub mod scenario;

pub use advantage::AdvantageTracker;
pub use engagement::*;
pub use geometry::{AngleOff, Geometry};
pub use kinematics::{Airframe, EnergyManeuverModel, EnergyState, Kinematics, PlanarState, PlanarTurnModel};
pub use match_loop::*;
pub use observation::{RelativeGeometryEncoder, StateEncoder};
pub use policy::*;
pub use reward::RewardShaper;
pub use scenario::{PostureInitializer, ScenarioInitializer};
