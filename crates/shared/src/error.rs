use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimError {
    #[error("invalid {model} command {command}: expected 0..{count}")]
    InvalidCommand {
        model: &'static str,
        command: i64,
        count: u8,
    },
    #[error("kinematic envelope violated at step entry: speed {speed:.1} m/s, position ({x:.1}, {y:.1}, {z:.1})")]
    BoundaryViolation { speed: f64, x: f64, y: f64, z: f64 },
    #[error("episode already finished; call reset before stepping again")]
    EpisodeFinished,
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
