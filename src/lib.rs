//! Table Tennis - a two-player table tennis simulation core
//!
//! Core modules:
//! - `sim`: Simulation (ball, paddles, collisions, serve rotation, scoring)
//! - `rules`: Data-driven rule set and difficulty levels
//! - `audio`: Named sound cues and sinks
//! - `error`: Error taxonomy shared by every module

pub mod audio;
pub mod error;
pub mod rules;
pub mod sim;

pub use error::{Result, SimError};
pub use rules::{Difficulty, DifficultyTier, RuleConfig};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz); longer frames are split into substeps
    pub const SIM_DT: f32 = 1.0 / REFERENCE_FPS;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Window dimensions
    pub const WINDOW_WIDTH: f32 = 800.0;
    pub const WINDOW_HEIGHT: f32 = 600.0;
    /// Frame rate the legacy per-frame speeds were tuned for
    pub const REFERENCE_FPS: f32 = 60.0;

    /// Paddle defaults
    pub const PADDLE_WIDTH: f32 = 60.0;
    pub const PADDLE_HEIGHT: f32 = 100.0;
    /// Pixels per second (10 px/frame)
    pub const PADDLE_SPEED: f32 = 10.0 * REFERENCE_FPS;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 7.0;
    /// Minimum base speed, difficulty 1 (7 px/frame)
    pub const BALL_MIN_SPEED: f32 = 7.0 * REFERENCE_FPS;
    /// Maximum base speed, difficulty 10 (18 px/frame)
    pub const BALL_MAX_SPEED: f32 = 18.0 * REFERENCE_FPS;
}
