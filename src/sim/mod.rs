//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Stable paddle processing order
//! - No rendering, audio playback or platform dependencies

pub mod collision;
pub mod geometry;
pub mod score;
pub mod serve;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use collision::{
    AdvanceOutcome, HitOutcome, Wall, advance, impact_offset, on_paddle_hit, on_paddle_hit_toward,
    pick_target, resolve_paddle_contact, speed_multiplier,
};
pub use geometry::Rect;
pub use score::{GameRecord, MatchStats, PointOutcome, ScoreState};
pub use serve::{ServeController, ServePhase};
pub use snapshot::FrameSnapshot;
pub use state::{Ball, GameEvent, MatchState, Paddle, Player, RallyPhase, RngState, Side};
pub use tick::{TickInput, reset_match, tick};
