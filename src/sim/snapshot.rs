//! Read-only view of a frame for renderers

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::serve::ServePhase;
use super::state::{MatchState, Player, Side};

/// Everything a front-end needs to draw one frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub clock_ms: u64,
    pub table: Rect,
    pub net_x: f32,
    pub ball_pos: Vec2,
    pub ball_radius: f32,
    pub ball_active: bool,
    pub left_paddle: Rect,
    pub right_paddle: Rect,
    pub points: (u32, u32),
    pub games_won: (u32, u32),
    pub server: Player,
    pub serve_phase: ServePhase,
    pub services_remaining: u32,
    pub headline: String,
    pub winner: Option<Player>,
    pub paused: bool,
}

impl FrameSnapshot {
    pub fn capture(state: &MatchState) -> Self {
        Self {
            frame: state.frames,
            clock_ms: state.clock_ms,
            table: state.rules.table_rect(),
            net_x: state.rules.net_x(),
            ball_pos: state.ball.pos,
            ball_radius: state.ball.radius,
            ball_active: state.ball.active,
            left_paddle: state.paddle(Side::Left).rect,
            right_paddle: state.paddle(Side::Right).rect,
            points: state.score.points,
            games_won: state.score.games_won,
            server: state.serve.current_server,
            serve_phase: state.serve.phase,
            services_remaining: state.serve.services_remaining(),
            headline: state.score.headline(),
            winner: state.score.match_winner,
            paused: state.paused,
        }
    }
}

impl From<&MatchState> for FrameSnapshot {
    fn from(state: &MatchState) -> Self {
        Self::capture(state)
    }
}
