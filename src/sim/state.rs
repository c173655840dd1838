//! Match state and core simulation types
//!
//! Everything the frame loop owns lives here: the ball, both paddles, the serve
//! controller, the score and the match clock.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::geometry::Rect;
use super::score::ScoreState;
use super::serve::ServeController;
use crate::audio::SoundCue;
use crate::error::{Result, SimError};
use crate::rules::{Difficulty, RuleConfig};

/// One of the two players. Player one always plays from the left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// 1 or 2, as shown on the scoreboard
    pub fn number(&self) -> u8 {
        match self {
            Player::One => 1,
            Player::Two => 2,
        }
    }

    pub fn other(&self) -> Self {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    pub fn side(&self) -> Side {
        match self {
            Player::One => Side::Left,
            Player::Two => Side::Right,
        }
    }
}

impl TryFrom<u8> for Player {
    type Error = SimError;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            1 => Ok(Player::One),
            2 => Ok(Player::Two),
            other => Err(SimError::validation(format!("player must be 1 or 2, got {other}"))),
        }
    }
}

impl std::fmt::Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.number())
    }
}

/// Half of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub fn opposite(&self) -> Self {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Player defending this side
    pub fn player(&self) -> Player {
        match self {
            Side::Left => Player::One,
            Side::Right => Player::Two,
        }
    }
}

/// Where the ball is in the life of a point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RallyPhase {
    /// Waiting for the server to place the ball
    ReadyToServe,
    /// Ball placed (or just launched), not yet returned
    ServiceStarted,
    /// Ball in open play
    Rally,
    /// Ball left the window
    PointOver,
}

/// The ball
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    pub pos: Vec2,
    /// Pixels per second
    pub vel: Vec2,
    /// Speed chosen by the difficulty level; never changes during a match
    pub base_speed: f32,
    pub radius: f32,
    pub active: bool,
    /// True from service until the first paddle return
    pub awaiting_serve: bool,
    pub phase: RallyPhase,
    /// Last aim point picked for a serve or a return
    pub target: Option<Vec2>,
}

impl Ball {
    pub fn new(base_speed: f32, rules: &RuleConfig) -> Result<Self> {
        if !base_speed.is_finite()
            || base_speed < rules.ball_speed_min
            || base_speed > rules.ball_speed_max
        {
            return Err(SimError::validation(format!(
                "ball speed {base_speed} outside {}..={}",
                rules.ball_speed_min, rules.ball_speed_max
            )));
        }
        let mut ball = Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            base_speed,
            radius: rules.ball_radius,
            active: true,
            awaiting_serve: true,
            phase: RallyPhase::ReadyToServe,
            target: None,
        };
        ball.reset(rules);
        Ok(ball)
    }

    /// Back to the centre of the window, motionless, waiting for a serve
    pub fn reset(&mut self, rules: &RuleConfig) {
        self.pos = Vec2::new(rules.window_width / 2.0, rules.window_height / 2.0);
        self.vel = Vec2::ZERO;
        self.active = true;
        self.awaiting_serve = true;
        self.phase = RallyPhase::ReadyToServe;
        self.target = None;
    }

    pub fn bounds(&self) -> Rect {
        Rect::around_circle(self.pos, self.radius)
    }

    pub fn speed(&self) -> f32 {
        self.vel.length()
    }
}

/// A player's paddle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paddle {
    pub side: Side,
    pub rect: Rect,
    /// Pixels per second
    pub vel: Vec2,
    pub speed: f32,
    /// Ms timestamp of the last accepted hit
    pub last_impact_ms: Option<u64>,
    home: Vec2,
    min_x: f32,
    max_x: f32,
    max_y: f32,
    head_offset: f32,
    head_height: f32,
}

impl Paddle {
    /// Paddle at its home position, just outside its end of the table
    pub fn new(side: Side, rules: &RuleConfig) -> Self {
        let y = rules.window_height / 2.0 - rules.paddle_height / 2.0;
        let x = match side {
            Side::Left => rules.table_x() - rules.paddle_width - rules.paddle_table_gap,
            Side::Right => rules.table_x() + rules.table_width() + rules.paddle_table_gap,
        };
        let half = rules.window_width / 2.0;
        let (min_x, max_x) = match side {
            Side::Left => (0.0, half - rules.paddle_width),
            Side::Right => (half, rules.window_width - rules.paddle_width),
        };

        let mut paddle = Self {
            side,
            rect: Rect::new(x, y, rules.paddle_width, rules.paddle_height),
            vel: Vec2::ZERO,
            speed: rules.paddle_speed,
            last_impact_ms: None,
            home: Vec2::new(x, y),
            min_x,
            max_x,
            max_y: rules.window_height - rules.paddle_height,
            head_offset: rules.paddle_head_offset,
            head_height: rules.paddle_head_height,
        };
        paddle.clamp_position();
        paddle.home = paddle.rect.origin;
        paddle
    }

    /// The striking area: the paddle head, below the top edge
    pub fn collision_zone(&self) -> Rect {
        Rect::new(
            self.rect.left(),
            self.rect.top() + self.rect.height() * self.head_offset,
            self.rect.width(),
            self.rect.height() * self.head_height,
        )
    }

    /// X of the face turned toward the net
    pub fn leading_edge(&self) -> f32 {
        match self.side {
            Side::Left => self.rect.right(),
            Side::Right => self.rect.left(),
        }
    }

    pub fn cue(&self) -> SoundCue {
        match self.side {
            Side::Left => SoundCue::LeftHit,
            Side::Right => SoundCue::RightHit,
        }
    }

    /// Set velocity from a direction intent; each axis is -1, 0 or 1
    pub fn set_intent(&mut self, dx: f32, dy: f32) {
        fn axis(v: f32) -> f32 {
            if v > 0.0 {
                1.0
            } else if v < 0.0 {
                -1.0
            } else {
                0.0
            }
        }
        self.vel = Vec2::new(axis(dx), axis(dy)) * self.speed;
    }

    /// Move by velocity, saturating at the paddle's own half and the window
    pub fn step(&mut self, dt: f32) {
        self.rect.origin += self.vel * dt;
        self.clamp_position();
    }

    pub fn stop(&mut self) {
        self.vel = Vec2::ZERO;
    }

    /// Stop and return to the home position
    pub fn reset_position(&mut self) {
        self.stop();
        self.rect.origin = self.home;
    }

    pub fn in_cooldown(&self, now_ms: u64, cooldown_ms: u64) -> bool {
        self.last_impact_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < cooldown_ms)
    }

    fn clamp_position(&mut self) {
        self.rect.origin.x = self.rect.origin.x.clamp(self.min_x, self.max_x);
        self.rect.origin.y = self.rect.origin.y.clamp(0.0, self.max_y);
    }
}

/// Things that happened during a tick, drained by the front-end
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Sound to play
    Cue(SoundCue),
    /// Ball bounced off the top or bottom of the window
    WallBounce,
    PointScored { scorer: Player, points: (u32, u32) },
    ServeChanged { server: Player },
    LetCalled,
    GameWon { winner: Player, final_points: (u32, u32) },
    MatchWon { winner: Player, games: (u32, u32) },
    MatchReset,
}

/// RNG state wrapper: the seed is kept so a reset can rebuild the stream
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Complete match state, owned by the frame loop
#[derive(Debug, Clone)]
pub struct MatchState {
    pub rules: RuleConfig,
    pub difficulty: Difficulty,
    pub rng_state: RngState,
    /// Aim generator, seeded once per match
    pub rng: Pcg32,
    pub ball: Ball,
    pub left: Paddle,
    pub right: Paddle,
    pub serve: ServeController,
    pub score: ScoreState,
    /// Milliseconds of simulated time
    pub clock_ms: u64,
    /// Fractional milliseconds carried between ticks
    pub(crate) clock_remainder: f64,
    pub paused: bool,
    /// Simulation frame counter
    pub frames: u64,
    /// Events since the front-end last drained them
    pub events: Vec<GameEvent>,
}

impl MatchState {
    /// Create a match with the given rules, difficulty level and seed
    pub fn new(rules: RuleConfig, level: u8, seed: u64) -> Result<Self> {
        rules.validate()?;
        let difficulty = Difficulty::new(level, &rules)?;
        let ball = Ball::new(difficulty.ball_speed(&rules), &rules)?;
        let rng_state = RngState::new(seed);
        let mut rng = rng_state.to_rng();
        let serve = ServeController::new(&rules, ServeController::draw_first_server(&mut rng));
        let score = ScoreState::new(&rules);

        log::info!(
            "New match: difficulty {} ({}), ball speed {:.0} px/s, first to {} games, server {}",
            difficulty.level(),
            difficulty.tier().as_str(),
            ball.base_speed,
            rules.games_to_win_match,
            serve.current_server
        );

        Ok(Self {
            left: Paddle::new(Side::Left, &rules),
            right: Paddle::new(Side::Right, &rules),
            rules,
            difficulty,
            rng_state,
            rng,
            ball,
            serve,
            score,
            clock_ms: 0,
            clock_remainder: 0.0,
            paused: false,
            frames: 0,
            events: Vec::new(),
        })
    }

    pub fn paddle(&self, side: Side) -> &Paddle {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    pub fn is_over(&self) -> bool {
        self.score.match_winner.is_some()
    }

    /// Hand pending events to the caller
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance the match clock by `dt` seconds
    pub(crate) fn advance_clock(&mut self, dt: f32) {
        let total = self.clock_remainder + f64::from(dt) * 1000.0;
        let whole = total.floor();
        self.clock_ms += whole as u64;
        self.clock_remainder = total - whole;
    }
}
