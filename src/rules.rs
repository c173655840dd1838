//! Rule set and difficulty levels
//!
//! Built once at startup, validated, then passed by reference into every
//! component. Nothing mutates it afterwards.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts;
use crate::error::{Result, SimError};
use crate::sim::Rect;

/// Difficulty tier names shown by the level selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DifficultyTier {
    Beginner,
    Intermediate,
    Expert,
    Master,
}

impl DifficultyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyTier::Beginner => "Beginner",
            DifficultyTier::Intermediate => "Intermediate",
            DifficultyTier::Expert => "Expert",
            DifficultyTier::Master => "Master",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "beginner" => Some(DifficultyTier::Beginner),
            "intermediate" | "inter" => Some(DifficultyTier::Intermediate),
            "expert" => Some(DifficultyTier::Expert),
            "master" => Some(DifficultyTier::Master),
            _ => None,
        }
    }

    fn for_level(level: u8) -> Self {
        match level {
            0..=3 => DifficultyTier::Beginner,
            4..=6 => DifficultyTier::Intermediate,
            7..=9 => DifficultyTier::Expert,
            _ => DifficultyTier::Master,
        }
    }
}

/// A validated difficulty level inside the rule set's range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Difficulty(u8);

impl Difficulty {
    pub fn new(level: u8, rules: &RuleConfig) -> Result<Self> {
        if level < rules.difficulty_min || level > rules.difficulty_max {
            return Err(SimError::validation(format!(
                "difficulty {level} outside {}..={}",
                rules.difficulty_min, rules.difficulty_max
            )));
        }
        Ok(Self(level))
    }

    pub fn level(&self) -> u8 {
        self.0
    }

    pub fn tier(&self) -> DifficultyTier {
        DifficultyTier::for_level(self.0)
    }

    /// Base ball speed, linear between the configured bounds
    pub fn ball_speed(&self, rules: &RuleConfig) -> f32 {
        let span = f32::from(rules.difficulty_max - rules.difficulty_min);
        let ratio = f32::from(self.0 - rules.difficulty_min) / span;
        let speed = rules.ball_speed_min + (rules.ball_speed_max - rules.ball_speed_min) * ratio;
        speed.clamp(rules.ball_speed_min, rules.ball_speed_max)
    }
}

/// Scoring thresholds, copied out of the rule set into the score keeper
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub points_to_win_game: u32,
    pub min_win_margin: u32,
    pub games_to_win_match: u32,
}

impl ScoringRules {
    /// Score at which both players count as "at deuce"
    pub fn deuce_threshold(&self) -> u32 {
        self.points_to_win_game.saturating_sub(1)
    }

    /// Longest possible match (best of N)
    pub fn total_games_possible(&self) -> u32 {
        self.games_to_win_match.saturating_mul(2).saturating_sub(1)
    }
}

/// Immutable rule set for one process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    // === Window ===
    pub window_width: f32,
    pub window_height: f32,

    // === Table ===
    /// Table width as a percentage of the window width
    pub table_width_percent: f32,
    /// Net position as a percentage of the table width
    pub net_position_percent: f32,

    // === Paddles ===
    pub paddle_width: f32,
    pub paddle_height: f32,
    /// Pixels per second
    pub paddle_speed: f32,
    /// Head zone top, as a fraction of the paddle height below its top edge
    pub paddle_head_offset: f32,
    /// Head zone height, as a fraction of the paddle height
    pub paddle_head_height: f32,
    /// Gap between a paddle's home position and the table edge
    pub paddle_table_gap: f32,

    // === Ball ===
    pub ball_radius: f32,
    /// Pixels per second
    pub ball_speed_min: f32,
    pub ball_speed_max: f32,

    // === Scoring ===
    pub points_to_win_game: u32,
    pub min_win_margin: u32,
    pub games_to_win_match: u32,

    // === Service ===
    pub serves_per_turn: u32,
    pub impact_cooldown_ms: u64,
    /// Horizontal distance from the table edge where the ball is served
    pub serve_inset: f32,

    // === Difficulty ===
    pub difficulty_min: u8,
    pub difficulty_max: u8,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            window_width: consts::WINDOW_WIDTH,
            window_height: consts::WINDOW_HEIGHT,

            table_width_percent: 60.0,
            net_position_percent: 50.0,

            paddle_width: consts::PADDLE_WIDTH,
            paddle_height: consts::PADDLE_HEIGHT,
            paddle_speed: consts::PADDLE_SPEED,
            paddle_head_offset: 0.05,
            paddle_head_height: 0.55,
            paddle_table_gap: 10.0,

            ball_radius: consts::BALL_RADIUS,
            ball_speed_min: consts::BALL_MIN_SPEED,
            ball_speed_max: consts::BALL_MAX_SPEED,

            points_to_win_game: 11,
            min_win_margin: 2,
            games_to_win_match: 3,

            serves_per_turn: 2,
            impact_cooldown_ms: 100,
            serve_inset: 30.0,

            difficulty_min: 1,
            difficulty_max: 10,
        }
    }
}

impl RuleConfig {
    /// Default rule set, validated
    pub fn new() -> Result<Self> {
        Self::default().validated()
    }

    /// Parse a JSON rule set; missing fields fall back to defaults
    pub fn from_json(json: &str) -> Result<Self> {
        let rules: RuleConfig = serde_json::from_str(json)
            .map_err(|e| SimError::configuration(format!("malformed rule set: {e}")))?;
        rules.validated()
    }

    /// Load a JSON rule set from disk
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SimError::configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        let rules = Self::from_json(&json)?;
        log::info!("Loaded rule set from {}", path.display());
        Ok(rules)
    }

    /// Consume and return self if every rule is coherent
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        fn finite(name: &str, value: f32) -> Result<()> {
            if value.is_finite() {
                Ok(())
            } else {
                Err(SimError::configuration(format!("{name} must be finite, got {value}")))
            }
        }
        fn positive(name: &str, value: f32) -> Result<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(SimError::configuration(format!("{name} must be positive, got {value}")))
            }
        }
        fn non_negative(name: &str, value: f32) -> Result<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(SimError::configuration(format!("{name} must be >= 0, got {value}")))
            }
        }
        fn percent(name: &str, value: f32) -> Result<()> {
            if (0.0..=100.0).contains(&value) {
                Ok(())
            } else {
                Err(SimError::configuration(format!("{name} must be within 0..=100, got {value}")))
            }
        }

        positive("window_width", self.window_width)?;
        positive("window_height", self.window_height)?;
        percent("table_width_percent", self.table_width_percent)?;
        percent("net_position_percent", self.net_position_percent)?;
        positive("table width", self.table_width())?;

        positive("paddle_width", self.paddle_width)?;
        positive("paddle_height", self.paddle_height)?;
        positive("paddle_speed", self.paddle_speed)?;
        finite("paddle_head_offset", self.paddle_head_offset)?;
        positive("paddle_head_height", self.paddle_head_height)?;
        non_negative("paddle_table_gap", self.paddle_table_gap)?;
        if self.paddle_head_offset < 0.0 || self.paddle_head_offset + self.paddle_head_height > 1.0 {
            return Err(SimError::configuration("paddle head zone must fit inside the paddle"));
        }
        if self.paddle_height > self.window_height || self.paddle_width * 2.0 > self.window_width {
            return Err(SimError::configuration("paddles do not fit inside the window"));
        }

        positive("ball_radius", self.ball_radius)?;
        positive("ball_speed_min", self.ball_speed_min)?;
        positive("ball_speed_max", self.ball_speed_max)?;
        if self.ball_speed_max < self.ball_speed_min {
            return Err(SimError::configuration(format!(
                "ball speed bounds inverted: min {} > max {}",
                self.ball_speed_min, self.ball_speed_max
            )));
        }

        if self.points_to_win_game == 0 {
            return Err(SimError::configuration("points_to_win_game must be positive"));
        }
        if self.min_win_margin == 0 {
            return Err(SimError::configuration("min_win_margin must be positive"));
        }
        if self.games_to_win_match == 0 || self.games_to_win_match.checked_mul(2).is_none() {
            return Err(SimError::configuration(format!(
                "games_to_win_match must be within 1..={}, got {}",
                u32::MAX / 2,
                self.games_to_win_match
            )));
        }
        if self.serves_per_turn == 0 {
            return Err(SimError::configuration("serves_per_turn must be positive"));
        }

        // Both service spots must sit strictly inside the server's own half
        non_negative("serve_inset", self.serve_inset)?;
        let half = (self.net_x() - self.table_x()).min(self.table_x() + self.table_width() - self.net_x());
        if self.serve_inset >= half {
            return Err(SimError::configuration(format!(
                "serve_inset {} does not leave the serve inside a half of width {half}",
                self.serve_inset
            )));
        }

        if self.difficulty_min == 0 || self.difficulty_max <= self.difficulty_min {
            return Err(SimError::configuration(format!(
                "difficulty range {}..={} is empty",
                self.difficulty_min, self.difficulty_max
            )));
        }

        Ok(())
    }

    pub fn table_width(&self) -> f32 {
        self.window_width * self.table_width_percent / 100.0
    }

    pub fn table_height(&self) -> f32 {
        self.window_height * 0.5
    }

    pub fn table_x(&self) -> f32 {
        (self.window_width - self.table_width()) / 2.0
    }

    pub fn table_y(&self) -> f32 {
        self.window_height * 0.25
    }

    pub fn table_rect(&self) -> Rect {
        Rect::new(self.table_x(), self.table_y(), self.table_width(), self.table_height())
    }

    /// X coordinate of the net line
    pub fn net_x(&self) -> f32 {
        self.table_x() + self.table_width() * self.net_position_percent / 100.0
    }

    pub fn scoring(&self) -> ScoringRules {
        ScoringRules {
            points_to_win_game: self.points_to_win_game,
            min_win_margin: self.min_win_margin,
            games_to_win_match: self.games_to_win_match,
        }
    }
}
