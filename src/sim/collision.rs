//! Collision detection and rebound for the ball
//!
//! Two kinds of contact matter on a table tennis table seen from above:
//! the ball leaving through the top/bottom of the window (bounce) or through a
//! side (point over), and the ball meeting a paddle head (return).
//!
//! A return does not reflect the incoming velocity. The striker aims at a
//! random point in the opponent's half and the ball leaves at the base speed
//! scaled by how far from the centre of the head it was struck.

use glam::Vec2;
use rand::Rng;

use super::state::{Ball, Paddle, RallyPhase, Side};
use crate::audio::SoundCue;
use crate::error::{Result, SimError};
use crate::rules::RuleConfig;

/// Horizontal window edge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wall {
    Top,
    Bottom,
}

/// Result of moving the ball for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// Ball inactive, nothing moved
    Idle,
    Moved,
    WallBounce(Wall),
    /// Ball crossed a vertical boundary; the point is over
    OutOfBounds { exit: Side },
}

impl AdvanceOutcome {
    pub fn point_scored(&self) -> bool {
        matches!(self, AdvanceOutcome::OutOfBounds { .. })
    }
}

/// Result of a paddle contact
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitOutcome {
    /// Paddle still cooling down from its previous hit; nothing changed
    Ignored,
    Hit {
        side: Side,
        cue: SoundCue,
        multiplier: f32,
        target: Vec2,
    },
}

impl HitOutcome {
    pub fn is_hit(&self) -> bool {
        matches!(self, HitOutcome::Hit { .. })
    }
}

/// Move the ball by `dt` seconds and resolve window edges
///
/// Leaving through the left or right edge ends the point without touching
/// the vertical geometry. Top and bottom edges clamp and bounce.
pub fn advance(ball: &mut Ball, dt: f32, rules: &RuleConfig) -> Result<AdvanceOutcome> {
    if !dt.is_finite() || dt < 0.0 {
        return Err(SimError::validation(format!("frame delta must be finite and >= 0, got {dt}")));
    }
    if !ball.active {
        return Ok(AdvanceOutcome::Idle);
    }

    ball.pos += ball.vel * dt;

    if ball.pos.x < 0.0 || ball.pos.x > rules.window_width {
        let exit = if ball.pos.x < 0.0 { Side::Left } else { Side::Right };
        ball.active = false;
        ball.phase = RallyPhase::PointOver;
        log::debug!("Ball out of bounds on the {exit:?} at {:?}", ball.pos);
        return Ok(AdvanceOutcome::OutOfBounds { exit });
    }

    let outcome = if ball.pos.y < 0.0 {
        ball.pos.y = 0.0;
        ball.vel.y = ball.vel.y.abs();
        AdvanceOutcome::WallBounce(Wall::Top)
    } else if ball.pos.y > rules.window_height {
        ball.pos.y = rules.window_height;
        ball.vel.y = -ball.vel.y.abs();
        AdvanceOutcome::WallBounce(Wall::Bottom)
    } else {
        AdvanceOutcome::Moved
    };

    ball.phase = RallyPhase::Rally;
    Ok(outcome)
}

/// Rebound speed factor: 1.0 for a centre hit, up to 1.5 at either edge
#[inline]
pub fn speed_multiplier(offset: f32) -> f32 {
    1.0 + (offset - 0.5).abs()
}

/// Normalised contact height on the paddle head, or `None` for a miss
///
/// The ball's box must overlap the head zone and its centre must lie within
/// the zone's vertical span.
pub fn impact_offset(ball: &Ball, paddle: &Paddle) -> Option<f32> {
    let zone = paddle.collision_zone();
    if !ball.bounds().intersects(&zone) {
        return None;
    }
    let offset = (ball.pos.y - zone.top()) / zone.height();
    (0.0..=1.0).contains(&offset).then_some(offset)
}

/// Random aim point in the half of the table facing `striker`
pub fn pick_target<R: Rng + ?Sized>(rng: &mut R, striker: Side, rules: &RuleConfig) -> Vec2 {
    let (left_half, right_half) = rules.table_rect().split_at_x(rules.net_x());
    let half = match striker {
        Side::Left => right_half,
        Side::Right => left_half,
    };
    Vec2::new(
        rng.random_range(half.left()..=half.right()),
        rng.random_range(half.top()..=half.bottom()),
    )
}

/// Unit vector from `from` toward `to`, falling back to straight across the net
pub(crate) fn aim_direction(from: Vec2, to: Vec2, striker: Side) -> Vec2 {
    let dir = (to - from).normalize_or_zero();
    if dir == Vec2::ZERO {
        match striker {
            Side::Left => Vec2::X,
            Side::Right => Vec2::NEG_X,
        }
    } else {
        dir
    }
}

/// Return the ball from `paddle`, aiming at a random point in the other half
///
/// Callers must have checked overlap first (see [`impact_offset`]).
pub fn on_paddle_hit<R: Rng + ?Sized>(
    ball: &mut Ball,
    paddle: &mut Paddle,
    offset: f32,
    now_ms: u64,
    rng: &mut R,
    rules: &RuleConfig,
) -> Result<HitOutcome> {
    check_hit(ball, paddle, offset)?;
    if paddle.in_cooldown(now_ms, rules.impact_cooldown_ms) {
        log::debug!("{:?} paddle contact ignored (cooldown)", paddle.side);
        return Ok(HitOutcome::Ignored);
    }
    check_overlap(ball, paddle)?;

    let target = pick_target(rng, paddle.side, rules);
    Ok(apply_hit(ball, paddle, offset, target, now_ms))
}

/// Same as [`on_paddle_hit`] with an explicit aim point instead of a random one
pub fn on_paddle_hit_toward(
    ball: &mut Ball,
    paddle: &mut Paddle,
    offset: f32,
    target: Vec2,
    now_ms: u64,
    rules: &RuleConfig,
) -> Result<HitOutcome> {
    check_hit(ball, paddle, offset)?;
    if paddle.in_cooldown(now_ms, rules.impact_cooldown_ms) {
        return Ok(HitOutcome::Ignored);
    }
    check_overlap(ball, paddle)?;
    Ok(apply_hit(ball, paddle, offset, target, now_ms))
}

fn check_hit(ball: &Ball, paddle: &Paddle, offset: f32) -> Result<()> {
    if !offset.is_finite() || !(0.0..=1.0).contains(&offset) {
        return Err(SimError::validation(format!(
            "impact offset {offset} outside 0..=1 on {:?} paddle",
            paddle.side
        )));
    }
    if !ball.active {
        return Err(SimError::invalid_transition("paddle hit on an inactive ball"));
    }
    Ok(())
}

fn check_overlap(ball: &Ball, paddle: &Paddle) -> Result<()> {
    if !ball.bounds().intersects(&paddle.collision_zone()) {
        return Err(SimError::invalid_transition(format!(
            "paddle hit without contact: ball at {:?}, {:?} paddle head {:?}",
            ball.pos,
            paddle.side,
            paddle.collision_zone()
        )));
    }
    Ok(())
}

fn apply_hit(ball: &mut Ball, paddle: &mut Paddle, offset: f32, target: Vec2, now_ms: u64) -> HitOutcome {
    let multiplier = speed_multiplier(offset);

    // Clear of the leading edge so the next frame cannot re-collide
    ball.pos.x = match paddle.side {
        Side::Left => paddle.leading_edge() + ball.radius,
        Side::Right => paddle.leading_edge() - ball.radius,
    };
    ball.vel = aim_direction(ball.pos, target, paddle.side) * ball.base_speed * multiplier;
    ball.target = Some(target);
    ball.awaiting_serve = false;
    ball.phase = RallyPhase::Rally;
    paddle.last_impact_ms = Some(now_ms);

    log::debug!(
        "{:?} paddle hit at offset {offset:.2} (x{multiplier:.2}), aiming {target:?}",
        paddle.side
    );

    HitOutcome::Hit {
        side: paddle.side,
        cue: paddle.cue(),
        multiplier,
        target,
    }
}

/// Resolve at most one paddle contact this frame
///
/// The paddle on the side the ball is travelling toward is checked first
/// (left first when the ball has no horizontal motion). Paddles still in
/// cooldown are skipped.
pub fn resolve_paddle_contact<R: Rng + ?Sized>(
    ball: &mut Ball,
    left: &mut Paddle,
    right: &mut Paddle,
    now_ms: u64,
    rng: &mut R,
    rules: &RuleConfig,
) -> Result<Option<HitOutcome>> {
    if !ball.active {
        return Ok(None);
    }

    let order: [&mut Paddle; 2] = if ball.vel.x > 0.0 {
        [right, left]
    } else {
        [left, right]
    };

    for paddle in order {
        if paddle.in_cooldown(now_ms, rules.impact_cooldown_ms) {
            continue;
        }
        if let Some(offset) = impact_offset(ball, paddle) {
            let outcome = on_paddle_hit(ball, paddle, offset, now_ms, rng, rules)?;
            return Ok(Some(outcome));
        }
    }
    Ok(None)
}
