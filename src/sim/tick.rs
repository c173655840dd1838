//! Frame step
//!
//! Advances a match by one frame: input, paddles, serve, ball, point resolution.
//! The frame delta is split into fixed substeps so the outcome of a rally does
//! not depend on the frame rate. A frame either completes or leaves the state
//! exactly as it was.

use super::collision::{self, AdvanceOutcome, HitOutcome};
use super::score::PointOutcome;
use super::serve::{ServeController, ServePhase};
use super::state::{GameEvent, MatchState, Player};
use crate::audio::SoundCue;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::error::{Result, SimError};

/// Input commands for a single frame, sampled once before the step
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub player1_up: bool,
    pub player1_down: bool,
    pub player1_left: bool,
    pub player1_right: bool,
    pub player2_up: bool,
    pub player2_down: bool,
    pub player2_left: bool,
    pub player2_right: bool,
    /// Place and launch the serve
    pub serve: bool,
    /// Replay the current serve (before it is returned)
    pub let_serve: bool,
    /// Start the match over
    pub reset: bool,
    /// Pause toggle
    pub pause: bool,
}

fn axis(negative: bool, positive: bool) -> f32 {
    match (negative, positive) {
        (true, false) => -1.0,
        (false, true) => 1.0,
        _ => 0.0,
    }
}

/// Advance the match by `dt` seconds
pub fn tick(state: &mut MatchState, input: &TickInput, dt: f32) {
    if input.reset {
        reset_match(state);
        return;
    }

    if input.pause && !state.is_over() {
        state.paused = !state.paused;
        log::debug!("{}", if state.paused { "Paused" } else { "Resumed" });
    }

    // Don't tick if paused or match over
    if state.paused || state.is_over() {
        return;
    }

    let mut next = state.clone();
    match step(&mut next, input, dt) {
        Ok(()) => *state = next,
        Err(err) if err.is_recoverable() => {
            log::warn!("Frame {} discarded: {err}", state.frames + 1)
        }
        Err(err) => log::error!("Frame {} discarded: {err}", state.frames + 1),
    }
}

/// Number of fixed substeps covering `dt`, and their length
///
/// Each substep is at most `SIM_DT`. Frames longer than `MAX_SUBSTEPS` of them
/// are shortened so a stall cannot snowball.
fn substeps(dt: f32) -> (u32, f32) {
    let dt = dt.min(SIM_DT * MAX_SUBSTEPS as f32);
    // Tolerance keeps exact multiples of SIM_DT from rounding up a step
    let count = ((dt / SIM_DT - 1e-4).ceil() as u32).clamp(1, MAX_SUBSTEPS);
    (count, dt / count as f32)
}

fn step(state: &mut MatchState, input: &TickInput, dt: f32) -> Result<()> {
    if !dt.is_finite() || dt < 0.0 {
        return Err(SimError::validation(format!("frame delta must be finite and >= 0, got {dt}")));
    }
    state.frames += 1;

    state.left.set_intent(
        axis(input.player1_left, input.player1_right),
        axis(input.player1_up, input.player1_down),
    );
    state.right.set_intent(
        axis(input.player2_left, input.player2_right),
        axis(input.player2_up, input.player2_down),
    );

    let (count, sub_dt) = substeps(dt);
    for i in 0..count {
        substep(state, input, sub_dt, i == 0)?;
        if state.is_over() {
            break;
        }
    }
    Ok(())
}

/// One fixed slice of a frame; one-shot intents only apply on the first
fn substep(state: &mut MatchState, input: &TickInput, dt: f32, first: bool) -> Result<()> {
    state.advance_clock(dt);
    state.left.step(dt);
    state.right.step(dt);

    if first && input.let_serve {
        call_let(state)?;
    }
    if first && input.serve {
        serve(state)?;
    }

    if state.serve.phase != ServePhase::Rally {
        return Ok(());
    }

    match collision::advance(&mut state.ball, dt, &state.rules)? {
        AdvanceOutcome::OutOfBounds { exit } => {
            // The player defending the far side wins the point
            resolve_point(state, exit.opposite().player())?;
        }
        outcome => {
            if let AdvanceOutcome::WallBounce(_) = outcome {
                state.events.push(GameEvent::WallBounce);
            }
            let now = state.clock_ms;
            let contact = collision::resolve_paddle_contact(
                &mut state.ball,
                &mut state.left,
                &mut state.right,
                now,
                &mut state.rng,
                &state.rules,
            )?;
            if let Some(HitOutcome::Hit { cue, .. }) = contact {
                state.events.push(GameEvent::Cue(cue));
            }
        }
    }
    Ok(())
}

/// Serve key: place the ball if needed, then put it in play
fn serve(state: &mut MatchState) -> Result<()> {
    match state.serve.phase {
        ServePhase::ReadyToServe => {
            let server = state.serve.current_server;
            state.serve.begin_service(server, &mut state.ball, &state.rules)?;
        }
        ServePhase::ServiceStarted => {}
        // Already in play, or nothing left to serve
        _ => return Ok(()),
    }
    state.serve.launch(&mut state.ball, &mut state.rng, &state.rules)?;
    state.events.push(GameEvent::Cue(SoundCue::Serve));
    Ok(())
}

fn call_let(state: &mut MatchState) -> Result<()> {
    if !state.ball.awaiting_serve {
        return Err(SimError::invalid_transition("a let can only be called before the return"));
    }
    state.serve.call_let()?;
    state.ball.reset(&state.rules);
    state.events.push(GameEvent::LetCalled);
    Ok(())
}

fn resolve_point(state: &mut MatchState, scorer: Player) -> Result<()> {
    state.serve.end_rally()?;
    let outcome = state.score.award_point(scorer)?;
    state.events.push(GameEvent::PointScored {
        scorer,
        points: state.score.points,
    });
    log::debug!("Point to {scorer}: {}", state.score);

    let server_before = state.serve.current_server;
    match outcome {
        PointOutcome::Continue => {
            state.serve.resolve_point(&state.score)?;
        }
        PointOutcome::GameWon {
            winner,
            final_points,
        } => {
            state.events.push(GameEvent::GameWon {
                winner,
                final_points,
            });
            state.score.start_next_game()?;
            let opener = state.serve.first_server_this_game.other();
            state.serve.start_game(opener)?;
        }
        PointOutcome::MatchWon {
            winner,
            final_points,
            games,
        } => {
            state.events.push(GameEvent::GameWon {
                winner,
                final_points,
            });
            state.events.push(GameEvent::MatchWon { winner, games });
            state.serve.finish_match();
        }
    }

    state.left.reset_position();
    state.right.reset_position();

    if state.is_over() {
        return Ok(());
    }
    let server = state.serve.current_server;
    if server != server_before {
        state.events.push(GameEvent::ServeChanged { server });
    }
    state.serve.begin_service(server, &mut state.ball, &state.rules)
}

/// Start the match over with the same rules and difficulty
///
/// The aim generator is rebuilt from the match seed, so a reset match replays
/// the same toss and aim sequence as a freshly created one.
pub fn reset_match(state: &mut MatchState) {
    state.rng = state.rng_state.to_rng();
    let first = ServeController::draw_first_server(&mut state.rng);
    state.serve = ServeController::new(&state.rules, first);
    state.score.reset();
    state.ball.reset(&state.rules);
    for paddle in [&mut state.left, &mut state.right] {
        paddle.reset_position();
        paddle.last_impact_ms = None;
    }
    state.paused = false;
    state.events.push(GameEvent::MatchReset);
    log::info!("Match reset, {first} serves first");
}
