//! Serve rotation and service phases
//!
//! Service changes hands every `serves_per_turn` points (two by default). Once
//! both players reach the deuce threshold it changes after every point. Deuce is
//! recomputed from the live score on every call, never cached across games.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision::{aim_direction, pick_target};
use super::score::ScoreState;
use super::state::{Ball, Player, RallyPhase, Side};
use crate::error::{Result, SimError};
use crate::rules::RuleConfig;

/// Service phase of the current point
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServePhase {
    ReadyToServe,
    ServiceStarted,
    Rally,
    PointOver,
    /// Match decided; no further service
    GameOver,
}

/// Who serves, how many serves are left in the turn, and where the point is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServeController {
    pub current_server: Player,
    pub service_count_this_turn: u32,
    pub is_deuce: bool,
    pub serves_per_turn: u32,
    pub phase: ServePhase,
    /// Last serve was called a let and will be replayed
    pub let_called: bool,
    /// Who opened the current game; the other player opens the next one
    pub first_server_this_game: Player,
    default_serves_per_turn: u32,
    deuce_threshold: u32,
}

impl ServeController {
    pub fn new(rules: &RuleConfig, first_server: Player) -> Self {
        Self {
            current_server: first_server,
            service_count_this_turn: 0,
            is_deuce: false,
            serves_per_turn: rules.serves_per_turn,
            phase: ServePhase::ReadyToServe,
            let_called: false,
            first_server_this_game: first_server,
            default_serves_per_turn: rules.serves_per_turn,
            deuce_threshold: rules.scoring().deuce_threshold(),
        }
    }

    /// Toss for the first server of a match
    pub fn draw_first_server<R: Rng + ?Sized>(rng: &mut R) -> Player {
        if rng.random_bool(0.5) { Player::One } else { Player::Two }
    }

    /// Side the current server plays from
    pub fn serving_side(&self) -> Side {
        self.current_server.side()
    }

    pub fn services_remaining(&self) -> u32 {
        self.serves_per_turn.saturating_sub(self.service_count_this_turn)
    }

    /// X where the server puts the ball: just inside their end of the table
    pub fn service_x(&self, rules: &RuleConfig) -> f32 {
        match self.serving_side() {
            Side::Left => rules.table_x() + rules.serve_inset,
            Side::Right => rules.table_x() + rules.table_width() - rules.serve_inset,
        }
    }

    /// Place the ball on the server's side, motionless, waiting for the serve
    pub fn begin_service(&mut self, player: Player, ball: &mut Ball, rules: &RuleConfig) -> Result<()> {
        if self.phase != ServePhase::ReadyToServe {
            return Err(SimError::invalid_transition(format!(
                "cannot begin service from {:?}",
                self.phase
            )));
        }
        if player != self.current_server {
            return Err(SimError::validation(format!(
                "{player} asked to serve but {} holds the serve",
                self.current_server
            )));
        }

        ball.reset(rules);
        ball.pos = Vec2::new(self.service_x(rules), rules.window_height / 2.0);
        ball.phase = RallyPhase::ServiceStarted;
        self.phase = ServePhase::ServiceStarted;
        self.let_called = false;
        log::debug!("{player} begins service from the {:?}", self.serving_side());
        Ok(())
    }

    /// Put the placed ball into play toward a random point in the receiver's half
    pub fn launch<R: Rng + ?Sized>(&mut self, ball: &mut Ball, rng: &mut R, rules: &RuleConfig) -> Result<()> {
        let target = pick_target(rng, self.serving_side(), rules);
        self.launch_toward(ball, target)
    }

    /// Launch with an explicit aim point
    pub fn launch_toward(&mut self, ball: &mut Ball, target: Vec2) -> Result<()> {
        if self.phase != ServePhase::ServiceStarted {
            return Err(SimError::invalid_transition(format!(
                "cannot launch a serve from {:?}",
                self.phase
            )));
        }
        ball.vel = aim_direction(ball.pos, target, self.serving_side()) * ball.base_speed;
        ball.target = Some(target);
        self.phase = ServePhase::Rally;
        Ok(())
    }

    /// Replay the serve without counting it
    pub fn call_let(&mut self) -> Result<()> {
        match self.phase {
            ServePhase::ServiceStarted | ServePhase::Rally => {
                self.phase = ServePhase::ReadyToServe;
                self.let_called = true;
                log::debug!("Let: {} serves again", self.current_server);
                Ok(())
            }
            other => Err(SimError::invalid_transition(format!("cannot call a let from {other:?}"))),
        }
    }

    /// The ball left play
    pub fn end_rally(&mut self) -> Result<()> {
        match self.phase {
            ServePhase::ServiceStarted | ServePhase::Rally => {
                self.phase = ServePhase::PointOver;
                Ok(())
            }
            other => Err(SimError::invalid_transition(format!("cannot end a rally from {other:?}"))),
        }
    }

    /// Count the serve just played and rotate the server if the turn is used up
    ///
    /// Returns true when the serve changed hands.
    pub fn resolve_point(&mut self, score: &ScoreState) -> Result<bool> {
        if self.phase == ServePhase::GameOver {
            return Err(SimError::invalid_transition("match is over; no more serves"));
        }

        let (p1, p2) = score.points;
        self.is_deuce = p1 >= self.deuce_threshold && p2 >= self.deuce_threshold;
        self.serves_per_turn = if self.is_deuce { 1 } else { self.default_serves_per_turn };

        self.service_count_this_turn += 1;
        let changed = self.service_count_this_turn >= self.serves_per_turn;
        if changed {
            self.current_server = self.current_server.other();
            self.service_count_this_turn = 0;
            log::debug!("Serve passes to {}", self.current_server);
        }

        self.phase = ServePhase::ReadyToServe;
        self.let_called = false;
        Ok(changed)
    }

    /// Fresh serve state for a new game opened by `first_server`
    pub fn start_game(&mut self, first_server: Player) -> Result<()> {
        if self.phase == ServePhase::GameOver {
            return Err(SimError::invalid_transition("match is over; reset it first"));
        }
        self.current_server = first_server;
        self.first_server_this_game = first_server;
        self.service_count_this_turn = 0;
        self.is_deuce = false;
        self.serves_per_turn = self.default_serves_per_turn;
        self.phase = ServePhase::ReadyToServe;
        self.let_called = false;
        Ok(())
    }

    pub fn finish_match(&mut self) {
        self.phase = ServePhase::GameOver;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::RuleConfig;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn controller() -> (RuleConfig, ServeController) {
        let rules = RuleConfig::default();
        let serve = ServeController::new(&rules, Player::One);
        (rules, serve)
    }

    fn score_at(rules: &RuleConfig, p1: u32, p2: u32) -> ScoreState {
        let mut score = ScoreState::new(rules);
        score.points = (p1, p2);
        score
    }

    #[test]
    fn test_serve_changes_every_two_points() {
        let (rules, mut serve) = controller();
        let score = score_at(&rules, 1, 0);
        assert!(!serve.resolve_point(&score).unwrap());
        assert_eq!(serve.service_count_this_turn, 1);
        assert_eq!(serve.current_server, Player::One);
        assert!(!serve.is_deuce);

        assert!(serve.resolve_point(&score_at(&rules, 1, 1)).unwrap());
        assert_eq!(serve.current_server, Player::Two);
        assert_eq!(serve.serving_side(), Side::Right);
        assert_eq!(serve.service_count_this_turn, 0);
    }

    #[test]
    fn test_serve_changes_every_point_at_deuce() {
        let (rules, mut serve) = controller();
        assert!(serve.resolve_point(&score_at(&rules, 10, 10)).unwrap());
        assert!(serve.is_deuce);
        assert_eq!(serve.serves_per_turn, 1);
        assert_eq!(serve.current_server, Player::Two);

        assert!(serve.resolve_point(&score_at(&rules, 11, 10)).unwrap());
        assert_eq!(serve.current_server, Player::One);
    }

    #[test]
    fn test_deuce_entered_mid_turn_rotates_immediately() {
        let (rules, mut serve) = controller();
        // One serve already used in this turn before reaching 10-10
        serve.resolve_point(&score_at(&rules, 10, 9)).unwrap();
        assert_eq!(serve.service_count_this_turn, 1);
        assert!(serve.resolve_point(&score_at(&rules, 10, 10)).unwrap());
        assert_eq!(serve.service_count_this_turn, 0);
    }

    #[test]
    fn test_deuce_recomputed_after_new_game() {
        let (rules, mut serve) = controller();
        serve.resolve_point(&score_at(&rules, 10, 10)).unwrap();
        assert!(serve.is_deuce);
        serve.resolve_point(&score_at(&rules, 0, 1)).unwrap();
        assert!(!serve.is_deuce);
        assert_eq!(serve.serves_per_turn, 2);
    }

    #[test]
    fn test_begin_service_places_ball() {
        let (rules, mut serve) = controller();
        let mut ball = Ball::new(rules.ball_speed_min, &rules).unwrap();
        serve.begin_service(Player::One, &mut ball, &rules).unwrap();
        assert_eq!(ball.pos, Vec2::new(190.0, 300.0));
        assert_eq!(ball.vel, Vec2::ZERO);
        assert!(ball.awaiting_serve);
        assert_eq!(ball.phase, RallyPhase::ServiceStarted);
        assert_eq!(serve.phase, ServePhase::ServiceStarted);

        // Not from ServiceStarted
        assert!(matches!(
            serve.begin_service(Player::One, &mut ball, &rules),
            Err(SimError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_begin_service_right_side_and_wrong_player() {
        let rules = RuleConfig::default();
        let mut serve = ServeController::new(&rules, Player::Two);
        let mut ball = Ball::new(rules.ball_speed_min, &rules).unwrap();
        assert!(matches!(
            serve.begin_service(Player::One, &mut ball, &rules),
            Err(SimError::Validation(_))
        ));
        serve.begin_service(Player::Two, &mut ball, &rules).unwrap();
        assert_eq!(ball.pos.x, 610.0);
    }

    #[test]
    fn test_launch_aims_into_receiver_half() {
        let (rules, mut serve) = controller();
        let mut ball = Ball::new(rules.ball_speed_min, &rules).unwrap();
        let mut rng = Pcg32::seed_from_u64(21);
        assert!(matches!(
            serve.launch(&mut ball, &mut rng, &rules),
            Err(SimError::InvalidTransition(_))
        ));

        serve.begin_service(Player::One, &mut ball, &rules).unwrap();
        serve.launch(&mut ball, &mut rng, &rules).unwrap();
        assert_eq!(serve.phase, ServePhase::Rally);
        assert!(ball.vel.x > 0.0);
        assert!((ball.speed() - ball.base_speed).abs() < 1e-2);
        assert!(ball.target.unwrap().x >= rules.net_x());
        assert!(ball.awaiting_serve);
    }

    #[test]
    fn test_let_replays_serve_without_counting() {
        let (rules, mut serve) = controller();
        let mut ball = Ball::new(rules.ball_speed_min, &rules).unwrap();
        assert!(serve.call_let().is_err());
        serve.begin_service(Player::One, &mut ball, &rules).unwrap();
        serve.call_let().unwrap();
        assert!(serve.let_called);
        assert_eq!(serve.phase, ServePhase::ReadyToServe);
        assert_eq!(serve.service_count_this_turn, 0);
        serve.begin_service(Player::One, &mut ball, &rules).unwrap();
        assert!(!serve.let_called);
    }

    #[test]
    fn test_game_over_rejects_everything() {
        let (rules, mut serve) = controller();
        serve.finish_match();
        assert!(matches!(
            serve.resolve_point(&score_at(&rules, 0, 0)),
            Err(SimError::InvalidTransition(_))
        ));
        assert!(serve.start_game(Player::Two).is_err());
    }

    #[test]
    fn test_start_game_resets_turn() {
        let (rules, mut serve) = controller();
        serve.resolve_point(&score_at(&rules, 10, 10)).unwrap();
        serve.start_game(Player::Two).unwrap();
        assert_eq!(serve.current_server, Player::Two);
        assert_eq!(serve.first_server_this_game, Player::Two);
        assert_eq!(serve.serves_per_turn, 2);
        assert_eq!(serve.service_count_this_turn, 0);
        assert!(!serve.is_deuce);
        assert_eq!(serve.services_remaining(), 2);
    }

    proptest! {
        /// Property: the serve changes hands exactly when the turn count reaches serves_per_turn
        #[test]
        fn prop_rotation_matches_turn_length(points in proptest::collection::vec((0u32..15, 0u32..15), 1..60)) {
            let (rules, mut serve) = controller();
            for (p1, p2) in points {
                let before_server = serve.current_server;
                let before_count = serve.service_count_this_turn;
                let deuce = p1 >= 10 && p2 >= 10;
                let turn = if deuce { 1 } else { 2 };

                let changed = serve.resolve_point(&score_at(&rules, p1, p2)).unwrap();
                prop_assert_eq!(serve.is_deuce, deuce);
                prop_assert_eq!(changed, before_count + 1 >= turn);
                if changed {
                    prop_assert_eq!(serve.current_server, before_server.other());
                    prop_assert_eq!(serve.service_count_this_turn, 0);
                } else {
                    prop_assert_eq!(serve.current_server, before_server);
                    prop_assert_eq!(serve.service_count_this_turn, before_count + 1);
                }
            }
        }
    }
}
