//! Points, games and match result
//!
//! A game goes to the first player with `points_to_win_game` points and a
//! lead of `min_win_margin`. The match goes to the first player with
//! `games_to_win_match` games. Once the match is decided the score is
//! frozen until [`ScoreState::reset`].

use serde::{Deserialize, Serialize};

use super::state::Player;
use crate::error::{Result, SimError};
use crate::rules::{RuleConfig, ScoringRules};

/// What a single awarded point did to the match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointOutcome {
    /// Game still in play
    Continue,
    GameWon {
        winner: Player,
        final_points: (u32, u32),
    },
    /// Game and match won with the same point
    MatchWon {
        winner: Player,
        final_points: (u32, u32),
        games: (u32, u32),
    },
}

/// Final points of a completed game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub winner: Player,
    pub points: (u32, u32),
}

/// Summary of the match so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchStats {
    pub games_played: u32,
    pub games_won: (u32, u32),
    /// Points per player across completed games
    pub total_points: (u32, u32),
    /// 1-based number of the game in play (or the last one once the match is over)
    pub current_game: u32,
    pub total_games_possible: u32,
    pub winner: Option<Player>,
}

/// Score keeper for one match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreState {
    pub points: (u32, u32),
    pub games_won: (u32, u32),
    /// Both players at the deuce threshold or beyond
    pub is_advantage: bool,
    /// Leader by exactly one point while at deuce
    pub advantage_player: Option<Player>,
    pub game_winner: Option<Player>,
    pub match_winner: Option<Player>,
    pub history: Vec<GameRecord>,
    rules: ScoringRules,
}

fn get(pair: (u32, u32), player: Player) -> u32 {
    match player {
        Player::One => pair.0,
        Player::Two => pair.1,
    }
}

fn bump(pair: &mut (u32, u32), player: Player) {
    match player {
        Player::One => pair.0 += 1,
        Player::Two => pair.1 += 1,
    }
}

impl ScoreState {
    pub fn new(rules: &RuleConfig) -> Self {
        Self::with_rules(rules.scoring())
    }

    pub fn with_rules(rules: ScoringRules) -> Self {
        Self {
            points: (0, 0),
            games_won: (0, 0),
            is_advantage: false,
            advantage_player: None,
            game_winner: None,
            match_winner: None,
            history: Vec::new(),
            rules,
        }
    }

    pub fn points_of(&self, player: Player) -> u32 {
        get(self.points, player)
    }

    pub fn games_of(&self, player: Player) -> u32 {
        get(self.games_won, player)
    }

    /// Current game decided and waiting for [`start_next_game`](Self::start_next_game)
    pub fn game_decided(&self) -> bool {
        self.game_winner.is_some()
    }

    /// Give one point to `player`
    pub fn award_point(&mut self, player: Player) -> Result<PointOutcome> {
        if let Some(winner) = self.match_winner {
            return Err(SimError::invalid_transition(format!(
                "match already won by {winner}"
            )));
        }
        if let Some(winner) = self.game_winner {
            return Err(SimError::invalid_transition(format!(
                "game already won by {winner}; start the next game first"
            )));
        }

        bump(&mut self.points, player);
        let (p1, p2) = self.points;
        let leader = if p1 >= p2 { Player::One } else { Player::Two };
        let margin = p1.abs_diff(p2);

        if p1.max(p2) >= self.rules.points_to_win_game && margin >= self.rules.min_win_margin {
            return Ok(self.finish_game(leader));
        }

        let threshold = self.rules.deuce_threshold();
        self.is_advantage = p1 >= threshold && p2 >= threshold;
        self.advantage_player = (self.is_advantage && margin == 1).then_some(leader);
        if self.is_advantage {
            log::debug!("{}", self.headline());
        }
        Ok(PointOutcome::Continue)
    }

    fn finish_game(&mut self, winner: Player) -> PointOutcome {
        let final_points = self.points;
        bump(&mut self.games_won, winner);
        self.game_winner = Some(winner);
        self.is_advantage = false;
        self.advantage_player = None;
        self.history.push(GameRecord {
            winner,
            points: final_points,
        });
        log::info!(
            "Game {} to {winner}, {} - {}",
            self.history.len(),
            final_points.0,
            final_points.1
        );

        if self.games_of(winner) >= self.rules.games_to_win_match {
            self.match_winner = Some(winner);
            log::info!(
                "Match to {winner}, games {} - {}",
                self.games_won.0,
                self.games_won.1
            );
            return PointOutcome::MatchWon {
                winner,
                final_points,
                games: self.games_won,
            };
        }
        PointOutcome::GameWon {
            winner,
            final_points,
        }
    }

    /// Clear the points of a decided game so play can continue
    pub fn start_next_game(&mut self) -> Result<()> {
        if self.match_winner.is_some() {
            return Err(SimError::invalid_transition("match is over"));
        }
        if self.game_winner.is_none() {
            return Err(SimError::invalid_transition("current game is still in play"));
        }
        self.points = (0, 0);
        self.game_winner = None;
        self.is_advantage = false;
        self.advantage_player = None;
        Ok(())
    }

    /// Back to 0-0, no games, no history
    pub fn reset(&mut self) {
        *self = Self::with_rules(self.rules);
    }

    pub fn stats(&self) -> MatchStats {
        let total_points = self
            .history
            .iter()
            .fold((0, 0), |(a, b), game| (a + game.points.0, b + game.points.1));
        let games_played = self.history.len() as u32;
        let current_game = if self.match_winner.is_some() || self.game_winner.is_some() {
            games_played.max(1)
        } else {
            games_played + 1
        };

        MatchStats {
            games_played,
            games_won: self.games_won,
            total_points,
            current_game,
            total_games_possible: self.rules.total_games_possible(),
            winner: self.match_winner,
        }
    }

    /// Scoreboard line for the current game
    pub fn headline(&self) -> String {
        match (self.is_advantage, self.advantage_player) {
            (true, Some(player)) => format!("Advantage {player}"),
            (true, None) => "Deuce".to_string(),
            _ => format!("{} - {}", self.points.0, self.points.1),
        }
    }
}

impl std::fmt::Display for ScoreState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} - {} | games {} - {}",
            self.points.0, self.points.1, self.games_won.0, self.games_won.1
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn score() -> ScoreState {
        ScoreState::new(&RuleConfig::default())
    }

    fn award_n(score: &mut ScoreState, player: Player, n: u32) {
        for _ in 0..n {
            score.award_point(player).unwrap();
        }
    }

    /// Win one game 11-0 and open the next
    fn win_game(score: &mut ScoreState, player: Player) -> PointOutcome {
        let mut outcome = PointOutcome::Continue;
        for _ in 0..11 {
            outcome = score.award_point(player).unwrap();
        }
        if score.match_winner.is_none() {
            score.start_next_game().unwrap();
        }
        outcome
    }

    #[test]
    fn test_award_at_ten_all_gives_advantage() {
        let mut score = score();
        score.points = (10, 10);
        let outcome = score.award_point(Player::One).unwrap();
        assert_eq!(outcome, PointOutcome::Continue);
        assert_eq!(score.points, (11, 10));
        assert!(score.is_advantage);
        assert_eq!(score.advantage_player, Some(Player::One));
        assert_eq!(score.game_winner, None);
        assert_eq!(score.headline(), "Advantage Player 1");
    }

    #[test]
    fn test_award_at_ten_nine_wins_game() {
        let mut score = score();
        score.points = (10, 9);
        let outcome = score.award_point(Player::One).unwrap();
        assert_eq!(
            outcome,
            PointOutcome::GameWon {
                winner: Player::One,
                final_points: (11, 9)
            }
        );
        assert_eq!(score.points, (11, 9));
        assert_eq!(score.game_winner, Some(Player::One));
        assert_eq!(score.games_won, (1, 0));
        assert!(!score.is_advantage);

        score.start_next_game().unwrap();
        assert_eq!(score.points, (0, 0));
        assert_eq!(score.game_winner, None);
    }

    #[test]
    fn test_no_points_until_next_game_started() {
        let mut score = score();
        award_n(&mut score, Player::Two, 11);
        assert!(score.game_decided());
        assert!(matches!(
            score.award_point(Player::One),
            Err(SimError::InvalidTransition(_))
        ));
        assert_eq!(score.points, (0, 11));
    }

    #[test]
    fn test_start_next_game_requires_decided_game() {
        let mut score = score();
        assert!(matches!(
            score.start_next_game(),
            Err(SimError::InvalidTransition(_))
        ));
    }

    #[test]
    fn test_deuce_and_back() {
        let mut score = score();
        score.points = (10, 9);
        score.award_point(Player::Two).unwrap();
        assert_eq!(score.headline(), "Deuce");
        score.award_point(Player::Two).unwrap();
        assert_eq!(score.headline(), "Advantage Player 2");
        score.award_point(Player::One).unwrap();
        assert_eq!(score.headline(), "Deuce");
        score.award_point(Player::One).unwrap();
        score.award_point(Player::One).unwrap();
        assert_eq!(score.game_winner, Some(Player::One));
        assert_eq!(score.points, (13, 11));
    }

    #[test]
    fn test_match_is_terminal() {
        let mut score = score();
        assert_eq!(
            win_game(&mut score, Player::One),
            PointOutcome::GameWon {
                winner: Player::One,
                final_points: (11, 0)
            }
        );
        win_game(&mut score, Player::Two);
        win_game(&mut score, Player::One);
        let last = win_game(&mut score, Player::One);
        assert_eq!(
            last,
            PointOutcome::MatchWon {
                winner: Player::One,
                final_points: (11, 0),
                games: (3, 1)
            }
        );
        assert_eq!(score.match_winner, Some(Player::One));

        let before = score.clone();
        assert!(matches!(
            score.award_point(Player::Two),
            Err(SimError::InvalidTransition(_))
        ));
        assert!(score.start_next_game().is_err());
        assert_eq!(score, before);
    }

    #[test]
    fn test_stats_and_history() {
        let mut score = score();
        award_n(&mut score, Player::Two, 3);
        win_game(&mut score, Player::One);
        award_n(&mut score, Player::Two, 2);

        let stats = score.stats();
        assert_eq!(stats.games_played, 1);
        assert_eq!(stats.games_won, (1, 0));
        assert_eq!(stats.total_points, (11, 3));
        assert_eq!(stats.current_game, 2);
        assert_eq!(stats.total_games_possible, 5);
        assert_eq!(stats.winner, None);
        assert_eq!(
            score.history,
            vec![GameRecord {
                winner: Player::One,
                points: (11, 3)
            }]
        );
        assert_eq!(score.to_string(), "0 - 2 | games 1 - 0");
    }

    #[test]
    fn test_configurable_match_length() {
        let rules = RuleConfig {
            games_to_win_match: 4,
            ..RuleConfig::default()
        };
        let mut score = ScoreState::new(&rules);
        for _ in 0..3 {
            win_game(&mut score, Player::Two);
        }
        assert_eq!(score.match_winner, None);
        win_game(&mut score, Player::Two);
        assert_eq!(score.match_winner, Some(Player::Two));
        assert_eq!(score.stats().total_games_possible, 7);
    }

    #[test]
    fn test_reset() {
        let mut score = score();
        win_game(&mut score, Player::One);
        award_n(&mut score, Player::Two, 4);
        score.reset();
        assert_eq!(score, ScoreState::new(&RuleConfig::default()));
    }

    proptest! {
        /// Property: any sequence of points keeps games within the match limit
        /// and a decided game always has the winning margin
        #[test]
        fn prop_score_invariants(winners in proptest::collection::vec(any::<bool>(), 0..400)) {
            let mut score = score();
            for one in winners {
                if score.match_winner.is_some() {
                    prop_assert!(score.award_point(Player::One).is_err());
                    break;
                }
                if score.game_decided() {
                    score.start_next_game().unwrap();
                }
                let player = if one { Player::One } else { Player::Two };
                score.award_point(player).unwrap();

                prop_assert!(score.games_won.0 <= 3 && score.games_won.1 <= 3);
                if let Some(winner) = score.game_winner {
                    let (w, l) = (score.points_of(winner), score.points_of(winner.other()));
                    prop_assert!(w >= 11);
                    prop_assert!(w - l >= 2);
                }
            }
        }
    }
}
