//! Contest orchestration: qualifying, bracket and finals against simulated opponents.
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::constants::{BRACKET_BALLS, FINALS_BALLS, QUALIFYING_BALLS};
use crate::error::{CatalogError, ContestError};
use crate::result::DriveResult;

const DEFAULT_OPPONENT_DATA: &str = include_str!("../assets/data/opponents.json");

/// Computer-controlled contestant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Opponent {
    pub id: String,
    pub name: String,
    /// Difficulty tier: 1 qualifying, 2 bracket, 3 finals.
    pub tier: u8,
    pub mean_distance: f64,
    pub variance: f64,
    /// Probability in `0..=1` that a drive finishes out of bounds.
    pub ob_chance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpponentCatalog {
    pub opponents: Vec<Opponent>,
}

impl OpponentCatalog {
    /// Load opponents from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed or if validation fails.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let catalog: Self = serde_json::from_str(json).map_err(|source| CatalogError::Parse {
            table: "opponents",
            source,
        })?;
        catalog.validate()?;
        Ok(catalog)
    }

    /// Embedded default roster.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded asset is malformed.
    pub fn default_config() -> Result<Self, CatalogError> {
        Self::from_json(DEFAULT_OPPONENT_DATA)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let mut seen = HashSet::new();
        for opponent in &self.opponents {
            if !seen.insert(opponent.id.as_str()) {
                return Err(CatalogError::DuplicateId {
                    table: "opponents",
                    id: opponent.id.clone(),
                });
            }
            if !(0.0..=1.0).contains(&opponent.ob_chance) {
                return Err(CatalogError::malformed(
                    "opponents",
                    &opponent.id,
                    "ob_chance must be a probability",
                ));
            }
            if opponent.variance < 0.0 || opponent.mean_distance < opponent.variance {
                return Err(CatalogError::malformed(
                    "opponents",
                    &opponent.id,
                    "variance must be non-negative and below the mean",
                ));
            }
        }
        for round in ContestRound::ORDER {
            if self.for_tier(round.tier()).next().is_none() {
                return Err(CatalogError::malformed(
                    "opponents",
                    "*",
                    format!("no opponent for tier {}", round.tier()),
                ));
            }
        }
        Ok(())
    }

    pub fn for_tier(&self, tier: u8) -> impl Iterator<Item = &Opponent> {
        self.opponents.iter().filter(move |o| o.tier == tier)
    }

    /// Uniform pick among the opponents of a tier.
    ///
    /// # Errors
    ///
    /// Returns [`ContestError::NoOpponentForTier`] if the tier is empty.
    pub fn pick<R: Rng + ?Sized>(&self, tier: u8, rng: &mut R) -> Result<&Opponent, ContestError> {
        let pool: Vec<&Opponent> = self.for_tier(tier).collect();
        pool.choose(rng)
            .copied()
            .ok_or(ContestError::NoOpponentForTier(tier))
    }
}

/// One pre-simulated opponent drive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AiDrive {
    pub distance: f64,
    pub in_bounds: bool,
}

/// Opponent mean ± uniform variance, with an independent out-of-bounds roll.
pub fn simulate_ai_drive<R: Rng + ?Sized>(opponent: &Opponent, rng: &mut R) -> AiDrive {
    let offset = if opponent.variance > 0.0 {
        rng.gen_range(-opponent.variance..=opponent.variance)
    } else {
        0.0
    };
    let distance = (opponent.mean_distance + offset).max(0.0);
    let in_bounds = rng.r#gen::<f64>() >= opponent.ob_chance;
    AiDrive {
        distance,
        in_bounds,
    }
}

/// Best in-bounds distance, or zero if nothing stayed in bounds.
#[must_use]
pub fn best_in_bounds(drives: &[AiDrive]) -> f64 {
    drives
        .iter()
        .filter(|d| d.in_bounds)
        .map(|d| d.distance)
        .fold(0.0, f64::max)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContestRound {
    Qualifying,
    Bracket,
    Finals,
}

impl ContestRound {
    pub const ORDER: [Self; 3] = [Self::Qualifying, Self::Bracket, Self::Finals];

    #[must_use]
    pub const fn balls(self) -> u8 {
        match self {
            Self::Qualifying => QUALIFYING_BALLS,
            Self::Bracket => BRACKET_BALLS,
            Self::Finals => FINALS_BALLS,
        }
    }

    #[must_use]
    pub const fn tier(self) -> u8 {
        match self {
            Self::Qualifying => 1,
            Self::Bracket => 2,
            Self::Finals => 3,
        }
    }

    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self {
            Self::Qualifying => Some(Self::Bracket),
            Self::Bracket => Some(Self::Finals),
            Self::Finals => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContestResult {
    #[default]
    Pending,
    Win,
    Lose,
}

/// Player ball as recorded by the contest.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BallOutcome {
    pub total: f64,
    pub in_bounds: bool,
    pub timed_out: bool,
}

impl From<&DriveResult> for BallOutcome {
    fn from(result: &DriveResult) -> Self {
        Self {
            total: result.total,
            in_bounds: result.in_bounds,
            timed_out: result.timed_out,
        }
    }
}

/// Snapshot of the active round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContestState {
    pub round: ContestRound,
    pub balls_remaining: u8,
    pub total_balls: u8,
    pub player_best: f64,
    pub opponent: Opponent,
    pub opponent_best: f64,
    pub player_drives: Vec<BallOutcome>,
    pub opponent_drives: Vec<AiDrive>,
    pub result: ContestResult,
    /// Set once the round is won and the next one has not started.
    pub round_won: bool,
}

impl ContestState {
    /// Fresh round with the opponent's drives already thrown.
    pub fn new_round<R: Rng + ?Sized>(
        round: ContestRound,
        opponents: &OpponentCatalog,
        rng: &mut R,
    ) -> Result<Self, ContestError> {
        let opponent = opponents.pick(round.tier(), rng)?.clone();
        let opponent_drives: Vec<AiDrive> = (0..round.balls())
            .map(|_| simulate_ai_drive(&opponent, rng))
            .collect();
        Ok(Self::with_opponent_drives(round, opponent, opponent_drives))
    }

    /// Round with explicit opponent drives; the opponent's best is derived from them.
    #[must_use]
    pub fn with_opponent_drives(
        round: ContestRound,
        opponent: Opponent,
        opponent_drives: Vec<AiDrive>,
    ) -> Self {
        let opponent_best = best_in_bounds(&opponent_drives);
        log::info!(
            "contest {round:?}: {} to beat {opponent_best:.1} yards",
            opponent.name
        );
        Self {
            round,
            balls_remaining: round.balls(),
            total_balls: round.balls(),
            player_best: 0.0,
            opponent,
            opponent_best,
            player_drives: Vec::with_capacity(usize::from(round.balls())),
            opponent_drives,
            result: ContestResult::Pending,
            round_won: false,
        }
    }

    #[must_use]
    pub fn is_round_over(&self) -> bool {
        self.balls_remaining == 0 || self.result != ContestResult::Pending
    }
}

/// What happened after a ball was recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContestUpdate {
    NextBall,
    RoundWon { next: ContestRound },
    Champion,
    Eliminated,
}

/// The contextual action offered after a ball lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContestAction {
    NextBall,
    NextRound,
    BackToMenu,
}

/// Owns at most one contest at a time.
#[derive(Debug, Clone, Default)]
pub struct ContestOrchestrator {
    state: Option<ContestState>,
}

impl ContestOrchestrator {
    #[must_use]
    pub const fn new() -> Self {
        Self { state: None }
    }

    #[must_use]
    pub const fn state(&self) -> Option<&ContestState> {
        self.state.as_ref()
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Start at qualifying, replacing any prior contest outright.
    ///
    /// # Errors
    ///
    /// Returns an error if no qualifying opponent exists.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        opponents: &OpponentCatalog,
        rng: &mut R,
    ) -> Result<&ContestState, ContestError> {
        let state = ContestState::new_round(ContestRound::Qualifying, opponents, rng)?;
        Ok(self.state.insert(state))
    }

    /// Install a prepared round, e.g. with forced opponent drives.
    pub fn start_with(&mut self, state: ContestState) -> &ContestState {
        self.state.insert(state)
    }

    /// Consume one ball for the player.
    ///
    /// # Errors
    ///
    /// Returns an error when no contest is active, the contest is decided or the
    /// round has no balls left.
    pub fn record_ball(&mut self, result: &DriveResult) -> Result<ContestUpdate, ContestError> {
        let state = self.state.as_mut().ok_or(ContestError::NoActiveContest)?;
        if state.result != ContestResult::Pending {
            return Err(ContestError::ContestDecided);
        }
        if state.balls_remaining == 0 {
            return Err(ContestError::RoundComplete);
        }
        state.balls_remaining -= 1;
        state.player_drives.push(BallOutcome::from(result));
        state.player_best = state.player_best.max(result.scoring_distance());
        if state.balls_remaining > 0 {
            return Ok(ContestUpdate::NextBall);
        }

        let won = state.player_best > state.opponent_best;
        let update = match (won, state.round.next()) {
            (true, Some(next)) => {
                state.round_won = true;
                ContestUpdate::RoundWon { next }
            }
            (true, None) => {
                state.result = ContestResult::Win;
                ContestUpdate::Champion
            }
            (false, _) => {
                state.result = ContestResult::Lose;
                ContestUpdate::Eliminated
            }
        };
        log::info!(
            "contest {:?} decided: player {:.1} vs {} {:.1} -> {update:?}",
            state.round,
            state.player_best,
            state.opponent.name,
            state.opponent_best
        );
        Ok(update)
    }

    /// Replace the won round with the next one.
    ///
    /// # Errors
    ///
    /// Returns [`ContestError::RoundNotWon`] unless the current round was just won.
    pub fn advance_round<R: Rng + ?Sized>(
        &mut self,
        opponents: &OpponentCatalog,
        rng: &mut R,
    ) -> Result<&ContestState, ContestError> {
        let state = self.state.as_ref().ok_or(ContestError::NoActiveContest)?;
        let next = match (state.round_won, state.round.next()) {
            (true, Some(next)) => next,
            _ => return Err(ContestError::RoundNotWon),
        };
        let fresh = ContestState::new_round(next, opponents, rng)?;
        Ok(self.state.insert(fresh))
    }

    /// Contextual action for the player's reset button.
    #[must_use]
    pub fn next_action(&self) -> ContestAction {
        match self.state.as_ref() {
            None => ContestAction::BackToMenu,
            Some(state) if state.result != ContestResult::Pending => ContestAction::BackToMenu,
            Some(state) if state.round_won => ContestAction::NextRound,
            Some(_) => ContestAction::NextBall,
        }
    }

    /// Drop the contest and return to the menu.
    pub fn abandon(&mut self) -> Option<ContestState> {
        self.state.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn drive(total: f64, in_bounds: bool) -> DriveResult {
        DriveResult {
            carry: total * 0.9,
            roll: total * 0.1,
            total,
            ball_speed: 150.0,
            launch_angle: 12.0,
            wind: 0.0,
            power: 80.0,
            accuracy: 50.0,
            in_bounds,
            night_mode: false,
            timed_out: false,
        }
    }

    fn opponent(tier: u8) -> Opponent {
        Opponent {
            id: format!("tier{tier}"),
            name: format!("Tier {tier}"),
            tier,
            mean_distance: 280.0,
            variance: 10.0,
            ob_chance: 0.2,
        }
    }

    #[test]
    fn opponent_best_ignores_out_of_bounds() {
        let drives = [
            AiDrive {
                distance: 330.0,
                in_bounds: false,
            },
            AiDrive {
                distance: 290.0,
                in_bounds: true,
            },
        ];
        assert!((best_in_bounds(&drives) - 290.0).abs() < f64::EPSILON);
        assert!(best_in_bounds(&[]).abs() < f64::EPSILON);
    }

    #[test]
    fn ai_drive_respects_variance() {
        let opp = opponent(2);
        let mut rng = SmallRng::seed_from_u64(12);
        for _ in 0..200 {
            let d = simulate_ai_drive(&opp, &mut rng);
            assert!((d.distance - opp.mean_distance).abs() <= opp.variance + 1e-9);
        }
    }

    #[test]
    fn default_roster_covers_every_round() {
        let catalog = OpponentCatalog::default_config().unwrap();
        let mut rng = SmallRng::seed_from_u64(1);
        for round in ContestRound::ORDER {
            let picked = catalog.pick(round.tier(), &mut rng).unwrap();
            assert_eq!(picked.tier, round.tier());
        }
        assert_eq!(
            catalog.pick(9, &mut rng).unwrap_err(),
            ContestError::NoOpponentForTier(9)
        );
    }

    #[test]
    fn losing_round_eliminates_and_blocks_further_balls() {
        let mut contest = ContestOrchestrator::new();
        let drives = vec![
            AiDrive {
                distance: 300.0,
                in_bounds: true,
            };
            6
        ];
        contest.start_with(ContestState::with_opponent_drives(
            ContestRound::Qualifying,
            opponent(1),
            drives,
        ));
        for _ in 0..5 {
            assert_eq!(
                contest.record_ball(&drive(250.0, true)).unwrap(),
                ContestUpdate::NextBall
            );
        }
        assert_eq!(
            contest.record_ball(&drive(299.0, true)).unwrap(),
            ContestUpdate::Eliminated
        );
        let state = contest.state().unwrap();
        assert_eq!(state.result, ContestResult::Lose);
        assert_eq!(state.balls_remaining, 0);
        assert_eq!(
            contest.record_ball(&drive(400.0, true)),
            Err(ContestError::ContestDecided)
        );
        assert_eq!(contest.next_action(), ContestAction::BackToMenu);
    }

    #[test]
    fn tie_goes_to_the_opponent() {
        let mut contest = ContestOrchestrator::new();
        contest.start_with(ContestState::with_opponent_drives(
            ContestRound::Finals,
            opponent(3),
            vec![AiDrive {
                distance: 300.0,
                in_bounds: true,
            }],
        ));
        contest.record_ball(&drive(300.0, true)).unwrap();
        assert_eq!(
            contest.record_ball(&drive(300.0, true)).unwrap(),
            ContestUpdate::Eliminated
        );
    }

    #[test]
    fn out_of_bounds_player_drives_do_not_count() {
        let mut contest = ContestOrchestrator::new();
        contest.start_with(ContestState::with_opponent_drives(
            ContestRound::Finals,
            opponent(3),
            vec![AiDrive {
                distance: 100.0,
                in_bounds: true,
            }],
        ));
        contest.record_ball(&drive(450.0, false)).unwrap();
        assert!(contest.state().unwrap().player_best.abs() < f64::EPSILON);
        assert_eq!(
            contest.record_ball(&drive(90.0, true)).unwrap(),
            ContestUpdate::Eliminated
        );
    }

    #[test]
    fn advancing_requires_a_won_round() {
        let catalog = OpponentCatalog::default_config().unwrap();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut contest = ContestOrchestrator::new();
        assert_eq!(
            contest.advance_round(&catalog, &mut rng).unwrap_err(),
            ContestError::NoActiveContest
        );
        contest.start(&catalog, &mut rng).unwrap();
        assert_eq!(
            contest.advance_round(&catalog, &mut rng).unwrap_err(),
            ContestError::RoundNotWon
        );
        assert_eq!(contest.next_action(), ContestAction::NextBall);
    }

    #[test]
    fn starting_again_replaces_prior_state() {
        let catalog = OpponentCatalog::default_config().unwrap();
        let mut rng = SmallRng::seed_from_u64(6);
        let mut contest = ContestOrchestrator::new();
        contest.start(&catalog, &mut rng).unwrap();
        contest.record_ball(&drive(200.0, true)).unwrap();
        let fresh = contest.start(&catalog, &mut rng).unwrap();
        assert_eq!(fresh.round, ContestRound::Qualifying);
        assert_eq!(fresh.balls_remaining, 6);
        assert!(fresh.player_drives.is_empty());
        assert_eq!(fresh.opponent_drives.len(), 6);
    }
}
