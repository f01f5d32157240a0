//! Session wiring: one shot machine, at most one contest, and the reward loop.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::catalog::Catalogs;
use crate::constants::SHOT_CLOCK_SECONDS;
use crate::contest::{
    ContestAction, ContestOrchestrator, ContestResult, ContestState, ContestUpdate,
};
use crate::equipment::{EquipmentSlot, Loadout, STARTER_BALL_ID, STARTER_DRIVER_ID};
use crate::error::{ContestError, SessionError, ShotError};
use crate::history::DriveHistory;
use crate::profile::{ProfileAggregate, ProfileDelta, ProfileStore};
use crate::progression::{
    AchievementContext, ChestContents, ChestInstance, DailyChallengeDef, DriveContext,
    DriveOutcome, check_achievements, check_challenge, daily_challenges_for, drive_rewards,
    first_completed_challenge,
};
use crate::result::DriveResult;
use crate::rng::RngBundle;
use crate::shot::{ShotEvent, ShotMachine, ShotPhase, ShotSetup};
use crate::venue::{VenueDef, VenueLockReason, VenueUnlock, is_venue_unlocked, unlock_venue};
use crate::weather::{AmbientConditions, select_freeplay_conditions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PlayMode {
    #[default]
    Freeplay,
    Contest,
}

/// Outbound notification for the rendering collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SessionEvent {
    Shot(ShotEvent),
    Contest {
        update: ContestUpdate,
        state: ContestState,
    },
    /// A fresh round was drawn: contest start or a `NextRound` reset.
    RoundStarted(ContestState),
    Unlocks {
        achievements: Vec<String>,
        challenges: Vec<String>,
    },
    Profile(ProfileDelta),
}

pub type SessionEvents = SmallVec<[SessionEvent; 4]>;

/// Explicitly owned game context. Several sessions can coexist without sharing state.
pub struct GameSession<'a, S: ProfileStore> {
    catalogs: &'a Catalogs,
    store: &'a S,
    rng: RngBundle,
    shot: ShotMachine,
    contest: ContestOrchestrator,
    mode: PlayMode,
    history: DriveHistory,
    /// `None` plays the open range with freeplay weather.
    venue_id: Option<String>,
    loadout: Loadout,
    profile: ProfileAggregate,
    pending_chests: Vec<ChestInstance>,
    /// Events raised outside `advance`, delivered ahead of the next tick.
    outbox: SessionEvents,
    day: u32,
}

impl<'a, S: ProfileStore> GameSession<'a, S> {
    /// Fresh session at the default venue with the starter loadout.
    #[must_use]
    pub fn new(catalogs: &'a Catalogs, store: &'a S, profile: ProfileAggregate, seed: u64) -> Self {
        Self {
            catalogs,
            store,
            rng: RngBundle::from_user_seed(seed),
            shot: ShotMachine::new(),
            contest: ContestOrchestrator::new(),
            mode: PlayMode::Freeplay,
            history: DriveHistory::default(),
            venue_id: catalogs.venues.default_venue().map(|v| v.id.clone()),
            loadout: Loadout::default(),
            profile,
            pending_chests: Vec::new(),
            outbox: SessionEvents::new(),
            day: 0,
        }
    }

    #[must_use]
    pub const fn mode(&self) -> PlayMode {
        self.mode
    }

    #[must_use]
    pub const fn phase(&self) -> ShotPhase {
        self.shot.phase()
    }

    #[must_use]
    pub const fn shot(&self) -> &ShotMachine {
        &self.shot
    }

    #[must_use]
    pub const fn contest_state(&self) -> Option<&ContestState> {
        self.contest.state()
    }

    #[must_use]
    pub const fn history(&self) -> &DriveHistory {
        &self.history
    }

    #[must_use]
    pub const fn profile(&self) -> &ProfileAggregate {
        &self.profile
    }

    #[must_use]
    pub const fn loadout(&self) -> &Loadout {
        &self.loadout
    }

    #[must_use]
    pub const fn rng(&self) -> &RngBundle {
        &self.rng
    }

    #[must_use]
    pub fn pending_chests(&self) -> &[ChestInstance] {
        &self.pending_chests
    }

    /// Selected venue, or `None` on the open range.
    #[must_use]
    pub fn venue(&self) -> Option<&VenueDef> {
        self.venue_id
            .as_deref()
            .and_then(|id| self.catalogs.venues.get(id).ok())
    }

    /// Day index used for the daily challenge rotation.
    pub const fn set_day(&mut self, day: u32) {
        self.day = day;
    }

    #[must_use]
    pub fn daily_challenges(&self) -> Vec<&'a DailyChallengeDef> {
        daily_challenges_for(&self.catalogs.challenges, self.day)
    }

    /// Move to a venue the player has unlocked.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown or locked venue.
    pub fn select_venue(&mut self, venue_id: &str) -> Result<(), SessionError> {
        let venue = self.catalogs.venues.get(venue_id)?;
        if !is_venue_unlocked(venue, &self.profile) {
            let reason = match unlock_venue(venue, &self.profile) {
                Err(reason) => reason,
                Ok(unlock) => VenueLockReason::NotPurchased {
                    currency: unlock.currency,
                    cost: unlock.cost,
                },
            };
            return Err(SessionError::VenueLocked {
                venue: venue.id.clone(),
                reason,
            });
        }
        self.venue_id = Some(venue.id.clone());
        Ok(())
    }

    /// Play on the open range with randomized freeplay weather.
    pub fn clear_venue(&mut self) {
        self.venue_id = None;
    }

    /// Purchase a venue, apply the cost locally and report it to the store.
    ///
    /// # Errors
    ///
    /// Returns an error for an unknown venue or when level or funds fall short.
    pub fn unlock_venue(&mut self, venue_id: &str) -> Result<VenueUnlock, SessionError> {
        let venue = self.catalogs.venues.get(venue_id)?;
        let unlock = unlock_venue(venue, &self.profile).map_err(|reason| {
            SessionError::VenueLocked {
                venue: venue.id.clone(),
                reason,
            }
        })?;
        let delta = ProfileDelta {
            venue_unlock: Some(unlock.clone()),
            ..ProfileDelta::default()
        };
        log::info!(
            "unlocked venue {} for {} {:?}",
            unlock.venue_id,
            unlock.cost,
            unlock.currency
        );
        self.commit(&delta);
        Ok(unlock)
    }

    /// Swap equipment. Starter items are always available; others must be owned.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown ids or items the player does not own.
    pub fn set_loadout(&mut self, loadout: Loadout) -> Result<(), SessionError> {
        for (id, slot, starter) in [
            (&loadout.driver_id, EquipmentSlot::Driver, STARTER_DRIVER_ID),
            (&loadout.ball_id, EquipmentSlot::Ball, STARTER_BALL_ID),
        ] {
            self.catalogs.equipment.lookup(id, slot)?;
            if id != starter && self.profile.owned(id).is_none() {
                return Err(SessionError::NotOwned(id.clone()));
            }
        }
        self.loadout = loadout;
        Ok(())
    }

    /// Begin a contest at qualifying, replacing any prior one.
    ///
    /// # Errors
    ///
    /// Returns an error if the roster lacks a qualifying opponent.
    pub fn start_contest(&mut self) -> Result<&ContestState, SessionError> {
        self.shot.reset();
        self.mode = PlayMode::Contest;
        let state = self
            .contest
            .start(&self.catalogs.opponents, &mut *self.rng.opponent())?;
        self.outbox.push(SessionEvent::RoundStarted(state.clone()));
        Ok(state)
    }

    /// Install a prepared contest round, e.g. with scripted opponent drives.
    pub fn start_contest_with(&mut self, state: ContestState) -> &ContestState {
        self.shot.reset();
        self.mode = PlayMode::Contest;
        let state = self.contest.start_with(state);
        self.outbox.push(SessionEvent::RoundStarted(state.clone()));
        state
    }

    /// Drop any contest and return to freeplay.
    pub fn leave_contest(&mut self) {
        self.shot.reset();
        self.contest.abandon();
        self.mode = PlayMode::Freeplay;
    }

    fn ambient(&self) -> Result<AmbientConditions, SessionError> {
        match self.venue() {
            Some(venue) => Ok(venue.conditions(&self.catalogs.weather, &mut *self.rng.weather())?),
            None => Ok(select_freeplay_conditions(
                &self.catalogs.weather,
                &mut *self.rng.weather(),
            )),
        }
    }

    /// `start_charge` trigger.
    ///
    /// # Errors
    ///
    /// Returns an error if the shot is not idle or the contest round is already over.
    pub fn start_charge(&mut self) -> Result<(), SessionError> {
        let phase = self.shot.phase();
        if phase != ShotPhase::Idle {
            return Err(ShotError::InvalidTrigger {
                trigger: "start_charge",
                phase,
            }
            .into());
        }
        let shot_clock = match self.mode {
            PlayMode::Freeplay => None,
            PlayMode::Contest => {
                let state = self.contest.state().ok_or(ContestError::NoActiveContest)?;
                if state.result != ContestResult::Pending {
                    return Err(ContestError::ContestDecided.into());
                }
                if state.is_round_over() || state.round_won {
                    return Err(ContestError::RoundComplete.into());
                }
                Some(SHOT_CLOCK_SECONDS)
            }
        };
        let (driver, ball) = self.loadout.bonuses(&self.catalogs.equipment)?;
        let setup = ShotSetup {
            venue_id: self.venue_id.clone(),
            ambient: self.ambient()?,
            driver,
            ball,
            shot_clock,
        };
        self.shot.start_charge(setup)?;
        Ok(())
    }

    /// `lock_current_phase` trigger: lock power, then lock accuracy and fire.
    ///
    /// # Errors
    ///
    /// Returns an error outside the powering and aiming phases.
    pub fn lock_current_phase(&mut self) -> Result<ShotPhase, SessionError> {
        Ok(self.shot.lock_current_phase(&mut *self.rng.flight())?)
    }

    /// Tick the live timer. Landing runs the reward loop.
    ///
    /// # Errors
    ///
    /// Returns an error if a contest ball cannot be recorded.
    pub fn advance(&mut self, dt: f64) -> Result<SessionEvents, SessionError> {
        let mut events = std::mem::take(&mut self.outbox);
        let Some(event) = self.shot.advance(dt) else {
            return Ok(events);
        };
        if let ShotEvent::Landed(result) = &event {
            let result = result.clone();
            events.push(SessionEvent::Shot(event));
            self.on_landed(result, &mut events)?;
        } else {
            events.push(SessionEvent::Shot(event));
        }
        Ok(events)
    }

    fn on_landed(
        &mut self,
        result: DriveResult,
        events: &mut SessionEvents,
    ) -> Result<(), SessionError> {
        let mut outcome = DriveOutcome::default();
        if self.mode == PlayMode::Contest {
            let update = self.contest.record_ball(&result)?;
            outcome.round_won = matches!(update, ContestUpdate::RoundWon { .. });
            outcome.contest_won = update == ContestUpdate::Champion;
            if let Some(state) = self.contest.state() {
                events.push(SessionEvent::Contest {
                    update,
                    state: state.clone(),
                });
            }
        }

        let streak = if result.in_bounds {
            self.profile.current_streak.saturating_add(1)
        } else {
            0
        };
        let rewards = drive_rewards(&result, &self.profile, outcome);
        let mut delta = ProfileDelta {
            drives: 1,
            xp: rewards.xp,
            coins: rewards.coins,
            contest_wins: rewards.contest_wins,
            best_distance: rewards.personal_best.then_some(result.total),
            streak: Some(streak),
            chests_earned: rewards.chests.clone(),
            daily_day: Some(self.day),
            ..ProfileDelta::default()
        };

        let ctx = DriveContext::from_result(&result, streak);
        let struck_at = self.shot.setup().and_then(|setup| setup.venue_id.clone());
        if let Some(venue_id) = struck_at.as_deref()
            && let Some(challenge) = first_completed_challenge(
                &self.catalogs.challenges,
                venue_id,
                &self.profile.completed_challenges,
                &ctx,
            )
        {
            delta.coins += challenge.coins;
            delta.gems += challenge.gems;
            delta.xp += challenge.xp;
            delta.new_challenges.push(challenge.id.clone());
        }
        let same_day = self.profile.daily_day == self.day;
        if let Some(daily) = self.daily_challenges().into_iter().find(|c| {
            !(same_day && self.profile.completed_daily.contains(&c.id))
                && check_challenge(&c.requirement, &ctx)
        }) {
            delta.coins += daily.coins;
            delta.gems += daily.gems;
            delta.xp += daily.xp;
            delta.new_daily.push(daily.id.clone());
        }

        let mut projected = self.profile.clone();
        projected.apply(&delta);
        let achievement_ctx = AchievementContext::from_profile(&projected, &self.catalogs.venues);
        for id in check_achievements(
            &self.catalogs.achievements,
            &projected.unlocked_achievements,
            &achievement_ctx,
        ) {
            if let Some(def) = self.catalogs.achievements.get(&id) {
                delta.coins += def.coins;
                delta.gems += def.gems;
            }
            delta.new_achievements.push(id);
        }

        self.history.push(result);
        self.pending_chests
            .extend(rewards.chests.iter().copied().map(ChestInstance::new));

        if delta.has_unlocks() {
            log::info!(
                "unlocked achievements {:?} challenges {:?} daily {:?}",
                delta.new_achievements,
                delta.new_challenges,
                delta.new_daily
            );
            let mut challenges: Vec<String> = delta.new_challenges.to_vec();
            challenges.extend(delta.new_daily.iter().cloned());
            events.push(SessionEvent::Unlocks {
                achievements: delta.new_achievements.to_vec(),
                challenges,
            });
        }
        self.commit(&delta);
        events.push(SessionEvent::Profile(delta));
        Ok(())
    }

    fn commit(&mut self, delta: &ProfileDelta) {
        self.profile.apply(delta);
        if let Err(err) = self.store.submit_delta(delta) {
            log::warn!("profile store rejected delta: {err}");
        }
    }

    /// `reset` trigger. In contest mode after a landing, performs and returns
    /// the contextual action.
    ///
    /// # Errors
    ///
    /// Returns an error if the next round cannot be drawn.
    pub fn reset(&mut self) -> Result<Option<ContestAction>, SessionError> {
        let landed = self.shot.phase() == ShotPhase::Landed;
        self.shot.reset();
        if self.mode != PlayMode::Contest || !landed {
            return Ok(None);
        }
        let action = self.contest.next_action();
        match action {
            ContestAction::NextBall => {}
            ContestAction::NextRound => {
                let state = self
                    .contest
                    .advance_round(&self.catalogs.opponents, &mut *self.rng.opponent())?;
                self.outbox.push(SessionEvent::RoundStarted(state.clone()));
            }
            ContestAction::BackToMenu => {
                self.contest.abandon();
                self.mode = PlayMode::Freeplay;
            }
        }
        log::debug!("contest reset action {action:?}");
        Ok(Some(action))
    }

    /// Open the oldest earned chest and bank its contents.
    ///
    /// # Errors
    ///
    /// Returns an error if the chest type has no loot table.
    pub fn open_next_chest(&mut self) -> Result<Option<ChestContents>, SessionError> {
        if self.pending_chests.is_empty() {
            return Ok(None);
        }
        let mut chest = self.pending_chests.remove(0);
        let contents = chest
            .open(
                &self.catalogs.chests,
                &self.catalogs.equipment,
                &mut *self.rng.loot(),
            )?
            .clone();
        let delta = ProfileDelta {
            xp: contents.xp,
            coins: contents.coins,
            gems: contents.gems,
            equipment_drops: contents.equipment.iter().cloned().collect(),
            ..ProfileDelta::default()
        };
        self.commit(&delta);
        Ok(Some(contents))
    }
}
