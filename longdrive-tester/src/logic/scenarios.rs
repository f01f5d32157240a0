use anyhow::{Context, Result, bail, ensure};
use longdrive_game::constants::{DAILY_CHALLENGE_COUNT, DRIVE_HISTORY_CAPACITY};
use longdrive_game::progression::daily_challenges_for;
use longdrive_game::trajectory::{adjusted_accuracy, is_in_bounds};
use longdrive_game::venue::is_venue_unlocked;
use longdrive_game::{
    AchievementContext, Catalogs, ChestInstance, ChestType, ContestAction, ContestRound,
    ContestUpdate, DriveResult, EmbeddedCatalogs, GameSession, Loadout, LongDriveEngine, PlayMode,
    ProfileAggregate, ProfileStore, ShotPhase, check_achievements, level_from_xp,
};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;

use super::harness::{BallTrace, let_clock_expire, swing};
use super::policy::{SwingPolicy, SwingStrategy};
use super::store::MemoryStore;

const DRIVES_PER_VENUE: usize = 4;
const ECONOMY_DRIVES: u32 = 10;
const MAX_CONTEST_BALLS: usize = 11;

/// Inputs shared by every scenario iteration.
pub struct ScenarioCtx<'a> {
    pub catalogs: &'a Catalogs,
    pub seed: u64,
    pub strategy: SwingStrategy,
    pub verbose: bool,
}

/// A named, self-checking run against the engine.
pub struct Scenario {
    pub key: &'static str,
    pub description: &'static str,
    run: fn(&ScenarioCtx<'_>) -> Result<()>,
}

impl Scenario {
    /// Execute one iteration.
    ///
    /// # Errors
    ///
    /// Returns the first failed expectation or engine error.
    pub fn run(&self, ctx: &ScenarioCtx<'_>) -> Result<()> {
        (self.run)(ctx)
    }
}

const SCENARIOS: &[Scenario] = &[
    Scenario {
        key: "smoke",
        description: "One freeplay drive through the engine facade",
        run: run_smoke,
    },
    Scenario {
        key: "freeplay-sweep",
        description: "Unlock every venue and drive at each, plus the open range",
        run: run_freeplay_sweep,
    },
    Scenario {
        key: "contest-run",
        description: "Play a contest to a terminal result with ball accounting",
        run: run_contest,
    },
    Scenario {
        key: "shot-clock",
        description: "Let the shot clock expire on every contest ball",
        run: run_shot_clock,
    },
    Scenario {
        key: "economy",
        description: "Levels, divisions, chests, achievements and daily rotation",
        run: run_economy,
    },
];

pub fn list_scenarios() -> impl Iterator<Item = (&'static str, &'static str)> {
    SCENARIOS.iter().map(|s| (s.key, s.description))
}

#[must_use]
pub fn scenario_keys() -> Vec<String> {
    SCENARIOS.iter().map(|s| s.key.to_string()).collect()
}

#[must_use]
pub fn get_scenario(name: &str) -> Option<&'static Scenario> {
    SCENARIOS.iter().find(|s| s.key == name)
}

fn play<S: ProfileStore>(
    session: &mut GameSession<'_, S>,
    policy: &mut dyn SwingPolicy,
) -> Result<BallTrace> {
    let target = policy.pick_swing();
    log::debug!(
        "{} swing: power {:.1} accuracy {:.1}",
        policy.name(),
        target.power,
        target.accuracy
    );
    swing(session, target)
}

/// Physical sanity of one landed drive.
fn check_drive(catalogs: &Catalogs, loadout: &Loadout, result: &DriveResult) -> Result<()> {
    for (field, value) in [
        ("carry", result.carry),
        ("roll", result.roll),
        ("total", result.total),
        ("ball_speed", result.ball_speed),
    ] {
        ensure!(
            value.is_finite() && value >= 0.0,
            "{field} is not a finite non-negative distance: {value}"
        );
    }
    ensure!(
        (result.total - (result.carry + result.roll)).abs() < 1e-6,
        "total {:.3} != carry {:.3} + roll {:.3}",
        result.total,
        result.carry,
        result.roll
    );
    ensure!(!result.timed_out, "a struck ball was flagged as timed out");
    let (driver, ball) = loadout.bonuses(&catalogs.equipment)?;
    let expected = is_in_bounds(adjusted_accuracy(result.accuracy, (driver + ball).accuracy));
    ensure!(
        result.in_bounds == expected,
        "accuracy {:.1} landed in_bounds={} (expected {expected})",
        result.accuracy,
        result.in_bounds
    );
    Ok(())
}

fn run_smoke(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let engine = LongDriveEngine::new(EmbeddedCatalogs, MemoryStore::default())?;
    let mut session = engine.create_session(ctx.seed)?;
    let mut policy = ctx.strategy.create_policy(ctx.seed);
    let trace = play(&mut session, policy.as_mut())?;
    check_drive(engine.catalogs(), session.loadout(), &trace.result)?;

    ensure!(session.phase() == ShotPhase::Landed, "shot did not land");
    ensure!(session.history().len() == 1, "history should hold one drive");
    ensure!(session.profile().total_drives == 1, "drive was not counted");
    ensure!(
        engine.store().delta_count() == 1,
        "store saw {} deltas",
        engine.store().delta_count()
    );
    let delta = trace.delta().context("landing emitted no profile delta")?;
    ensure!(delta.xp >= 10, "drive earned only {} xp", delta.xp);
    ensure!(
        engine.store().snapshot() == *session.profile(),
        "store and session profiles diverged"
    );
    Ok(())
}

fn run_freeplay_sweep(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let store = MemoryStore::veteran();
    let mut session = GameSession::new(ctx.catalogs, &store, store.snapshot(), ctx.seed);
    let mut policy = ctx.strategy.create_policy(ctx.seed);
    let mut drives = 0_u32;

    for venue in &ctx.catalogs.venues.venues {
        if !is_venue_unlocked(venue, session.profile()) {
            let unlock = session.unlock_venue(&venue.id)?;
            ensure!(unlock.cost == venue.unlock_cost, "wrong unlock cost for {}", venue.id);
        }
        session.select_venue(&venue.id)?;
        for _ in 0..DRIVES_PER_VENUE {
            session.reset()?;
            let trace = play(&mut session, policy.as_mut())?;
            check_drive(ctx.catalogs, session.loadout(), &trace.result)?;
            ensure!(
                trace.result.night_mode == venue.night,
                "night mode mismatch at {}",
                venue.id
            );
            drives += 1;
        }
        if ctx.verbose {
            println!(
                "  venue {} best so far {:.1} yd",
                venue.id,
                session.profile().best_distance
            );
        }
    }

    session.clear_venue();
    for _ in 0..DRIVES_PER_VENUE {
        session.reset()?;
        let trace = play(&mut session, policy.as_mut())?;
        check_drive(ctx.catalogs, session.loadout(), &trace.result)?;
        drives += 1;
    }

    let profile = session.profile();
    ensure!(profile.total_drives == drives, "drive counter drifted");
    ensure!(
        profile.unlocked_venues.len() + 1 >= ctx.catalogs.venues.venues.len(),
        "not every paid venue was recorded as unlocked"
    );
    ensure!(
        session.history().len() < DRIVE_HISTORY_CAPACITY,
        "sweep overflowed the drive history"
    );
    ensure!(
        profile.current_streak == session.history().in_bounds_streak(),
        "profile streak {} disagrees with history streak {}",
        profile.current_streak,
        session.history().in_bounds_streak()
    );
    if let Some(best) = session.history().best_in_bounds() {
        ensure!(
            profile.best_distance >= best,
            "personal best {:.1} is below an in-bounds drive of {best:.1}",
            profile.best_distance
        );
    }
    Ok(())
}

fn run_contest(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let store = MemoryStore::default();
    let mut session = GameSession::new(ctx.catalogs, &store, store.snapshot(), ctx.seed);
    let mut policy = ctx.strategy.create_policy(ctx.seed);
    session.start_contest()?;

    let mut balls_in_round = 0_u8;
    let mut rounds_won = 0_usize;
    let mut balls = 0_usize;
    let terminal = loop {
        ensure!(balls < MAX_CONTEST_BALLS, "contest did not finish in {balls} balls");
        let round = session
            .contest_state()
            .map(|s| s.round)
            .context("contest ended early")?;
        let trace = play(&mut session, policy.as_mut())?;
        check_drive(ctx.catalogs, session.loadout(), &trace.result)?;
        if balls_in_round == 0 {
            let started = trace
                .round_started()
                .context("round began without a snapshot")?;
            ensure!(started.round == round, "snapshot for {:?} during {round:?}", started.round);
        }
        balls += 1;
        balls_in_round += 1;

        let update = trace
            .contest_update()
            .context("landing produced no contest update")?;
        let state = session.contest_state().context("contest vanished")?;
        ensure!(
            state.balls_remaining == round.balls() - balls_in_round,
            "{round:?}: {} balls remaining after {balls_in_round}",
            state.balls_remaining
        );

        match session.reset()? {
            Some(ContestAction::NextBall) => {
                ensure!(update == ContestUpdate::NextBall, "unexpected {update:?}");
            }
            Some(ContestAction::NextRound) => {
                ensure!(balls_in_round == round.balls(), "{round:?} ended early");
                ensure!(
                    matches!(update, ContestUpdate::RoundWon { .. }),
                    "next round offered after {update:?}"
                );
                rounds_won += 1;
                balls_in_round = 0;
            }
            Some(ContestAction::BackToMenu) => {
                ensure!(balls_in_round == round.balls(), "{round:?} ended early");
                break update;
            }
            None => bail!("reset after a contest landing offered no action"),
        }
    };

    if ctx.verbose {
        println!("  contest finished {terminal:?} after {balls} balls");
    }
    ensure!(session.mode() == PlayMode::Freeplay, "session stayed in contest mode");
    ensure!(session.contest_state().is_none(), "contest state was not cleared");

    let chests = session.pending_chests();
    let count = |kind: ChestType| chests.iter().filter(|c| c.chest_type == kind).count();
    ensure!(count(ChestType::Silver) == rounds_won, "silver chests do not match rounds won");
    match terminal {
        ContestUpdate::Champion => {
            ensure!(session.profile().contest_wins == 1, "win was not recorded");
            ensure!(count(ChestType::Gold) == 1, "champion earned no gold chest");
            ensure!(rounds_won == ContestRound::ORDER.len() - 1, "champion skipped a round");
        }
        ContestUpdate::Eliminated => {
            ensure!(session.profile().contest_wins == 0, "loss counted as a win");
            ensure!(count(ChestType::Gold) == 0, "eliminated player earned gold");
        }
        other => bail!("contest ended on {other:?}"),
    }
    Ok(())
}

fn run_shot_clock(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let store = MemoryStore::default();
    let mut session = GameSession::new(ctx.catalogs, &store, store.snapshot(), ctx.seed);
    session.start_contest()?;
    let balls = ContestRound::Qualifying.balls();

    for ball in 1..=balls {
        let trace = let_clock_expire(&mut session)?;
        let result = &trace.result;
        ensure!(result.timed_out, "ball {ball} was not a clock miss");
        ensure!(
            result.total == 0.0 && !result.in_bounds,
            "clock miss scored {:.1} yd",
            result.total
        );
        let delta = trace.delta().context("clock miss emitted no delta")?;
        ensure!(delta.xp == 10, "clock miss earned {} xp", delta.xp);
        ensure!(delta.coins == 0 || delta.has_unlocks(), "clock miss earned coins");

        let expected = if ball == balls {
            ContestAction::BackToMenu
        } else {
            ContestAction::NextBall
        };
        let action = session.reset()?;
        ensure!(action == Some(expected), "ball {ball}: got {action:?}");
    }

    ensure!(session.mode() == PlayMode::Freeplay, "eliminated player stayed in contest");
    ensure!(session.profile().current_streak == 0, "misses kept a streak");
    ensure!(
        session.profile().total_drives == u32::from(balls),
        "clock misses were not counted as drives"
    );
    Ok(())
}

fn run_economy(ctx: &ScenarioCtx<'_>) -> Result<()> {
    let catalogs = ctx.catalogs;
    check_level_curve()?;
    check_divisions(catalogs)?;
    check_chest_tables(catalogs, ctx.seed)?;

    let day = u32::try_from(ctx.seed % 365).unwrap_or(0);
    let today = daily_challenges_for(&catalogs.challenges, day);
    ensure!(today.len() == DAILY_CHALLENGE_COUNT, "daily rotation has {} entries", today.len());
    ensure!(
        today == daily_challenges_for(&catalogs.challenges, day),
        "daily rotation is not stable for day {day}"
    );

    let store = MemoryStore::default();
    let mut session = GameSession::new(catalogs, &store, store.snapshot(), ctx.seed);
    session.set_day(day);
    let mut policy = ctx.strategy.create_policy(ctx.seed);
    for _ in 0..ECONOMY_DRIVES {
        session.reset()?;
        play(&mut session, policy.as_mut())?;
    }
    ensure!(
        session
            .pending_chests()
            .iter()
            .any(|c| c.chest_type == ChestType::Wooden),
        "no wooden chest after {ECONOMY_DRIVES} drives"
    );

    loop {
        let before = session.profile().coins;
        let Some(contents) = session.open_next_chest()? else {
            break;
        };
        ensure!(
            session.profile().coins == before + contents.coins,
            "opening a {} chest banked the wrong coins",
            contents.chest_type
        );
    }
    ensure!(session.pending_chests().is_empty(), "chests left unopened");

    check_achievement_idempotence(catalogs, session.profile())
}

fn check_level_curve() -> Result<()> {
    let mut last = level_from_xp(0);
    for xp in (0..=60_000_u64).step_by(97) {
        let progress = level_from_xp(xp);
        ensure!(progress.level >= last.level, "level dropped at {xp} xp");
        ensure!(
            progress.xp_for_next == 0 || progress.xp_into_level < progress.xp_for_next,
            "xp into level overflowed at {xp}"
        );
        last = progress;
    }
    Ok(())
}

fn check_divisions(catalogs: &Catalogs) -> Result<()> {
    let table = &catalogs.divisions;
    let mut last_index = 0;
    for xp in (0..=200_000_u64).step_by(250) {
        let division = table
            .division_from_xp(xp)
            .with_context(|| format!("no division for {xp} xp"))?;
        let index = table
            .divisions
            .iter()
            .position(|d| d.id == division.id)
            .context("division not in table")?;
        ensure!(index >= last_index, "division regressed at {xp} xp");
        last_index = index;
    }
    Ok(())
}

fn check_chest_tables(catalogs: &Catalogs, seed: u64) -> Result<()> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    for kind in ChestType::ALL {
        let tier = catalogs.chests.tier(kind)?;
        let mut chest = ChestInstance::new(kind);
        let first = chest
            .open(&catalogs.chests, &catalogs.equipment, &mut rng)?
            .clone();
        let again = chest.open(&catalogs.chests, &catalogs.equipment, &mut rng)?;
        ensure!(first == *again, "{kind} chest re-rolled on second open");
        ensure!(
            (tier.coins[0]..=tier.coins[1]).contains(&first.coins),
            "{kind} chest coins {} outside table",
            first.coins
        );
        ensure!(
            (tier.xp[0]..=tier.xp[1]).contains(&first.xp),
            "{kind} chest xp {} outside table",
            first.xp
        );
        if let Some(item) = &first.equipment {
            catalogs.equipment.lookup(&item.id, item.slot)?;
        }
    }
    Ok(())
}

fn check_achievement_idempotence(catalogs: &Catalogs, profile: &ProfileAggregate) -> Result<()> {
    let achievement_ctx = AchievementContext::from_profile(profile, &catalogs.venues);
    let mut unlocked = profile.unlocked_achievements.clone();
    unlocked.extend(check_achievements(
        &catalogs.achievements,
        &unlocked,
        &achievement_ctx,
    ));
    let repeat = check_achievements(&catalogs.achievements, &unlocked, &achievement_ctx);
    ensure!(repeat.is_empty(), "achievements unlocked twice: {repeat:?}");
    Ok(())
}
