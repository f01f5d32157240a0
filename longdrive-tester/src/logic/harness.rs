//! Drives a [`GameSession`] the way a player would: tick the meters with
//! synthetic frame deltas and lock when the reading is close to a target.
use anyhow::{Result, bail};
use longdrive_game::{
    ContestState, ContestUpdate, DriveResult, GameSession, ProfileDelta, ProfileStore, SessionEvent,
    ShotEvent,
};

use super::policy::SwingTarget;

/// Meter tick. Small enough that every reading is passed within tolerance.
pub const METER_STEP_SECONDS: f64 = 1.0 / 240.0;
pub const TARGET_TOLERANCE: f64 = 1.0;
const MAX_METER_STEPS: usize = 4_800;
const FLIGHT_STEP_SECONDS: f64 = 1.0 / 60.0;
const MAX_FLIGHT_STEPS: usize = 10_000;
const IDLE_STEP_SECONDS: f64 = 0.25;
const MAX_IDLE_STEPS: usize = 400;

/// Everything the session emitted while one ball was played.
#[derive(Debug, Clone)]
pub struct BallTrace {
    pub result: DriveResult,
    pub events: Vec<SessionEvent>,
}

impl BallTrace {
    /// Profile delta emitted on landing.
    #[must_use]
    pub fn delta(&self) -> Option<&ProfileDelta> {
        self.events.iter().find_map(|event| match event {
            SessionEvent::Profile(delta) => Some(delta),
            _ => None,
        })
    }

    /// Round snapshot delivered with this ball, if a round began just before it.
    #[must_use]
    pub fn round_started(&self) -> Option<&ContestState> {
        self.events.iter().find_map(|event| match event {
            SessionEvent::RoundStarted(state) => Some(state),
            _ => None,
        })
    }

    /// Contest update emitted on landing.
    #[must_use]
    pub fn contest_update(&self) -> Option<ContestUpdate> {
        self.events.iter().find_map(|event| match event {
            SessionEvent::Contest { update, .. } => Some(*update),
            _ => None,
        })
    }
}

fn landed(events: &[SessionEvent]) -> Option<DriveResult> {
    events.iter().find_map(|event| match event {
        SessionEvent::Shot(ShotEvent::Landed(result)) => Some(result.clone()),
        _ => None,
    })
}

/// Play one full ball: charge, lock both meters near the target, watch the flight.
///
/// # Errors
///
/// Returns an error if the session rejects a trigger or a meter never reaches its target.
pub fn swing<S: ProfileStore>(
    session: &mut GameSession<'_, S>,
    target: SwingTarget,
) -> Result<BallTrace> {
    session.start_charge()?;
    let mut events = Vec::new();
    for goal in [target.power, target.accuracy] {
        if let Some(result) = hold_until(session, goal, &mut events)? {
            return Ok(BallTrace { result, events });
        }
        session.lock_current_phase()?;
    }
    let result = fly_to_landing(session, &mut events)?;
    Ok(BallTrace { result, events })
}

/// Start a ball and never lock, so the shot clock runs out.
///
/// # Errors
///
/// Returns an error if the ball cannot be started or no clock is running.
pub fn let_clock_expire<S: ProfileStore>(session: &mut GameSession<'_, S>) -> Result<BallTrace> {
    session.start_charge()?;
    if session.shot().clock_remaining().is_none() {
        bail!("no shot clock is running");
    }
    let mut events = Vec::new();
    for _ in 0..MAX_IDLE_STEPS {
        let batch = session.advance(IDLE_STEP_SECONDS)?;
        let result = landed(&batch);
        events.extend(batch);
        if let Some(result) = result {
            return Ok(BallTrace { result, events });
        }
    }
    bail!("shot clock never expired");
}

fn hold_until<S: ProfileStore>(
    session: &mut GameSession<'_, S>,
    goal: f64,
    events: &mut Vec<SessionEvent>,
) -> Result<Option<DriveResult>> {
    for _ in 0..MAX_METER_STEPS {
        if (session.shot().meter_value() - goal).abs() <= TARGET_TOLERANCE {
            return Ok(None);
        }
        let batch = session.advance(METER_STEP_SECONDS)?;
        let result = landed(&batch);
        events.extend(batch);
        if result.is_some() {
            return Ok(result);
        }
    }
    bail!("meter never reached {goal:.1} while {:?}", session.phase());
}

fn fly_to_landing<S: ProfileStore>(
    session: &mut GameSession<'_, S>,
    events: &mut Vec<SessionEvent>,
) -> Result<DriveResult> {
    for _ in 0..MAX_FLIGHT_STEPS {
        let batch = session.advance(FLIGHT_STEP_SECONDS)?;
        let result = landed(&batch);
        events.extend(batch);
        if let Some(result) = result {
            return Ok(result);
        }
    }
    bail!("ball never landed");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::store::MemoryStore;
    use longdrive_game::{Catalogs, ShotPhase};

    #[test]
    fn swing_locks_close_to_target() {
        let catalogs = Catalogs::load_default().unwrap();
        let store = MemoryStore::default();
        let mut session = GameSession::new(&catalogs, &store, store.snapshot(), 3);
        let trace = swing(&mut session, SwingTarget::new(70.0, 50.0)).unwrap();
        assert!((trace.result.power - 70.0).abs() <= TARGET_TOLERANCE);
        assert!((trace.result.accuracy - 50.0).abs() <= TARGET_TOLERANCE);
        assert!(trace.result.in_bounds);
        assert_eq!(session.phase(), ShotPhase::Landed);
        assert!(trace.delta().is_some());
        assert_eq!(store.delta_count(), 1);
    }

    #[test]
    fn freeplay_has_no_clock_to_expire() {
        let catalogs = Catalogs::load_default().unwrap();
        let store = MemoryStore::default();
        let mut session = GameSession::new(&catalogs, &store, store.snapshot(), 3);
        assert!(let_clock_expire(&mut session).is_err());
    }
}
