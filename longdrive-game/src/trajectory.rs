//! Ball flight integrator.
//!
//! A deliberately simple drag + gravity model stepped at a fixed `dt`. Wind
//! only acts on horizontal velocity. The only random input is the roll factor,
//! drawn from the caller's generator.
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ACCURACY_CENTER, BASE_LAUNCH_ANGLE_DEG, DRAG_PER_STEP, GRAVITY_MPS2, IN_BOUNDS_TOLERANCE,
    LAUNCH_ANGLE_SWING_DEG, MAX_FLIGHT_STEPS, MIN_FLIGHT_POINTS, MPH_TO_MPS, POWER_TO_MPH,
    ROLL_ANGLE_FACTOR_FLOOR, ROLL_ANGLE_PENALTY_PER_DEG, ROLL_FACTOR_MAX, ROLL_FACTOR_MIN, SIM_DT,
    YARD_TO_METER,
};
use crate::equipment::BonusSet;
use crate::error::SimulationError;
use crate::weather::WeatherCondition;

/// One recorded integration step, in meters and seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightPoint {
    pub time: f64,
    pub downrange: f64,
    pub height: f64,
}

/// Inputs to a single simulated drive.
#[derive(Debug, Clone, Copy)]
pub struct DriveParams<'a> {
    pub power: f64,
    pub accuracy: f64,
    /// Signed wind in mph; positive is a tailwind.
    pub wind_mph: f64,
    pub driver: BonusSet,
    pub ball: BonusSet,
    pub weather: &'a WeatherCondition,
    pub altitude_bonus: f64,
}

/// Scored flight, distances in yards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub carry: f64,
    pub roll: f64,
    pub total: f64,
    pub ball_speed_mph: f64,
    pub launch_angle_deg: f64,
    pub in_bounds: bool,
    pub flight_points: Vec<FlightPoint>,
}

/// Timing accuracy after equipment forgiveness pulls it toward center.
#[must_use]
pub fn adjusted_accuracy(accuracy: f64, accuracy_bonus: f64) -> f64 {
    let forgiveness = (1.0 - accuracy_bonus / 100.0).clamp(0.0, 1.0);
    ACCURACY_CENTER + (accuracy - ACCURACY_CENTER) * forgiveness
}

/// Lateral gate; independent of distance.
#[must_use]
pub fn is_in_bounds(adjusted_accuracy: f64) -> bool {
    (adjusted_accuracy - ACCURACY_CENTER).abs() < IN_BOUNDS_TOLERANCE
}

#[must_use]
pub fn launch_angle(adjusted_accuracy: f64) -> f64 {
    BASE_LAUNCH_ANGLE_DEG
        + (adjusted_accuracy - ACCURACY_CENTER) / ACCURACY_CENTER * LAUNCH_ANGLE_SWING_DEG
}

fn roll_angle_factor(launch_angle_deg: f64) -> f64 {
    let miss = (launch_angle_deg - BASE_LAUNCH_ANGLE_DEG).abs();
    (1.0 - miss * ROLL_ANGLE_PENALTY_PER_DEG).max(ROLL_ANGLE_FACTOR_FLOOR)
}

fn check_meter(field: &'static str, value: f64) -> Result<(), SimulationError> {
    if !value.is_finite() {
        return Err(SimulationError::NonFinite { field, value });
    }
    if !(0.0..=100.0).contains(&value) {
        return Err(SimulationError::OutOfRange { field, value });
    }
    Ok(())
}

fn check_finite(field: &'static str, value: f64) -> Result<(), SimulationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SimulationError::NonFinite { field, value })
    }
}

/// Integrate the flight and score it.
///
/// # Errors
///
/// Returns [`SimulationError`] when power or accuracy fall outside `0..=100`
/// or any input is not finite. Callers are expected to validate first.
pub fn simulate_drive<R: Rng + ?Sized>(
    params: &DriveParams<'_>,
    rng: &mut R,
) -> Result<Trajectory, SimulationError> {
    check_meter("power", params.power)?;
    check_meter("accuracy", params.accuracy)?;
    check_finite("wind", params.wind_mph)?;
    check_finite("altitude bonus", params.altitude_bonus)?;

    let bonuses = params.driver + params.ball;
    let ball_speed_mph = params.power * POWER_TO_MPH + bonuses.speed;
    let ball_speed = ball_speed_mph * MPH_TO_MPS;
    let adjusted = adjusted_accuracy(params.accuracy, bonuses.accuracy);
    let launch_angle_deg = launch_angle(adjusted);
    let radians = launch_angle_deg.to_radians();

    let wind_mps = params.wind_mph * MPH_TO_MPS;
    let mut vx = ball_speed * radians.cos();
    let mut vy = ball_speed * radians.sin();
    let mut x = 0.0_f64;
    let mut y = 0.0_f64;
    let mut flight_points = Vec::with_capacity(256);

    for step in 1..=MAX_FLIGHT_STEPS {
        vx += wind_mps * SIM_DT;
        vx *= DRAG_PER_STEP;
        vy *= DRAG_PER_STEP;
        vy -= GRAVITY_MPS2 * SIM_DT;
        x += vx * SIM_DT;
        y += vy * SIM_DT;

        let landed = y <= 0.0;
        flight_points.push(FlightPoint {
            time: f64::from(u32::try_from(step).unwrap_or(u32::MAX)) * SIM_DT,
            downrange: x,
            height: y.max(0.0),
        });
        if landed && flight_points.len() >= MIN_FLIGHT_POINTS {
            break;
        }
    }

    let carry = x.max(0.0) / YARD_TO_METER
        * (1.0 + bonuses.distance_pct / 100.0)
        * params.weather.distance_modifier
        * (1.0 + params.altitude_bonus);
    let roll_factor = rng.gen_range(ROLL_FACTOR_MIN..=ROLL_FACTOR_MAX);
    let roll = carry
        * roll_factor
        * roll_angle_factor(launch_angle_deg)
        * (1.0 + bonuses.roll_pct / 100.0)
        * params.weather.roll_modifier;
    let in_bounds = is_in_bounds(adjusted);

    log::debug!(
        "drive power {:.1} acc {:.1} wind {:+.1}: carry {carry:.1} roll {roll:.1} angle {launch_angle_deg:.2} in_bounds {in_bounds} ({} points)",
        params.power,
        params.accuracy,
        params.wind_mph,
        flight_points.len()
    );

    Ok(Trajectory {
        carry,
        roll,
        total: carry + roll,
        ball_speed_mph,
        launch_angle_deg,
        in_bounds,
        flight_points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn params(weather: &WeatherCondition, power: f64, accuracy: f64) -> DriveParams<'_> {
        DriveParams {
            power,
            accuracy,
            wind_mph: 0.0,
            driver: BonusSet::default(),
            ball: BonusSet::default(),
            weather,
            altitude_bonus: 0.0,
        }
    }

    #[test]
    fn centered_drive_launches_at_baseline() {
        let weather = WeatherCondition::still();
        let mut rng = SmallRng::seed_from_u64(1);
        let flight = simulate_drive(&params(&weather, 80.0, 50.0), &mut rng).unwrap();
        assert!(flight.in_bounds);
        assert!((flight.launch_angle_deg - 12.0).abs() < 1e-9);
        assert!(flight.total > 0.0);
        assert!(flight.carry > flight.roll);
        assert!((flight.ball_speed_mph - 152.0).abs() < 1e-9);
    }

    #[test]
    fn zero_power_is_a_valid_near_zero_drive() {
        let weather = WeatherCondition::still();
        let mut rng = SmallRng::seed_from_u64(2);
        let flight = simulate_drive(&params(&weather, 0.0, 50.0), &mut rng).unwrap();
        assert!(flight.total < 1.0);
        assert!(flight.flight_points.len() >= MIN_FLIGHT_POINTS);
        assert!((flight.total - (flight.carry + flight.roll)).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_inputs_fail_fast() {
        let weather = WeatherCondition::still();
        let mut rng = SmallRng::seed_from_u64(3);
        assert_eq!(
            simulate_drive(&params(&weather, 101.0, 50.0), &mut rng).unwrap_err(),
            SimulationError::OutOfRange {
                field: "power",
                value: 101.0
            }
        );
        assert!(matches!(
            simulate_drive(&params(&weather, 50.0, -0.5), &mut rng),
            Err(SimulationError::OutOfRange {
                field: "accuracy",
                ..
            })
        ));
        assert!(matches!(
            simulate_drive(&params(&weather, f64::NAN, 50.0), &mut rng),
            Err(SimulationError::NonFinite { .. })
        ));
    }

    #[test]
    fn accuracy_bonus_dampens_but_does_not_shift() {
        assert!((adjusted_accuracy(50.0, 40.0) - 50.0).abs() < f64::EPSILON);
        assert!((adjusted_accuracy(90.0, 50.0) - 70.0).abs() < 1e-9);
        assert!((adjusted_accuracy(10.0, 50.0) - 30.0).abs() < 1e-9);
        assert!(!is_in_bounds(adjusted_accuracy(90.0, 0.0)));
        assert!(is_in_bounds(adjusted_accuracy(90.0, 50.0)));
    }

    #[test]
    fn tailwind_carries_further_than_headwind() {
        let weather = WeatherCondition::still();
        let mut tail = params(&weather, 90.0, 50.0);
        tail.wind_mph = 15.0;
        let mut head = tail;
        head.wind_mph = -15.0;
        let with = simulate_drive(&tail, &mut SmallRng::seed_from_u64(9)).unwrap();
        let against = simulate_drive(&head, &mut SmallRng::seed_from_u64(9)).unwrap();
        assert!(with.carry > against.carry);
    }

    #[test]
    fn flight_terminates_under_extreme_tailwind() {
        let weather = WeatherCondition::still();
        let mut extreme = params(&weather, 100.0, 50.0);
        extreme.wind_mph = 1.0e6;
        let flight = simulate_drive(&extreme, &mut SmallRng::seed_from_u64(4)).unwrap();
        assert!(flight.flight_points.len() <= MAX_FLIGHT_STEPS);
    }

    #[test]
    fn same_seed_same_drive() {
        let weather = WeatherCondition::still();
        let p = params(&weather, 75.0, 61.0);
        let a = simulate_drive(&p, &mut SmallRng::seed_from_u64(77)).unwrap();
        let b = simulate_drive(&p, &mut SmallRng::seed_from_u64(77)).unwrap();
        assert_eq!(a, b);
    }
}
