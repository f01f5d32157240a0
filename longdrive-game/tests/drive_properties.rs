use longdrive_game::equipment::{EquipmentCatalog, EquipmentSlot, Loadout};
use longdrive_game::trajectory::{adjusted_accuracy, is_in_bounds};
use longdrive_game::{
    AmbientConditions, BonusSet, Catalogs, DriveParams, DriveResult, WeatherCatalog,
    simulate_drive,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn common_bonuses() -> (BonusSet, BonusSet) {
    let catalog = EquipmentCatalog::default_config().unwrap();
    Loadout::default().bonuses(&catalog).unwrap()
}

fn params<'a>(
    ambient: &'a AmbientConditions,
    power: f64,
    accuracy: f64,
    driver: BonusSet,
    ball: BonusSet,
) -> DriveParams<'a> {
    DriveParams {
        power,
        accuracy,
        wind_mph: ambient.wind_mph,
        driver,
        ball,
        weather: &ambient.weather,
        altitude_bonus: ambient.altitude_bonus,
    }
}

#[test]
fn total_is_carry_plus_roll_across_inputs() {
    let weather = WeatherCatalog::default_config().unwrap();
    let (driver, ball) = common_bonuses();
    let mut rng = SmallRng::seed_from_u64(0xD12);
    for condition in &weather.conditions {
        let ambient = AmbientConditions {
            weather: condition.clone(),
            wind_mph: condition.wind_max,
            altitude_bonus: 0.05,
            night_mode: false,
        };
        for power in [0.0, 12.5, 50.0, 80.0, 100.0] {
            for accuracy in [0.0, 19.0, 50.0, 81.0, 100.0] {
                let flight =
                    simulate_drive(&params(&ambient, power, accuracy, driver, ball), &mut rng)
                        .unwrap();
                assert_eq!(flight.total, flight.carry + flight.roll);
                let result = DriveResult::from_flight(&flight, power, accuracy, &ambient);
                assert_eq!(result.total, result.carry + result.roll);
                assert!(result.carry >= 0.0 && result.roll >= 0.0);
            }
        }
    }
}

#[test]
fn in_bounds_ignores_power() {
    let ambient = AmbientConditions::still();
    let (driver, ball) = common_bonuses();
    for accuracy in [10.0, 21.0, 50.0, 79.0, 90.0] {
        let weak = simulate_drive(
            &params(&ambient, 20.0, accuracy, driver, ball),
            &mut SmallRng::seed_from_u64(1),
        )
        .unwrap();
        let strong = simulate_drive(
            &params(&ambient, 100.0, accuracy, driver, ball),
            &mut SmallRng::seed_from_u64(1),
        )
        .unwrap();
        assert!(strong.total > weak.total);
        assert_eq!(weak.in_bounds, strong.in_bounds);
        assert_eq!(
            weak.in_bounds,
            is_in_bounds(adjusted_accuracy(accuracy, driver.accuracy + ball.accuracy))
        );
    }
}

#[test]
fn basic_drive_at_default_venue() {
    let catalogs = Catalogs::load_default().unwrap();
    let venue = catalogs.venues.default_venue().unwrap();
    let weather = catalogs.weather.get(&venue.weather).unwrap().clone();
    let ambient = AmbientConditions {
        weather,
        wind_mph: 0.0,
        altitude_bonus: venue.altitude_bonus,
        night_mode: venue.night,
    };
    let (driver, ball) = common_bonuses();
    let flight = simulate_drive(
        &params(&ambient, 80.0, 50.0, driver, ball),
        &mut SmallRng::seed_from_u64(80),
    )
    .unwrap();
    assert!(flight.in_bounds);
    assert!((flight.launch_angle_deg - 12.0).abs() < 1e-9);
    assert!(flight.total > 0.0);
    assert!(flight.carry > flight.roll);
}

#[test]
fn distance_bonus_strictly_increases_carry() {
    let ambient = AmbientConditions::still();
    let (driver, ball) = common_bonuses();
    let baseline = simulate_drive(
        &params(&ambient, 85.0, 55.0, driver, ball),
        &mut SmallRng::seed_from_u64(3),
    )
    .unwrap();
    let mut boosted_driver = driver;
    boosted_driver.distance_pct += 5.0;
    let boosted = simulate_drive(
        &params(&ambient, 85.0, 55.0, boosted_driver, ball),
        &mut SmallRng::seed_from_u64(3),
    )
    .unwrap();
    assert!(boosted.carry > baseline.carry);
}

#[test]
fn rarer_gear_outdrives_starters() {
    let catalog = EquipmentCatalog::default_config().unwrap();
    let ambient = AmbientConditions::still();
    let (driver, ball) = common_bonuses();
    let legendary_driver = catalog
        .lookup("thunderclap", EquipmentSlot::Driver)
        .unwrap()
        .bonuses();
    let legendary_ball = catalog
        .lookup("solar_flare", EquipmentSlot::Ball)
        .unwrap()
        .bonuses();
    let starter = simulate_drive(
        &params(&ambient, 90.0, 50.0, driver, ball),
        &mut SmallRng::seed_from_u64(12),
    )
    .unwrap();
    let premium = simulate_drive(
        &params(&ambient, 90.0, 50.0, legendary_driver, legendary_ball),
        &mut SmallRng::seed_from_u64(12),
    )
    .unwrap();
    assert!(premium.total > starter.total);
    assert!(premium.ball_speed_mph > starter.ball_speed_mph);
}

#[test]
fn unknown_equipment_fails_fast() {
    let catalog = EquipmentCatalog::default_config().unwrap();
    let loadout = Loadout {
        driver_id: "starter_driver".into(),
        ball_id: "starter_driver".into(),
    };
    assert!(loadout.bonuses(&catalog).is_err());
}
