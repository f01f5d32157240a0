use longdrive_game::progression::{ChestTier, DriveOutcome, drive_rewards};
use longdrive_game::{
    AchievementCatalog, AchievementContext, Catalogs, ChestConfig, ChestType, DivisionTable,
    EquipmentCatalog, ProfileAggregate, VenueCatalog, check_achievements, generate_chest_contents,
    level_from_xp,
};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::collections::BTreeSet;

#[test]
fn level_is_monotonic_in_xp() {
    let mut last = level_from_xp(0);
    let mut xp = 0_u64;
    while xp < 2_000_000 {
        xp += 1 + xp / 50;
        let next = level_from_xp(xp);
        assert!(next.level >= last.level);
        if next.level == last.level {
            assert!(next.xp_into_level >= last.xp_into_level);
        }
        last = next;
    }
}

#[test]
fn division_never_drops_with_more_xp() {
    let table = DivisionTable::default_config().unwrap();
    let mut last_min = 0;
    for xp in (0..20_000).step_by(250) {
        let division = table.division_from_xp(xp).unwrap();
        assert!(division.min_xp >= last_min);
        assert!(division.min_xp <= xp);
        last_min = division.min_xp;
    }
}

#[test]
fn achievements_are_never_awarded_twice() {
    let catalog = AchievementCatalog::default_config().unwrap();
    let mut profile = ProfileAggregate {
        total_drives: 600,
        best_distance: 410.0,
        current_streak: 20,
        xp: 20_000,
        contest_wins: 12,
        ..ProfileAggregate::default()
    };
    for venue in ["driving_range", "coastal_links", "desert_dunes"] {
        profile.unlocked_venues.insert(venue.to_string());
    }
    let venues = VenueCatalog::default_config().unwrap();
    let ctx = AchievementContext::from_profile(&profile, &venues);
    let first = check_achievements(&catalog, &profile.unlocked_achievements, &ctx);
    assert!(first.iter().any(|id| id == "globetrotter"));
    assert!(!first.iter().any(|id| id == "epic_owner"));
    let mut unlocked: BTreeSet<String> = first.into_iter().collect();
    assert!(check_achievements(&catalog, &unlocked, &ctx).is_empty());

    unlocked.insert("ignored-unknown-id".into());
    assert!(check_achievements(&catalog, &unlocked, &ctx).is_empty());
}

#[test]
fn chest_contents_respect_tier_tables() {
    let catalogs = Catalogs::load_default().unwrap();
    let mut rng = SmallRng::seed_from_u64(0xC4E57);
    for tier in &catalogs.chests.tiers {
        let mut saw_gems = false;
        for _ in 0..500 {
            let contents = generate_chest_contents(tier, &catalogs.equipment, &mut rng);
            assert_eq!(contents.chest_type, tier.chest_type);
            assert!((tier.coins[0]..=tier.coins[1]).contains(&contents.coins));
            assert!((tier.xp[0]..=tier.xp[1]).contains(&contents.xp));
            if contents.gems > 0 {
                saw_gems = true;
                assert!((tier.gems[0]..=tier.gems[1]).contains(&contents.gems));
            }
            if let Some(drop) = contents.equipment {
                assert!(tier.rarity_weights.contains_key(&drop.rarity));
            }
        }
        assert!(saw_gems || tier.gem_chance < 0.1);
    }
}

#[test]
fn zero_chance_tier_never_drops_gems_or_gear() {
    let equipment = EquipmentCatalog::default_config().unwrap();
    let config = ChestConfig::default_config().unwrap();
    let mut tier: ChestTier = config.tier(ChestType::Wooden).unwrap().clone();
    tier.gem_chance = 0.0;
    tier.equipment_chance = 0.0;
    let mut rng = SmallRng::seed_from_u64(17);
    for _ in 0..200 {
        let contents = generate_chest_contents(&tier, &equipment, &mut rng);
        assert_eq!(contents.gems, 0);
        assert!(contents.equipment.is_none());
    }
}

#[test]
fn every_tenth_drive_earns_a_wooden_chest() {
    let miss = longdrive_game::DriveResult::shot_clock_miss(
        10.0,
        0.0,
        &longdrive_game::AmbientConditions::still(),
    );
    let mut profile = ProfileAggregate::default();
    let mut wooden = 0;
    for _ in 0..30 {
        let rewards = drive_rewards(&miss, &profile, DriveOutcome::default());
        wooden += rewards
            .chests
            .iter()
            .filter(|c| **c == ChestType::Wooden)
            .count();
        profile.total_drives += 1;
    }
    assert_eq!(wooden, 3);
}
