use anyhow::{Result, bail};
use chrono::{Datelike, NaiveDate, Utc};

pub const DEFAULT_SEED: u64 = 1337;

/// Resolve CLI seed arguments into numeric seeds, in order and without duplicates.
///
/// Supports literal integers (negative values use their magnitude) and the
/// keyword `today`, which maps the current UTC date to `YYYYMMDD`.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<u64>> {
    resolve_seed_inputs_on(tokens, Utc::now().date_naive())
}

fn resolve_seed_inputs_on(tokens: &[String], today: NaiveDate) -> Result<Vec<u64>> {
    let mut seeds: Vec<u64> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        let seed = if token.eq_ignore_ascii_case("today") {
            date_seed(today)
        } else if let Ok(value) = token.parse::<u64>() {
            value
        } else if let Ok(value) = token.parse::<i64>() {
            value.unsigned_abs()
        } else {
            bail!("Unrecognized seed token: {token}");
        };

        if !seeds.contains(&seed) {
            seeds.push(seed);
        }
    }

    if seeds.is_empty() {
        seeds.push(DEFAULT_SEED);
    }

    Ok(seeds)
}

fn date_seed(date: NaiveDate) -> u64 {
    let year = u64::try_from(date.year()).unwrap_or(0);
    year * 10_000 + u64::from(date.month()) * 100 + u64::from(date.day())
}
