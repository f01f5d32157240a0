use colored::Colorize;
use longdrive_game::Catalogs;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use super::policy::SwingStrategy;
use super::scenarios::{Scenario, ScenarioCtx};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_name: String,
    pub seed: u64,
    pub strategy: SwingStrategy,
    pub passed: bool,
    pub iterations_run: usize,
    pub successful_iterations: usize,
    pub failures: Vec<String>,
    #[serde(with = "duration_serde")]
    pub average_duration: Duration,
    #[serde(with = "duration_vec_serde")]
    pub performance_data: Vec<Duration>,
}

pub struct LogicTester<'a> {
    catalogs: &'a Catalogs,
    strategy: SwingStrategy,
    verbose: bool,
}

impl<'a> LogicTester<'a> {
    pub const fn new(catalogs: &'a Catalogs, strategy: SwingStrategy, verbose: bool) -> Self {
        Self {
            catalogs,
            strategy,
            verbose,
        }
    }

    pub fn run_scenario(
        &self,
        scenario: &Scenario,
        seeds: &[u64],
        iterations: usize,
    ) -> Vec<ScenarioResult> {
        let mut results = Vec::new();

        for &seed in seeds {
            if self.verbose {
                println!(
                    "🧪 Testing scenario: {} (policy: {} seed: {})",
                    scenario.key.bright_white(),
                    self.strategy,
                    seed
                );
            }

            results.push(self.run_single_scenario(scenario, seed, iterations));
        }

        results
    }

    fn run_single_scenario(
        &self,
        scenario: &Scenario,
        seed: u64,
        iterations: usize,
    ) -> ScenarioResult {
        let mut successes = 0;
        let mut failures = Vec::new();
        let mut performance_data = Vec::new();

        for i in 0..iterations {
            let start_time = Instant::now();
            let iteration_seed = seed.wrapping_add(u64::try_from(i).unwrap_or(u64::MAX));
            let ctx = ScenarioCtx {
                catalogs: self.catalogs,
                seed: iteration_seed,
                strategy: self.strategy,
                verbose: self.verbose,
            };

            match scenario.run(&ctx) {
                Ok(()) => {
                    successes += 1;
                    performance_data.push(start_time.elapsed());
                }
                Err(err) => {
                    log::debug!("{} seed {iteration_seed} failed: {err:?}", scenario.key);
                    failures.push(format!(
                        "Iteration {} (policy {}, seed {}): {:#}",
                        i + 1,
                        self.strategy,
                        iteration_seed,
                        err
                    ));
                    if self.verbose {
                        println!(
                            "  ❌ Iteration {}/{} failed: {}",
                            i + 1,
                            iterations,
                            format!("{err:#}").red()
                        );
                    }
                }
            }
        }

        let average_duration = if performance_data.is_empty() {
            Duration::ZERO
        } else {
            performance_data.iter().sum::<Duration>()
                / u32::try_from(performance_data.len()).unwrap_or(1)
        };

        ScenarioResult {
            scenario_name: scenario.key.to_string(),
            seed,
            strategy: self.strategy,
            passed: failures.is_empty(),
            iterations_run: iterations,
            successful_iterations: successes,
            failures,
            average_duration,
            performance_data,
        }
    }
}

mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        micros(*duration).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_micros(u64::deserialize(deserializer)?))
    }

    pub fn micros(duration: Duration) -> u64 {
        u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
    }
}

mod duration_vec_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(durations: &[Duration], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let micros: Vec<u64> = durations
            .iter()
            .copied()
            .map(super::duration_serde::micros)
            .collect();
        micros.serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let micros = Vec::<u64>::deserialize(deserializer)?;
        Ok(micros.into_iter().map(Duration::from_micros).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::scenarios::get_scenario;

    #[test]
    fn iterations_are_counted_per_seed() {
        let catalogs = Catalogs::load_default().unwrap();
        let tester = LogicTester::new(&catalogs, SwingStrategy::Steady, false);
        let scenario = get_scenario("smoke").unwrap();
        let results = tester.run_scenario(scenario, &[1, 2], 2);
        assert_eq!(results.len(), 2);
        for result in &results {
            assert!(result.passed, "{:?}", result.failures);
            assert_eq!(result.iterations_run, 2);
            assert_eq!(result.successful_iterations, 2);
            assert_eq!(result.performance_data.len(), 2);
        }
    }

    #[test]
    fn results_serialize_durations_as_micros() {
        let result = ScenarioResult {
            scenario_name: "smoke".into(),
            seed: 7,
            strategy: SwingStrategy::Erratic,
            passed: false,
            iterations_run: 1,
            successful_iterations: 0,
            failures: vec!["boom".into()],
            average_duration: Duration::from_micros(1500),
            performance_data: vec![Duration::from_micros(1500)],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["average_duration"], 1500);
        assert_eq!(json["strategy"], "erratic");
        let back: ScenarioResult = serde_json::from_value(json).unwrap();
        assert_eq!(back.performance_data, result.performance_data);
    }
}
