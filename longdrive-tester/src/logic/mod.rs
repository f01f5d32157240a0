pub mod harness;
pub mod policy;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod store;
pub mod tester;

pub use policy::SwingStrategy;
pub use scenarios::{get_scenario, list_scenarios, scenario_keys};
pub use seeds::resolve_seed_inputs;
pub use tester::*;
