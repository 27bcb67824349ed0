pub mod scenario;
pub mod suite;
pub mod types;

pub use scenario::{builtin_scenarios, load_scenarios, reference_path};
pub use suite::{SuiteSettings, bless_references, run_scenario, run_suite};
pub use types::{HarnessError, HarnessResult, Scenario};
