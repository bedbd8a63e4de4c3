pub mod loader;
pub mod schema;
pub mod script;

pub use loader::{DataLoadError, Scenario, load_config, load_scenario};
pub use script::Script;
