pub mod settings;

pub use settings::{CrmConfig, MediaConfig, RosterConfig, ServerConfig, Settings};
