pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str};
pub use schema::{
    CurriculaConfig, DatabaseConfig, GenerationServiceConfig, SchedulerConfig,
    DEFAULT_API_KEY_ENV_VAR,
};
