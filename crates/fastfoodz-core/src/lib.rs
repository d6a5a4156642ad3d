pub mod app_config;
pub mod config;
pub mod display;
pub mod geo;
pub mod place;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env, parse_categories};
pub use display::{format_distance_miles, list_row, METERS_TO_MILES};
pub use geo::Coordinate;
pub use place::{Category, Place, PriceTier};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
