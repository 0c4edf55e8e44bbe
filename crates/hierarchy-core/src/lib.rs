pub mod config;
pub mod error;
pub mod models;

pub use config::{
    GraphConfig, HealthConfig, LinksConfig, LoggingConfig, ServerConfig, Settings,
};
pub use error::*;
pub use models::*;
