pub mod app_config;
pub mod article;
pub mod config;

pub use app_config::{AppConfig, Environment};
pub use article::NewArticle;
pub use config::{load_app_config, load_app_config_from_env, ConfigError};
