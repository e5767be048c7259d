use thiserror::Error;

pub mod app_config;
pub mod config;
pub mod plans;
pub mod product;
pub mod session;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use plans::PlanTier;
pub use product::{generate_sku, ProductStatus, ScannedProduct, VariantOption, VariantOptionSet};
pub use session::ScanSessionStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid plan tier: {0}")]
    InvalidPlanTier(String),
    #[error("invalid product status: {0}")]
    InvalidProductStatus(String),
    #[error("invalid session status: {0}")]
    InvalidSessionStatus(String),
}
