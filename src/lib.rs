pub mod config;
pub mod models;
pub mod orchestrator;
pub mod page;
pub mod session;
pub mod site;
pub mod store;
pub mod utils;
pub mod web;

// Re-export commonly used types
pub use config::AppConfig;
pub use utils::error::AppError;

pub type Result<T> = std::result::Result<T, AppError>;
