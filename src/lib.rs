pub mod api;
pub mod config;
pub mod database;
pub mod document;
pub mod error;
pub mod formatter;
pub mod prompt;
pub mod providers;

// Re-export commonly used items
pub use config::Settings;
pub use error::AppError;
