// webshell-bridge library
// Request routing for an embedded web shell, iCalendar import into a local
// calendar store and pull notifications.

pub mod calendar;
pub mod config;
pub mod database;
pub mod error;
pub mod http_config;
pub mod models;
pub mod notify;
pub mod router;
pub mod utils;

// Re-export commonly used types
pub use config::BridgeConfig;
pub use database::Database;
pub use error::{AppError, AppResult};
pub use models::*;
pub use router::RequestRouter;
