pub mod app;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod errors;
pub mod habits;
pub mod handlers;
pub mod insights;
pub mod journal;
pub mod models;
pub mod state;
pub mod storage;
pub mod streak;
pub mod table;
pub mod tasks;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::Store;
