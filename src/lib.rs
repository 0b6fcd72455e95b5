pub mod aggregator;
pub mod app;
pub mod calendar;
pub mod config;
pub mod controller;
pub mod dates;
pub mod errors;
pub mod handlers;
pub mod markers;
pub mod models;
pub mod state;
pub mod store;
pub mod ui;

pub use app::router;
pub use config::Config;
pub use state::{build_state, AppState};
