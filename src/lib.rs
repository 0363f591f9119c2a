pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod utils;

pub use state::{bootstrap, AppConfig, AppState};
