pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod templates;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
pub use routes::app;
pub use state::AppState;
