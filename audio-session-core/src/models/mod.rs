pub mod config;
pub mod error;
pub mod params;
pub mod progress;
pub mod snapshot;
pub mod state;
