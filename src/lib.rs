pub mod actions;
pub mod api;
pub mod config;
pub mod contract;
pub mod derive;
pub mod error;
pub mod matches;
pub mod refresh;
pub mod state;
pub mod types;
