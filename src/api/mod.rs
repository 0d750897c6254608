pub mod client;
pub mod models;
pub mod throttle;

pub use client::{ApiClient, ScoreSource};
