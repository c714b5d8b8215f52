//! Services - price tracking and scheduling
//!
//! This module contains the core business logic services:
//! - `route_tracker` - Best fare per route (monotonic, sentinel-guarded)
//! - `day_aggregator` - Best fare per day across its routes
//! - `tracking_store` - One polling cycle over every day and route
//! - `runner` - Polling loop state machine with cooperative shutdown

pub mod day_aggregator;
pub mod route_tracker;
pub mod runner;
pub mod tracking_store;

// Re-export commonly used types
pub use day_aggregator::DayUpdate;
pub use route_tracker::RouteUpdate;
pub use runner::{Runner, RunnerState};
pub use tracking_store::{CycleReport, TrackingStore};
