//! Domain models - fares, routes, and the tracking state
//!
//! This module contains the canonical data types used throughout the system:
//! - `Fare` - one parsed fare listing
//! - `RouteState` / `DayState` / `TrackingState` - best-so-far tracking state
//! - `fare_record` - raw listing text parser
//! - `TrackerError` - error taxonomy

pub mod error;
pub mod fare_record;
pub mod types;

// Re-export commonly used types at module level
pub use error::{TrackerError, TrackerResult};
pub use fare_record::parse_fare;
pub use types::{DayState, Fare, Route, RouteState, TrackingState, UNKNOWN_PRICE};
