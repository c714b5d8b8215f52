//! Per-route best fare tracking
//!
//! A route's best fare only ever moves down. Each polling cycle hands the
//! route the fares seen for it; the cheapest one (first on ties) is compared
//! against the stored best.

use crate::domain::error::{TrackerError, TrackerResult};
use crate::domain::types::{Fare, RouteState};
use tracing::debug;

/// Result of feeding one cycle's fares to a route
#[derive(Debug, Clone, PartialEq)]
pub struct RouteUpdate {
    pub improved: bool,
    /// Route best after the update
    pub best: Fare,
}

impl RouteState {
    /// Ingest one cycle's fares for this route.
    ///
    /// Returns `EmptyBatch` when `fares` is empty; routes without fares must
    /// be skipped by the caller.
    pub fn update_cycle(&mut self, fares: &[Fare]) -> TrackerResult<RouteUpdate> {
        // min_by_key keeps the first of equal elements
        let candidate = fares.iter().min_by_key(|f| f.price).ok_or(TrackerError::EmptyBatch)?;

        let improved = candidate.improves_on(self.best_fare.as_ref());
        if improved {
            debug!(
                route = %self.route,
                price = %candidate.price,
                previous = ?self.best_fare.as_ref().map(|f| f.price),
                "route_best_updated"
            );
            self.best_fare = Some(candidate.clone());
        }

        let best = match &self.best_fare {
            Some(best) => best.clone(),
            None => candidate.clone(),
        };
        Ok(RouteUpdate { improved, best })
    }
}
