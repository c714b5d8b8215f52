//! Polling cycle orchestration
//!
//! The TrackingStore owns the tracking state and drives one cycle at a time:
//! - Query every route of every day, in configured order
//! - Parse listings and feed them to the route trackers
//! - Aggregate each day once all its routes are done
//! - Notify on day-level improvement
//!
//! Failures are contained at the smallest unit: a bad listing is skipped, a
//! failing route sits the cycle out, a failed notification is logged.


use crate::domain::fare_record::parse_fare;
use crate::domain::types::{Fare, RouteState, TrackingState};
use crate::io::notifier::Notifier;
use crate::io::provider::ListingProvider;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};

/// Outcome counters for one polling cycle
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Dates whose best fare improved, in configured order
    pub improved_days: Vec<String>,
    pub routes_queried: usize,
    pub routes_improved: usize,
    /// Routes left unchanged because the provider failed or nothing parsed
    pub routes_skipped: usize,
    pub listings_rejected: usize,
    pub notifications_failed: usize,
}

impl CycleReport {
    pub fn day_improved(&self, date: &str) -> bool {
        self.improved_days.iter().any(|d| d == date)
    }
}

pub struct TrackingStore {
    state: TrackingState,
    provider: Arc<dyn ListingProvider>,
    notifier: Arc<dyn Notifier>,
}

impl TrackingStore {
    pub fn new(
        state: TrackingState,
        provider: Arc<dyn ListingProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { state, provider, notifier }
    }

    pub fn state(&self) -> &TrackingState {
        &self.state
    }

    pub fn into_state(self) -> TrackingState {
        self.state
    }

    /// Run one full polling cycle over every configured day
    pub async fn run_cycle(&mut self) -> CycleReport {
        let mut report = CycleReport::default();
        let start = Instant::now();

        for day in &mut self.state.days {
            for route in &mut day.routes {
                refresh_route(self.provider.as_ref(), &day.date, route, &mut report).await;
            }

            if !day.recompute_best().improved {
                continue;
            }
            let Some(best) = day.best_fare.as_ref() else {
                continue;
            };

            info!(date = %day.date, price = %best.price, fare = %best, "day_improved");
            report.improved_days.push(day.date.clone());

            if let Err(e) = self.notifier.notify(&day.date, best).await {
                report.notifications_failed += 1;
                error!(date = %day.date, kind = %e.kind(), error = %e, "notification_failed");
            }
        }

        info!(
            routes_queried = %report.routes_queried,
            routes_improved = %report.routes_improved,
            routes_skipped = %report.routes_skipped,
            listings_rejected = %report.listings_rejected,
            days_improved = %report.improved_days.len(),
            notifications_failed = %report.notifications_failed,
            duration_ms = %start.elapsed().as_millis(),
            "cycle_completed"
        );
        report
    }
}

/// Query, parse and update a single route
async fn refresh_route(
    provider: &dyn ListingProvider,
    date: &str,
    route: &mut RouteState,
    report: &mut CycleReport,
) {
    let origin = route.route.origin.as_str();
    let destination = route.route.destination.as_str();
    info!(origin = %origin, destination = %destination, date = %date, "route_query_started");
    report.routes_queried += 1;

    let listings = match provider.query(origin, destination, date).await {
        Ok(listings) => listings,
        Err(e) => {
            report.routes_skipped += 1;
            warn!(
                origin = %origin,
                destination = %destination,
                date = %date,
                kind = %e.kind(),
                error = %e,
                "route_query_failed"
            );
            return;
        }
    };

    let mut fares: Vec<Fare> = Vec::with_capacity(listings.len());
    for raw in &listings {
        match parse_fare(raw) {
            Ok(fare) => fares.push(fare),
            Err(e) => {
                report.listings_rejected += 1;
                warn!(route = %route.route, date = %date, error = %e, "listing_rejected");
            }
        }
    }

    if fares.is_empty() {
        report.routes_skipped += 1;
        warn!(route = %route.route, date = %date, listings = %listings.len(), "route_without_fares");
        return;
    }

    match route.update_cycle(&fares) {
        Ok(update) => {
            if update.improved {
                report.routes_improved += 1;
            }
            info!(
                route = %route.route,
                date = %date,
                fares = %fares.len(),
                best_price = %update.best.price,
                carrier = %update.best.carrier,
                improved = %update.improved,
                "route_updated"
            );
        }
        Err(e) => {
            report.routes_skipped += 1;
            warn!(route = %route.route, date = %date, error = %e, "route_update_failed");
        }
    }
}
