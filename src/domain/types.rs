//! Shared types for fare tracking
//!
//! The tracking state is persisted as-is, so these types double as the
//! snapshot schema. Optional fields default when absent to keep older
//! snapshots loadable.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Price given to listings without a parsable amount so they sort last.
/// Never allowed to displace a real best price. A real price at or above
/// this value cannot replace a sentinel best; unreachable for BRL fares.
pub const UNKNOWN_PRICE: u64 = 999_999;

/// One fare listing, immutable once parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fare {
    pub departure_time: String,
    pub arrival_time: String,
    pub carrier: String,
    pub duration: String,
    pub stops: String,
    /// Whole currency units, separators stripped
    pub price: u64,
}

impl Fare {
    #[inline]
    pub fn has_known_price(&self) -> bool {
        self.price != UNKNOWN_PRICE
    }

    /// Whether this fare should replace `prior` as best.
    ///
    /// Strictly lower wins; ties keep the prior. The sentinel only fills an
    /// empty slot.
    pub fn improves_on(&self, prior: Option<&Fare>) -> bool {
        match prior {
            None => true,
            Some(_) if !self.has_known_price() => false,
            Some(prior) => self.price < prior.price,
        }
    }
}

impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "R$ {} {} ({} -> {}, {}, {})",
            self.price,
            self.carrier,
            self.departure_time,
            self.arrival_time,
            self.duration,
            self.stops
        )
    }
}

/// Origin/destination pair, compared exactly (case-sensitive, no trimming)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    pub origin: String,
    pub destination: String,
}

impl Route {
    pub fn new(origin: &str, destination: &str) -> Self {
        Self { origin: origin.to_string(), destination: destination.to_string() }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.origin, self.destination)
    }
}

/// Best fare seen so far for one route on one day
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteState {
    #[serde(flatten)]
    pub route: Route,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_fare: Option<Fare>,
}

impl RouteState {
    pub fn new(route: Route) -> Self {
        Self { route, best_fare: None }
    }
}

/// All routes tracked for one travel date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayState {
    /// Literal date string, passed through to the provider unparsed
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_fare: Option<Fare>,
    #[serde(default)]
    pub routes: Vec<RouteState>,
}

impl DayState {
    pub fn new(date: &str, routes: Vec<Route>) -> Self {
        Self {
            date: date.to_string(),
            best_fare: None,
            routes: routes.into_iter().map(RouteState::new).collect(),
        }
    }

    /// Cheapest current route best, first in configured order on ties
    pub fn cheapest_route_fare(&self) -> Option<&Fare> {
        self.routes.iter().filter_map(|r| r.best_fare.as_ref()).min_by_key(|f| f.price)
    }
}

/// Every tracked day, in configured order. The unit of persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackingState {
    #[serde(default)]
    pub days: Vec<DayState>,
}

impl TrackingState {
    pub fn new(days: Vec<DayState>) -> Self {
        Self { days }
    }

    pub fn day(&self, date: &str) -> Option<&DayState> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn route_count(&self) -> usize {
        self.days.iter().map(|d| d.routes.len()).sum()
    }

    /// Carry best fares from a persisted snapshot into this (configured) state.
    ///
    /// Configuration decides which days and routes exist and their order.
    /// Day bests are rebuilt from the merged route bests afterwards, so a
    /// route dropped from configuration cannot leave a stale day best behind.
    pub fn restore_from(&mut self, snapshot: TrackingState) {
        let mut restored_routes = 0usize;

        for saved_day in snapshot.days {
            let Some(day) = self.days.iter_mut().find(|d| d.date == saved_day.date) else {
                info!(date = %saved_day.date, "snapshot_day_not_configured");
                continue;
            };

            for saved_route in saved_day.routes {
                let Some(route) = day.routes.iter_mut().find(|r| r.route == saved_route.route)
                else {
                    info!(
                        date = %day.date,
                        route = %saved_route.route,
                        "snapshot_route_not_configured"
                    );
                    continue;
                };
                if saved_route.best_fare.is_some() {
                    route.best_fare = saved_route.best_fare;
                    restored_routes += 1;
                }
            }
        }

        for day in &mut self.days {
            day.best_fare = day.cheapest_route_fare().cloned();
        }

        info!(restored_routes = %restored_routes, "snapshot_restored");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fare(price: u64) -> Fare {
        Fare {
            departure_time: "08:00".to_string(),
            arrival_time: "10:15".to_string(),
            carrier: "AirlineX".to_string(),
            duration: "2h 15m".to_string(),
            stops: "Nonstop".to_string(),
            price,
        }
    }

    #[test]
    fn test_improves_on() {
        assert!(fare(500).improves_on(None));
        assert!(fare(400).improves_on(Some(&fare(500))));
        assert!(!fare(500).improves_on(Some(&fare(500))));
        assert!(!fare(600).improves_on(Some(&fare(500))));
    }

    #[test]
    fn test_unknown_price_only_fills_empty_slot() {
        let unknown = fare(UNKNOWN_PRICE);
        assert!(!unknown.has_known_price());
        assert!(unknown.improves_on(None));
        assert!(!unknown.improves_on(Some(&fare(500))));
        assert!(!unknown.improves_on(Some(&fare(UNKNOWN_PRICE))));
        assert!(fare(500).improves_on(Some(&unknown)));
        // Prices at or above the sentinel cannot displace it
        assert!(!fare(1_200_000).improves_on(Some(&unknown)));
    }

    #[test]
    fn test_route_equality_is_exact() {
        assert_eq!(Route::new("NVT", "GRU"), Route::new("NVT", "GRU"));
        assert_ne!(Route::new("NVT", "GRU"), Route::new("nvt", "GRU"));
        assert_ne!(Route::new("NVT", "GRU"), Route::new("NVT ", "GRU"));
    }

    #[test]
    fn test_cheapest_route_fare_prefers_first_on_tie() {
        let mut day = DayState::new(
            "2024-05-31",
            vec![Route::new("NVT", "GRU"), Route::new("NVT", "CGH"), Route::new("FLN", "GRU")],
        );
        assert!(day.cheapest_route_fare().is_none());

        let mut tied = fare(450);
        tied.carrier = "Second".to_string();
        day.routes[0].best_fare = Some(fare(450));
        day.routes[1].best_fare = Some(tied);
        assert_eq!(day.cheapest_route_fare().unwrap().carrier, "AirlineX");
    }

    #[test]
    fn test_restore_from_snapshot() {
        let mut state = TrackingState::new(vec![
            DayState::new("2024-05-31", vec![Route::new("NVT", "GRU"), Route::new("NVT", "CGH")]),
            DayState::new("2024-06-01", vec![Route::new("NVT", "GRU")]),
        ]);

        let mut saved_day = DayState::new(
            "2024-05-31",
            vec![Route::new("NVT", "CGH"), Route::new("NVT", "VCP"), Route::new("NVT", "GRU")],
        );
        saved_day.routes[0].best_fare = Some(fare(700));
        saved_day.routes[1].best_fare = Some(fare(100)); // no longer configured
        saved_day.routes[2].best_fare = None;
        saved_day.best_fare = Some(fare(100));
        let stale_day = DayState::new("2023-01-01", vec![Route::new("NVT", "GRU")]);

        state.restore_from(TrackingState::new(vec![stale_day, saved_day]));

        assert_eq!(state.days.len(), 2);
        let day = state.day("2024-05-31").unwrap();
        assert_eq!(day.routes[0].route, Route::new("NVT", "GRU"));
        assert!(day.routes[0].best_fare.is_none());
        assert_eq!(day.routes[1].best_fare.as_ref().unwrap().price, 700);
        assert_eq!(day.best_fare.as_ref().unwrap().price, 700);
        assert!(state.day("2024-06-01").unwrap().best_fare.is_none());
        assert!(state.day("2023-01-01").is_none());
    }

    #[test]
    fn test_absent_best_fare_is_omitted_from_json() {
        let state = TrackingState::new(vec![DayState::new("2024-05-31", vec![Route::new("A", "B")])]);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(json["days"][0]["routes"][0]["origin"], "A");
        assert!(json["days"][0].get("best_fare").is_none());
        assert!(json["days"][0]["routes"][0].get("best_fare").is_none());
    }
}
