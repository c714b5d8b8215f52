//! Day-level aggregation over route bests
//!
//! Runs once per cycle after every route of the day has been queried, so a
//! day produces at most one improvement (and one notification) per cycle.

use crate::domain::types::DayState;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayUpdate {
    pub improved: bool,
}

impl DayState {
    /// Recompute the day best from current route bests.
    ///
    /// Same rules as a route: strict decrease, and the unknown-price sentinel
    /// only fills an absent best.
    pub fn recompute_best(&mut self) -> DayUpdate {
        let Some(candidate) = self.cheapest_route_fare() else {
            return DayUpdate { improved: false };
        };

        if !candidate.improves_on(self.best_fare.as_ref()) {
            return DayUpdate { improved: false };
        }

        let candidate = candidate.clone();
        debug!(
            date = %self.date,
            price = %candidate.price,
            previous = ?self.best_fare.as_ref().map(|f| f.price),
            "day_best_updated"
        );
        self.best_fare = Some(candidate);
        DayUpdate { improved: true }
    }
}

#[cfg(test)]
mod tests {
    use crate::domain::types::{DayState, Fare, Route, UNKNOWN_PRICE};

    fn fare(price: u64, carrier: &str) -> Fare {
        Fare {
            departure_time: "08:00".to_string(),
            arrival_time: "10:15".to_string(),
            carrier: carrier.to_string(),
            duration: "2h 15m".to_string(),
            stops: "Nonstop".to_string(),
            price,
        }
    }

    fn day() -> DayState {
        DayState::new(
            "2024-05-31",
            vec![Route::new("NVT", "GRU"), Route::new("NVT", "CGH"), Route::new("FLN", "GRU")],
        )
    }

    #[test]
    fn test_no_route_fares_no_improvement() {
        let mut day = day();
        assert!(!day.recompute_best().improved);
        assert!(day.best_fare.is_none());
    }

    #[test]
    fn test_first_fare_improves() {
        let mut day = day();
        day.routes[1].update_cycle(&[fare(700, "B")]).unwrap();
        assert!(day.recompute_best().improved);
        assert_eq!(day.best_fare.as_ref().unwrap().price, 700);
    }

    #[test]
    fn test_tie_across_routes_is_not_improvement() {
        let mut day = day();
        day.routes[0].update_cycle(&[fare(500, "A")]).unwrap();
        assert!(day.recompute_best().improved);

        day.routes[2].update_cycle(&[fare(500, "C")]).unwrap();
        assert!(!day.recompute_best().improved);
        assert_eq!(day.best_fare.as_ref().unwrap().carrier, "A");
    }

    #[test]
    fn test_unknown_sentinel_replaced_by_real_price() {
        let mut day = day();
        day.routes[0].update_cycle(&[fare(UNKNOWN_PRICE, "A")]).unwrap();
        assert!(day.recompute_best().improved);

        day.routes[1].update_cycle(&[fare(800, "B")]).unwrap();
        assert!(day.recompute_best().improved);
        assert_eq!(day.best_fare.as_ref().unwrap().price, 800);
    }

    #[test]
    fn test_day_best_tracks_route_minimum_over_many_cycles() {
        let cycles: [[Option<u64>; 3]; 6] = [
            [Some(900), None, Some(1100)],
            [Some(950), Some(870), None],
            [None, Some(880), Some(860)],
            [Some(UNKNOWN_PRICE), None, Some(860)],
            [Some(700), Some(720), Some(710)],
            [None, None, None],
        ];

        let mut day = day();
        for prices in cycles {
            for (route, price) in day.routes.iter_mut().zip(prices) {
                if let Some(price) = price {
                    route.update_cycle(&[fare(price, "X")]).unwrap();
                }
            }
            day.recompute_best();

            let expected = day.routes.iter().filter_map(|r| r.best_fare.as_ref()).map(|f| f.price).min();
            assert_eq!(day.best_fare.as_ref().map(|f| f.price), expected);
        }
        assert_eq!(day.best_fare.unwrap().price, 700);
    }
}
