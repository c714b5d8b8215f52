//! Raw listing text -> Fare
//!
//! A listing is the rendered text of one search result, one field per line:
//!
//! ```text
//! [departure, _, arrival, carrier, duration, _, stops, _, _, _]
//! ```
//!
//! The price line is located by its currency marker rather than by position,
//! since its index shifts with carrier-specific badges.

use crate::domain::error::{TrackerError, TrackerResult};
use crate::domain::types::{Fare, UNKNOWN_PRICE};

pub const CURRENCY_MARKER: &str = "R$";

// Positions within a listing
const DEPARTURE: usize = 0;
const ARRIVAL: usize = 2;
const CARRIER: usize = 3;
const DURATION: usize = 4;
const STOPS: usize = 6;

/// Fields needed to reach the last named position
pub const REQUIRED_FIELDS: usize = STOPS + 1;

/// Parse one raw listing.
///
/// Fails only on layout (too few fields). A missing or unreadable price
/// yields `UNKNOWN_PRICE`.
pub fn parse_fare(raw: &str) -> TrackerResult<Fare> {
    let fields: Vec<&str> = raw.split('\n').collect();
    if fields.len() < REQUIRED_FIELDS {
        return Err(TrackerError::MalformedRecord {
            fields: fields.len(),
            required: REQUIRED_FIELDS,
        });
    }

    Ok(Fare {
        departure_time: fields[DEPARTURE].to_string(),
        arrival_time: fields[ARRIVAL].to_string(),
        carrier: fields[CARRIER].to_string(),
        duration: fields[DURATION].to_string(),
        stops: fields[STOPS].to_string(),
        price: parse_price(&fields),
    })
}

/// Price from the first field carrying the currency marker
pub fn parse_price(fields: &[&str]) -> u64 {
    fields
        .iter()
        .find(|f| f.contains(CURRENCY_MARKER))
        .and_then(|f| parse_amount(f))
        .unwrap_or(UNKNOWN_PRICE)
}

/// "R$ 1.234" -> 1234. Thousands separators and any whitespace (the page
/// uses a non-breaking space after the marker) are dropped.
fn parse_amount(field: &str) -> Option<u64> {
    let digits: String = field
        .replace(CURRENCY_MARKER, "")
        .chars()
        .filter(|c| *c != '.' && !c.is_whitespace())
        .collect();
    digits.parse().ok()
}
