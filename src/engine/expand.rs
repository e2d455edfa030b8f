use chrono::{DateTime, NaiveDate, Utc};

use crate::model::*;

// ── Date-Range Expander ───────────────────────────────────────────

/// Calendar day of an instant, normalized to UTC.
pub fn day_of(instant: &DateTime<Utc>) -> Day {
    instant.date_naive()
}

/// Parse a stay boundary from either `YYYY-MM-DD` or an RFC 3339 date-time.
/// Anything else is `None`.
pub fn parse_day(s: &str) -> Option<Day> {
    let s = s.trim();
    if let Ok(day) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(day);
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| day_of(&dt.with_timezone(&Utc)))
}

/// Occupied day range for a check-in/check-out pair of days.
///
/// Blocking: `[check_in, check_out]`. Free: `[check_in, check_out - 1]`.
/// Returns `None` when nothing is occupied (inverted input, or a same-day
/// stay under the free policy).
pub fn occupied_range(check_in: Day, check_out: Day, policy: CheckoutPolicy) -> Option<DayRange> {
    let last = match policy {
        CheckoutPolicy::Blocking => check_out,
        CheckoutPolicy::Free => check_out.pred_opt()?,
    };
    DayRange::try_new(check_in, last)
}

/// Range occupied by an existing booking.
pub fn booking_range(booking: &Booking, policy: CheckoutPolicy) -> Option<DayRange> {
    occupied_range(day_of(&booking.date_from), day_of(&booking.date_to), policy)
}

/// Expand check-in/check-out instants into the ordered calendar days they
/// occupy. Empty if check-out precedes check-in.
pub fn expand(
    check_in: &DateTime<Utc>,
    check_out: &DateTime<Utc>,
    policy: CheckoutPolicy,
) -> impl Iterator<Item = Day> + use<> {
    occupied_range(day_of(check_in), day_of(check_out), policy)
        .into_iter()
        .flat_map(|r| r.days())
}
