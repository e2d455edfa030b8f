use serde::{Deserialize, Serialize};

use crate::limits::MAX_STAY_DAYS;
use crate::model::*;

use super::availability::AvailabilityIndex;
use super::expand::{occupied_range, parse_day};

// ── Booking Validator ─────────────────────────────────────────────

/// Why a proposed stay was refused. Expected user-input outcomes, not faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Rejection {
    /// Missing, unparseable, inverted, or overlong dates.
    InvalidRange,
    /// At least one day of the stay is already booked.
    Conflict,
    /// More guests than the venue accepts.
    CapacityExceeded,
    /// Zero guests.
    InvalidGuests,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::InvalidRange => "invalid-range",
            Rejection::Conflict => "conflict",
            Rejection::CapacityExceeded => "capacity-exceeded",
            Rejection::InvalidGuests => "invalid-guests",
        }
    }
}

impl std::fmt::Display for Rejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result handed back to the UI layer: `{ accepted, reason? }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<Rejection>,
}

impl Verdict {
    pub const ACCEPTED: Verdict = Verdict {
        accepted: true,
        reason: None,
    };

    pub fn rejected(reason: Rejection) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
        }
    }
}

impl<T> From<Result<T, Rejection>> for Verdict {
    fn from(result: Result<T, Rejection>) -> Self {
        match result {
            Ok(_) => Verdict::ACCEPTED,
            Err(reason) => Verdict::rejected(reason),
        }
    }
}

/// A proposed stay. Absent dates stand for missing or unparseable input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRequest {
    pub check_in: Option<Day>,
    pub check_out: Option<Day>,
    pub guests: u32,
}

impl StayRequest {
    pub fn new(check_in: Day, check_out: Day, guests: u32) -> Self {
        Self {
            check_in: Some(check_in),
            check_out: Some(check_out),
            guests,
        }
    }

    /// Build from raw form input; unparseable dates become `None`.
    pub fn parse(check_in: &str, check_out: &str, guests: u32) -> Self {
        Self {
            check_in: parse_day(check_in),
            check_out: parse_day(check_out),
            guests,
        }
    }

    pub fn nights(&self) -> Option<i64> {
        Some((self.check_out? - self.check_in?).num_days())
    }
}

/// Decide whether `request` can be booked at a venue holding `max_guests`
/// whose existing bookings are `index`.
///
/// Guest checks run before date checks so an over-capacity request is
/// refused as such whatever its dates. On success returns the day range the
/// stay will occupy under the index's checkout policy.
pub fn validate_stay(
    request: &StayRequest,
    max_guests: u32,
    index: &AvailabilityIndex,
) -> Result<DayRange, Rejection> {
    if request.guests == 0 {
        return Err(Rejection::InvalidGuests);
    }
    if request.guests > max_guests {
        return Err(Rejection::CapacityExceeded);
    }

    let (Some(check_in), Some(check_out)) = (request.check_in, request.check_out) else {
        return Err(Rejection::InvalidRange);
    };
    if check_out <= check_in {
        return Err(Rejection::InvalidRange);
    }
    if (check_out - check_in).num_days() > MAX_STAY_DAYS {
        return Err(Rejection::InvalidRange);
    }
    let occupied =
        occupied_range(check_in, check_out, index.policy()).ok_or(Rejection::InvalidRange)?;

    // Reject on the first blocked day; which day collided is not reported.
    if occupied.days().any(|day| index.is_blocked(day)) {
        return Err(Rejection::Conflict);
    }

    Ok(occupied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(y: i32, m: u32, d: u32) -> Day {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn june(d: u32) -> Day {
        day(2024, 6, d)
    }

    /// Venue with capacity 4 booked 2024-06-10 → 2024-06-12.
    fn index_with(policy: CheckoutPolicy) -> AvailabilityIndex {
        let range = occupied_range(june(10), june(12), policy).unwrap();
        AvailabilityIndex::from_ranges(vec![range], policy)
    }

    fn check(request: StayRequest, policy: CheckoutPolicy) -> Result<DayRange, Rejection> {
        validate_stay(&request, 4, &index_with(policy))
    }

    #[test]
    fn shared_boundary_day_conflicts() {
        let r = check(StayRequest::new(june(12), june(14), 2), CheckoutPolicy::Blocking);
        assert_eq!(r, Err(Rejection::Conflict));
    }

    #[test]
    fn disjoint_stay_accepted() {
        let r = check(StayRequest::new(june(13), june(15), 2), CheckoutPolicy::Blocking);
        assert_eq!(r, Ok(DayRange::new(june(13), june(15))));
    }

    #[test]
    fn free_policy_allows_turnover_day() {
        let r = check(StayRequest::new(june(12), june(14), 2), CheckoutPolicy::Free);
        assert_eq!(r, Ok(DayRange::new(june(12), june(13))));
    }

    #[test]
    fn free_policy_still_conflicts_inside_stay() {
        let r = check(StayRequest::new(june(11), june(14), 2), CheckoutPolicy::Free);
        assert_eq!(r, Err(Rejection::Conflict));
    }

    #[test]
    fn stay_ending_on_existing_checkin_conflicts_when_blocking() {
        let r = check(StayRequest::new(june(8), june(10), 1), CheckoutPolicy::Blocking);
        assert_eq!(r, Err(Rejection::Conflict));
        let r = check(StayRequest::new(june(8), june(10), 1), CheckoutPolicy::Free);
        assert!(r.is_ok());
    }

    #[test]
    fn stay_enclosing_booking_conflicts() {
        let r = check(StayRequest::new(june(1), june(30), 1), CheckoutPolicy::Blocking);
        assert_eq!(r, Err(Rejection::Conflict));
    }

    #[test]
    fn over_capacity_wins_regardless_of_dates() {
        let ok_dates = StayRequest::new(june(13), june(15), 5);
        let clashing = StayRequest::new(june(12), june(14), 5);
        let inverted = StayRequest::new(june(15), june(13), 5);
        let missing = StayRequest::parse("", "nope", 5);
        for req in [ok_dates, clashing, inverted, missing] {
            assert_eq!(check(req, CheckoutPolicy::Blocking), Err(Rejection::CapacityExceeded));
        }
    }

    #[test]
    fn at_capacity_is_fine() {
        let r = check(StayRequest::new(june(13), june(15), 4), CheckoutPolicy::Blocking);
        assert!(r.is_ok());
    }

    #[test]
    fn zero_guests_rejected() {
        let r = check(StayRequest::new(june(13), june(15), 0), CheckoutPolicy::Blocking);
        assert_eq!(r, Err(Rejection::InvalidGuests));
    }

    #[test]
    fn checkout_must_follow_checkin() {
        let same = check(StayRequest::new(june(13), june(13), 1), CheckoutPolicy::Blocking);
        assert_eq!(same, Err(Rejection::InvalidRange));
        let inverted = check(StayRequest::new(june(15), june(13), 1), CheckoutPolicy::Blocking);
        assert_eq!(inverted, Err(Rejection::InvalidRange));
    }

    #[test]
    fn unparseable_dates_are_invalid_range() {
        let r = check(StayRequest::parse("2024-06-13", "soon", 1), CheckoutPolicy::Blocking);
        assert_eq!(r, Err(Rejection::InvalidRange));
        let r = check(StayRequest::parse("", "2024-06-15", 1), CheckoutPolicy::Blocking);
        assert_eq!(r, Err(Rejection::InvalidRange));
    }

    #[test]
    fn overlong_stay_is_invalid_range() {
        let start = day(2025, 1, 1);
        let end = start + chrono::Days::new(MAX_STAY_DAYS as u64 + 1);
        let r = check(StayRequest::new(start, end, 1), CheckoutPolicy::Blocking);
        assert_eq!(r, Err(Rejection::InvalidRange));
    }

    #[test]
    fn empty_index_accepts_any_valid_stay() {
        let r = validate_stay(&StayRequest::new(june(1), june(3), 1), 1, &AvailabilityIndex::default());
        assert!(r.is_ok());
    }

    #[test]
    fn verdict_wire_shape() {
        let accepted: Verdict = check(StayRequest::new(june(13), june(15), 2), CheckoutPolicy::Blocking).into();
        assert_eq!(serde_json::to_value(accepted).unwrap(), serde_json::json!({"accepted": true}));

        let rejected: Verdict = check(StayRequest::new(june(12), june(14), 2), CheckoutPolicy::Blocking).into();
        assert_eq!(
            serde_json::to_value(rejected).unwrap(),
            serde_json::json!({"accepted": false, "reason": "conflict"})
        );
        assert_eq!(
            serde_json::to_value(Rejection::CapacityExceeded).unwrap(),
            serde_json::json!(Rejection::CapacityExceeded.as_str())
        );
    }

    #[test]
    fn stay_request_nights() {
        assert_eq!(StayRequest::new(june(13), june(15), 1).nights(), Some(2));
        assert_eq!(StayRequest::parse("x", "2024-06-15", 1).nights(), None);
    }
}
