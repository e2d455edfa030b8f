use serde::Serialize;

use crate::model::*;

use super::expand::booking_range;

// ── Availability Index ────────────────────────────────────────────

/// Blocked calendar days of one venue, derived from its bookings.
///
/// Stored as sorted, disjoint ranges; adjacent ranges are coalesced, so
/// membership is exactly the union of every booking's expanded days.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AvailabilityIndex {
    blocked: Vec<DayRange>,
    policy: CheckoutPolicy,
}

impl AvailabilityIndex {
    /// Build from a venue's full booking list. Bookings whose check-out
    /// precedes check-in block nothing.
    pub fn build<'a>(bookings: impl IntoIterator<Item = &'a Booking>, policy: CheckoutPolicy) -> Self {
        let mut ranges = Vec::new();
        for booking in bookings {
            match booking_range(booking, policy) {
                Some(range) => ranges.push(range),
                None => tracing::debug!("booking {} occupies no days, skipped", booking.id),
            }
        }
        Self::from_ranges(ranges, policy)
    }

    pub fn from_ranges(mut ranges: Vec<DayRange>, policy: CheckoutPolicy) -> Self {
        ranges.sort_by_key(|r| r.first);
        Self {
            blocked: merge_touching(&ranges),
            policy,
        }
    }

    pub fn policy(&self) -> CheckoutPolicy {
        self.policy
    }

    pub fn is_empty(&self) -> bool {
        self.blocked.is_empty()
    }

    pub fn is_blocked(&self, day: Day) -> bool {
        // First range ending on or after `day`; blocked iff it also starts on or before it.
        let idx = self.blocked.partition_point(|r| r.last < day);
        self.blocked.get(idx).is_some_and(|r| r.first <= day)
    }

    /// Earliest blocked day inside `range`, if any.
    pub fn first_blocked_in(&self, range: &DayRange) -> Option<Day> {
        let idx = self.blocked.partition_point(|r| r.last < range.first);
        let hit = self.blocked.get(idx)?;
        hit.overlaps(range).then(|| hit.first.max(range.first))
    }

    pub fn blocked_ranges(&self) -> &[DayRange] {
        &self.blocked
    }

    pub fn blocked_days(&self) -> impl Iterator<Item = Day> + '_ {
        self.blocked.iter().flat_map(|r| r.days())
    }

    /// Total number of blocked days.
    pub fn blocked_day_count(&self) -> i64 {
        self.blocked.iter().map(DayRange::len_days).sum()
    }

    /// Free stretches of `window`: the window minus every blocked range.
    pub fn free_ranges(&self, window: &DayRange) -> Vec<DayRange> {
        subtract_ranges(&[*window], &self.blocked)
    }

    /// One entry per day of `window`. Days before `today` are `Past`
    /// regardless of bookings.
    pub fn calendar(&self, window: &DayRange, today: Day) -> Vec<CalendarDay> {
        window
            .days()
            .map(|date| {
                let status = if date < today {
                    DayStatus::Past
                } else if self.is_blocked(date) {
                    DayStatus::Booked
                } else {
                    DayStatus::Open
                };
                CalendarDay { date, status }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DayStatus {
    Past,
    Booked,
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CalendarDay {
    pub date: Day,
    pub status: DayStatus,
}

/// Merge sorted overlapping/adjacent ranges into disjoint ranges.
pub fn merge_touching(sorted: &[DayRange]) -> Vec<DayRange> {
    let mut merged: Vec<DayRange> = Vec::new();
    for &range in sorted {
        if let Some(last) = merged.last_mut()
            && last.touches(&range) {
                last.last = last.last.max(range.last);
                continue;
            }
        merged.push(range);
    }
    merged
}

/// Remove `to_remove` (sorted, disjoint) from `base` (sorted, disjoint).
pub fn subtract_ranges(base: &[DayRange], to_remove: &[DayRange]) -> Vec<DayRange> {
    let mut result = Vec::new();
    let mut ri = 0;

    for &b in base {
        let mut current_first = Some(b.first);

        while ri < to_remove.len() && to_remove[ri].last < b.first {
            ri += 1;
        }

        let mut j = ri;
        while let Some(first) = current_first {
            let Some(r) = to_remove.get(j) else { break };
            if r.first > b.last {
                break;
            }
            if r.first > first
                && let Some(end) = r.first.pred_opt() {
                    result.push(DayRange::new(first, end));
                }
            current_first = if r.last >= first { r.last.succ_opt() } else { Some(first) };
            j += 1;
        }

        if let Some(first) = current_first
            && first <= b.last {
                result.push(DayRange::new(first, b.last));
            }
    }

    result
}
