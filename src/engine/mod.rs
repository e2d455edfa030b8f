mod availability;
mod error;
mod expand;
mod service;
mod validate;
#[cfg(test)]
mod tests;

pub use availability::{AvailabilityIndex, CalendarDay, DayStatus, merge_touching, subtract_ranges};
pub use error::EngineError;
pub use expand::{booking_range, day_of, expand, occupied_range, parse_day};
pub use service::{Assessment, AvailabilityService, VenueSnapshot};
pub use validate::{Rejection, StayRequest, Verdict, validate_stay};
