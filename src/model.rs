use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// A calendar day. Availability is tracked at no finer granularity.
pub type Day = NaiveDate;

/// Inclusive range of calendar days `[first, last]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DayRange {
    pub first: Day,
    pub last: Day,
}

impl DayRange {
    pub fn new(first: Day, last: Day) -> Self {
        debug_assert!(first <= last, "DayRange first must not be after last");
        Self { first, last }
    }

    /// Like `new`, but returns `None` for an inverted range.
    pub fn try_new(first: Day, last: Day) -> Option<Self> {
        (first <= last).then_some(Self { first, last })
    }

    /// Number of calendar days covered, counting both ends.
    pub fn len_days(&self) -> i64 {
        (self.last - self.first).num_days() + 1
    }

    pub fn contains(&self, day: Day) -> bool {
        self.first <= day && day <= self.last
    }

    pub fn overlaps(&self, other: &DayRange) -> bool {
        self.first <= other.last && other.first <= self.last
    }

    /// Overlapping or directly adjacent (no free day in between).
    pub fn touches(&self, other: &DayRange) -> bool {
        if self.overlaps(other) {
            return true;
        }
        self.last.succ_opt() == Some(other.first) || other.last.succ_opt() == Some(self.first)
    }

    pub fn days(&self) -> impl Iterator<Item = Day> + use<> {
        let last = self.last;
        self.first.iter_days().take_while(move |d| *d <= last)
    }
}

/// Whether the check-out day of a stay counts as occupied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutPolicy {
    /// Check-out day is occupied: `[check_in, check_out]`.
    #[default]
    Blocking,
    /// Check-out day is free for the next guest: `[check_in, check_out)`.
    Free,
}

impl FromStr for CheckoutPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "blocking" | "inclusive" => Ok(CheckoutPolicy::Blocking),
            "free" | "exclusive" => Ok(CheckoutPolicy::Free),
            other => Err(format!("unknown checkout policy: {other}")),
        }
    }
}

// ── Wire types ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Media {
    pub url: String,
    #[serde(default)]
    pub alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub continent: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
}

/// Amenity flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VenueMeta {
    #[serde(default)]
    pub wifi: bool,
    #[serde(default)]
    pub parking: bool,
    #[serde(default)]
    pub breakfast: bool,
    #[serde(default)]
    pub pets: bool,
}

/// Profile as embedded in venues (owner) and bookings (customer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<Media>,
    #[serde(default)]
    pub banner: Option<Media>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub media: Vec<Media>,
    pub price: f64,
    pub max_guests: u32,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meta: VenueMeta,
    #[serde(default)]
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ProfileSummary>,
    /// Present only when requested with `_bookings=true`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookings: Option<Vec<Booking>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub guests: u32,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue: Option<Box<Venue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<ProfileSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ProfileCount {
    #[serde(default)]
    pub venues: u32,
    #[serde(default)]
    pub bookings: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar: Option<Media>,
    #[serde(default)]
    pub banner: Option<Media>,
    #[serde(default)]
    pub venue_manager: bool,
    #[serde(default, rename = "_count", skip_serializing_if = "Option::is_none")]
    pub count: Option<ProfileCount>,
}

/// Login response data: the profile plus its access token.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticatedProfile {
    pub access_token: String,
    #[serde(flatten)]
    pub profile: Profile,
}

/// Every API response wraps its payload as `{ data, meta }`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default)]
    pub meta: PageMeta,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    #[serde(default)]
    pub is_first_page: Option<bool>,
    #[serde(default)]
    pub is_last_page: Option<bool>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub total_count: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<ErrorDetail>,
    #[serde(default)]
    pub status_code: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub message: String,
}

// ── Request payloads ─────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Media>,
    pub venue_manager: bool,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<Media>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub banner: Option<Media>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub venue_manager: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
    pub guests: u32,
    pub venue_id: String,
}
