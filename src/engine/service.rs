use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, NaiveTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use tracing::{debug, info};

use crate::client::{ClientError, HolidazeApi};
use crate::limits::{MAX_CALENDAR_DAYS, MAX_SNAPSHOTS};
use crate::model::*;
use crate::observability::{BOOKING_VALIDATIONS_TOTAL, INDEX_REBUILDS_TOTAL, SNAPSHOTS_CACHED, outcome_label};
use crate::session::Session;

use super::EngineError;
use super::availability::{AvailabilityIndex, CalendarDay};
use super::validate::{Rejection, StayRequest, Verdict, validate_stay};

/// A verdict together with the price of the stay. The quote is only
/// present for accepted stays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assessment {
    pub verdict: Verdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote: Option<f64>,
}

/// Everything needed to judge a stay at one venue, built from a single
/// fetch of its bookings. Never mutated; a refresh replaces it.
#[derive(Debug, Clone)]
pub struct VenueSnapshot {
    pub venue_id: String,
    pub name: String,
    pub max_guests: u32,
    pub price: f64,
    pub index: AvailabilityIndex,
    pub loaded_at: DateTime<Utc>,
}

impl VenueSnapshot {
    pub fn from_venue(venue: &Venue, policy: CheckoutPolicy) -> Self {
        Self {
            venue_id: venue.id.clone(),
            name: venue.name.clone(),
            max_guests: venue.max_guests,
            price: venue.price,
            index: AvailabilityIndex::build(venue.bookings.iter().flatten(), policy),
            loaded_at: Utc::now(),
        }
    }

    pub fn validate(&self, request: &StayRequest) -> Result<DayRange, Rejection> {
        let result = validate_stay(request, self.max_guests, &self.index);
        let outcome = outcome_label(result.as_ref().err().copied());
        metrics::counter!(BOOKING_VALIDATIONS_TOTAL, "outcome" => outcome).increment(1);
        result
    }

    pub fn check(&self, request: &StayRequest) -> Verdict {
        self.validate(request).into()
    }

    pub fn assess(&self, request: &StayRequest) -> Assessment {
        let verdict = self.check(request);
        let quote = if verdict.accepted { self.quote(request) } else { None };
        Assessment { verdict, quote }
    }

    /// Nightly price times nights; `None` while the dates are incomplete.
    pub fn quote(&self, request: &StayRequest) -> Option<f64> {
        let nights = request.nights()?;
        (nights > 0).then(|| self.price * nights as f64)
    }
}

struct Cached {
    /// Load order; the smallest is evicted first.
    seq: u64,
    snapshot: Arc<VenueSnapshot>,
}

/// Per-venue availability snapshots over a remote booking source.
pub struct AvailabilityService<A> {
    api: Arc<A>,
    policy: CheckoutPolicy,
    snapshots: DashMap<String, Cached>,
    loads: AtomicU64,
}

impl<A: HolidazeApi> AvailabilityService<A> {
    pub fn new(api: Arc<A>, policy: CheckoutPolicy) -> Self {
        Self {
            api,
            policy,
            snapshots: DashMap::new(),
            loads: AtomicU64::new(0),
        }
    }

    pub fn policy(&self) -> CheckoutPolicy {
        self.policy
    }

    /// Fetch the venue's bookings and rebuild its index from scratch.
    pub async fn refresh(&self, venue_id: &str) -> Result<Arc<VenueSnapshot>, EngineError> {
        let venue = match self.api.fetch_venue_with_bookings(venue_id).await {
            Ok(venue) => venue,
            Err(ClientError::NotFound(_)) => return Err(EngineError::VenueNotFound(venue_id.to_string())),
            Err(e) => return Err(e.into()),
        };
        let snapshot = Arc::new(VenueSnapshot::from_venue(&venue, self.policy));
        metrics::counter!(INDEX_REBUILDS_TOTAL).increment(1);
        debug!(
            "rebuilt availability for venue {venue_id}: {} blocked days in {} ranges",
            snapshot.index.blocked_day_count(),
            snapshot.index.blocked_ranges().len()
        );
        self.insert(venue_id, snapshot.clone());
        Ok(snapshot)
    }

    /// Store a snapshot, evicting the earliest loaded one when the cache is
    /// full. The check and the eviction are separate map operations, so
    /// concurrent refreshes of new venues can overshoot `MAX_SNAPSHOTS` by
    /// the number of refreshes in flight until the next insert.
    fn insert(&self, venue_id: &str, snapshot: Arc<VenueSnapshot>) {
        if !self.snapshots.contains_key(venue_id) && self.snapshots.len() >= MAX_SNAPSHOTS {
            let oldest = self
                .snapshots
                .iter()
                .min_by_key(|entry| entry.value().seq)
                .map(|entry| entry.key().clone());
            if let Some(oldest) = oldest {
                self.snapshots.remove(&oldest);
                debug!("evicted availability snapshot of venue {oldest}");
            }
        }
        let seq = self.loads.fetch_add(1, Ordering::Relaxed);
        self.snapshots.insert(venue_id.to_string(), Cached { seq, snapshot });
        metrics::gauge!(SNAPSHOTS_CACHED).set(self.cached() as f64);
    }

    pub fn snapshot(&self, venue_id: &str) -> Option<Arc<VenueSnapshot>> {
        self.snapshots.get(venue_id).map(|entry| entry.value().snapshot.clone())
    }

    /// Number of venues with a cached snapshot.
    pub fn cached(&self) -> usize {
        self.snapshots.len()
    }

    pub fn invalidate(&self, venue_id: &str) {
        if self.snapshots.remove(venue_id).is_some() {
            metrics::gauge!(SNAPSHOTS_CACHED).set(self.cached() as f64);
        }
    }

    async fn current(&self, venue_id: &str) -> Result<Arc<VenueSnapshot>, EngineError> {
        match self.snapshot(venue_id) {
            Some(snapshot) => Ok(snapshot),
            None => self.refresh(venue_id).await,
        }
    }

    pub async fn check(&self, venue_id: &str, request: &StayRequest) -> Result<Verdict, EngineError> {
        Ok(self.current(venue_id).await?.check(request))
    }

    pub async fn assess(&self, venue_id: &str, request: &StayRequest) -> Result<Assessment, EngineError> {
        Ok(self.current(venue_id).await?.assess(request))
    }

    pub async fn calendar(
        &self,
        venue_id: &str,
        window: &DayRange,
        today: Day,
    ) -> Result<Vec<CalendarDay>, EngineError> {
        if window.len_days() > MAX_CALENDAR_DAYS {
            return Err(EngineError::LimitExceeded("calendar window too wide"));
        }
        Ok(self.current(venue_id).await?.index.calendar(window, today))
    }

    /// Validate against freshly fetched bookings, then submit. Nothing is
    /// sent when the stay is rejected.
    pub async fn book(
        &self,
        session: &Session,
        venue_id: &str,
        request: &StayRequest,
    ) -> Result<Booking, EngineError> {
        if !session.is_authenticated() {
            return Err(EngineError::NotAuthenticated);
        }
        let snapshot = self.refresh(venue_id).await?;
        snapshot.validate(request).map_err(EngineError::Rejected)?;

        let (Some(check_in), Some(check_out)) = (request.check_in, request.check_out) else {
            return Err(EngineError::Rejected(Rejection::InvalidRange));
        };
        let booking = NewBooking {
            date_from: check_in.and_time(NaiveTime::MIN).and_utc(),
            date_to: check_out.and_time(NaiveTime::MIN).and_utc(),
            guests: request.guests,
            venue_id: venue_id.to_string(),
        };
        let created = self.api.create_booking(session, &booking).await?;
        self.invalidate(venue_id);
        info!("booking {} confirmed at venue {venue_id}", created.id);
        Ok(created)
    }
}
