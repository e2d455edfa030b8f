use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{NaiveDate, TimeZone, Utc};

use super::*;
use crate::client::{ClientError, ClientResult, HolidazeApi};
use crate::limits::MAX_SNAPSHOTS;
use crate::model::*;
use crate::session::Session;

fn day(y: i32, m: u32, d: u32) -> Day {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn june(d: u32) -> Day {
    day(2024, 6, d)
}

fn booking(id: &str, from: Day, to: Day, guests: u32) -> Booking {
    Booking {
        id: id.to_string(),
        date_from: Utc.from_utc_datetime(&from.and_hms_opt(0, 0, 0).unwrap()),
        date_to: Utc.from_utc_datetime(&to.and_hms_opt(0, 0, 0).unwrap()),
        guests,
        created: None,
        updated: None,
        venue: None,
        customer: None,
    }
}

fn venue(id: &str, max_guests: u32, bookings: Vec<Booking>) -> Venue {
    Venue {
        id: id.to_string(),
        name: format!("Venue {id}"),
        description: None,
        media: vec![],
        price: 1000.0,
        max_guests,
        rating: None,
        created: None,
        updated: None,
        meta: VenueMeta::default(),
        location: Location::default(),
        owner: None,
        bookings: Some(bookings),
    }
}

fn guest_session() -> Session {
    Session::new(
        "tok",
        Profile {
            name: "guest".into(),
            email: "guest@stud.noroff.no".into(),
            bio: None,
            avatar: None,
            banner: None,
            venue_manager: false,
            count: None,
        },
    )
}

/// In-memory stand-in for the remote API.
#[derive(Default)]
struct FakeApi {
    venues: Mutex<HashMap<String, Venue>>,
    fetches: AtomicUsize,
    created: Mutex<Vec<NewBooking>>,
}

impl FakeApi {
    fn with_venue(venue: Venue) -> Arc<Self> {
        let api = FakeApi::default();
        api.venues.lock().unwrap().insert(venue.id.clone(), venue);
        Arc::new(api)
    }

    fn add_booking(&self, venue_id: &str, b: Booking) {
        let mut venues = self.venues.lock().unwrap();
        let v = venues.get_mut(venue_id).unwrap();
        v.bookings.get_or_insert_with(Vec::new).push(b);
    }

    fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HolidazeApi for FakeApi {
    async fn fetch_venue_with_bookings(&self, venue_id: &str) -> ClientResult<Venue> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.venues
            .lock()
            .unwrap()
            .get(venue_id)
            .cloned()
            .ok_or_else(|| ClientError::NotFound(format!("No venue with id {venue_id}")))
    }

    async fn create_booking(&self, session: &Session, new: &NewBooking) -> ClientResult<Booking> {
        session.token().ok_or(ClientError::MissingToken)?;
        let id = format!("b{}", self.created.lock().unwrap().len() + 1);
        let b = Booking {
            id,
            date_from: new.date_from,
            date_to: new.date_to,
            guests: new.guests,
            created: None,
            updated: None,
            venue: None,
            customer: None,
        };
        self.created.lock().unwrap().push(new.clone());
        self.add_booking(&new.venue_id, b.clone());
        Ok(b)
    }
}

fn service(api: &Arc<FakeApi>, policy: CheckoutPolicy) -> AvailabilityService<FakeApi> {
    AvailabilityService::new(api.clone(), policy)
}

// ── check ────────────────────────────────────────────────

#[tokio::test]
async fn check_follows_worked_example() {
    let api = FakeApi::with_venue(venue("v1", 4, vec![booking("b0", june(10), june(12), 2)]));
    let svc = service(&api, CheckoutPolicy::Blocking);

    let boundary = svc.check("v1", &StayRequest::new(june(12), june(14), 2)).await.unwrap();
    assert_eq!(boundary, Verdict::rejected(Rejection::Conflict));

    let after = svc.check("v1", &StayRequest::new(june(13), june(15), 2)).await.unwrap();
    assert_eq!(after, Verdict::ACCEPTED);

    let crowd = svc.check("v1", &StayRequest::new(june(13), june(15), 5)).await.unwrap();
    assert_eq!(crowd, Verdict::rejected(Rejection::CapacityExceeded));
}

#[tokio::test]
async fn check_reuses_snapshot() {
    let api = FakeApi::with_venue(venue("v1", 4, vec![]));
    let svc = service(&api, CheckoutPolicy::Blocking);

    svc.check("v1", &StayRequest::new(june(1), june(2), 1)).await.unwrap();
    svc.check("v1", &StayRequest::new(june(3), june(4), 1)).await.unwrap();
    assert_eq!(api.fetch_count(), 1);

    svc.invalidate("v1");
    svc.check("v1", &StayRequest::new(june(3), june(4), 1)).await.unwrap();
    assert_eq!(api.fetch_count(), 2);
}

#[tokio::test]
async fn unknown_venue() {
    let api = Arc::new(FakeApi::default());
    let svc = service(&api, CheckoutPolicy::Blocking);
    let err = svc.check("nope", &StayRequest::new(june(1), june(2), 1)).await.unwrap_err();
    assert!(matches!(err, EngineError::VenueNotFound(id) if id == "nope"));
    assert!(svc.snapshot("nope").is_none());
}

#[tokio::test]
async fn refresh_picks_up_new_bookings() {
    let api = FakeApi::with_venue(venue("v1", 4, vec![]));
    let svc = service(&api, CheckoutPolicy::Blocking);

    let before = svc.refresh("v1").await.unwrap();
    assert!(before.index.is_empty());

    api.add_booking("v1", booking("b9", june(20), june(21), 1));
    // Cached snapshot is untouched until the next refresh
    assert!(svc.snapshot("v1").unwrap().index.is_empty());

    let after = svc.refresh("v1").await.unwrap();
    assert!(after.index.is_blocked(june(20)));
    assert!(after.index.is_blocked(june(21)));
    assert!(before.index.is_empty());
}

#[tokio::test]
async fn refresh_twice_same_membership() {
    let api = FakeApi::with_venue(venue(
        "v1",
        4,
        vec![booking("a", june(1), june(3), 1), booking("b", june(10), june(12), 1)],
    ));
    let svc = service(&api, CheckoutPolicy::Blocking);
    let first = svc.refresh("v1").await.unwrap();
    let second = svc.refresh("v1").await.unwrap();
    assert_eq!(first.index, second.index);
}

#[tokio::test]
async fn cache_evicts_earliest_loaded_venue() {
    let api = FakeApi::default();
    {
        let mut venues = api.venues.lock().unwrap();
        for i in 0..=MAX_SNAPSHOTS {
            let v = venue(&format!("v{i}"), 2, vec![]);
            venues.insert(v.id.clone(), v);
        }
    }
    let api = Arc::new(api);
    let svc = service(&api, CheckoutPolicy::Blocking);

    for i in 0..MAX_SNAPSHOTS {
        svc.refresh(&format!("v{i}")).await.unwrap();
    }
    assert_eq!(svc.cached(), MAX_SNAPSHOTS);
    // Refreshing a cached venue replaces it without evicting anyone
    svc.refresh("v0").await.unwrap();
    assert_eq!(svc.cached(), MAX_SNAPSHOTS);
    assert!(svc.snapshot("v1").is_some());

    let newest = format!("v{MAX_SNAPSHOTS}");
    svc.refresh(&newest).await.unwrap();
    assert_eq!(svc.cached(), MAX_SNAPSHOTS);
    assert!(svc.snapshot("v1").is_none());
    assert!(svc.snapshot("v0").is_some());
    assert!(svc.snapshot(&newest).is_some());
}

// ── calendar ─────────────────────────────────────────────

#[tokio::test]
async fn calendar_from_snapshot() {
    let api = FakeApi::with_venue(venue("v1", 2, vec![booking("b0", june(10), june(11), 1)]));
    let svc = service(&api, CheckoutPolicy::Blocking);
    let cal = svc
        .calendar("v1", &DayRange::new(june(9), june(12)), june(1))
        .await
        .unwrap();
    let statuses: Vec<_> = cal.iter().map(|c| c.status).collect();
    assert_eq!(
        statuses,
        vec![DayStatus::Open, DayStatus::Booked, DayStatus::Booked, DayStatus::Open]
    );
}

#[tokio::test]
async fn calendar_window_limited() {
    let api = FakeApi::with_venue(venue("v1", 2, vec![]));
    let svc = service(&api, CheckoutPolicy::Blocking);
    let window = DayRange::new(day(2024, 1, 1), day(2027, 1, 1));
    let err = svc.calendar("v1", &window, day(2024, 1, 1)).await.unwrap_err();
    assert!(matches!(err, EngineError::LimitExceeded(_)));
    assert_eq!(api.fetch_count(), 0);
}

// ── book ─────────────────────────────────────────────────

#[tokio::test]
async fn book_submits_and_invalidates() {
    let api = FakeApi::with_venue(venue("v1", 4, vec![booking("b0", june(10), june(12), 2)]));
    let svc = service(&api, CheckoutPolicy::Blocking);

    let created = svc
        .book(&guest_session(), "v1", &StayRequest::new(june(13), june(15), 3))
        .await
        .unwrap();
    assert_eq!(created.guests, 3);
    assert!(svc.snapshot("v1").is_none());

    let sent = api.created.lock().unwrap().clone();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].venue_id, "v1");
    assert_eq!(sent[0].date_from.date_naive(), june(13));
    assert_eq!(sent[0].date_to.date_naive(), june(15));

    // The new booking now blocks its days
    let again = svc.check("v1", &StayRequest::new(june(14), june(16), 1)).await.unwrap();
    assert_eq!(again, Verdict::rejected(Rejection::Conflict));
}

#[tokio::test]
async fn book_rejected_sends_nothing() {
    let api = FakeApi::with_venue(venue("v1", 4, vec![booking("b0", june(10), june(12), 2)]));
    let svc = service(&api, CheckoutPolicy::Blocking);

    let err = svc
        .book(&guest_session(), "v1", &StayRequest::new(june(11), june(13), 2))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Rejected(Rejection::Conflict)));
    assert!(api.created.lock().unwrap().is_empty());
}

#[tokio::test]
async fn book_uses_fresh_bookings() {
    let api = FakeApi::with_venue(venue("v1", 4, vec![]));
    let svc = service(&api, CheckoutPolicy::Blocking);
    // Snapshot taken before someone else books
    svc.refresh("v1").await.unwrap();
    api.add_booking("v1", booking("other", june(13), june(14), 1));

    let err = svc
        .book(&guest_session(), "v1", &StayRequest::new(june(13), june(15), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Rejected(Rejection::Conflict)));
}

#[tokio::test]
async fn book_requires_login() {
    let api = FakeApi::with_venue(venue("v1", 4, vec![]));
    let svc = service(&api, CheckoutPolicy::Blocking);
    let err = svc
        .book(&Session::anonymous(), "v1", &StayRequest::new(june(13), june(15), 1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotAuthenticated));
    assert_eq!(api.fetch_count(), 0);
}

#[tokio::test]
async fn book_turnover_day_with_free_policy() {
    let api = FakeApi::with_venue(venue("v1", 4, vec![booking("b0", june(10), june(12), 2)]));
    let svc = service(&api, CheckoutPolicy::Free);
    let created = svc
        .book(&guest_session(), "v1", &StayRequest::new(june(12), june(14), 2))
        .await;
    assert!(created.is_ok());
}

// ── snapshot ─────────────────────────────────────────────

#[test]
fn snapshot_quote() {
    let snap = VenueSnapshot::from_venue(&venue("v1", 2, vec![]), CheckoutPolicy::Blocking);
    assert_eq!(snap.quote(&StayRequest::new(june(1), june(4), 1)), Some(3000.0));
    assert_eq!(snap.quote(&StayRequest::new(june(4), june(1), 1)), None);
    assert_eq!(snap.quote(&StayRequest::parse("", "2024-06-04", 1)), None);
}

#[tokio::test]
async fn assess_quotes_only_accepted_stays() {
    let api = FakeApi::with_venue(venue("v1", 4, vec![booking("b0", june(10), june(12), 2)]));
    let svc = service(&api, CheckoutPolicy::Blocking);

    let accepted = svc.assess("v1", &StayRequest::new(june(13), june(15), 2)).await.unwrap();
    assert_eq!(accepted.verdict, Verdict::ACCEPTED);
    assert_eq!(accepted.quote, Some(2000.0));

    let conflict = svc.assess("v1", &StayRequest::new(june(12), june(14), 2)).await.unwrap();
    assert_eq!(conflict.verdict, Verdict::rejected(Rejection::Conflict));
    assert_eq!(conflict.quote, None);
    let json = serde_json::to_value(&conflict).unwrap();
    assert_eq!(json, serde_json::json!({ "verdict": { "accepted": false, "reason": "conflict" } }));
}

#[test]
fn snapshot_without_bookings_field() {
    let mut v = venue("v1", 2, vec![]);
    v.bookings = None;
    let snap = VenueSnapshot::from_venue(&v, CheckoutPolicy::Blocking);
    assert!(snap.index.is_empty());
    assert_eq!(snap.max_guests, 2);
}

#[test]
fn engine_error_display() {
    assert_eq!(EngineError::VenueNotFound("v1".into()).to_string(), "venue not found: v1");
    assert_eq!(
        EngineError::Rejected(Rejection::CapacityExceeded).to_string(),
        "booking rejected: capacity-exceeded"
    );
    assert!(matches!(EngineError::from(ClientError::MissingToken), EngineError::NotAuthenticated));
}
