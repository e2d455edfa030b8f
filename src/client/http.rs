//! HTTP client for the Holidaze REST API

use std::time::Instant;

use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::draft::VenueDraft;
use crate::limits::MAX_BOOKING_PAGES;
use crate::model::*;
use crate::observability::{API_REQUESTS_TOTAL, API_REQUEST_DURATION_SECONDS};
use crate::session::Session;

use super::{ClientError, ClientResult};

const API_KEY_HEADER: &str = "X-Noroff-API-Key";

#[derive(Debug, Clone)]
pub struct HolidazeClient {
    http: Client,
    base: Url,
    api_key: Option<String>,
    per_page: u32,
}

impl HolidazeClient {
    pub fn new(config: &Config) -> ClientResult<Self> {
        let base = Url::parse(&config.api_base)
            .map_err(|e| ClientError::Config(format!("api base {}: {e}", config.api_base)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Config(format!("api base {} cannot hold paths", config.api_base)));
        }
        let http = Client::builder().timeout(config.http_timeout).build()?;
        Ok(Self {
            http,
            base,
            api_key: config.api_key.clone(),
            per_page: config.bookings_per_page,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> RequestBuilder {
        let mut request = self.http.request(method, self.endpoint(segments));
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        request
    }

    fn authed(&self, method: Method, segments: &[&str], session: &Session) -> ClientResult<RequestBuilder> {
        let token = session.bearer()?;
        Ok(self.request(method, segments).bearer_auth(token))
    }

    fn manager(&self, method: Method, segments: &[&str], session: &Session) -> ClientResult<RequestBuilder> {
        let request = self.authed(method, segments, session)?;
        if !session.is_venue_manager() {
            return Err(ClientError::NotVenueManager);
        }
        Ok(request)
    }

    /// Send and map the status. `None` for 204 No Content.
    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> ClientResult<Option<T>> {
        let started = Instant::now();
        let response = request.send().await?;
        let status = response.status();
        metrics::counter!(API_REQUESTS_TOTAL, "operation" => operation, "status" => status.as_u16().to_string())
            .increment(1);
        metrics::histogram!(API_REQUEST_DURATION_SECONDS, "operation" => operation)
            .record(started.elapsed().as_secs_f64());
        debug!("{operation}: {status} in {:?}", started.elapsed());

        if !status.is_success() {
            let text = response.text().await?;
            return Err(error_for_status(status, &text));
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(None);
        }
        let bytes = response.bytes().await?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    async fn send_data<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> ClientResult<Envelope<T>> {
        self.send(operation, request)
            .await?
            .ok_or_else(|| ClientError::InvalidResponse(format!("{operation}: empty body")))
    }

    // ========== Auth ==========

    pub async fn register(&self, registration: &RegisterRequest) -> ClientResult<Profile> {
        let request = self.request(Method::POST, &["auth", "register"]).json(registration);
        let profile = self.send_data::<Profile>("register", request).await?.data;
        info!("registered profile {}", profile.name);
        Ok(profile)
    }

    /// Log in and return the resulting session; the caller persists it.
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<Session> {
        let body = serde_json::json!({ "email": email, "password": password });
        let request = self
            .request(Method::POST, &["auth", "login"])
            .query(&[("_holidaze", "true")])
            .json(&body);
        let auth = self.send_data::<AuthenticatedProfile>("login", request).await?.data;
        info!("logged in as {}", auth.profile.name);
        Ok(Session::from_login(auth))
    }

    // ========== Profiles ==========

    pub async fn fetch_profile(&self, session: &Session, name: &str) -> ClientResult<Profile> {
        let request = self.authed(Method::GET, &["holidaze", "profiles", name], session)?;
        Ok(self.send_data("fetch_profile", request).await?.data)
    }

    /// Returns the updated profile. Callers holding `session` for `name`
    /// should store it with `Session::set_profile` and save.
    pub async fn update_profile(
        &self,
        session: &Session,
        name: &str,
        update: &ProfileUpdate,
    ) -> ClientResult<Profile> {
        let request = self
            .authed(Method::PUT, &["holidaze", "profiles", name], session)?
            .json(update);
        Ok(self.send_data("update_profile", request).await?.data)
    }

    // ========== Venues ==========

    pub async fn fetch_venues(&self) -> ClientResult<Vec<Venue>> {
        let request = self.request(Method::GET, &["holidaze", "venues"]);
        Ok(self.send_data("fetch_venues", request).await?.data)
    }

    pub async fn fetch_venue(&self, venue_id: &str) -> ClientResult<Venue> {
        let request = self
            .request(Method::GET, &["holidaze", "venues", venue_id])
            .query(&[("_owner", "true")]);
        Ok(self.send_data("fetch_venue", request).await?.data)
    }

    pub async fn fetch_venue_with_bookings(&self, venue_id: &str) -> ClientResult<Venue> {
        let request = self
            .request(Method::GET, &["holidaze", "venues", venue_id])
            .query(&[("_owner", "true"), ("_bookings", "true")]);
        Ok(self.send_data("fetch_venue_with_bookings", request).await?.data)
    }

    pub async fn search_venues(&self, query: &str) -> ClientResult<Vec<Venue>> {
        let request = self
            .request(Method::GET, &["holidaze", "venues", "search"])
            .query(&[("q", query)]);
        Ok(self.send_data("search_venues", request).await?.data)
    }

    pub async fn create_venue(&self, session: &Session, draft: &VenueDraft) -> ClientResult<Venue> {
        let request = self.manager(Method::POST, &["holidaze", "venues"], session)?;
        draft.validate().map_err(ClientError::InvalidDraft)?;
        let request = request.json(&draft.to_payload());
        let venue: Venue = self.send_data("create_venue", request).await?.data;
        info!("created venue {} ({})", venue.id, venue.name);
        Ok(venue)
    }

    pub async fn update_venue(
        &self,
        session: &Session,
        venue_id: &str,
        draft: &VenueDraft,
    ) -> ClientResult<Venue> {
        let request = self.manager(Method::PUT, &["holidaze", "venues", venue_id], session)?;
        draft.validate().map_err(ClientError::InvalidDraft)?;
        let request = request.json(&draft.to_payload());
        let venue: Venue = self.send_data("update_venue", request).await?.data;
        info!("updated venue {}", venue.id);
        Ok(venue)
    }

    pub async fn delete_venue(&self, session: &Session, venue_id: &str) -> ClientResult<()> {
        let request = self.manager(Method::DELETE, &["holidaze", "venues", venue_id], session)?;
        self.send::<serde_json::Value>("delete_venue", request).await?;
        info!("deleted venue {venue_id}");
        Ok(())
    }

    // ========== Bookings ==========

    pub async fn create_booking(&self, session: &Session, booking: &NewBooking) -> ClientResult<Booking> {
        let request = self
            .authed(Method::POST, &["holidaze", "bookings"], session)?
            .json(booking);
        let created: Booking = self.send_data("create_booking", request).await?.data;
        info!(
            "booked venue {} for {} guests ({} → {})",
            booking.venue_id, booking.guests, booking.date_from, booking.date_to
        );
        Ok(created)
    }

    /// Walk the paginated bookings listing, newest first, keeping the
    /// bookings `keep` accepts. Stops at the first short page.
    pub async fn fetch_bookings_where(
        &self,
        session: &Session,
        mut keep: impl FnMut(&Booking) -> bool,
    ) -> ClientResult<Vec<Booking>> {
        let per_page = self.per_page;
        let mut kept = Vec::new();
        for page in 1..=MAX_BOOKING_PAGES {
            let request = self
                .authed(Method::GET, &["holidaze", "bookings"], session)?
                .query(&[
                    ("_venue", "true"),
                    ("_customer", "true"),
                    ("sort", "created"),
                    ("sortOrder", "desc"),
                ])
                .query(&[("page", page), ("per_page", per_page)]);
            let envelope: Envelope<Vec<Booking>> = self.send_data("fetch_bookings", request).await?;
            let fetched = envelope.data.len();
            kept.extend(envelope.data.into_iter().filter(|b| keep(b)));
            if fetched < per_page as usize || envelope.meta.is_last_page == Some(true) {
                return Ok(kept);
            }
        }
        warn!("stopped after {MAX_BOOKING_PAGES} pages of bookings");
        Ok(kept)
    }

    pub async fn fetch_all_bookings(&self, session: &Session) -> ClientResult<Vec<Booking>> {
        self.fetch_bookings_where(session, |_| true).await
    }

    /// Bookings made by the logged-in profile, matched exactly on customer email.
    pub async fn fetch_customer_bookings(&self, session: &Session) -> ClientResult<Vec<Booking>> {
        let email = session
            .profile()
            .map(|p| p.email.clone())
            .ok_or(ClientError::MissingToken)?;
        self.fetch_bookings_where(session, |b| b.customer.as_ref().is_some_and(|c| c.email == email))
            .await
    }
}

fn error_for_status(status: StatusCode, body: &str) -> ClientError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|e| e.errors.into_iter().next())
        .map(|e| e.message)
        .unwrap_or_else(|| {
            if body.trim().is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body.trim().to_string()
            }
        });
    match status {
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::FORBIDDEN => ClientError::Forbidden(message),
        StatusCode::NOT_FOUND => ClientError::NotFound(message),
        StatusCode::BAD_REQUEST => ClientError::Validation(message),
        _ => ClientError::Api {
            status: status.as_u16(),
            message,
        },
    }
}
