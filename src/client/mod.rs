//! Remote Holidaze API access.

mod error;
mod http;

pub use error::{ClientError, ClientResult};
pub use http::HolidazeClient;

use async_trait::async_trait;

use crate::model::{Booking, NewBooking, Venue};
use crate::session::Session;

/// The slice of the remote API the availability engine depends on.
#[async_trait]
pub trait HolidazeApi: Send + Sync {
    /// A venue with its embedded booking list.
    async fn fetch_venue_with_bookings(&self, venue_id: &str) -> ClientResult<Venue>;

    async fn create_booking(&self, session: &Session, booking: &NewBooking) -> ClientResult<Booking>;
}

#[async_trait]
impl HolidazeApi for HolidazeClient {
    async fn fetch_venue_with_bookings(&self, venue_id: &str) -> ClientResult<Venue> {
        HolidazeClient::fetch_venue_with_bookings(self, venue_id).await
    }

    async fn create_booking(&self, session: &Session, booking: &NewBooking) -> ClientResult<Booking> {
        HolidazeClient::create_booking(self, session, booking).await
    }
}
