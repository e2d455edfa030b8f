use serde::{Deserialize, Serialize};

use crate::model::{Location, Media, Venue, VenueMeta};

const DEFAULT_MEDIA_ALT: &str = "Venue Image";

/// Venue create/edit form input.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueDraft {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub media_url: Option<String>,
    pub price: f64,
    pub max_guests: u32,
    #[serde(default)]
    pub wifi: bool,
    #[serde(default)]
    pub parking: bool,
    #[serde(default)]
    pub breakfast: bool,
    #[serde(default)]
    pub pets: bool,
    pub address: String,
    pub city: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftProblem {
    MissingName,
    MissingDescription,
    MissingAddress,
    MissingCity,
    InvalidPrice,
    InvalidMaxGuests,
    InvalidMediaUrl,
}

impl std::fmt::Display for DraftProblem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            DraftProblem::MissingName => "name is required",
            DraftProblem::MissingDescription => "description is required",
            DraftProblem::MissingAddress => "address is required",
            DraftProblem::MissingCity => "city is required",
            DraftProblem::InvalidPrice => "price must be a positive number",
            DraftProblem::InvalidMaxGuests => "max guests must be at least 1",
            DraftProblem::InvalidMediaUrl => "media URL must start with http:// or https://",
        };
        f.write_str(msg)
    }
}

/// Body of `POST/PUT holidaze/venues`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenuePayload {
    pub name: String,
    pub description: String,
    pub media: Vec<Media>,
    pub price: f64,
    pub max_guests: u32,
    pub location: PayloadLocation,
    pub meta: VenueMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PayloadLocation {
    pub address: String,
    pub city: String,
    pub zip: String,
    pub country: String,
    pub continent: String,
}

impl VenueDraft {
    /// Pre-fill an edit form from an existing venue.
    pub fn from_venue(venue: &Venue) -> Self {
        let Location { address, city, .. } = &venue.location;
        Self {
            name: venue.name.clone(),
            description: venue.description.clone().unwrap_or_default(),
            media_url: venue.media.first().map(|m| m.url.clone()),
            price: venue.price,
            max_guests: venue.max_guests,
            wifi: venue.meta.wifi,
            parking: venue.meta.parking,
            breakfast: venue.meta.breakfast,
            pets: venue.meta.pets,
            address: address.clone().unwrap_or_default(),
            city: city.clone().unwrap_or_default(),
        }
    }

    /// Every problem with the draft; empty when it can be submitted.
    pub fn problems(&self) -> Vec<DraftProblem> {
        let mut problems = Vec::new();
        if self.name.trim().is_empty() {
            problems.push(DraftProblem::MissingName);
        }
        if self.description.trim().is_empty() {
            problems.push(DraftProblem::MissingDescription);
        }
        if self.address.trim().is_empty() {
            problems.push(DraftProblem::MissingAddress);
        }
        if self.city.trim().is_empty() {
            problems.push(DraftProblem::MissingCity);
        }
        if !self.price.is_finite() || self.price <= 0.0 {
            problems.push(DraftProblem::InvalidPrice);
        }
        if self.max_guests == 0 {
            problems.push(DraftProblem::InvalidMaxGuests);
        }
        if let Some(url) = self.media_url.as_deref().map(str::trim)
            && !url.is_empty()
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            problems.push(DraftProblem::InvalidMediaUrl);
        }
        problems
    }

    pub fn validate(&self) -> Result<(), Vec<DraftProblem>> {
        let problems = self.problems();
        if problems.is_empty() { Ok(()) } else { Err(problems) }
    }

    pub fn to_payload(&self) -> VenuePayload {
        let media = self
            .media_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .map(|url| Media {
                url: url.to_string(),
                alt: Some(DEFAULT_MEDIA_ALT.to_string()),
            })
            .into_iter()
            .collect();
        VenuePayload {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            media,
            price: self.price,
            max_guests: self.max_guests,
            location: PayloadLocation {
                address: self.address.trim().to_string(),
                city: self.city.trim().to_string(),
                zip: String::new(),
                country: String::new(),
                continent: String::new(),
            },
            meta: VenueMeta {
                wifi: self.wifi,
                parking: self.parking,
                breakfast: self.breakfast,
                pets: self.pets,
            },
        }
    }
}
