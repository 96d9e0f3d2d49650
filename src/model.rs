use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use ulid::Ulid;

use crate::dates::{format_ms, serialize_ms};

/// Unix milliseconds. Every timestamp in the model uses it.
pub type Ms = i64;

/// Half-open interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: Ms,
    pub end: Ms,
}

impl Span {
    pub fn new(start: Ms, end: Ms) -> Self {
        debug_assert!(start < end, "Span start must be before end");
        Self { start, end }
    }

    pub fn duration_ms(&self) -> Ms {
        self.end - self.start
    }

    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn contains_instant(&self, t: Ms) -> bool {
        self.start <= t && t < self.end
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_span(&self, other: &Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A requested stay that has not been validated yet. Unlike [`Span`] the
/// bounds may be in any order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CandidateRange {
    pub start: Ms,
    pub end: Ms,
}

impl CandidateRange {
    pub fn new(start: Ms, end: Ms) -> Self {
        Self { start, end }
    }

    /// The range as a span, if it is non-empty.
    pub fn as_span(&self) -> Option<Span> {
        (self.start < self.end).then(|| Span::new(self.start, self.end))
    }
}

// ── Stored entities ──────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Ulid,
    pub first_name: String,
    pub last_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Spot {
    pub id: Ulid,
    pub owner_id: Ulid,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub description: String,
    pub price: f64,
    #[serde(serialize_with = "serialize_ms")]
    pub created_at: Ms,
    #[serde(serialize_with = "serialize_ms")]
    pub updated_at: Ms,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotImage {
    pub id: Ulid,
    pub spot_id: Ulid,
    pub url: String,
    pub preview: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: Ulid,
    pub spot_id: Ulid,
    pub user_id: Ulid,
    pub review: String,
    pub stars: u8,
    #[serde(serialize_with = "serialize_ms")]
    pub created_at: Ms,
}

/// A confirmed stay. Bookings are never edited after creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Booking {
    pub id: Ulid,
    pub spot_id: Ulid,
    pub user_id: Ulid,
    pub span: Span,
    pub created_at: Ms,
}

impl Serialize for Booking {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Booking", 6)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("spotId", &self.spot_id)?;
        s.serialize_field("userId", &self.user_id)?;
        s.serialize_field("startDate", &format_ms(self.span.start))?;
        s.serialize_field("endDate", &format_ms(self.span.end))?;
        s.serialize_field("createdAt", &format_ms(self.created_at))?;
        s.end()
    }
}

/// Everything the engine keeps for one spot. Guarded by a single lock so a
/// booking check and its insert see the same booking set.
#[derive(Debug, Clone)]
pub struct SpotState {
    pub spot: Spot,
    pub images: Vec<SpotImage>,
    pub reviews: Vec<Review>,
    /// Sorted by `span.start`.
    pub bookings: Vec<Booking>,
    /// Set when the spot is removed while other tasks still hold its Arc.
    pub deleted: bool,
}

impl SpotState {
    pub fn new(spot: Spot) -> Self {
        Self {
            spot,
            images: Vec::new(),
            reviews: Vec::new(),
            bookings: Vec::new(),
            deleted: false,
        }
    }

    /// Insert booking maintaining sort order by span.start.
    pub fn insert_booking(&mut self, booking: Booking) {
        let pos = self
            .bookings
            .binary_search_by_key(&booking.span.start, |b| b.span.start)
            .unwrap_or_else(|e| e);
        self.bookings.insert(pos, booking);
    }

    /// Return only bookings whose span overlaps the query window.
    /// Uses binary search to skip bookings starting at or after `query.end`.
    pub fn overlapping(&self, query: &Span) -> impl Iterator<Item = &Booking> {
        let right_bound = self
            .bookings
            .partition_point(|b| b.span.start < query.end);
        self.bookings[..right_bound]
            .iter()
            .filter(move |b| b.span.end > query.start)
    }

    pub fn remove_review(&mut self, id: Ulid) -> Option<Review> {
        let pos = self.reviews.iter().position(|r| r.id == id)?;
        Some(self.reviews.remove(pos))
    }

    pub fn has_review_by(&self, user_id: Ulid) -> bool {
        self.reviews.iter().any(|r| r.user_id == user_id)
    }
}

// ── Inputs ───────────────────────────────────────────────────────

/// Spot fields as submitted. Every field is optional so that missing input is
/// reported per field instead of failing decode.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpotInput {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub country: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
}

/// Inclusive bounds applied by spot listing. Unset bounds match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpotFilter {
    pub min_lat: Option<f64>,
    pub max_lat: Option<f64>,
    pub min_lng: Option<f64>,
    pub max_lng: Option<f64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
}

impl SpotFilter {
    pub fn matches(&self, spot: &Spot) -> bool {
        fn within(v: f64, min: Option<f64>, max: Option<f64>) -> bool {
            min.is_none_or(|m| v >= m) && max.is_none_or(|m| v <= m)
        }
        within(spot.lat, self.min_lat, self.max_lat)
            && within(spot.lng, self.min_lng, self.max_lng)
            && within(spot.price, self.min_price, self.max_price)
    }
}

// ── Query result types ───────────────────────────────────────────

pub const NO_REVIEWS: &str = "No Reviews exist for this spot";
pub const NO_PREVIEW_IMAGE: &str = "No Preview Image Available";

/// Average star rating, or the placeholder shown when a spot has no reviews.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AvgRating {
    /// Already rounded to one decimal place.
    Stars(f64),
    NoReviews,
}

impl Serialize for AvgRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AvgRating::Stars(avg) => serializer.serialize_f64(*avg),
            AvgRating::NoReviews => serializer.serialize_str(NO_REVIEWS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoratedSpot {
    #[serde(flatten)]
    pub spot: Spot,
    pub avg_rating: AvgRating,
    /// Preview url or [`NO_PREVIEW_IMAGE`].
    pub preview_image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpotDetails {
    #[serde(flatten)]
    pub spot: Spot,
    pub num_reviews: usize,
    pub avg_star_rating: AvgRating,
    #[serde(rename = "SpotImages")]
    pub spot_images: Vec<SpotImage>,
    #[serde(rename = "Owner")]
    pub owner: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewView {
    #[serde(flatten)]
    pub review: Review,
    #[serde(rename = "User")]
    pub user: Option<User>,
}

/// What a spot's booking list shows. Owners see who booked; everyone else
/// only sees which dates are taken.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BookingView {
    Full(GuestBooking),
    Public(TakenDates),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GuestBooking {
    #[serde(flatten)]
    pub booking: Booking,
    #[serde(rename = "User")]
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TakenDates {
    pub spot_id: Ulid,
    #[serde(serialize_with = "serialize_ms")]
    pub start_date: Ms,
    #[serde(serialize_with = "serialize_ms")]
    pub end_date: Ms,
}

impl From<&Booking> for TakenDates {
    fn from(b: &Booking) -> Self {
        Self {
            spot_id: b.spot_id,
            start_date: b.span.start,
            end_date: b.span.end,
        }
    }
}
