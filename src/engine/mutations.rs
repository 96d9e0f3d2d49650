use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, info};
use ulid::Ulid;

use crate::dates::now_ms;
use crate::limits::*;
use crate::model::*;

use super::conflict::check_against_spot;
use super::error::FieldErrors;
use super::validation::{validate_image_url, validate_review, validate_spot, SpotFields};
use super::{Engine, EngineError, EntityKind};

fn apply_fields(spot: &mut Spot, fields: SpotFields) {
    spot.address = fields.address;
    spot.city = fields.city;
    spot.state = fields.state;
    spot.country = fields.country;
    spot.lat = fields.lat;
    spot.lng = fields.lng;
    spot.name = fields.name;
    spot.description = fields.description;
    spot.price = fields.price;
}

impl Engine {
    pub fn register_user(&self, first_name: &str, last_name: &str) -> Result<User, EngineError> {
        let mut errors = FieldErrors::new();
        let first_name = first_name.trim();
        let last_name = last_name.trim();
        if first_name.is_empty() || first_name.len() > MAX_FIELD_LEN {
            errors.set("firstName", "First Name is required");
        }
        if last_name.is_empty() || last_name.len() > MAX_FIELD_LEN {
            errors.set("lastName", "Last Name is required");
        }
        errors.into_result(EngineError::ValidationFailed)?;

        let user = User {
            id: self.next_id(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        };
        self.users.insert(user.id, user.clone());
        debug!("registered user {}", user.id);
        Ok(user)
    }

    pub fn create_spot(&self, owner_id: Ulid, input: &SpotInput) -> Result<Spot, EngineError> {
        self.require_user(owner_id)?;
        if self.spots.len() >= MAX_SPOTS {
            return Err(EngineError::LimitExceeded("too many spots"));
        }
        let fields = validate_spot(input)?;
        let now = now_ms();
        let mut spot = Spot {
            id: self.next_id(),
            owner_id,
            address: String::new(),
            city: String::new(),
            state: String::new(),
            country: String::new(),
            lat: 0.0,
            lng: 0.0,
            name: String::new(),
            description: String::new(),
            price: 0.0,
            created_at: now,
            updated_at: now,
        };
        apply_fields(&mut spot, fields);

        self.spots
            .insert(spot.id, Arc::new(RwLock::new(SpotState::new(spot.clone()))));
        info!("spot {} created by {owner_id}", spot.id);
        Ok(spot)
    }

    pub async fn update_spot(
        &self,
        user_id: Ulid,
        spot_id: Ulid,
        input: &SpotInput,
    ) -> Result<Spot, EngineError> {
        let mut guard = self.spot_write(spot_id).await?;
        if guard.spot.owner_id != user_id {
            return Err(EngineError::Forbidden);
        }
        let fields = validate_spot(input)?;
        apply_fields(&mut guard.spot, fields);
        guard.spot.updated_at = now_ms();
        Ok(guard.spot.clone())
    }

    pub async fn delete_spot(&self, user_id: Ulid, spot_id: Ulid) -> Result<(), EngineError> {
        let mut guard = self.spot_write(spot_id).await?;
        if guard.spot.owner_id != user_id {
            return Err(EngineError::Forbidden);
        }
        guard.deleted = true;
        for review in &guard.reviews {
            self.review_to_spot.remove(&review.id);
        }
        self.spots.remove(&spot_id);
        info!("spot {spot_id} deleted");
        Ok(())
    }

    pub async fn add_spot_image(
        &self,
        user_id: Ulid,
        spot_id: Ulid,
        url: &str,
        preview: bool,
    ) -> Result<SpotImage, EngineError> {
        let mut guard = self.spot_write(spot_id).await?;
        if guard.spot.owner_id != user_id {
            return Err(EngineError::Forbidden);
        }
        if guard.images.len() >= MAX_IMAGES_PER_SPOT {
            return Err(EngineError::LimitExceeded("too many images on spot"));
        }
        let url = validate_image_url(url)?;
        let image = SpotImage {
            id: self.next_id(),
            spot_id,
            url,
            preview,
        };
        guard.images.push(image.clone());
        Ok(image)
    }

    pub async fn create_review(
        &self,
        user_id: Ulid,
        spot_id: Ulid,
        review: &str,
        stars: i64,
    ) -> Result<Review, EngineError> {
        self.require_user(user_id)?;
        let mut guard = self.spot_write(spot_id).await?;
        let (text, stars) = validate_review(review, stars)?;
        if guard.has_review_by(user_id) {
            return Err(EngineError::AlreadyReviewed(spot_id));
        }
        let review = Review {
            id: self.next_id(),
            spot_id,
            user_id,
            review: text,
            stars,
            created_at: now_ms(),
        };
        guard.reviews.push(review.clone());
        self.review_to_spot.insert(review.id, spot_id);
        Ok(review)
    }

    pub async fn delete_review(&self, user_id: Ulid, review_id: Ulid) -> Result<(), EngineError> {
        let spot_id = self
            .review_to_spot
            .get(&review_id)
            .map(|e| *e.value())
            .ok_or(EngineError::not_found(EntityKind::Review, review_id))?;
        let mut guard = self.spot_write(spot_id).await?;
        let author = guard
            .reviews
            .iter()
            .find(|r| r.id == review_id)
            .map(|r| r.user_id)
            .ok_or(EngineError::not_found(EntityKind::Review, review_id))?;
        if author != user_id {
            return Err(EngineError::Forbidden);
        }
        guard.remove_review(review_id);
        self.review_to_spot.remove(&review_id);
        Ok(())
    }

    pub async fn create_booking(
        &self,
        user_id: Ulid,
        spot_id: Ulid,
        candidate: CandidateRange,
    ) -> Result<Booking, EngineError> {
        self.create_booking_at(user_id, spot_id, candidate, now_ms()).await
    }

    /// Book a stay as of `now`. The spot's write lock is held from the
    /// conflict check through the insert, so overlapping requests for the same
    /// spot are decided one at a time.
    pub async fn create_booking_at(
        &self,
        user_id: Ulid,
        spot_id: Ulid,
        candidate: CandidateRange,
        now: Ms,
    ) -> Result<Booking, EngineError> {
        self.require_user(user_id)?;
        let mut guard = self.spot_write(spot_id).await?;
        if guard.spot.owner_id == user_id {
            return Err(EngineError::Forbidden);
        }
        if guard.bookings.len() >= MAX_BOOKINGS_PER_SPOT {
            return Err(EngineError::LimitExceeded("too many bookings on spot"));
        }

        let span = match check_against_spot(&guard, &candidate, now, self.policy) {
            Ok(span) => span,
            Err(e) => {
                if let EngineError::Conflict(ref fields) = e {
                    metrics::counter!(crate::observability::BOOKING_CONFLICTS_TOTAL).increment(1);
                    debug!(
                        "booking on {spot_id} rejected, conflicting fields: {:?}",
                        fields.fields().collect::<Vec<_>>()
                    );
                }
                return Err(e);
            }
        };

        let booking = Booking {
            id: self.next_id(),
            spot_id,
            user_id,
            span,
            created_at: now,
        };
        guard.insert_booking(booking.clone());
        metrics::counter!(crate::observability::BOOKINGS_CREATED_TOTAL).increment(1);
        info!("booking {} on spot {spot_id} [{}, {})", booking.id, span.start, span.end);
        Ok(booking)
    }
}
