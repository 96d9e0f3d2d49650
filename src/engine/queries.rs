use ulid::Ulid;

use crate::model::*;

use super::decorate::{average_stars, decorate_state, rating};
use super::{Engine, EngineError};

impl Engine {
    pub async fn list_spots(&self, filter: &SpotFilter) -> Vec<DecoratedSpot> {
        let mut result = Vec::new();
        for rs in self.spot_handles() {
            let guard = rs.read().await;
            if !guard.deleted && filter.matches(&guard.spot) {
                result.push(decorate_state(&guard));
            }
        }
        result
    }

    pub async fn spots_for_owner(&self, owner_id: Ulid) -> Result<Vec<DecoratedSpot>, EngineError> {
        self.require_user(owner_id)?;
        let mut result = Vec::new();
        for rs in self.spot_handles() {
            let guard = rs.read().await;
            if !guard.deleted && guard.spot.owner_id == owner_id {
                result.push(decorate_state(&guard));
            }
        }
        Ok(result)
    }

    pub async fn spot_details(&self, spot_id: Ulid) -> Result<SpotDetails, EngineError> {
        let guard = self.spot_read(spot_id).await?;
        Ok(SpotDetails {
            spot: guard.spot.clone(),
            num_reviews: guard.reviews.len(),
            avg_star_rating: rating(average_stars(&guard.reviews)),
            spot_images: guard.images.clone(),
            owner: self.get_user(&guard.spot.owner_id),
        })
    }

    pub async fn reviews_for_spot(&self, spot_id: Ulid) -> Result<Vec<ReviewView>, EngineError> {
        let guard = self.spot_read(spot_id).await?;
        Ok(guard
            .reviews
            .iter()
            .map(|r| ReviewView {
                review: r.clone(),
                user: self.get_user(&r.user_id),
            })
            .collect())
    }

    pub async fn reviews_for_user(&self, user_id: Ulid) -> Result<Vec<ReviewView>, EngineError> {
        let user = self.require_user(user_id)?;
        let mut result = Vec::new();
        for rs in self.spot_handles() {
            let guard = rs.read().await;
            if guard.deleted {
                continue;
            }
            result.extend(
                guard
                    .reviews
                    .iter()
                    .filter(|r| r.user_id == user_id)
                    .map(|r| ReviewView {
                        review: r.clone(),
                        user: Some(user.clone()),
                    }),
            );
        }
        result.sort_by_key(|v| v.review.id);
        Ok(result)
    }

    /// Bookings on a spot as seen by `user_id`: the owner gets full records
    /// with the guest attached, anyone else only the taken date ranges.
    pub async fn bookings_for_spot(
        &self,
        user_id: Ulid,
        spot_id: Ulid,
    ) -> Result<Vec<BookingView>, EngineError> {
        let guard = self.spot_read(spot_id).await?;
        let is_owner = guard.spot.owner_id == user_id;
        Ok(guard
            .bookings
            .iter()
            .map(|b| {
                if is_owner {
                    BookingView::Full(GuestBooking {
                        booking: b.clone(),
                        user: self.get_user(&b.user_id),
                    })
                } else {
                    BookingView::Public(TakenDates::from(b))
                }
            })
            .collect())
    }

    /// Every booking made by `user_id`, ordered by start date.
    pub async fn bookings_for_user(&self, user_id: Ulid) -> Result<Vec<Booking>, EngineError> {
        self.require_user(user_id)?;
        let mut result = Vec::new();
        for rs in self.spot_handles() {
            let guard = rs.read().await;
            if guard.deleted {
                continue;
            }
            result.extend(guard.bookings.iter().filter(|b| b.user_id == user_id).cloned());
        }
        result.sort_by_key(|b| (b.span.start, b.id));
        Ok(result)
    }
}
