use crate::model::*;

/// Mean star rating, `None` when there are no reviews.
pub fn average_stars(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.stars)).sum();
    Some(f64::from(total) / reviews.len() as f64)
}

pub fn rating(raw_average: Option<f64>) -> AvgRating {
    match raw_average {
        Some(avg) if avg > 0.0 => AvgRating::Stars((avg * 10.0).round() / 10.0),
        _ => AvgRating::NoReviews,
    }
}

/// Url of the first image flagged as preview.
pub fn preview_image(images: &[SpotImage]) -> Option<&str> {
    images.iter().find(|i| i.preview).map(|i| i.url.as_str())
}

/// Listing shape shared by every spot listing.
pub fn decorate_spot(spot: &Spot, raw_average: Option<f64>, images: &[SpotImage]) -> DecoratedSpot {
    DecoratedSpot {
        spot: spot.clone(),
        avg_rating: rating(raw_average),
        preview_image: preview_image(images)
            .unwrap_or(NO_PREVIEW_IMAGE)
            .to_string(),
    }
}

pub(crate) fn decorate_state(state: &SpotState) -> DecoratedSpot {
    decorate_spot(&state.spot, average_stars(&state.reviews), &state.images)
}
