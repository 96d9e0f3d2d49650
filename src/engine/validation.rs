use crate::limits::*;
use crate::model::SpotInput;

use super::error::FieldErrors;
use super::EngineError;

/// Spot fields after validation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SpotFields {
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: f64,
    pub lng: f64,
    pub name: String,
    pub description: String,
    pub price: f64,
}

fn required(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<&String>,
    max_len: usize,
    message: &'static str,
) -> String {
    match value.map(|v| v.trim()) {
        Some(v) if !v.is_empty() && v.chars().count() <= max_len => v.to_string(),
        _ => {
            errors.set(field, message);
            String::new()
        }
    }
}

fn in_range(
    errors: &mut FieldErrors,
    field: &'static str,
    value: Option<f64>,
    min: f64,
    max: f64,
    message: &'static str,
) -> f64 {
    match value {
        Some(v) if v.is_finite() && (min..=max).contains(&v) => v,
        _ => {
            errors.set(field, message);
            0.0
        }
    }
}

pub(crate) fn validate_spot(input: &SpotInput) -> Result<SpotFields, EngineError> {
    let mut errors = FieldErrors::new();
    let address = required(&mut errors, "address", input.address.as_ref(), MAX_FIELD_LEN, "Street address is required");
    let city = required(&mut errors, "city", input.city.as_ref(), MAX_FIELD_LEN, "City is required");
    let state = required(&mut errors, "state", input.state.as_ref(), MAX_FIELD_LEN, "State is required");
    let country = required(&mut errors, "country", input.country.as_ref(), MAX_FIELD_LEN, "Country is required");
    let lat = in_range(&mut errors, "lat", input.lat, -90.0, 90.0, "Latitude is not valid");
    let lng = in_range(&mut errors, "lng", input.lng, -180.0, 180.0, "Longitude is not valid");
    let name = required(
        &mut errors,
        "name",
        input.name.as_ref(),
        MAX_NAME_LEN - 1,
        "Name must be less than 50 characters",
    );
    let description = required(
        &mut errors,
        "description",
        input.description.as_ref(),
        MAX_DESCRIPTION_LEN,
        "Description is required",
    );
    let price = match input.price {
        Some(p) if p.is_finite() && p > 0.0 => p,
        _ => {
            errors.set("price", "Price per day is required");
            0.0
        }
    };

    errors.into_result(EngineError::ValidationFailed)?;
    Ok(SpotFields { address, city, state, country, lat, lng, name, description, price })
}

pub(crate) fn validate_review(review: &str, stars: i64) -> Result<(String, u8), EngineError> {
    let mut errors = FieldErrors::new();
    let text = review.trim();
    if text.is_empty() || text.chars().count() > MAX_REVIEW_LEN {
        errors.set("review", "Review text is required");
    }
    let stars = match u8::try_from(stars) {
        Ok(s) if (1..=5).contains(&s) => s,
        _ => {
            errors.set("stars", "Stars must be an integer from 1 to 5");
            0
        }
    };
    errors.into_result(EngineError::ValidationFailed)?;
    Ok((text.to_string(), stars))
}

pub(crate) fn validate_image_url(url: &str) -> Result<String, EngineError> {
    let url = url.trim();
    if url.is_empty() || url.len() > MAX_URL_LEN {
        let mut errors = FieldErrors::new();
        errors.set("url", "Url is required");
        return Err(EngineError::ValidationFailed(errors));
    }
    Ok(url.to_string())
}
