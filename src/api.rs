//! Transport-neutral request API.
//!
//! A request is one JSON object tagged by `op`; the reply is a status code and
//! a JSON body. Errors always carry `{ "message", "errors" }` where `errors`
//! maps request fields to messages.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, warn};
use ulid::Ulid;

use crate::config::Config;
use crate::dates::parse_date;
use crate::engine::{Engine, EngineError, FieldErrors};
use crate::model::*;
use crate::observability;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Request {
    RegisterUser {
        #[serde(default)]
        first_name: String,
        #[serde(default)]
        last_name: String,
    },
    CreateSpot {
        user_id: Ulid,
        #[serde(default)]
        spot: SpotInput,
    },
    UpdateSpot {
        user_id: Ulid,
        spot_id: Ulid,
        #[serde(default)]
        spot: SpotInput,
    },
    DeleteSpot {
        user_id: Ulid,
        spot_id: Ulid,
    },
    AddSpotImage {
        user_id: Ulid,
        spot_id: Ulid,
        #[serde(default)]
        url: String,
        #[serde(default)]
        preview: bool,
    },
    ListSpots {
        #[serde(default)]
        filter: SpotFilter,
    },
    CurrentUserSpots {
        user_id: Ulid,
    },
    SpotDetails {
        spot_id: Ulid,
    },
    CreateReview {
        user_id: Ulid,
        spot_id: Ulid,
        #[serde(default)]
        review: Option<String>,
        #[serde(default)]
        stars: Option<i64>,
    },
    DeleteReview {
        user_id: Ulid,
        review_id: Ulid,
    },
    SpotReviews {
        spot_id: Ulid,
    },
    CurrentUserReviews {
        user_id: Ulid,
    },
    CreateBooking {
        user_id: Ulid,
        spot_id: Ulid,
        #[serde(default)]
        start_date: Option<String>,
        #[serde(default)]
        end_date: Option<String>,
    },
    SpotBookings {
        user_id: Ulid,
        spot_id: Ulid,
    },
    CurrentUserBookings {
        user_id: Ulid,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn new(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(body) => Self::new(status, body),
            Err(e) => {
                error!("response encoding failed: {e}");
                Self::error(500, "Internal Server Error", &FieldErrors::new())
            }
        }
    }

    pub fn error(status: u16, message: &str, errors: &FieldErrors) -> Self {
        Self::new(status, json!({ "message": message, "errors": errors }))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Parse the raw request dates into a candidate stay.
pub fn candidate_from_raw(
    start_date: Option<&str>,
    end_date: Option<&str>,
) -> Result<CandidateRange, EngineError> {
    let start = start_date.and_then(parse_date);
    let end = end_date.and_then(parse_date);
    let mut errors = FieldErrors::new();
    if start.is_none() {
        errors.set("startDate", "startDate must be a valid date");
    }
    if end.is_none() {
        errors.set("endDate", "endDate must be a valid date");
    }
    match (start, end) {
        (Some(start), Some(end)) => Ok(CandidateRange::new(start, end)),
        _ => Err(EngineError::ValidationFailed(errors)),
    }
}

/// Dispatches requests to the engine and renders the outcome.
pub struct Handler {
    engine: Arc<Engine>,
    conflict_status: u16,
}

impl Handler {
    pub fn new(engine: Arc<Engine>, config: &Config) -> Self {
        Self {
            engine,
            conflict_status: config.conflict_status,
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn status_for(&self, err: &EngineError) -> u16 {
        match err {
            EngineError::NotFound { .. } => 404,
            EngineError::Forbidden | EngineError::AlreadyReviewed(_) => 403,
            EngineError::Conflict(_) => self.conflict_status,
            EngineError::ValidationFailed(_) | EngineError::LimitExceeded(_) => 400,
        }
    }

    pub fn error_response(&self, err: &EngineError) -> Response {
        Response::error(self.status_for(err), &err.to_string(), &err.field_errors())
    }

    /// Decode one JSON request and handle it. Undecodable input is a 400.
    pub async fn handle_line(&self, line: &str) -> Response {
        match serde_json::from_str::<Request>(line) {
            Ok(req) => self.handle(req).await,
            Err(e) => {
                metrics::counter!(observability::MALFORMED_REQUESTS_TOTAL).increment(1);
                warn!("malformed request: {e}");
                let mut errors = FieldErrors::new();
                errors.set("request", e.to_string());
                Response::error(400, "Malformed request", &errors)
            }
        }
    }

    pub async fn handle(&self, req: Request) -> Response {
        let op = observability::op_label(&req);
        let start = Instant::now();
        let response = match self.execute(req).await {
            Ok(response) => response,
            Err(e) => self.error_response(&e),
        };
        metrics::counter!(
            observability::REQUESTS_TOTAL,
            "op" => op,
            "status" => response.status.to_string()
        )
        .increment(1);
        metrics::histogram!(observability::REQUEST_DURATION_SECONDS, "op" => op)
            .record(start.elapsed().as_secs_f64());
        response
    }

    async fn execute(&self, req: Request) -> Result<Response, EngineError> {
        let engine = &self.engine;
        match req {
            Request::RegisterUser { first_name, last_name } => {
                let user = engine.register_user(&first_name, &last_name)?;
                Ok(Response::json(201, &user))
            }
            Request::CreateSpot { user_id, spot } => {
                let spot = engine.create_spot(user_id, &spot)?;
                Ok(Response::json(201, &spot))
            }
            Request::UpdateSpot { user_id, spot_id, spot } => {
                let spot = engine.update_spot(user_id, spot_id, &spot).await?;
                Ok(Response::json(200, &spot))
            }
            Request::DeleteSpot { user_id, spot_id } => {
                engine.delete_spot(user_id, spot_id).await?;
                Ok(Response::new(200, json!({ "message": "Successfully deleted" })))
            }
            Request::AddSpotImage { user_id, spot_id, url, preview } => {
                let image = engine.add_spot_image(user_id, spot_id, &url, preview).await?;
                Ok(Response::new(
                    201,
                    json!({ "id": image.id, "url": image.url, "preview": image.preview }),
                ))
            }
            Request::ListSpots { filter } => {
                let spots = engine.list_spots(&filter).await;
                Ok(Response::json(200, &json!({ "Spots": spots })))
            }
            Request::CurrentUserSpots { user_id } => {
                let spots = engine.spots_for_owner(user_id).await?;
                Ok(Response::json(200, &json!({ "Spots": spots })))
            }
            Request::SpotDetails { spot_id } => {
                let details = engine.spot_details(spot_id).await?;
                Ok(Response::json(200, &details))
            }
            Request::CreateReview { user_id, spot_id, review, stars } => {
                let review = engine
                    .create_review(user_id, spot_id, review.as_deref().unwrap_or(""), stars.unwrap_or(0))
                    .await?;
                Ok(Response::json(201, &review))
            }
            Request::DeleteReview { user_id, review_id } => {
                engine.delete_review(user_id, review_id).await?;
                Ok(Response::new(200, json!({ "message": "Successfully deleted" })))
            }
            Request::SpotReviews { spot_id } => {
                let reviews = engine.reviews_for_spot(spot_id).await?;
                Ok(Response::json(200, &json!({ "Reviews": reviews })))
            }
            Request::CurrentUserReviews { user_id } => {
                let reviews = engine.reviews_for_user(user_id).await?;
                Ok(Response::json(200, &json!({ "Reviews": reviews })))
            }
            Request::CreateBooking { user_id, spot_id, start_date, end_date } => {
                let candidate = candidate_from_raw(start_date.as_deref(), end_date.as_deref())?;
                let booking = engine.create_booking(user_id, spot_id, candidate).await?;
                Ok(Response::json(201, &booking))
            }
            Request::SpotBookings { user_id, spot_id } => {
                let bookings = engine.bookings_for_spot(user_id, spot_id).await?;
                Ok(Response::json(200, &json!({ "Bookings": bookings })))
            }
            Request::CurrentUserBookings { user_id } => {
                let bookings = engine.bookings_for_user(user_id).await?;
                Ok(Response::json(200, &json!({ "Bookings": bookings })))
            }
        }
    }
}
