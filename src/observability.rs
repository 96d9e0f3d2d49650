use std::net::SocketAddr;

use crate::api::Request;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: total requests handled. Labels: op, status.
pub const REQUESTS_TOTAL: &str = "staybook_requests_total";

/// Histogram: request latency in seconds. Labels: op.
pub const REQUEST_DURATION_SECONDS: &str = "staybook_request_duration_seconds";

/// Counter: request lines that could not be decoded.
pub const MALFORMED_REQUESTS_TOTAL: &str = "staybook_malformed_requests_total";

// ── Booking outcomes ────────────────────────────────────────────

/// Counter: bookings accepted.
pub const BOOKINGS_CREATED_TOTAL: &str = "staybook_bookings_created_total";

/// Counter: bookings rejected for clashing with an existing booking.
pub const BOOKING_CONFLICTS_TOTAL: &str = "staybook_booking_conflicts_total";

/// Install Prometheus metrics exporter on the given port. No-op if port is None.
pub fn init(port: Option<u16>) -> Result<(), Box<dyn std::error::Error>> {
    let Some(port) = port else { return Ok(()) };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()?;
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
    Ok(())
}

/// Map a Request variant to a short label for metrics.
pub fn op_label(req: &Request) -> &'static str {
    match req {
        Request::RegisterUser { .. } => "register_user",
        Request::CreateSpot { .. } => "create_spot",
        Request::UpdateSpot { .. } => "update_spot",
        Request::DeleteSpot { .. } => "delete_spot",
        Request::AddSpotImage { .. } => "add_spot_image",
        Request::ListSpots { .. } => "list_spots",
        Request::CurrentUserSpots { .. } => "current_user_spots",
        Request::SpotDetails { .. } => "spot_details",
        Request::CreateReview { .. } => "create_review",
        Request::DeleteReview { .. } => "delete_review",
        Request::SpotReviews { .. } => "spot_reviews",
        Request::CurrentUserReviews { .. } => "current_user_reviews",
        Request::CreateBooking { .. } => "create_booking",
        Request::SpotBookings { .. } => "spot_bookings",
        Request::CurrentUserBookings { .. } => "current_user_bookings",
    }
}
