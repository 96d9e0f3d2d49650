use std::sync::Arc;

use serde_json::{json, Value};

use staybook::api::{Handler, Response};
use staybook::config::Config;
use staybook::engine::{ConflictPolicy, Engine};

// ── Test infrastructure ──────────────────────────────────────

fn handler_with(config: Config) -> Handler {
    Handler::new(Arc::new(Engine::new(config.conflict_policy)), &config)
}

fn handler() -> Handler {
    handler_with(Config::default())
}

async fn call(h: &Handler, request: Value) -> Response {
    h.handle_line(&request.to_string()).await
}

async fn user(h: &Handler, first: &str) -> String {
    let resp = call(
        h,
        json!({ "op": "register_user", "firstName": first, "lastName": "Tester" }),
    )
    .await;
    assert_eq!(resp.status, 201, "{:?}", resp.body);
    resp.body["id"].as_str().unwrap().to_string()
}

fn spot_body(name: &str, price: f64) -> Value {
    json!({
        "address": "123 Disney Lane",
        "city": "San Francisco",
        "state": "California",
        "country": "United States of America",
        "lat": 37.7645358,
        "lng": -122.4730327,
        "name": name,
        "description": "Place where web developers are created",
        "price": price
    })
}

async fn spot(h: &Handler, owner: &str, name: &str) -> String {
    let resp = call(
        h,
        json!({ "op": "create_spot", "userId": owner, "spot": spot_body(name, 123.0) }),
    )
    .await;
    assert_eq!(resp.status, 201, "{:?}", resp.body);
    resp.body["id"].as_str().unwrap().to_string()
}

async fn book(h: &Handler, guest: &str, spot_id: &str, start: &str, end: &str) -> Response {
    call(
        h,
        json!({
            "op": "create_booking",
            "userId": guest,
            "spotId": spot_id,
            "startDate": start,
            "endDate": end
        }),
    )
    .await
}

// ── Bookings ─────────────────────────────────────────────────

#[tokio::test]
async fn booking_created_and_conflict_rejected() {
    let h = handler();
    let owner = user(&h, "Olive").await;
    let guest = user(&h, "Gus").await;
    let other = user(&h, "Ora").await;
    let spot_id = spot(&h, &owner, "Cabin").await;

    let resp = book(&h, &guest, &spot_id, "2099-06-01", "2099-06-10").await;
    assert_eq!(resp.status, 201);
    assert_eq!(resp.body["spotId"], spot_id.as_str());
    assert_eq!(resp.body["userId"], guest.as_str());
    assert_eq!(resp.body["startDate"], "2099-06-01T00:00:00.000Z");
    assert_eq!(resp.body["endDate"], "2099-06-10T00:00:00.000Z");

    let resp = book(&h, &other, &spot_id, "2099-06-01", "2099-06-05").await;
    assert_eq!(resp.status, 409);
    assert_eq!(
        resp.body,
        json!({
            "message": "Sorry, this spot is already booked for the specified dates",
            "errors": { "startDate": "Start date conflicts with an existing booking" }
        })
    );

    let resp = book(&h, &other, &spot_id, "2099-05-25", "2099-06-15").await;
    assert_eq!(resp.status, 409);
    assert_eq!(
        resp.body["errors"],
        json!({
            "startDate": "Start date conflicts with an existing booking",
            "endDate": "End date conflicts with an existing booking"
        })
    );

    let resp = book(&h, &other, &spot_id, "2099-05-20", "2099-05-30").await;
    assert_eq!(resp.status, 201);
}

#[tokio::test]
async fn legacy_status_for_conflicts() {
    let h = handler_with(Config {
        conflict_status: 403,
        ..Config::default()
    });
    let owner = user(&h, "Olive").await;
    let guest = user(&h, "Gus").await;
    let spot_id = spot(&h, &owner, "Cabin").await;

    assert_eq!(book(&h, &guest, &spot_id, "2099-06-01", "2099-06-10").await.status, 201);
    assert_eq!(book(&h, &guest, &spot_id, "2099-06-05", "2099-06-20").await.status, 403);
}

#[tokio::test]
async fn overlap_policy_reports_both_fields() {
    let h = handler_with(Config {
        conflict_policy: ConflictPolicy::Overlap,
        ..Config::default()
    });
    let owner = user(&h, "Olive").await;
    let guest = user(&h, "Gus").await;
    let spot_id = spot(&h, &owner, "Cabin").await;

    book(&h, &guest, &spot_id, "2099-06-01", "2099-06-10").await;
    let resp = book(&h, &guest, &spot_id, "2099-06-05", "2099-06-20").await;
    assert_eq!(resp.status, 409);
    assert_eq!(resp.body["errors"].as_object().unwrap().len(), 2);
}

#[tokio::test]
async fn booking_validation_errors() {
    let h = handler();
    let owner = user(&h, "Olive").await;
    let guest = user(&h, "Gus").await;
    let spot_id = spot(&h, &owner, "Cabin").await;

    let resp = book(&h, &guest, &spot_id, "2000-01-10", "2000-01-01").await;
    assert_eq!(resp.status, 400);
    assert_eq!(
        resp.body,
        json!({
            "message": "Bad Request",
            "errors": {
                "startDate": "startDate cannot be in the past",
                "endDate": "endDate cannot be on or before startDate"
            }
        })
    );

    let resp = book(&h, &guest, &spot_id, "soon", "2099-01-01").await;
    assert_eq!(resp.status, 400);
    assert_eq!(resp.body["errors"]["startDate"], "startDate must be a valid date");
}

#[tokio::test]
async fn booking_forbidden_and_missing() {
    let h = handler();
    let owner = user(&h, "Olive").await;
    let guest = user(&h, "Gus").await;
    let spot_id = spot(&h, &owner, "Cabin").await;

    let resp = book(&h, &owner, &spot_id, "2099-06-01", "2099-06-10").await;
    assert_eq!(resp.status, 403);
    assert_eq!(resp.body["message"], "Forbidden");

    let missing = ulid::Ulid::new().to_string();
    let resp = book(&h, &guest, &missing, "2099-06-01", "2099-06-10").await;
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body["message"], "Spot couldn't be found");
}

#[tokio::test]
async fn booking_list_owner_and_guest_views() {
    let h = handler();
    let owner = user(&h, "Olive").await;
    let guest = user(&h, "Gus").await;
    let spot_id = spot(&h, &owner, "Cabin").await;
    book(&h, &guest, &spot_id, "2099-06-01", "2099-06-10").await;

    let resp = call(&h, json!({ "op": "spot_bookings", "userId": owner, "spotId": spot_id })).await;
    assert_eq!(resp.status, 200);
    let full = &resp.body["Bookings"][0];
    assert_eq!(full["userId"], guest.as_str());
    assert_eq!(full["User"]["firstName"], "Gus");

    let resp = call(&h, json!({ "op": "spot_bookings", "userId": guest, "spotId": spot_id })).await;
    let public = resp.body["Bookings"][0].as_object().unwrap();
    let mut keys: Vec<&str> = public.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["endDate", "spotId", "startDate"]);

    let resp = call(&h, json!({ "op": "current_user_bookings", "userId": guest })).await;
    assert_eq!(resp.body["Bookings"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_requests_book_once() {
    let h = Arc::new(handler());
    let owner = user(&h, "Olive").await;
    let spot_id = spot(&h, &owner, "Cabin").await;
    let mut guests = Vec::new();
    for i in 0..16 {
        guests.push(user(&h, &format!("Guest{i}")).await);
    }

    let mut tasks = Vec::new();
    for guest in guests {
        let h = h.clone();
        let spot_id = spot_id.clone();
        tasks.push(tokio::spawn(async move {
            book(&h, &guest, &spot_id, "2099-06-01", "2099-06-10").await.status
        }));
    }
    let mut statuses = Vec::new();
    for t in tasks {
        statuses.push(t.await.unwrap());
    }
    assert_eq!(statuses.iter().filter(|s| **s == 201).count(), 1);
    assert_eq!(statuses.iter().filter(|s| **s == 409).count(), 15);
}

// ── Spots, images, reviews ───────────────────────────────────

#[tokio::test]
async fn spot_listing_decoration() {
    let h = handler();
    let owner = user(&h, "Olive").await;
    let guest = user(&h, "Gus").await;
    let spot_id = spot(&h, &owner, "Cabin").await;

    let resp = call(&h, json!({ "op": "list_spots" })).await;
    let listed = &resp.body["Spots"][0];
    assert_eq!(listed["avgRating"], "No Reviews exist for this spot");
    assert_eq!(listed["previewImage"], "No Preview Image Available");

    let resp = call(
        &h,
        json!({ "op": "add_spot_image", "userId": owner, "spotId": spot_id, "url": "front.png", "preview": true }),
    )
    .await;
    assert_eq!(resp.status, 201);
    assert_eq!(resp.body["url"], "front.png");

    let resp = call(
        &h,
        json!({ "op": "create_review", "userId": guest, "spotId": spot_id, "review": "Cozy", "stars": 4 }),
    )
    .await;
    assert_eq!(resp.status, 201);

    let resp = call(&h, json!({ "op": "current_user_spots", "userId": owner })).await;
    let listed = &resp.body["Spots"][0];
    assert_eq!(listed["avgRating"], 4.0);
    assert_eq!(listed["previewImage"], "front.png");

    let resp = call(&h, json!({ "op": "spot_details", "spotId": spot_id })).await;
    assert_eq!(resp.body["numReviews"], 1);
    assert_eq!(resp.body["avgStarRating"], 4.0);
    assert_eq!(resp.body["Owner"]["firstName"], "Olive");
    assert_eq!(resp.body["SpotImages"][0]["url"], "front.png");
}

#[tokio::test]
async fn spot_filters_apply() {
    let h = handler();
    let owner = user(&h, "Olive").await;
    for (name, price) in [("Cheap", 50.0), ("Mid", 150.0), ("Lux", 900.0)] {
        let resp = call(
            &h,
            json!({ "op": "create_spot", "userId": owner, "spot": spot_body(name, price) }),
        )
        .await;
        assert_eq!(resp.status, 201);
    }
    let resp = call(
        &h,
        json!({ "op": "list_spots", "filter": { "minPrice": 100, "maxPrice": 500 } }),
    )
    .await;
    let spots = resp.body["Spots"].as_array().unwrap();
    assert_eq!(spots.len(), 1);
    assert_eq!(spots[0]["name"], "Mid");
}

#[tokio::test]
async fn spot_create_validation_and_ownership() {
    let h = handler();
    let owner = user(&h, "Olive").await;
    let guest = user(&h, "Gus").await;

    let resp = call(&h, json!({ "op": "create_spot", "userId": owner, "spot": { "city": "SF" } })).await;
    assert_eq!(resp.status, 400);
    assert_eq!(resp.body["message"], "Bad Request");
    assert_eq!(resp.body["errors"]["address"], "Street address is required");
    assert!(resp.body["errors"].get("city").is_none());

    let spot_id = spot(&h, &owner, "Cabin").await;
    let resp = call(
        &h,
        json!({ "op": "update_spot", "userId": guest, "spotId": spot_id, "spot": spot_body("Stolen", 1.0) }),
    )
    .await;
    assert_eq!(resp.status, 403);

    let resp = call(
        &h,
        json!({ "op": "update_spot", "userId": owner, "spotId": spot_id, "spot": spot_body("Chalet", 99.0) }),
    )
    .await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["name"], "Chalet");

    let resp = call(&h, json!({ "op": "delete_spot", "userId": owner, "spotId": spot_id })).await;
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["message"], "Successfully deleted");

    let resp = call(&h, json!({ "op": "spot_details", "spotId": spot_id })).await;
    assert_eq!(resp.status, 404);
}

#[tokio::test]
async fn review_rules() {
    let h = handler();
    let owner = user(&h, "Olive").await;
    let guest = user(&h, "Gus").await;
    let spot_id = spot(&h, &owner, "Cabin").await;

    let review = json!({ "op": "create_review", "userId": guest, "spotId": spot_id, "review": "Great", "stars": 5 });
    let resp = call(&h, review.clone()).await;
    assert_eq!(resp.status, 201);
    let review_id = resp.body["id"].as_str().unwrap().to_string();

    let resp = call(&h, review).await;
    assert_eq!(resp.status, 403);
    assert_eq!(resp.body["message"], "User already has a review for this spot");

    let resp = call(
        &h,
        json!({ "op": "create_review", "userId": owner, "spotId": spot_id, "stars": 7 }),
    )
    .await;
    assert_eq!(resp.status, 400);
    assert_eq!(resp.body["errors"]["stars"], "Stars must be an integer from 1 to 5");
    assert_eq!(resp.body["errors"]["review"], "Review text is required");

    let resp = call(&h, json!({ "op": "spot_reviews", "spotId": spot_id })).await;
    assert_eq!(resp.body["Reviews"][0]["User"]["firstName"], "Gus");

    let resp = call(&h, json!({ "op": "current_user_reviews", "userId": guest })).await;
    assert_eq!(resp.body["Reviews"].as_array().unwrap().len(), 1);

    let resp = call(&h, json!({ "op": "delete_review", "userId": owner, "reviewId": review_id })).await;
    assert_eq!(resp.status, 403);
    let resp = call(&h, json!({ "op": "delete_review", "userId": guest, "reviewId": review_id })).await;
    assert_eq!(resp.status, 200);
    let resp = call(&h, json!({ "op": "delete_review", "userId": guest, "reviewId": review_id })).await;
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body["message"], "Review couldn't be found");
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let h = handler();
    let stranger = ulid::Ulid::new().to_string();
    let resp = call(&h, json!({ "op": "current_user_spots", "userId": stranger })).await;
    assert_eq!(resp.status, 404);
    assert_eq!(resp.body["message"], "User couldn't be found");
}
