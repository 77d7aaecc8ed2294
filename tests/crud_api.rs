//! CRUD surface smoke tests: authentication requirements, pagination,
//! search, and validation.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use common::{api_key_header, bootstrap_api_key, create_event, header_value, server};
use serde_json::{Value, json};
use uuid::Uuid;

#[tokio::test]
async fn authenticated_surface_requires_an_api_key() {
    let server = server();

    assert_eq!(server.get("/api/v1/events").await.status_code(), 401);
    assert_eq!(
        server
            .get("/api/v1/events")
            .add_header(api_key_header(), header_value("bogus"))
            .await
            .status_code(),
        401
    );

    // Health stays public.
    assert_eq!(server.get("/health").await.status_code(), 200);
}

#[tokio::test]
async fn revoked_keys_stop_working() {
    let server = server();
    let api_key = bootstrap_api_key(&server).await;

    let keys = server
        .get("/api/v1/tickets")
        .add_header(api_key_header(), header_value(&api_key))
        .await;
    assert_eq!(keys.status_code(), 200);

    // Find the key id through the owning user.
    let users = server
        .get("/api/v1/users")
        .add_header(api_key_header(), header_value(&api_key))
        .await;
    let user_id = users.json::<Value>()[0]["id"].as_str().unwrap().to_string();
    let listed = server
        .get(&format!("/api/v1/apikeys/user/{user_id}"))
        .add_header(api_key_header(), header_value(&api_key))
        .await;
    let key_id = listed.json::<Value>()[0]["id"].as_str().unwrap().to_string();

    let revoke = server
        .delete(&format!("/api/v1/apikeys/{key_id}"))
        .add_header(api_key_header(), header_value(&api_key))
        .await;
    assert_eq!(revoke.status_code(), 204);

    let after = server
        .get("/api/v1/tickets")
        .add_header(api_key_header(), header_value(&api_key))
        .await;
    assert_eq!(after.status_code(), 401);
}

#[tokio::test]
async fn login_verifies_credentials() {
    let server = server();

    let created = server
        .post("/api/v1/users")
        .json(&json!({
            "name": "Clara Lima",
            "email": "clara@example.com",
            "password": "clara-secret-1",
        }))
        .await;
    assert_eq!(created.status_code(), 201);

    let ok = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "clara@example.com", "password": "clara-secret-1" }))
        .await;
    assert_eq!(ok.status_code(), 200);
    let body = ok.json::<Value>();
    assert_eq!(body["email"], "clara@example.com");
    assert_eq!(body["role"], "Customer");

    let wrong = server
        .post("/api/v1/auth/login")
        .json(&json!({ "email": "clara@example.com", "password": "nope" }))
        .await;
    assert_eq!(wrong.status_code(), 401);
}

#[tokio::test]
async fn artist_crud_and_search() {
    let server = server();
    let api_key = bootstrap_api_key(&server).await;

    let mut ids = Vec::new();
    for (name, genre) in [
        ("Aurora Drift", "Electronic"),
        ("Basalto", "Rock"),
        ("Cedro Alto", "Folk"),
    ] {
        let response = server
            .post("/api/v1/artists")
            .add_header(api_key_header(), header_value(&api_key))
            .json(&json!({ "name": name, "genre": genre }))
            .await;
        assert_eq!(response.status_code(), 201);
        ids.push(response.json::<Value>()["id"].as_str().unwrap().to_string());
    }

    // Pagination bookkeeping.
    let page = server
        .get("/api/v1/artists")
        .add_query_param("size", "2")
        .add_header(api_key_header(), header_value(&api_key))
        .await;
    let body = page.json::<Value>();
    assert_eq!(body["content"].as_array().unwrap().len(), 2);
    assert_eq!(body["total_elements"], 3);
    assert_eq!(body["total_pages"], 2);
    // Default sort is by name, ascending.
    assert_eq!(body["content"][0]["name"], "Aurora Drift");

    // Search by genre substring.
    let found = server
        .get("/api/v1/artists/search")
        .add_query_param("genre", "rock")
        .add_header(api_key_header(), header_value(&api_key))
        .await;
    let found = found.json::<Value>();
    assert_eq!(found["total_elements"], 1);
    assert_eq!(found["content"][0]["name"], "Basalto");

    // Update and delete.
    let update = server
        .put(&format!("/api/v1/artists/{}", ids[0]))
        .add_header(api_key_header(), header_value(&api_key))
        .json(&json!({ "genre": "Ambient" }))
        .await;
    assert_eq!(update.status_code(), 200);
    assert_eq!(update.json::<Value>()["genre"], "Ambient");

    let delete = server
        .delete(&format!("/api/v1/artists/{}", ids[2]))
        .add_header(api_key_header(), header_value(&api_key))
        .await;
    assert_eq!(delete.status_code(), 204);

    let missing = server
        .get(&format!("/api/v1/artists/{}", ids[2]))
        .add_header(api_key_header(), header_value(&api_key))
        .await;
    assert_eq!(missing.status_code(), 404);
}

#[tokio::test]
async fn event_validation_and_id_mismatch() {
    let server = server();
    let api_key = bootstrap_api_key(&server).await;

    let zero_capacity = server
        .post("/api/v1/events")
        .add_header(api_key_header(), header_value(&api_key))
        .json(&json!({
            "name": "Ghost Show",
            "date": "2026-10-01T20:00:00Z",
            "venue": "Nowhere",
            "capacity_maximum": 0,
            "ticket_price_cents": 1000,
        }))
        .await;
    assert_eq!(zero_capacity.status_code(), 400);

    let free_show = server
        .post("/api/v1/events")
        .add_header(api_key_header(), header_value(&api_key))
        .json(&json!({
            "name": "Free Show",
            "date": "2026-10-01T20:00:00Z",
            "venue": "Main Hall",
            "capacity_maximum": 10,
            "ticket_price_cents": 0,
        }))
        .await;
    assert_eq!(free_show.status_code(), 400);

    let unknown_artist = server
        .post("/api/v1/events")
        .add_header(api_key_header(), header_value(&api_key))
        .json(&json!({
            "name": "Lineup Mixup",
            "date": "2026-10-01T20:00:00Z",
            "venue": "Main Hall",
            "capacity_maximum": 10,
            "ticket_price_cents": 500,
            "artist_ids": [Uuid::new_v4()],
        }))
        .await;
    assert_eq!(unknown_artist.status_code(), 400);

    // A body id disagreeing with the path id is rejected.
    let event_id = create_event(&server, &api_key, 10, 500).await;
    let mismatch = server
        .put(&format!("/api/v1/events/{event_id}"))
        .add_header(api_key_header(), header_value(&api_key))
        .json(&json!({ "id": Uuid::new_v4(), "name": "Renamed" }))
        .await;
    assert_eq!(mismatch.status_code(), 400);

    let matching = server
        .put(&format!("/api/v1/events/{event_id}"))
        .add_header(api_key_header(), header_value(&api_key))
        .json(&json!({ "id": event_id, "name": "Renamed Fest" }))
        .await;
    assert_eq!(matching.status_code(), 200);
    assert_eq!(matching.json::<Value>()["name"], "Renamed Fest");
}

#[tokio::test]
async fn ticket_search_filters_by_event_and_status() {
    let server = server();
    let api_key = bootstrap_api_key(&server).await;
    let event_a = create_event(&server, &api_key, 50, 1000).await;
    let event_b = create_event(&server, &api_key, 50, 1000).await;

    for event in [&event_a, &event_b] {
        let response = server
            .post("/api/v1/tickets")
            .add_header(api_key_header(), header_value(&api_key))
            .add_header(
                common::idempotency_header(),
                header_value(&Uuid::new_v4().to_string()),
            )
            .json(&common::purchase_body(event, 2))
            .await;
        assert_eq!(response.status_code(), 201);
    }

    let by_event = server
        .get("/api/v1/tickets/search")
        .add_query_param("event_id", &event_a)
        .add_header(api_key_header(), header_value(&api_key))
        .await;
    assert_eq!(by_event.json::<Value>()["total_elements"], 1);

    let by_status = server
        .get("/api/v1/tickets/search")
        .add_query_param("status", "Paid")
        .add_header(api_key_header(), header_value(&api_key))
        .await;
    assert_eq!(by_status.json::<Value>()["total_elements"], 0);

    let by_email = server
        .get("/api/v1/tickets/search")
        .add_query_param("email", "ana@")
        .add_header(api_key_header(), header_value(&api_key))
        .await;
    assert_eq!(by_email.json::<Value>()["total_elements"], 2);
}
