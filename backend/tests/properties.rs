mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::{TestApp, ADMIN_EMAIL, CENTRE, LITTORAL, MFOUNDI, WOURI};
use rental_marketplace::models::SubscriptionStatus;
use rental_marketplace::store::Store;

#[tokio::test]
async fn littoral_search_returns_only_the_active_listing() {
    let app = TestApp::new();
    let landlord = app.landlord("bailleur@douala.cm").await;
    let active = app
        .create_property(&landlord.token, json!({ "monthlyPrice": 50000 }))
        .await;
    app.create_property(
        &landlord.token,
        json!({ "monthlyPrice": 60000, "isActive": false }),
    )
    .await;

    let (status, body) = app
        .get(&format!("/api/properties?regionId={}", LITTORAL), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    let listed = body["properties"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["id"], active["id"]);
    assert_eq!(listed[0]["region"]["name"], "Littoral");
    assert_eq!(listed[0]["division"]["id"], WOURI);
}

#[tokio::test]
async fn inactive_listings_never_show_under_any_filter() {
    let app = TestApp::new();
    let landlord = app.landlord("inactifs@douala.cm").await;
    for price in [40000, 80000] {
        app.create_property(
            &landlord.token,
            json!({ "monthlyPrice": price, "isActive": false }),
        )
        .await;
    }
    app.create_property(&landlord.token, json!({ "monthlyPrice": 70000 }))
        .await;

    let queries = [
        "",
        "?regionId=5",
        "?divisionId=29",
        "?propertyType=apartment",
        "?contractType=long_term",
        "?minPrice=0&maxPrice=100000",
        "?rooms=1",
        "?page=1&limit=100",
    ];
    for query in queries {
        let (status, body) = app.get(&format!("/api/properties{}", query), None).await;
        assert_eq!(status, StatusCode::OK, "query {}", query);
        for property in body["properties"].as_array().unwrap() {
            assert_eq!(property["isActive"], true, "query {}", query);
        }
        assert_eq!(body["total"], 1, "query {}", query);
    }
}

#[tokio::test]
async fn page_sizes_follow_the_total() {
    let app = TestApp::new();
    let landlord = app.landlord("pages@douala.cm").await;
    for i in 0..7 {
        app.create_property(&landlord.token, json!({ "monthlyPrice": 10000 * (i + 1) }))
            .await;
    }

    let total: i64 = 7;
    for limit in [1_i64, 3, 5, 7, 10] {
        for page in 1_i64..=4 {
            let (status, body) = app
                .get(&format!("/api/properties?page={}&limit={}", page, limit), None)
                .await;
            assert_eq!(status, StatusCode::OK);
            let expected = limit.min((total - (page - 1) * limit).max(0));
            assert_eq!(
                body["properties"].as_array().unwrap().len() as i64,
                expected,
                "page {} limit {}",
                page,
                limit
            );
            assert_eq!(body["total"], total);
            assert_eq!(body["page"], page);
            assert_eq!(body["limit"], limit);
        }
    }
}

#[tokio::test]
async fn pages_are_newest_first_without_overlap() {
    let app = TestApp::new();
    let landlord = app.landlord("ordre@douala.cm").await;
    let mut ids = Vec::new();
    for _ in 0..4 {
        let created = app.create_property(&landlord.token, json!({})).await;
        ids.push(created["id"].as_i64().unwrap());
    }
    ids.reverse();

    let mut seen = Vec::new();
    for page in 1..=2 {
        let (_, body) = app
            .get(&format!("/api/properties?page={}&limit=2", page), None)
            .await;
        for property in body["properties"].as_array().unwrap() {
            seen.push(property["id"].as_i64().unwrap());
        }
    }
    assert_eq!(seen, ids);
}

#[tokio::test]
async fn price_bounds_apply_to_monthly_price() {
    let app = TestApp::new();
    let landlord = app.landlord("prix@douala.cm").await;
    for price in [30000, 50000, 75000, 120000] {
        app.create_property(&landlord.token, json!({ "monthlyPrice": price }))
            .await;
    }
    app.create_property(
        &landlord.token,
        json!({ "monthlyPrice": null, "nightlyPrice": 15000, "contractType": "short_term" }),
    )
    .await;

    let (_, body) = app
        .get("/api/properties?minPrice=50000&maxPrice=100000", None)
        .await;
    let prices: Vec<i64> = body["properties"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["monthlyPrice"].as_i64().unwrap())
        .collect();
    assert_eq!(prices.len(), 2);
    assert!(prices.iter().all(|p| (50000..=100000).contains(p)));

    let (_, body) = app.get("/api/properties?minPrice=0", None).await;
    assert_eq!(body["total"], 4);

    let (_, body) = app.get("/api/properties", None).await;
    assert_eq!(body["total"], 5);
}

#[tokio::test]
async fn inverted_price_range_is_a_validation_error() {
    let app = TestApp::new();
    let (status, body) = app
        .get("/api/properties?minPrice=90000&maxPrice=10000", None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"].is_object());
}

#[tokio::test]
async fn rooms_filter_is_a_minimum() {
    let app = TestApp::new();
    let landlord = app.landlord("pieces@douala.cm").await;
    for rooms in [1, 2, 4] {
        app.create_property(&landlord.token, json!({ "rooms": rooms }))
            .await;
    }
    let (_, body) = app.get("/api/properties?rooms=2", None).await;
    assert_eq!(body["total"], 2);
}

#[tokio::test]
async fn unverified_or_unsubscribed_landlords_cannot_create() {
    let app = TestApp::new();
    let cases = [
        ("nonverifie@douala.cm", false, SubscriptionStatus::Active, "verification"),
        ("inactif@douala.cm", true, SubscriptionStatus::Inactive, "subscription"),
        ("expire@douala.cm", true, SubscriptionStatus::Expired, "subscription"),
    ];
    for (email, verified, status, requires) in cases {
        let session = app.login(email, "landlord").await;
        app.set_account(session.id, verified, status).await;

        let (code, body) = app
            .post(
                "/api/landlord/properties",
                Some(&session.token),
                common::listing(json!({})),
            )
            .await;
        assert_eq!(code, StatusCode::FORBIDDEN, "{}", email);
        assert_eq!(body["requires"], requires, "{}", email);
        assert_eq!(app.owned_count(session.id).await, 0, "{}", email);
    }
}

#[tokio::test]
async fn refusal_comes_before_body_checks() {
    let app = TestApp::new();
    let session = app.login("brouillon@douala.cm", "landlord").await;
    app.set_account(session.id, false, SubscriptionStatus::Inactive).await;

    for body in [json!({}), json!({ "title": 42 })] {
        let (status, reply) = app
            .post("/api/landlord/properties", Some(&session.token), body)
            .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(reply["requires"], "verification");
    }

    let ready = app.landlord("brouillon-pret@douala.cm").await;
    let (status, _) = app
        .post("/api/landlord/properties", Some(&ready.token), json!({ "title": 42 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_amenities_keep_the_first_spelling() {
    let app = TestApp::new();
    let landlord = app.landlord("equipements@douala.cm").await;
    let created = app
        .create_property(
            &landlord.token,
            json!({ "amenities": ["WiFi", " wifi ", "Parking", "", "WIFI"] }),
        )
        .await;
    assert_eq!(created["amenities"], json!(["WiFi", "Parking"]));
}

#[tokio::test]
async fn renters_are_told_to_become_landlords() {
    let app = TestApp::new();
    let renter = app.login("locataire@yaounde.cm", "renter").await;
    app.set_account(renter.id, true, SubscriptionStatus::Active).await;
    let (status, body) = app
        .post(
            "/api/landlord/properties",
            Some(&renter.token),
            common::listing(json!({})),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["requires"], "landlord");
}

#[tokio::test]
async fn admins_create_regardless_of_account_state() {
    let app = TestApp::new();
    let admin = app.login(ADMIN_EMAIL, "renter").await;
    app.create_property(&admin.token, json!({})).await;
    assert_eq!(app.owned_count(admin.id).await, 1);

    let flagged = app.login("flag@kamer-rent.cm", "renter").await;
    app.store
        .update_user_admin(
            flagged.id,
            rental_marketplace::models::AdminUserChanges {
                is_admin: Some(true),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    app.create_property(&flagged.token, json!({})).await;
    assert_eq!(app.owned_count(flagged.id).await, 1);
}

#[tokio::test]
async fn created_listing_reads_back_unchanged() {
    let app = TestApp::new();
    let landlord = app.landlord("aller-retour@yaounde.cm").await;
    let input = common::listing(json!({
        "title": "Studio meublé à Bastos",
        "propertyType": "studio",
        "contractType": "short_term",
        "monthlyPrice": 200000,
        "nightlyPrice": 25000,
        "rooms": 1,
        "sizeSqm": 35,
        "regionId": CENTRE,
        "divisionId": MFOUNDI,
        "neighborhood": "Bastos",
        "address": "Avenue des Ambassades",
        "amenities": ["WiFi", "Climatisation", "Eau chaude"],
        "images": ["https://cdn.example.cm/bastos-1.jpg"],
    }));
    let created = app.create_property(&landlord.token, input.clone()).await;

    let (status, fetched) = app
        .get(
            &format!("/api/properties/{}", created["id"]),
            Some(&landlord.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    for (key, value) in input.as_object().unwrap() {
        assert_eq!(&fetched[key], value, "field {}", key);
    }
    assert_eq!(fetched["landlordId"], landlord.id.to_string());
    assert_eq!(fetched["isActive"], true);
}

#[tokio::test]
async fn division_outside_region_is_rejected() {
    let app = TestApp::new();
    let landlord = app.landlord("mauvaise-division@douala.cm").await;
    let (status, body) = app
        .post(
            "/api/landlord/properties",
            Some(&landlord.token),
            common::listing(json!({ "regionId": LITTORAL, "divisionId": MFOUNDI })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["errors"]["division_id"].is_array());
    assert_eq!(app.owned_count(landlord.id).await, 0);
}

#[tokio::test]
async fn other_landlords_listings_are_not_found() {
    let app = TestApp::new();
    let owner = app.landlord("proprietaire@douala.cm").await;
    let property = app.create_property(&owner.token, json!({})).await;
    let uri = format!("/api/landlord/properties/{}", property["id"]);

    let privileged = app.landlord("voisin@douala.cm").await;
    let unprivileged = app.login("voisin2@douala.cm", "landlord").await;
    for intruder in [&privileged, &unprivileged] {
        let (status, _) = app
            .put(&uri, Some(&intruder.token), json!({ "title": "Détourné" }))
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = app.delete(&uri, Some(&intruder.token)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    let (_, fetched) = app
        .get(&format!("/api/properties/{}", property["id"]), None)
        .await;
    assert_eq!(fetched["title"], property["title"]);
}

#[tokio::test]
async fn owners_update_without_an_active_subscription() {
    let app = TestApp::new();
    let owner = app.landlord("maj@douala.cm").await;
    let property = app.create_property(&owner.token, json!({})).await;
    app.set_account(owner.id, true, SubscriptionStatus::Expired).await;

    let (status, body) = app
        .put(
            &format!("/api/landlord/properties/{}", property["id"]),
            Some(&owner.token),
            json!({ "title": "Appartement rénové", "monthlyPrice": 175000, "sizeSqm": null }),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["title"], "Appartement rénové");
    assert_eq!(body["monthlyPrice"], 175000);
    assert_eq!(body["sizeSqm"], serde_json::Value::Null);
}

#[tokio::test]
async fn clearing_the_only_price_is_rejected() {
    let app = TestApp::new();
    let owner = app.landlord("sansprix@douala.cm").await;
    let property = app.create_property(&owner.token, json!({})).await;
    let (status, _) = app
        .put(
            &format!("/api/landlord/properties/{}", property["id"]),
            Some(&owner.token),
            json!({ "monthlyPrice": null }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn landlord_routes_require_a_session() {
    let app = TestApp::new();
    let (status, _) = app.get("/api/landlord/properties", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let renter = app.login("curieux@douala.cm", "renter").await;
    let (status, body) = app
        .get("/api/landlord/properties", Some(&renter.token))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn contact_details_need_a_subscription() {
    let app = TestApp::new();
    let owner = app.landlord("contact@douala.cm").await;
    let property = app.create_property(&owner.token, json!({})).await;
    let uri = format!("/api/properties/{}", property["id"]);

    let (_, anonymous) = app.get(&uri, None).await;
    assert_eq!(anonymous["contactVisible"], false);
    assert_eq!(anonymous["address"], serde_json::Value::Null);
    assert_eq!(anonymous["landlord"]["email"], serde_json::Value::Null);

    let renter = app.login("abonne@douala.cm", "renter").await;
    let (_, free) = app.get(&uri, Some(&renter.token)).await;
    assert_eq!(free["contactVisible"], false);

    app.set_account(renter.id, false, SubscriptionStatus::Active).await;
    let (_, paid) = app.get(&uri, Some(&renter.token)).await;
    assert_eq!(paid["contactVisible"], true);
    assert_eq!(paid["landlord"]["email"], "contact@douala.cm");
    assert_eq!(paid["address"], "Rue Njo-Njo, immeuble B");

    let (_, list) = app.get("/api/properties", None).await;
    assert_eq!(list["properties"][0]["address"], serde_json::Value::Null);
}

#[tokio::test]
async fn deleting_a_listing_removes_its_dependents() {
    let app = TestApp::new();
    let owner = app.landlord("cascade@douala.cm").await;
    let renter = app.login("renter-cascade@douala.cm", "renter").await;
    let property = app.create_property(&owner.token, json!({})).await;
    let id = property["id"].as_i64().unwrap();

    app.post(
        &format!("/api/properties/{}/reviews", id),
        Some(&renter.token),
        json!({ "rating": 4, "comment": "Très bien situé." }),
    )
    .await;
    app.post(
        &format!("/api/properties/{}/inquiries", id),
        None,
        json!({ "name": "Jean", "email": "jean@example.cm", "message": "Encore disponible ?" }),
    )
    .await;
    let (_, conversation) = app
        .post("/api/conversations", Some(&renter.token), json!({ "propertyId": id }))
        .await;

    let (status, _) = app
        .delete(&format!("/api/landlord/properties/{}", id), Some(&owner.token))
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/properties/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, reviews) = app.get(&format!("/api/properties/{}/reviews", id), None).await;
    assert_eq!(reviews, json!([]));
    let (_, inquiries) = app.get("/api/landlord/inquiries", Some(&owner.token)).await;
    assert_eq!(inquiries, json!([]));
    let (status, _) = app
        .get(
            &format!("/api/conversations/{}/messages", conversation["id"]),
            Some(&renter.token),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn regions_and_divisions_are_seeded() {
    let app = TestApp::new();
    let (_, regions) = app.get("/api/regions", None).await;
    assert_eq!(regions.as_array().unwrap().len(), 10);

    let (status, divisions) = app
        .get(&format!("/api/regions/{}/divisions", LITTORAL), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(divisions
        .as_array()
        .unwrap()
        .iter()
        .any(|d| d["id"] == WOURI && d["name"] == "Wouri"));

    let (status, _) = app.get("/api/regions/99/divisions", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
