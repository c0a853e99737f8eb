#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use rental_marketplace::auth::IdentityClaims;
use rental_marketplace::config::AppConfig;
use rental_marketplace::models::{AdminUserChanges, SubscriptionPlan, SubscriptionStatus};
use rental_marketplace::store::{MemoryStore, Store};
use rental_marketplace::{router, AppState};

pub const ADMIN_EMAIL: &str = "staff@kamer-rent.cm";
pub const IDP_SECRET: &str = "idp-integration-secret";
/// Littoral region and its Wouri division (Douala).
pub const LITTORAL: i32 = 5;
pub const WOURI: i32 = 29;
/// Centre region's Mfoundi division (Yaoundé).
pub const CENTRE: i32 = 2;
pub const MFOUNDI: i32 = 12;

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: None,
        host: "127.0.0.1".to_string(),
        port: 0,
        jwt_secret: "integration-secret".to_string(),
        idp_secret: IDP_SECRET.to_string(),
        jwt_ttl_hours: 1,
        database_pool_size: 1,
        default_page_size: 12,
        max_page_size: 100,
        admin_emails: vec![ADMIN_EMAIL.to_string()],
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    router: Router,
}

pub struct Session {
    pub id: Uuid,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState::new(test_config(), store.clone());
        Self {
            router: router(state.clone()),
            state,
            store,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    pub async fn put(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.request(Method::PUT, uri, token, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, token, None).await
    }

    pub async fn login(&self, email: &str, role: &str) -> Session {
        let (status, body) = self
            .post(
                "/api/auth/login",
                None,
                json!({ "assertion": assertion(email, role, IDP_SECRET) }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        Session {
            id: body["user"]["id"].as_str().unwrap().parse().unwrap(),
            token: body["token"].as_str().unwrap().to_string(),
        }
    }

    pub async fn set_account(&self, id: Uuid, verified: bool, status: SubscriptionStatus) {
        let expires_at = match status {
            SubscriptionStatus::Active => Some(Utc::now() + Duration::days(30)),
            _ => None,
        };
        self.store
            .update_user_admin(
                id,
                AdminUserChanges {
                    is_verified: Some(verified),
                    subscription_type: Some(Some(SubscriptionPlan::Monthly)),
                    subscription_status: Some(status),
                    subscription_expires_at: Some(expires_at),
                    ..AdminUserChanges::default()
                },
            )
            .await
            .unwrap();
    }

    /// A verified landlord with an active subscription.
    pub async fn landlord(&self, email: &str) -> Session {
        let session = self.login(email, "landlord").await;
        self.set_account(session.id, true, SubscriptionStatus::Active).await;
        session
    }

    pub async fn create_property(&self, token: &str, overrides: Value) -> Value {
        let (status, body) = self
            .post("/api/landlord/properties", Some(token), listing(overrides))
            .await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body
    }

    pub async fn owned_count(&self, landlord_id: Uuid) -> usize {
        self.store.properties_by_landlord(landlord_id).await.unwrap().len()
    }
}

/// Signs identity claims the way the identity provider does.
pub fn assertion(email: &str, role: &str, secret: &str) -> String {
    let claims = IdentityClaims {
        email: email.to_string(),
        first_name: Some("Test".to_string()),
        last_name: Some("User".to_string()),
        profile_image_url: None,
        role: Some(role.parse().unwrap()),
        exp: (Utc::now() + Duration::minutes(10)).timestamp() as usize,
    };
    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

/// A valid listing in Douala, with `overrides` merged on top.
pub fn listing(overrides: Value) -> Value {
    let mut body = json!({
        "title": "Appartement 2 chambres à Bonapriso",
        "description": "Bel appartement lumineux, proche des commerces et des écoles.",
        "propertyType": "apartment",
        "contractType": "long_term",
        "monthlyPrice": 150000,
        "rooms": 2,
        "regionId": LITTORAL,
        "divisionId": WOURI,
        "neighborhood": "Bonapriso",
        "address": "Rue Njo-Njo, immeuble B",
        "amenities": ["wifi", "parking"],
    });
    if let (Some(base), Some(extra)) = (body.as_object_mut(), overrides.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    body
}

impl TestApp {
    pub async fn store_user(&self, id: Uuid) -> rental_marketplace::models::User {
        self.store.get_user(id).await.unwrap().unwrap()
    }
}
