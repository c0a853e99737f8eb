use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::relay::{self, Relay};
use crate::store::Store;
use crate::{account, admin, conversation, inquiry, property, region, review};

/// Shared by every handler. Cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Arc<dyn Store>,
    pub relay: Relay,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>) -> Self {
        Self {
            config,
            store,
            relay: Relay::new(),
        }
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(account::login))
        .route("/auth/user", get(account::current_user))
        .route("/regions", get(region::list_regions))
        .route("/regions/:id/divisions", get(region::list_divisions))
        .route("/properties", get(property::list_properties))
        .route("/properties/:id", get(property::get_property))
        .route(
            "/properties/:id/reviews",
            get(review::list_reviews).post(review::create_review),
        )
        .route("/properties/:id/inquiries", post(inquiry::create_inquiry))
        .route("/reviews/:id/helpful", post(review::mark_helpful))
        .route(
            "/landlord/properties",
            get(property::landlord_properties).post(property::create_property),
        )
        .route(
            "/landlord/properties/:id",
            put(property::update_property).delete(property::delete_property),
        )
        .route("/landlord/inquiries", get(inquiry::landlord_inquiries))
        .route("/landlord/inquiries/:id", put(inquiry::update_inquiry))
        .route(
            "/profile",
            put(account::update_profile).delete(account::delete_account),
        )
        .route("/subscription", post(account::activate_subscription))
        .route("/admin/users/:id", put(admin::update_user))
        .route("/admin/reviews/:id", put(admin::moderate_review))
        .route(
            "/conversations",
            get(conversation::list_conversations).post(conversation::start_conversation),
        )
        .route(
            "/conversations/:id/messages",
            get(conversation::list_messages).post(conversation::send_message),
        )
        .route("/conversations/:id/read", put(conversation::mark_read));

    Router::new()
        .nest("/api", api)
        .route("/ws", get(relay::socket_handler))
        .with_state(state)
}
