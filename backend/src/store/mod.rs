//! Storage interface for the marketplace.
//!
//! [`PgStore`] is the production implementation over Diesel. [`MemoryStore`]
//! keeps everything in process and serves database-less runs and the test
//! suite. Both apply the same filtering, ordering and cascade rules.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    AdminUserChanges, Conversation, Division, Inquiry, InquiryStatus, Message, NewConversation,
    NewInquiry, NewMessage, NewProperty, NewReview, NewUser, ProfileChanges, Property,
    PropertyChanges, PropertyRecord, Region, Review, SubscriptionPlan, User,
};
use crate::search::{PropertyFilter, PropertyPage};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
    #[error("Blocking task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("{0}")]
    Conflict(String),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn list_regions(&self) -> Result<Vec<Region>, StoreError>;

    async fn get_region(&self, id: i32) -> Result<Option<Region>, StoreError>;

    async fn list_divisions(&self, region_id: i32) -> Result<Vec<Division>, StoreError>;

    async fn get_division(&self, id: i32) -> Result<Option<Division>, StoreError>;

    /// Creates the user on first login, otherwise refreshes the identity
    /// fields supplied by the identity provider.
    async fn upsert_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError>;

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Option<User>, StoreError>;

    async fn activate_subscription(
        &self,
        id: Uuid,
        plan: SubscriptionPlan,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError>;

    async fn update_user_admin(&self, id: Uuid, changes: AdminUserChanges) -> Result<Option<User>, StoreError>;

    /// Removes the account together with its listings and every
    /// conversation it takes part in. Reviews it wrote stay, detached.
    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError>;

    /// Active listings matching `filter`, newest first. The page and the
    /// total are read from the same snapshot.
    async fn list_properties(&self, filter: PropertyFilter) -> Result<PropertyPage, StoreError>;

    /// A single listing whether active or not.
    async fn get_property(&self, id: i32) -> Result<Option<PropertyRecord>, StoreError>;

    async fn properties_by_landlord(&self, landlord_id: Uuid) -> Result<Vec<PropertyRecord>, StoreError>;

    async fn create_property(&self, property: NewProperty) -> Result<Property, StoreError>;

    /// Applies `changes` only when `landlord_id` owns the listing.
    async fn update_property(
        &self,
        id: i32,
        landlord_id: Uuid,
        changes: PropertyChanges,
    ) -> Result<Option<Property>, StoreError>;

    /// Hard delete, owner-scoped. Conversations, messages, inquiries and
    /// reviews of the listing go with it.
    async fn delete_property(&self, id: i32, landlord_id: Uuid) -> Result<bool, StoreError>;

    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, StoreError>;

    async fn inquiries_for_landlord(&self, landlord_id: Uuid) -> Result<Vec<Inquiry>, StoreError>;

    async fn update_inquiry_status(
        &self,
        id: i32,
        landlord_id: Uuid,
        status: InquiryStatus,
    ) -> Result<Option<Inquiry>, StoreError>;

    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError>;

    async fn reviews_for_property(&self, property_id: i32) -> Result<Vec<Review>, StoreError>;

    async fn mark_review_helpful(&self, id: i32) -> Result<Option<Review>, StoreError>;

    async fn set_review_verified(&self, id: i32, verified: bool) -> Result<Option<Review>, StoreError>;

    /// Returns the conversation for the (property, landlord, renter) triple,
    /// creating it on first contact.
    async fn find_or_create_conversation(&self, conversation: NewConversation) -> Result<Conversation, StoreError>;

    async fn get_conversation(&self, id: i32) -> Result<Option<Conversation>, StoreError>;

    /// Conversations `user_id` takes part in, most recent activity first.
    async fn conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, StoreError>;

    /// Stores the message and bumps the conversation's `last_message_at`.
    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError>;

    async fn messages_in_conversation(&self, conversation_id: i32) -> Result<Vec<Message>, StoreError>;

    /// Marks every unread message sent to `reader_id` in the conversation
    /// as read. Returns how many changed.
    async fn mark_messages_read(&self, conversation_id: i32, reader_id: Uuid) -> Result<usize, StoreError>;
}
