use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::cmp::Reverse;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::models::{
    AdminUserChanges, Conversation, Division, Inquiry, InquiryStatus, Language, Message,
    NewConversation, NewInquiry, NewMessage, NewProperty, NewReview, NewUser, ProfileChanges,
    Property, PropertyChanges, PropertyRecord, Region, Review, SubscriptionPlan,
    SubscriptionStatus, User,
};
use crate::regions::{DIVISIONS, REGIONS};
use crate::search::{PropertyFilter, PropertyPage};

#[derive(Default)]
struct Tables {
    regions: Vec<Region>,
    divisions: Vec<Division>,
    users: Vec<User>,
    properties: Vec<Property>,
    inquiries: Vec<Inquiry>,
    reviews: Vec<Review>,
    conversations: Vec<Conversation>,
    messages: Vec<Message>,
    last_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    /// Joins a property with its landlord, region and division. Rows with a
    /// dangling reference are skipped, as an inner join would.
    fn hydrate(&self, property: &Property) -> Option<PropertyRecord> {
        Some(PropertyRecord {
            property: property.clone(),
            landlord: self.users.iter().find(|u| u.id == property.landlord_id)?.clone(),
            region: self.regions.iter().find(|r| r.id == property.region_id)?.clone(),
            division: self.divisions.iter().find(|d| d.id == property.division_id)?.clone(),
        })
    }

    fn remove_conversations(&mut self, doomed: impl Fn(&Conversation) -> bool) {
        let ids: Vec<i32> = self
            .conversations
            .iter()
            .filter(|c| doomed(c))
            .map(|c| c.id)
            .collect();
        self.conversations.retain(|c| !ids.contains(&c.id));
        self.messages.retain(|m| !ids.contains(&m.conversation_id));
    }

    fn remove_property(&mut self, id: i32) {
        self.properties.retain(|p| p.id != id);
        self.inquiries.retain(|i| i.property_id != id);
        self.reviews.retain(|r| r.property_id != id);
        self.remove_conversations(|c| c.property_id == id);
    }
}

/// Newest first, ties broken by id so insertion order decides.
fn newest_first(properties: &mut [&Property]) {
    properties.sort_by_key(|p| Reverse((p.created_at, p.id)));
}

/// Keeps every table in memory behind one lock. Seeded with the same
/// regions and divisions as the database migrations.
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let tables = Tables {
            regions: REGIONS
                .iter()
                .map(|&(id, name, name_en, slug)| Region {
                    id,
                    name: name.to_string(),
                    name_en: name_en.to_string(),
                    slug: slug.to_string(),
                })
                .collect(),
            divisions: DIVISIONS
                .iter()
                .map(|&(id, region_id, name, slug)| Division {
                    id,
                    region_id,
                    name: name.to_string(),
                    slug: slug.to_string(),
                })
                .collect(),
            ..Tables::default()
        };
        Self {
            tables: RwLock::new(tables),
        }
    }
}

fn apply_profile(user: &mut User, changes: ProfileChanges) {
    if let Some(first_name) = changes.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = changes.last_name {
        user.last_name = last_name;
    }
    if let Some(phone) = changes.phone {
        user.phone = phone;
    }
    if let Some(profile_image_url) = changes.profile_image_url {
        user.profile_image_url = profile_image_url;
    }
    if let Some(language) = changes.preferred_language {
        user.preferred_language = language;
    }
    if let Some(role) = changes.role {
        user.role = role;
    }
}

fn apply_property(property: &mut Property, changes: PropertyChanges) {
    let PropertyChanges {
        title,
        description,
        property_type,
        contract_type,
        monthly_price,
        nightly_price,
        rooms,
        size_sqm,
        region_id,
        division_id,
        neighborhood,
        address,
        amenities,
        images,
        is_active,
    } = changes;
    if let Some(v) = title {
        property.title = v;
    }
    if let Some(v) = description {
        property.description = v;
    }
    if let Some(v) = property_type {
        property.property_type = v;
    }
    if let Some(v) = contract_type {
        property.contract_type = v;
    }
    if let Some(v) = monthly_price {
        property.monthly_price = v;
    }
    if let Some(v) = nightly_price {
        property.nightly_price = v;
    }
    if let Some(v) = rooms {
        property.rooms = v;
    }
    if let Some(v) = size_sqm {
        property.size_sqm = v;
    }
    if let Some(v) = region_id {
        property.region_id = v;
    }
    if let Some(v) = division_id {
        property.division_id = v;
    }
    if let Some(v) = neighborhood {
        property.neighborhood = v;
    }
    if let Some(v) = address {
        property.address = v;
    }
    if let Some(v) = amenities {
        property.amenities = v;
    }
    if let Some(v) = images {
        property.images = v;
    }
    if let Some(v) = is_active {
        property.is_active = v;
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_regions(&self) -> Result<Vec<Region>, StoreError> {
        Ok(self.tables.read().await.regions.clone())
    }

    async fn get_region(&self, id: i32) -> Result<Option<Region>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.regions.iter().find(|r| r.id == id).cloned())
    }

    async fn list_divisions(&self, region_id: i32) -> Result<Vec<Division>, StoreError> {
        let tables = self.tables.read().await;
        let mut divisions: Vec<Division> = tables
            .divisions
            .iter()
            .filter(|d| d.region_id == region_id)
            .cloned()
            .collect();
        divisions.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(divisions)
    }

    async fn get_division(&self, id: i32) -> Result<Option<Division>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.divisions.iter().find(|d| d.id == id).cloned())
    }

    async fn upsert_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        if let Some(existing) = tables.users.iter_mut().find(|u| u.email == user.email) {
            existing.first_name = user.first_name;
            existing.last_name = user.last_name;
            existing.profile_image_url = user.profile_image_url;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let created = User {
            id: Uuid::new_v4(),
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            phone: None,
            profile_image_url: user.profile_image_url,
            role: user.role,
            is_verified: false,
            is_admin: false,
            subscription_type: None,
            subscription_status: SubscriptionStatus::Inactive,
            subscription_expires_at: None,
            preferred_language: Language::Fr,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            apply_profile(user, changes);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn activate_subscription(
        &self,
        id: Uuid,
        plan: SubscriptionPlan,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.subscription_type = Some(plan);
            user.subscription_status = SubscriptionStatus::Active;
            user.subscription_expires_at = Some(expires_at);
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn update_user_admin(&self, id: Uuid, changes: AdminUserChanges) -> Result<Option<User>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            if let Some(v) = changes.is_verified {
                user.is_verified = v;
            }
            if let Some(v) = changes.is_admin {
                user.is_admin = v;
            }
            if let Some(v) = changes.subscription_type {
                user.subscription_type = v;
            }
            if let Some(v) = changes.subscription_status {
                user.subscription_status = v;
            }
            if let Some(v) = changes.subscription_expires_at {
                user.subscription_expires_at = v;
            }
            user.updated_at = Utc::now();
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        let owned: Vec<i32> = tables
            .properties
            .iter()
            .filter(|p| p.landlord_id == id)
            .map(|p| p.id)
            .collect();
        for property_id in owned {
            tables.remove_property(property_id);
        }
        tables.remove_conversations(|c| c.is_participant(id));
        for review in tables.reviews.iter_mut().filter(|r| r.user_id == Some(id)) {
            review.user_id = None;
        }
        Ok(true)
    }

    async fn list_properties(&self, filter: PropertyFilter) -> Result<PropertyPage, StoreError> {
        let tables = self.tables.read().await;
        let mut matching: Vec<&Property> = tables
            .properties
            .iter()
            .filter(|p| filter.matches(p))
            .collect();
        newest_first(&mut matching);
        let total = matching.len() as i64;
        let properties = matching
            .into_iter()
            .skip(filter.offset().max(0) as usize)
            .take(filter.limit.max(0) as usize)
            .filter_map(|p| tables.hydrate(p))
            .collect();
        Ok(PropertyPage { properties, total })
    }

    async fn get_property(&self, id: i32) -> Result<Option<PropertyRecord>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .properties
            .iter()
            .find(|p| p.id == id)
            .and_then(|p| tables.hydrate(p)))
    }

    async fn properties_by_landlord(&self, landlord_id: Uuid) -> Result<Vec<PropertyRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut owned: Vec<&Property> = tables
            .properties
            .iter()
            .filter(|p| p.landlord_id == landlord_id)
            .collect();
        newest_first(&mut owned);
        Ok(owned.into_iter().filter_map(|p| tables.hydrate(p)).collect())
    }

    async fn create_property(&self, property: NewProperty) -> Result<Property, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let created = Property {
            id: tables.next_id(),
            landlord_id: property.landlord_id,
            title: property.title,
            description: property.description,
            property_type: property.property_type,
            contract_type: property.contract_type,
            monthly_price: property.monthly_price,
            nightly_price: property.nightly_price,
            rooms: property.rooms,
            size_sqm: property.size_sqm,
            region_id: property.region_id,
            division_id: property.division_id,
            neighborhood: property.neighborhood,
            address: property.address,
            amenities: property.amenities,
            images: property.images,
            is_active: property.is_active,
            created_at: now,
            updated_at: now,
        };
        tables.properties.push(created.clone());
        Ok(created)
    }

    async fn update_property(
        &self,
        id: i32,
        landlord_id: Uuid,
        changes: PropertyChanges,
    ) -> Result<Option<Property>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables
            .properties
            .iter_mut()
            .find(|p| p.id == id && p.landlord_id == landlord_id)
            .map(|property| {
                apply_property(property, changes);
                property.updated_at = Utc::now();
                property.clone()
            }))
    }

    async fn delete_property(&self, id: i32, landlord_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let owned = tables
            .properties
            .iter()
            .any(|p| p.id == id && p.landlord_id == landlord_id);
        if owned {
            tables.remove_property(id);
        }
        Ok(owned)
    }

    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, StoreError> {
        let mut tables = self.tables.write().await;
        let created = Inquiry {
            id: tables.next_id(),
            property_id: inquiry.property_id,
            name: inquiry.name,
            email: inquiry.email,
            phone: inquiry.phone,
            message: inquiry.message,
            status: inquiry.status,
            created_at: Utc::now(),
        };
        tables.inquiries.push(created.clone());
        Ok(created)
    }

    async fn inquiries_for_landlord(&self, landlord_id: Uuid) -> Result<Vec<Inquiry>, StoreError> {
        let tables = self.tables.read().await;
        let mut found: Vec<Inquiry> = tables
            .inquiries
            .iter()
            .filter(|i| {
                tables
                    .properties
                    .iter()
                    .any(|p| p.id == i.property_id && p.landlord_id == landlord_id)
            })
            .cloned()
            .collect();
        found.sort_by_key(|i| Reverse((i.created_at, i.id)));
        Ok(found)
    }

    async fn update_inquiry_status(
        &self,
        id: i32,
        landlord_id: Uuid,
        status: InquiryStatus,
    ) -> Result<Option<Inquiry>, StoreError> {
        let mut tables = self.tables.write().await;
        let owned: Vec<i32> = tables
            .properties
            .iter()
            .filter(|p| p.landlord_id == landlord_id)
            .map(|p| p.id)
            .collect();
        Ok(tables
            .inquiries
            .iter_mut()
            .find(|i| i.id == id && owned.contains(&i.property_id))
            .map(|inquiry| {
                inquiry.status = status;
                inquiry.clone()
            }))
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError> {
        let mut tables = self.tables.write().await;
        let created = Review {
            id: tables.next_id(),
            property_id: review.property_id,
            user_id: review.user_id,
            reviewer_name: review.reviewer_name,
            rating: review.rating,
            comment: review.comment,
            is_verified: false,
            helpful_count: 0,
            created_at: Utc::now(),
        };
        tables.reviews.push(created.clone());
        Ok(created)
    }

    async fn reviews_for_property(&self, property_id: i32) -> Result<Vec<Review>, StoreError> {
        let tables = self.tables.read().await;
        let mut found: Vec<Review> = tables
            .reviews
            .iter()
            .filter(|r| r.property_id == property_id)
            .cloned()
            .collect();
        found.sort_by_key(|r| Reverse((r.created_at, r.id)));
        Ok(found)
    }

    async fn mark_review_helpful(&self, id: i32) -> Result<Option<Review>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.reviews.iter_mut().find(|r| r.id == id).map(|review| {
            review.helpful_count += 1;
            review.clone()
        }))
    }

    async fn set_review_verified(&self, id: i32, verified: bool) -> Result<Option<Review>, StoreError> {
        let mut tables = self.tables.write().await;
        Ok(tables.reviews.iter_mut().find(|r| r.id == id).map(|review| {
            review.is_verified = verified;
            review.clone()
        }))
    }

    async fn find_or_create_conversation(&self, conversation: NewConversation) -> Result<Conversation, StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.conversations.iter().find(|c| {
            c.property_id == conversation.property_id
                && c.landlord_id == conversation.landlord_id
                && c.renter_id == conversation.renter_id
        }) {
            return Ok(existing.clone());
        }
        let created = Conversation {
            id: tables.next_id(),
            property_id: conversation.property_id,
            landlord_id: conversation.landlord_id,
            renter_id: conversation.renter_id,
            last_message_at: None,
            created_at: Utc::now(),
        };
        tables.conversations.push(created.clone());
        Ok(created)
    }

    async fn get_conversation(&self, id: i32) -> Result<Option<Conversation>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.conversations.iter().find(|c| c.id == id).cloned())
    }

    async fn conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, StoreError> {
        let tables = self.tables.read().await;
        let mut found: Vec<Conversation> = tables
            .conversations
            .iter()
            .filter(|c| c.is_participant(user_id))
            .cloned()
            .collect();
        // `None` sorts below `Some`, so reversing puts silent conversations last.
        found.sort_by_key(|c| Reverse((c.last_message_at, c.created_at)));
        Ok(found)
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        let mut tables = self.tables.write().await;
        let created = Message {
            id: tables.next_id(),
            conversation_id: message.conversation_id,
            sender_id: message.sender_id,
            content: message.content,
            message_type: message.message_type,
            is_read: false,
            read_at: None,
            created_at: Utc::now(),
        };
        if let Some(conversation) = tables
            .conversations
            .iter_mut()
            .find(|c| c.id == created.conversation_id)
        {
            conversation.last_message_at = Some(created.created_at);
        }
        tables.messages.push(created.clone());
        Ok(created)
    }

    async fn messages_in_conversation(&self, conversation_id: i32) -> Result<Vec<Message>, StoreError> {
        let tables = self.tables.read().await;
        let mut found: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        found.sort_by_key(|m| (m.created_at, m.id));
        Ok(found)
    }

    async fn mark_messages_read(&self, conversation_id: i32, reader_id: Uuid) -> Result<usize, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for message in tables.messages.iter_mut().filter(|m| {
            m.conversation_id == conversation_id && m.sender_id != reader_id && !m.is_read
        }) {
            message.is_read = true;
            message.read_at = Some(now);
            changed += 1;
        }
        Ok(changed)
    }
}
