use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel::upsert::excluded;
use uuid::Uuid;

use super::{Store, StoreError};
use crate::db::PgPool;
use crate::models::{
    AdminUserChanges, Conversation, Division, Inquiry, InquiryStatus, Language, Message,
    NewConversation, NewInquiry, NewMessage, NewProperty, NewReview, NewUser, ProfileChanges,
    Property, PropertyChanges, PropertyRecord, Region, Review, SubscriptionPlan,
    SubscriptionStatus, User,
};
use crate::schema::{
    conversations, divisions, inquiries, messages, properties, regions, reviews, users,
};
use crate::search::{PropertyFilter, PropertyPage};

type RecordRow = (Property, User, Region, Division);

fn into_record((property, landlord, region, division): RecordRow) -> PropertyRecord {
    PropertyRecord {
        property,
        landlord,
        region,
        division,
    }
}

/// Properties joined with landlord, region and division.
macro_rules! hydrated {
    () => {
        properties::table
            .inner_join(users::table)
            .inner_join(regions::table)
            .inner_join(divisions::table)
            .select((
                Property::as_select(),
                User::as_select(),
                Region::as_select(),
                Division::as_select(),
            ))
    };
}

/// Boxes `$query` and narrows it to the active listings matching `$filter`.
macro_rules! apply_filter {
    ($query:expr, $filter:expr) => {{
        let filter: &PropertyFilter = $filter;
        let mut query = $query
            .filter(properties::is_active.eq(true))
            .into_boxed::<Pg>();
        if let Some(region_id) = filter.region_id {
            query = query.filter(properties::region_id.eq(region_id));
        }
        if let Some(division_id) = filter.division_id {
            query = query.filter(properties::division_id.eq(division_id));
        }
        if let Some(property_type) = filter.property_type {
            query = query.filter(properties::property_type.eq(property_type));
        }
        if let Some(contract_type) = filter.contract_type {
            query = query.filter(properties::contract_type.eq(contract_type));
        }
        if let Some(rooms) = filter.min_rooms {
            query = query.filter(properties::rooms.ge(rooms));
        }
        if filter.has_price_filter() {
            query = query.filter(properties::monthly_price.is_not_null());
        }
        if let Some(min_price) = filter.min_price {
            query = query.filter(properties::monthly_price.ge(min_price));
        }
        if let Some(max_price) = filter.max_price {
            query = query.filter(properties::monthly_price.le(max_price));
        }
        query
    }};
}

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Runs blocking Diesel work on a pooled connection off the async runtime.
    async fn run<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = pool.get()?;
            f(&mut conn).map_err(classify)
        })
        .await?
    }
}

/// Constraint violations are the caller's problem, not an outage.
fn classify(error: StoreError) -> StoreError {
    use diesel::result::{DatabaseErrorKind, Error};

    match error {
        StoreError::Database(Error::DatabaseError(
            kind @ (DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation),
            info,
        )) => {
            log::debug!("Constraint violation ({:?}): {}", kind, info.message());
            StoreError::Conflict("The request conflicts with existing data".to_string())
        }
        other => other,
    }
}

#[async_trait]
impl Store for PgStore {
    async fn list_regions(&self) -> Result<Vec<Region>, StoreError> {
        self.run(|conn| {
            Ok(regions::table
                .select(Region::as_select())
                .order(regions::id)
                .load(conn)?)
        })
        .await
    }

    async fn get_region(&self, id: i32) -> Result<Option<Region>, StoreError> {
        self.run(move |conn| {
            Ok(regions::table
                .find(id)
                .select(Region::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn list_divisions(&self, region_id: i32) -> Result<Vec<Division>, StoreError> {
        self.run(move |conn| {
            Ok(divisions::table
                .filter(divisions::region_id.eq(region_id))
                .select(Division::as_select())
                .order(divisions::name)
                .load(conn)?)
        })
        .await
    }

    async fn get_division(&self, id: i32) -> Result<Option<Division>, StoreError> {
        self.run(move |conn| {
            Ok(divisions::table
                .find(id)
                .select(Division::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn upsert_user(&self, user: NewUser) -> Result<User, StoreError> {
        self.run(move |conn| {
            let now = Utc::now();
            let row = diesel::insert_into(users::table)
                .values((
                    users::id.eq(Uuid::new_v4()),
                    users::email.eq(&user.email),
                    users::first_name.eq(&user.first_name),
                    users::last_name.eq(&user.last_name),
                    users::profile_image_url.eq(&user.profile_image_url),
                    users::role.eq(user.role),
                    users::subscription_status.eq(SubscriptionStatus::Inactive),
                    users::preferred_language.eq(Language::Fr),
                    users::created_at.eq(now),
                    users::updated_at.eq(now),
                ))
                .on_conflict(users::email)
                .do_update()
                .set((
                    users::first_name.eq(excluded(users::first_name)),
                    users::last_name.eq(excluded(users::last_name)),
                    users::profile_image_url.eq(excluded(users::profile_image_url)),
                    users::updated_at.eq(now),
                ))
                .returning(User::as_returning())
                .get_result(conn)?;
            Ok(row)
        })
        .await
    }

    async fn get_user(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        self.run(move |conn| {
            Ok(users::table
                .find(id)
                .select(User::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn update_profile(&self, id: Uuid, changes: ProfileChanges) -> Result<Option<User>, StoreError> {
        self.run(move |conn| {
            Ok(diesel::update(users::table.find(id))
                .set((&changes, users::updated_at.eq(Utc::now())))
                .returning(User::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    async fn activate_subscription(
        &self,
        id: Uuid,
        plan: SubscriptionPlan,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<User>, StoreError> {
        self.run(move |conn| {
            Ok(diesel::update(users::table.find(id))
                .set((
                    users::subscription_type.eq(Some(plan)),
                    users::subscription_status.eq(SubscriptionStatus::Active),
                    users::subscription_expires_at.eq(Some(expires_at)),
                    users::updated_at.eq(Utc::now()),
                ))
                .returning(User::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    async fn update_user_admin(&self, id: Uuid, changes: AdminUserChanges) -> Result<Option<User>, StoreError> {
        self.run(move |conn| {
            Ok(diesel::update(users::table.find(id))
                .set((&changes, users::updated_at.eq(Utc::now())))
                .returning(User::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    async fn delete_user(&self, id: Uuid) -> Result<bool, StoreError> {
        // Foreign keys cascade to listings, conversations and messages.
        self.run(move |conn| Ok(diesel::delete(users::table.find(id)).execute(conn)? > 0))
            .await
    }

    async fn list_properties(&self, filter: PropertyFilter) -> Result<PropertyPage, StoreError> {
        self.run(move |conn| {
            let (rows, total) = conn
                .build_transaction()
                .read_only()
                .repeatable_read()
                .run(|conn| {
                    let rows = apply_filter!(hydrated!(), &filter)
                        .order((properties::created_at.desc(), properties::id.desc()))
                        .limit(filter.limit)
                        .offset(filter.offset())
                        .load::<RecordRow>(conn)?;
                    let total = apply_filter!(properties::table, &filter)
                        .count()
                        .get_result::<i64>(conn)?;
                    Ok::<_, diesel::result::Error>((rows, total))
                })?;
            log::debug!("Property search matched {} rows, returning {}", total, rows.len());
            Ok(PropertyPage {
                properties: rows.into_iter().map(into_record).collect(),
                total,
            })
        })
        .await
    }

    async fn get_property(&self, id: i32) -> Result<Option<PropertyRecord>, StoreError> {
        self.run(move |conn| {
            let row = hydrated!()
                .filter(properties::id.eq(id))
                .first::<RecordRow>(conn)
                .optional()?;
            Ok(row.map(into_record))
        })
        .await
    }

    async fn properties_by_landlord(&self, landlord_id: Uuid) -> Result<Vec<PropertyRecord>, StoreError> {
        self.run(move |conn| {
            let rows = hydrated!()
                .filter(properties::landlord_id.eq(landlord_id))
                .order((properties::created_at.desc(), properties::id.desc()))
                .load::<RecordRow>(conn)?;
            Ok(rows.into_iter().map(into_record).collect())
        })
        .await
    }

    async fn create_property(&self, property: NewProperty) -> Result<Property, StoreError> {
        self.run(move |conn| {
            Ok(diesel::insert_into(properties::table)
                .values(property)
                .returning(Property::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    async fn update_property(
        &self,
        id: i32,
        landlord_id: Uuid,
        changes: PropertyChanges,
    ) -> Result<Option<Property>, StoreError> {
        self.run(move |conn| {
            let owned = properties::table
                .filter(properties::id.eq(id))
                .filter(properties::landlord_id.eq(landlord_id));
            Ok(diesel::update(owned)
                .set((&changes, properties::updated_at.eq(Utc::now())))
                .returning(Property::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    async fn delete_property(&self, id: i32, landlord_id: Uuid) -> Result<bool, StoreError> {
        // Dependent conversations, inquiries and reviews cascade in the schema.
        self.run(move |conn| {
            let owned = properties::table
                .filter(properties::id.eq(id))
                .filter(properties::landlord_id.eq(landlord_id));
            Ok(diesel::delete(owned).execute(conn)? > 0)
        })
        .await
    }

    async fn create_inquiry(&self, inquiry: NewInquiry) -> Result<Inquiry, StoreError> {
        self.run(move |conn| {
            Ok(diesel::insert_into(inquiries::table)
                .values(inquiry)
                .returning(Inquiry::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    async fn inquiries_for_landlord(&self, landlord_id: Uuid) -> Result<Vec<Inquiry>, StoreError> {
        self.run(move |conn| {
            Ok(inquiries::table
                .inner_join(properties::table)
                .filter(properties::landlord_id.eq(landlord_id))
                .select(Inquiry::as_select())
                .order((inquiries::created_at.desc(), inquiries::id.desc()))
                .load(conn)?)
        })
        .await
    }

    async fn update_inquiry_status(
        &self,
        id: i32,
        landlord_id: Uuid,
        status: InquiryStatus,
    ) -> Result<Option<Inquiry>, StoreError> {
        self.run(move |conn| {
            let owned_properties = properties::table
                .filter(properties::landlord_id.eq(landlord_id))
                .select(properties::id);
            let target = inquiries::table
                .filter(inquiries::id.eq(id))
                .filter(inquiries::property_id.eq_any(owned_properties));
            Ok(diesel::update(target)
                .set(inquiries::status.eq(status))
                .returning(Inquiry::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    async fn create_review(&self, review: NewReview) -> Result<Review, StoreError> {
        self.run(move |conn| {
            Ok(diesel::insert_into(reviews::table)
                .values(review)
                .returning(Review::as_returning())
                .get_result(conn)?)
        })
        .await
    }

    async fn reviews_for_property(&self, property_id: i32) -> Result<Vec<Review>, StoreError> {
        self.run(move |conn| {
            Ok(reviews::table
                .filter(reviews::property_id.eq(property_id))
                .select(Review::as_select())
                .order((reviews::created_at.desc(), reviews::id.desc()))
                .load(conn)?)
        })
        .await
    }

    async fn mark_review_helpful(&self, id: i32) -> Result<Option<Review>, StoreError> {
        self.run(move |conn| {
            Ok(diesel::update(reviews::table.find(id))
                .set(reviews::helpful_count.eq(reviews::helpful_count + 1))
                .returning(Review::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    async fn set_review_verified(&self, id: i32, verified: bool) -> Result<Option<Review>, StoreError> {
        self.run(move |conn| {
            Ok(diesel::update(reviews::table.find(id))
                .set(reviews::is_verified.eq(verified))
                .returning(Review::as_returning())
                .get_result(conn)
                .optional()?)
        })
        .await
    }

    async fn find_or_create_conversation(&self, conversation: NewConversation) -> Result<Conversation, StoreError> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                diesel::insert_into(conversations::table)
                    .values(&conversation)
                    .on_conflict((
                        conversations::property_id,
                        conversations::landlord_id,
                        conversations::renter_id,
                    ))
                    .do_nothing()
                    .execute(conn)?;
                conversations::table
                    .filter(conversations::property_id.eq(conversation.property_id))
                    .filter(conversations::landlord_id.eq(conversation.landlord_id))
                    .filter(conversations::renter_id.eq(conversation.renter_id))
                    .select(Conversation::as_select())
                    .first(conn)
            })
            .map_err(StoreError::from)
        })
        .await
    }

    async fn get_conversation(&self, id: i32) -> Result<Option<Conversation>, StoreError> {
        self.run(move |conn| {
            Ok(conversations::table
                .find(id)
                .select(Conversation::as_select())
                .first(conn)
                .optional()?)
        })
        .await
    }

    async fn conversations_for_user(&self, user_id: Uuid) -> Result<Vec<Conversation>, StoreError> {
        self.run(move |conn| {
            Ok(conversations::table
                .filter(
                    conversations::landlord_id
                        .eq(user_id)
                        .or(conversations::renter_id.eq(user_id)),
                )
                .select(Conversation::as_select())
                .order((
                    conversations::last_message_at.desc().nulls_last(),
                    conversations::created_at.desc(),
                ))
                .load(conn)?)
        })
        .await
    }

    async fn create_message(&self, message: NewMessage) -> Result<Message, StoreError> {
        self.run(move |conn| {
            conn.transaction(|conn| {
                let stored = diesel::insert_into(messages::table)
                    .values(&message)
                    .returning(Message::as_returning())
                    .get_result(conn)?;
                diesel::update(conversations::table.find(stored.conversation_id))
                    .set(conversations::last_message_at.eq(Some(stored.created_at)))
                    .execute(conn)?;
                Ok::<_, diesel::result::Error>(stored)
            })
            .map_err(StoreError::from)
        })
        .await
    }

    async fn messages_in_conversation(&self, conversation_id: i32) -> Result<Vec<Message>, StoreError> {
        self.run(move |conn| {
            Ok(messages::table
                .filter(messages::conversation_id.eq(conversation_id))
                .select(Message::as_select())
                .order((messages::created_at.asc(), messages::id.asc()))
                .load(conn)?)
        })
        .await
    }

    async fn mark_messages_read(&self, conversation_id: i32, reader_id: Uuid) -> Result<usize, StoreError> {
        self.run(move |conn| {
            let unread = messages::table
                .filter(messages::conversation_id.eq(conversation_id))
                .filter(messages::sender_id.ne(reader_id))
                .filter(messages::is_read.eq(false));
            Ok(diesel::update(unread)
                .set((
                    messages::is_read.eq(true),
                    messages::read_at.eq(Some(Utc::now())),
                ))
                .execute(conn)?)
        })
        .await
    }
}
