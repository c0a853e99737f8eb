use std::fmt;
use std::io::Write;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::pg::{Pg, PgValue};
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::schema::{
    conversations, divisions, inquiries, messages, properties, regions, reviews, users,
};

#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// Declares a closed set of values stored as lowercase text columns and
/// exchanged as the same strings in JSON.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow)]
        #[diesel(sql_type = Text)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(UnknownVariant {
                        kind: stringify!($name),
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl ToSql<Text, Pg> for $name {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Pg>) -> serialize::Result {
                out.write_all(self.as_str().as_bytes())?;
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Pg> for $name {
            fn from_sql(bytes: PgValue<'_>) -> deserialize::Result<Self> {
                let raw = <String as FromSql<Text, Pg>>::from_sql(bytes)?;
                raw.parse::<Self>().map_err(Into::into)
            }
        }
    };
}

text_enum!(UserRole {
    Renter => "renter",
    Landlord => "landlord",
});

text_enum!(
    /// Stored subscription state. See [`crate::access::effective_status`] for
    /// the value privileged checks actually use.
    SubscriptionStatus {
        Active => "active",
        Inactive => "inactive",
        Expired => "expired",
    }
);

text_enum!(SubscriptionPlan {
    Monthly => "monthly",
    Yearly => "yearly",
});

text_enum!(Language {
    En => "en",
    Fr => "fr",
});

text_enum!(PropertyType {
    Apartment => "apartment",
    House => "house",
    Studio => "studio",
    Room => "room",
    Villa => "villa",
    Office => "office",
    Shop => "shop",
});

text_enum!(ContractType {
    LongTerm => "long_term",
    ShortTerm => "short_term",
});

text_enum!(InquiryStatus {
    Pending => "pending",
    Responded => "responded",
    Closed => "closed",
});

text_enum!(MessageType {
    Text => "text",
    Image => "image",
});

impl SubscriptionPlan {
    pub fn duration(&self) -> chrono::Duration {
        match self {
            SubscriptionPlan::Monthly => chrono::Duration::days(30),
            SubscriptionPlan::Yearly => chrono::Duration::days(365),
        }
    }
}

/// Distinguishes an absent JSON key (`None`) from an explicit `null`
/// (`Some(None)`) so changesets can clear nullable columns.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: UserRole,
    pub is_verified: bool,
    pub is_admin: bool,
    pub subscription_type: Option<SubscriptionPlan>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_expires_at: Option<DateTime<Utc>>,
    pub preferred_language: Language,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn display_name(&self) -> String {
        match (&self.first_name, &self.last_name) {
            (Some(first), Some(last)) => format!("{} {}", first, last),
            (Some(first), None) => first.clone(),
            (None, Some(last)) => last.clone(),
            (None, None) => self.email.clone(),
        }
    }
}

/// Identity claims handed over by the external identity provider. Upserted
/// by email: names and image refresh on every login, the role only applies
/// when the account is first created.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub role: UserRole,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct ProfileChanges {
    pub first_name: Option<Option<String>>,
    pub last_name: Option<Option<String>>,
    pub phone: Option<Option<String>>,
    pub profile_image_url: Option<Option<String>>,
    pub preferred_language: Option<Language>,
    pub role: Option<UserRole>,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = users)]
pub struct AdminUserChanges {
    pub is_verified: Option<bool>,
    pub is_admin: Option<bool>,
    pub subscription_type: Option<Option<SubscriptionPlan>>,
    pub subscription_status: Option<SubscriptionStatus>,
    pub subscription_expires_at: Option<Option<DateTime<Utc>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable)]
#[diesel(table_name = regions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub id: i32,
    pub name: String,
    pub name_en: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable)]
#[diesel(table_name = divisions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Division {
    pub id: i32,
    pub region_id: i32,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = properties)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: i32,
    pub landlord_id: Uuid,
    pub title: String,
    pub description: String,
    pub property_type: PropertyType,
    pub contract_type: ContractType,
    pub monthly_price: Option<i64>,
    pub nightly_price: Option<i64>,
    pub rooms: i32,
    pub size_sqm: Option<i32>,
    pub region_id: i32,
    pub division_id: i32,
    pub neighborhood: String,
    pub address: String,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = properties)]
pub struct NewProperty {
    pub landlord_id: Uuid,
    pub title: String,
    pub description: String,
    pub property_type: PropertyType,
    pub contract_type: ContractType,
    pub monthly_price: Option<i64>,
    pub nightly_price: Option<i64>,
    pub rooms: i32,
    pub size_sqm: Option<i32>,
    pub region_id: i32,
    pub division_id: i32,
    pub neighborhood: String,
    pub address: String,
    pub amenities: Vec<String>,
    pub images: Vec<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = properties)]
pub struct PropertyChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub property_type: Option<PropertyType>,
    pub contract_type: Option<ContractType>,
    pub monthly_price: Option<Option<i64>>,
    pub nightly_price: Option<Option<i64>>,
    pub rooms: Option<i32>,
    pub size_sqm: Option<Option<i32>>,
    pub region_id: Option<i32>,
    pub division_id: Option<i32>,
    pub neighborhood: Option<String>,
    pub address: Option<String>,
    pub amenities: Option<Vec<String>>,
    pub images: Option<Vec<String>>,
    pub is_active: Option<bool>,
}

/// A property joined with the rows every listing needs to render it.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyRecord {
    pub property: Property,
    pub landlord: User,
    pub region: Region,
    pub division: Division,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = inquiries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Inquiry {
    pub id: i32,
    pub property_id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = inquiries)]
pub struct NewInquiry {
    pub property_id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub message: String,
    pub status: InquiryStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = reviews)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub id: i32,
    pub property_id: i32,
    pub user_id: Option<Uuid>,
    pub reviewer_name: String,
    pub rating: i16,
    pub comment: String,
    pub is_verified: bool,
    pub helpful_count: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = reviews)]
pub struct NewReview {
    pub property_id: i32,
    pub user_id: Option<Uuid>,
    pub reviewer_name: String,
    pub rating: i16,
    pub comment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = conversations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: i32,
    pub property_id: i32,
    pub landlord_id: Uuid,
    pub renter_id: Uuid,
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.landlord_id == user_id || self.renter_id == user_id
    }

    /// The participant on the other side from `user_id`.
    pub fn counterpart(&self, user_id: Uuid) -> Uuid {
        if self.landlord_id == user_id {
            self.renter_id
        } else {
            self.landlord_id
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = conversations)]
pub struct NewConversation {
    pub property_id: i32,
    pub landlord_id: Uuid,
    pub renter_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Queryable, Selectable, Identifiable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i32,
    pub conversation_id: i32,
    pub sender_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
    pub is_read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub struct NewMessage {
    pub conversation_id: i32,
    pub sender_id: Uuid,
    pub content: String,
    pub message_type: MessageType,
}
