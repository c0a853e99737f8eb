//! Privilege rules for listing creation and contact-detail visibility.
//!
//! Every check is a pure function of the freshly loaded user row, the admin
//! allow-list and the current time. Nothing is cached between requests.

use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::{SubscriptionStatus, User, UserRole};

/// Why a privileged action was refused. Rendered with a `requires` field so
/// the client can route to the matching upgrade flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    LandlordRequired,
    VerificationRequired,
    SubscriptionRequired,
}

impl Denial {
    pub fn requirement(&self) -> &'static str {
        match self {
            Denial::LandlordRequired => "landlord",
            Denial::VerificationRequired => "verification",
            Denial::SubscriptionRequired => "subscription",
        }
    }
}

impl fmt::Display for Denial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            Denial::LandlordRequired => "A landlord account is required",
            Denial::VerificationRequired => "Account verification is required",
            Denial::SubscriptionRequired => "An active subscription is required",
        };
        f.write_str(message)
    }
}

/// The subscription status privileged checks use: an `active` subscription
/// whose expiry has passed counts as `expired`.
pub fn effective_status(user: &User, now: DateTime<Utc>) -> SubscriptionStatus {
    match (user.subscription_status, user.subscription_expires_at) {
        (SubscriptionStatus::Active, Some(expires_at)) if expires_at <= now => {
            SubscriptionStatus::Expired
        }
        (status, _) => status,
    }
}

pub fn is_admin(user: &User, config: &AppConfig) -> bool {
    user.is_admin || config.is_admin_email(&user.email)
}

pub fn can_create_property(user: &User, config: &AppConfig, now: DateTime<Utc>) -> Result<(), Denial> {
    if is_admin(user, config) {
        return Ok(());
    }
    if user.role != UserRole::Landlord {
        return Err(Denial::LandlordRequired);
    }
    if !user.is_verified {
        return Err(Denial::VerificationRequired);
    }
    if effective_status(user, now) != SubscriptionStatus::Active {
        return Err(Denial::SubscriptionRequired);
    }
    Ok(())
}

/// Whether `viewer` may see the private contact fields of a listing owned
/// by `landlord_id`. Anonymous viewers never can.
pub fn can_view_contact(
    viewer: Option<&User>,
    landlord_id: Uuid,
    config: &AppConfig,
    now: DateTime<Utc>,
) -> bool {
    let Some(viewer) = viewer else {
        return false;
    };
    viewer.id == landlord_id
        || is_admin(viewer, config)
        || effective_status(viewer, now) == SubscriptionStatus::Active
}
