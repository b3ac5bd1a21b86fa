use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Subscription plan of an account. Stored and serialized by its
/// capitalized name (`"Free"`, `"Starter"`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text")]
pub enum SubscriptionPlan {
    #[default]
    Free,
    Starter,
    Growth,
    Enterprise,
}

impl SubscriptionPlan {
    /// Every plan, in upgrade order.
    pub const ALL: [SubscriptionPlan; 4] = [
        Self::Free,
        Self::Starter,
        Self::Growth,
        Self::Enterprise,
    ];
}

impl fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Free => "Free",
            Self::Starter => "Starter",
            Self::Growth => "Growth",
            Self::Enterprise => "Enterprise",
        };
        f.write_str(s)
    }
}

impl FromStr for SubscriptionPlan {
    type Err = SubscriptionPlanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Free" => Ok(Self::Free),
            "Starter" => Ok(Self::Starter),
            "Growth" => Ok(Self::Growth),
            "Enterprise" => Ok(Self::Enterprise),
            other => Err(SubscriptionPlanParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`SubscriptionPlan`] string.
#[derive(Debug, Clone)]
pub struct SubscriptionPlanParseError(pub String);

impl fmt::Display for SubscriptionPlanParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid subscription plan: {:?}", self.0)
    }
}

impl std::error::Error for SubscriptionPlanParseError {}

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// A row from the `users` table, including the password hash.
///
/// Never serialize this directly into a response; use [`PublicUser`].
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub plan: SubscriptionPlan,
    pub notifications: bool,
    pub two_factor: bool,
    pub billing_last4: String,
    pub created_at: DateTime<Utc>,
}

/// The user profile as exposed over the API: everything but the hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub plan: SubscriptionPlan,
    pub notifications: bool,
    pub two_factor: bool,
    pub billing_last4: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            plan: u.plan,
            notifications: u.notifications,
            two_factor: u.two_factor,
            billing_last4: u.billing_last4,
            created_at: u.created_at,
        }
    }
}

/// A row from the `projects` table.
///
/// The logo, if any, lives in `image_blobs`; the row only holds its digest.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub description: String,
    pub business_name: String,
    pub slogan: Option<String>,
    pub logo_digest: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A row from the `image_blobs` table.
#[derive(Debug, Clone, FromRow)]
pub struct ImageBlob {
    /// Lowercase SHA-256 hex digest of `data`.
    pub digest: String,
    pub mime: String,
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plan_display_roundtrips_through_from_str() {
        for plan in SubscriptionPlan::ALL {
            let parsed: SubscriptionPlan = plan.to_string().parse().unwrap();
            assert_eq!(parsed, plan);
        }
    }

    #[test]
    fn plan_rejects_unknown_and_wrong_case() {
        assert!("Unlimited".parse::<SubscriptionPlan>().is_err());
        assert!("free".parse::<SubscriptionPlan>().is_err());
    }

    #[test]
    fn plan_serializes_capitalized() {
        let json = serde_json::to_string(&SubscriptionPlan::Growth).unwrap();
        assert_eq!(json, "\"Growth\"");
    }

    #[test]
    fn public_user_drops_password_hash() {
        let user = User {
            id: Uuid::new_v4(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            plan: SubscriptionPlan::Free,
            notifications: true,
            two_factor: false,
            billing_last4: "4242".into(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(PublicUser::from(user)).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["twoFactor"], false);
        assert_eq!(json["billingLast4"], "4242");
    }
}
