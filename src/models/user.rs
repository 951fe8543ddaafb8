use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{timestamp, Record};

/// Profile document, keyed by the identity provider's uid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default)]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Record for UserProfile {
    const COLLECTION: &'static str = "users";
    const ID_FIELD: &'static str = "uid";

    fn id(&self) -> &str {
        &self.uid
    }
}

/// Device push token for a user. Stored apart from the profile so it never
/// leaves the server inside a profile response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushToken {
    pub uid: String,
    pub token: String,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

impl Record for PushToken {
    const COLLECTION: &'static str = "push_tokens";
    const ID_FIELD: &'static str = "uid";

    fn id(&self) -> &str {
        &self.uid
    }
}
