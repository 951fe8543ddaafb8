// Caller's own profile and push token registration.

use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};
use crate::infrastructure::database::DocumentStore;
use crate::infrastructure::viewer::ViewerContext;
use crate::models::{timestamp, PushToken, Record, UserProfile};

/// Fields a user may change on their profile. Absent fields are untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub phone_number: Option<String>,
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn DocumentStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self, vc), fields(request_id = %vc.request_id))]
    pub async fn get_profile(&self, vc: &ViewerContext) -> AppResult<UserProfile> {
        let principal = vc.principal()?;
        self.load(&principal.id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("profile {}", principal.id)))
    }

    /// Apply `update` to the caller's profile, creating it on first use with
    /// email and name taken from the token claims.
    #[instrument(skip(self, vc, update), fields(request_id = %vc.request_id))]
    pub async fn upsert_profile(
        &self,
        vc: &ViewerContext,
        update: ProfileUpdate,
    ) -> AppResult<UserProfile> {
        let principal = vc.principal()?;
        let now = timestamp::now();

        let mut profile = match self.load(&principal.id).await? {
            Some(mut existing) => {
                existing.updated_at = Some(now);
                existing
            }
            None => UserProfile {
                uid: principal.id.clone(),
                email: principal.email().map(str::to_string),
                display_name: principal.name().unwrap_or_default().to_string(),
                phone_number: None,
                created_at: now,
                updated_at: None,
            },
        };

        if let Some(display_name) = update.display_name {
            profile.display_name = display_name;
        }
        if let Some(phone_number) = update.phone_number {
            profile.phone_number = Some(phone_number);
        }

        self.store
            .put(UserProfile::COLLECTION, &profile.uid, profile.encode()?)
            .await?;

        info!(uid = %profile.uid, "profile saved");
        Ok(profile)
    }

    /// Register the device token used for the caller's push notifications.
    #[instrument(skip(self, vc, token), fields(request_id = %vc.request_id))]
    pub async fn register_push_token(&self, vc: &ViewerContext, token: &str) -> AppResult<()> {
        let principal = vc.principal()?;
        let token = token.trim();
        if token.is_empty() {
            return Err(AppError::MissingField("token"));
        }

        let record = PushToken {
            uid: principal.id.clone(),
            token: token.to_string(),
            updated_at: timestamp::now(),
        };
        self.store
            .put(PushToken::COLLECTION, &record.uid, record.encode()?)
            .await
    }

    async fn load(&self, uid: &str) -> AppResult<Option<UserProfile>> {
        self.store
            .get(UserProfile::COLLECTION, uid)
            .await?
            .map(|row| UserProfile::decode(&row.id, row.data))
            .transpose()
    }
}
