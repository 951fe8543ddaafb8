// Push notifications for graph events. Delivery is best-effort: callers log
// and drop failures.

use async_trait::async_trait;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushMessage {
    pub token: String,
    pub title: String,
    pub body: String,
}

impl PushMessage {
    pub fn new_follower(token: String, follower_name: &str) -> Self {
        Self {
            token,
            title: "New Follower".to_string(),
            body: format!("{} started following you", follower_name),
        }
    }
}

#[async_trait]
pub trait PushNotifier: Send + Sync {
    async fn send(&self, message: PushMessage) -> anyhow::Result<()>;
}

/// Records each message in the log instead of delivering it.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl PushNotifier for LogNotifier {
    async fn send(&self, message: PushMessage) -> anyhow::Result<()> {
        info!(title = %message.title, body = %message.body, "push notification");
        Ok(())
    }
}
