use crate::domain::model::{ProfileChanges, UserRecord};
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Document collection holding one `UserRecord` per user id.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// `Ok(None)` when no document exists for `id`.
    async fn get(&self, id: &str) -> Result<Option<UserRecord>>;

    /// Merges the present fields into the existing document.
    async fn set(&self, id: &str, changes: &ProfileChanges) -> Result<()>;

    /// Documents whose `field` equals `value`, in store order.
    async fn query(&self, field: &str, value: &str) -> Result<Vec<UserRecord>>;

    /// Writes the whole record, replacing any existing document.
    async fn put(&self, record: &UserRecord) -> Result<()>;

    async fn list(&self) -> Result<Vec<UserRecord>>;
}

#[async_trait]
pub trait PictureStore: Send + Sync {
    /// Persists the bytes and returns a reference URL usable as `profilePictureUrl`.
    async fn upload(&self, user_id: &str, bytes: &[u8]) -> Result<String>;

    async fn resolve(&self, user_id: &str) -> Result<Option<String>>;
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &MailMessage) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MailAddress {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// An outgoing message: one recipient, a reply-to, and a plain text body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: MailAddress,
    pub reply_to: MailAddress,
    pub subject: String,
    pub body: String,
}
