//! Notification inbox mutations.
//!
//! All four operations target the authenticated user's inbox; the
//! backend resolves "whose" from the bearer token.

use reqwest::Method;

use vigia_common::AppResult;

use crate::client::ApiClient;

impl ApiClient {
    /// Mark one notification as read.
    pub async fn mark_notification_read(&self, notification_id: &str) -> AppResult<()> {
        let request = self.request(
            Method::PATCH,
            &format!("notifications/{notification_id}/read"),
        )?;
        self.request_empty(request).await
    }

    /// Mark the whole inbox as read.
    pub async fn mark_all_notifications_read(&self) -> AppResult<()> {
        let request = self.request(Method::POST, "notifications/mark-all-read")?;
        self.request_empty(request).await
    }

    /// Delete one notification.
    pub async fn delete_notification(&self, notification_id: &str) -> AppResult<()> {
        let request = self.request(Method::DELETE, &format!("notifications/{notification_id}"))?;
        self.request_empty(request).await
    }

    /// Empty the inbox.
    pub async fn clear_notifications(&self) -> AppResult<()> {
        let request = self.request(Method::DELETE, "notifications/")?;
        self.request_empty(request).await
    }
}
