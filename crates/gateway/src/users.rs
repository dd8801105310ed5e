//! Directory administration.

use reqwest::Method;

use vigia_common::AppResult;
use vigia_core::{Caller, ensure_not_self};
use vigia_store::{Role, UserRecord};

use crate::client::ApiClient;

impl ApiClient {
    /// List accounts, optionally narrowed to one role.
    pub async fn list_users(&self, role: Option<Role>) -> AppResult<Vec<UserRecord>> {
        let mut request = self.request(Method::GET, "users/")?;
        if let Some(role) = role {
            request = request.query(&[("role", role.as_str())]);
        }
        self.request_json(request).await
    }

    /// Enable or disable another account. The self-action guard rejects
    /// the caller's own id before the request is built.
    pub async fn toggle_user_active(
        &self,
        caller: &Caller,
        user_id: &str,
        is_active: bool,
    ) -> AppResult<()> {
        ensure_not_self(&caller.user_id, user_id)?;
        let request = self
            .request(Method::PATCH, &format!("users/{user_id}/toggle-active"))?
            .query(&[("is_active", is_active)]);
        self.request_empty(request).await
    }

    /// Delete another account, same guard as above.
    pub async fn delete_user(&self, caller: &Caller, user_id: &str) -> AppResult<()> {
        ensure_not_self(&caller.user_id, user_id)?;
        let request = self.request(Method::DELETE, &format!("users/{user_id}"))?;
        self.request_empty(request).await
    }
}
