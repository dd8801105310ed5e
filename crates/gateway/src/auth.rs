//! Authentication endpoints and session bootstrap.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::warn;
use validator::Validate;

use vigia_common::AppResult;
use vigia_core::Session;
use vigia_store::{Role, UserRecord};

use crate::client::ApiClient;

/// Credentials for `POST auth/login`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct LoginInput {
    /// Sign-in email address.
    #[validate(email)]
    pub email: String,

    /// Plain-text password; travels only over the request body.
    #[validate(length(min = 1))]
    pub password: String,
}

/// Login response body.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub access_token: String,
    /// The authenticated account.
    pub user: UserRecord,
}

/// Profile fields for `POST auth/register/{role}`.
#[derive(Debug, Clone, Serialize, Validate)]
pub struct RegisterInput {
    /// Display name.
    #[validate(length(min = 1, max = 100))]
    pub name: String,

    /// Sign-in email address.
    #[validate(email)]
    pub email: String,

    /// Initial password.
    #[validate(length(min = 8, max = 128))]
    pub password: String,

    /// Assignee-only: organization the worker belongs to. The backend
    /// ignores it for other roles, as with `phone` and `zone`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    /// Assignee-only: contact phone number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Assignee-only: coverage zone.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

/// Short-lived credential for connecting to the document store. Opaque
/// to this layer; the store client consumes it.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreCredential {
    /// The credential itself.
    #[serde(alias = "firebase_token")]
    pub token: String,
}

impl ApiClient {
    /// Sign in. On success the bearer token is installed and the session
    /// persisted for the next start.
    pub async fn login(&self, input: &LoginInput) -> AppResult<Session> {
        input.validate()?;
        let request = self.request(Method::POST, "auth/login")?.json(input);
        let response: LoginResponse = self.request_json(request).await?;

        self.set_token(Some(response.access_token.clone()));
        let session = Session::new(response.user, response.access_token);
        if let Some(store) = self.session_store() {
            // Persistence is best-effort; the login itself already succeeded.
            if let Err(e) = store.save(&session).await {
                warn!(error = %e, "failed to persist session");
            }
        }
        Ok(session)
    }

    /// Create an account with the given role.
    pub async fn register(&self, role: Role, input: &RegisterInput) -> AppResult<UserRecord> {
        input.validate()?;
        let request = self
            .request(Method::POST, &format!("auth/register/{}", role.as_str()))?
            .json(input);
        self.request_json(request).await
    }

    /// Validate the installed token and fetch the account behind it.
    pub async fn verify_token(&self) -> AppResult<UserRecord> {
        let request = self.request(Method::GET, "auth/verify-token")?;
        self.request_json(request).await
    }

    /// Exchange the API session for a document-store credential.
    pub async fn store_credential(&self) -> AppResult<StoreCredential> {
        let request = self.request(Method::POST, "auth/firebase-token")?;
        self.request_json(request).await
    }

    /// Resume a persisted session without network traffic. Callers
    /// typically follow up with [`ApiClient::verify_token`].
    pub fn resume(&self, session: &Session) {
        self.set_token(Some(session.token.clone()));
    }

    /// Sign out: drop the bearer token and the persisted session.
    pub async fn logout(&self) -> AppResult<()> {
        self.set_token(None);
        if let Some(store) = self.session_store() {
            store.clear().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_input_validation() {
        let valid = LoginInput {
            email: "rosa@example.com".to_string(),
            password: "secret".to_string(),
        };
        assert!(valid.validate().is_ok());

        let bad_email = LoginInput {
            email: "not-an-address".to_string(),
            password: "secret".to_string(),
        };
        assert!(bad_email.validate().is_err());

        let empty_password = LoginInput {
            email: "rosa@example.com".to_string(),
            password: String::new(),
        };
        assert!(empty_password.validate().is_err());
    }

    #[test]
    fn test_register_input_validation_and_wire_shape() {
        let input = RegisterInput {
            name: "Rosa Morales".to_string(),
            email: "rosa@example.com".to_string(),
            password: "correct-horse".to_string(),
            organization: None,
            phone: None,
            zone: None,
        };
        assert!(input.validate().is_ok());

        // Absent profile fields stay off the wire entirely.
        let body = serde_json::to_value(&input).unwrap();
        assert!(body.get("organization").is_none());
        assert!(body.get("zone").is_none());

        let short_password = RegisterInput {
            password: "short".to_string(),
            ..input
        };
        assert!(short_password.validate().is_err());
    }

    #[test]
    fn test_store_credential_accepts_both_field_names() {
        let plain: StoreCredential = serde_json::from_str(r#"{"token":"abc"}"#).unwrap();
        assert_eq!(plain.token, "abc");

        let aliased: StoreCredential =
            serde_json::from_str(r#"{"firebase_token":"xyz"}"#).unwrap();
        assert_eq!(aliased.token, "xyz");
    }
}
