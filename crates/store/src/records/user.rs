//! User account records and roles.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use vigia_common::AppError;

use crate::live::{Document, DocumentFilter};

/// The three roles the platform knows.
///
/// Closed set. Scope decisions branch on this exhaustively, so an account
/// whose stored role does not parse never reaches a query at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Platform operator: sees and manages everything.
    #[serde(rename = "admin")]
    Admin,
    /// Field worker ("encargado" on the wire): sees assigned cases.
    #[serde(rename = "encargado")]
    Assignee,
    /// Citizen: sees own reports.
    #[serde(rename = "reporter")]
    Reporter,
}

impl Role {
    /// Wire name used by the REST API and the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Assignee => "encargado",
            Self::Reporter => "reporter",
        }
    }
}

impl FromStr for Role {
    type Err = AppError;

    /// Parse a stored role string, failing closed.
    ///
    /// An unrecognized role grants access to nothing: callers get an error,
    /// never a guessed scope.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "encargado" => Ok(Self::Assignee),
            "reporter" => Ok(Self::Reporter),
            other => Err(AppError::Config(format!("unrecognized role: {other}"))),
        }
    }
}

/// A registered account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// Document ID.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Sign-in email address.
    pub email: String,

    /// Role the scope decisions branch on.
    pub role: Role,

    /// Deactivated accounts keep their data but cannot sign in.
    pub is_active: bool,

    /// Whether the email address was confirmed.
    pub is_verified: bool,

    /// Organization an assignee works for.
    #[serde(default)]
    pub organization: Option<String>,

    /// Contact phone number.
    #[serde(default)]
    pub phone: Option<String>,

    /// Coverage zone for assignees.
    #[serde(default)]
    pub zone: Option<String>,

    /// Server-side creation time.
    pub created_at: DateTime<Utc>,
}

impl Document for UserRecord {
    const COLLECTION: &'static str = "users";
    type Filter = UserFilter;

    fn doc_id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Query shapes for the user collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserFilter {
    /// Every account.
    All,
    /// Accounts holding the given role.
    WithRole(Role),
}

impl DocumentFilter<UserRecord> for UserFilter {
    fn matches(&self, record: &UserRecord) -> bool {
        match self {
            Self::All => true,
            Self::WithRole(role) => record.role == *role,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_user(role: Role) -> UserRecord {
        UserRecord {
            id: "user1".to_string(),
            name: "Ana".to_string(),
            email: "ana@example.com".to_string(),
            role,
            is_active: true,
            is_verified: true,
            organization: None,
            phone: None,
            zone: None,
            created_at: Utc.with_ymd_and_hms(2025, 1, 10, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_role_wire_names() {
        assert_eq!(Role::Admin.as_str(), "admin");
        assert_eq!(Role::Assignee.as_str(), "encargado");
        assert_eq!(Role::Reporter.as_str(), "reporter");

        let json = serde_json::to_string(&Role::Assignee).unwrap();
        assert_eq!(json, "\"encargado\"");
    }

    #[test]
    fn test_role_parsing_fails_closed() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("encargado".parse::<Role>().unwrap(), Role::Assignee);

        let err = "superuser".parse::<Role>().unwrap_err();
        assert_eq!(err.error_code(), "CONFIG_ERROR");
    }

    #[test]
    fn test_unknown_role_fails_deserialization() {
        assert!(serde_json::from_str::<Role>("\"superuser\"").is_err());
    }

    #[test]
    fn test_filter_by_role() {
        let admin = sample_user(Role::Admin);
        let assignee = sample_user(Role::Assignee);

        assert!(UserFilter::All.matches(&admin));
        assert!(UserFilter::WithRole(Role::Admin).matches(&admin));
        assert!(!UserFilter::WithRole(Role::Admin).matches(&assignee));
    }
}
