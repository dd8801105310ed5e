//! In-app notification records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::live::{Document, DocumentFilter};

/// Notification kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A case was assigned to the recipient.
    CaseAssigned,
    /// A case the recipient follows received an update.
    CaseUpdated,
    /// A case the recipient reported was resolved.
    CaseResolved,
    /// Scheduled reminder for a stale case.
    Reminder,
    /// Free-form announcement.
    Generic,
}

/// A notification addressed to one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationRecord {
    /// Document ID.
    pub id: String,

    /// The recipient.
    pub user_id: String,

    /// What happened.
    pub kind: NotificationKind,

    /// Human-readable body.
    pub message: String,

    /// Whether the recipient has opened it.
    pub is_read: bool,

    /// Case the notification refers to, when there is one.
    #[serde(default)]
    pub case_id: Option<String>,

    /// Assignee involved in the triggering event, when there is one.
    #[serde(default)]
    pub assignee_id: Option<String>,

    /// Server-side creation time.
    pub created_at: DateTime<Utc>,
}

impl Document for NotificationRecord {
    const COLLECTION: &'static str = "notifications";
    type Filter = NotificationFilter;

    fn doc_id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Query shapes for the notification collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationFilter {
    /// Notifications addressed to the given user.
    ForUser(String),
}

impl DocumentFilter<NotificationRecord> for NotificationFilter {
    fn matches(&self, record: &NotificationRecord) -> bool {
        match self {
            Self::ForUser(user_id) => record.user_id == *user_id,
        }
    }
}
