//! Case update (follow-up) records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::live::{Document, DocumentFilter};
use crate::records::case::CaseStatus;

/// What a follow-up entry represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateKind {
    /// Work-in-progress note.
    Progress,
    /// Status transition; carries the new status.
    StatusChange,
    /// Field observation with no state effect.
    Observation,
    /// Closing remark.
    Closure,
}

impl UpdateKind {
    /// Wire name used by the REST API and the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Progress => "progress",
            Self::StatusChange => "status_change",
            Self::Observation => "observation",
            Self::Closure => "closure",
        }
    }
}

/// A follow-up entry attached to a case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseUpdateRecord {
    /// Document ID.
    pub id: String,

    /// Parent case.
    pub case_id: String,

    /// Author user ID. `None` when the backend recorded a system-generated
    /// entry.
    #[serde(default)]
    pub author_id: Option<String>,

    /// Free-text body of the entry.
    pub message: String,

    /// What the entry represents.
    pub kind: UpdateKind,

    /// Present iff `kind` is [`UpdateKind::StatusChange`].
    #[serde(default)]
    pub new_status: Option<CaseStatus>,

    /// Uploaded photo URLs.
    #[serde(default)]
    pub image_urls: Vec<String>,

    /// Server-side creation time.
    pub created_at: DateTime<Utc>,
}

impl CaseUpdateRecord {
    /// Returns whether the kind/status coupling holds: a status change
    /// carries a new status, every other kind carries none.
    #[must_use]
    pub const fn kind_payload_coherent(&self) -> bool {
        match self.kind {
            UpdateKind::StatusChange => self.new_status.is_some(),
            UpdateKind::Progress | UpdateKind::Observation | UpdateKind::Closure => {
                self.new_status.is_none()
            }
        }
    }
}

impl Document for CaseUpdateRecord {
    const COLLECTION: &'static str = "case_updates";
    type Filter = UpdateFilter;

    fn doc_id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Query shapes for the case-update collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateFilter {
    /// Follow-ups of the given case.
    ForCase(String),
}

impl DocumentFilter<CaseUpdateRecord> for UpdateFilter {
    fn matches(&self, record: &CaseUpdateRecord) -> bool {
        match self {
            Self::ForCase(case_id) => record.case_id == *case_id,
        }
    }
}
