//! Incident case records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use vigia_common::AppError;

use crate::live::{Document, DocumentFilter};

/// Lifecycle state of a case.
///
/// Closed set: unknown wire values are deserialization errors, never a
/// silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    /// Filed, not yet claimed.
    Pending,
    /// Claimed by an assignee.
    Assigned,
    /// Work underway.
    InProgress,
    /// Work finished, awaiting closure.
    Resolved,
    /// Terminal state.
    Closed,
}

impl CaseStatus {
    /// Wire name used by the REST API and the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::InProgress => "in_progress",
            Self::Resolved => "resolved",
            Self::Closed => "closed",
        }
    }
}

impl FromStr for CaseStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "closed" => Ok(Self::Closed),
            other => Err(AppError::Validation(format!(
                "unknown case status: {other}"
            ))),
        }
    }
}

/// Urgency of a case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CasePriority {
    /// Can wait.
    Low,
    /// Default urgency.
    Medium,
    /// Needs prompt attention.
    High,
}

impl CasePriority {
    /// Wire name used by the REST API and the store.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Where a case was reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseLocation {
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,

    /// Street address, when reverse geocoding resolved one.
    #[serde(default)]
    pub address: Option<String>,

    /// City / zone bucket used by the aggregation screens.
    #[serde(default)]
    pub city: Option<String>,
}

/// An incident case reported by a citizen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    /// Document ID.
    pub id: String,

    /// Citizen-provided description of the incident.
    pub description: String,

    /// Where the incident is.
    pub location: CaseLocation,

    /// Urgency bucket.
    pub priority: CasePriority,

    /// Lifecycle state.
    pub status: CaseStatus,

    /// Assignee user ID. `None` means the case is still unclaimed, which
    /// pairs with [`CaseStatus::Pending`].
    #[serde(default)]
    pub assigned_to: Option<String>,

    /// Reporting user ID. `None` for anonymous reports.
    #[serde(default)]
    pub reported_by: Option<String>,

    /// Whether the reporter chose to stay unnamed.
    pub is_anonymous: bool,

    /// Uploaded photo URLs.
    #[serde(default)]
    pub image_urls: Vec<String>,

    /// Server-side creation time.
    pub created_at: DateTime<Utc>,
}

impl CaseRecord {
    /// Returns whether an assignee currently holds this case.
    #[must_use]
    pub const fn is_assigned(&self) -> bool {
        self.assigned_to.is_some()
    }
}

impl Document for CaseRecord {
    const COLLECTION: &'static str = "reports";
    type Filter = CaseFilter;

    fn doc_id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Query shapes the system issues against the case collection.
///
/// Single-field equality only; the upstream store offers nothing richer and
/// every screen lives within these three.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaseFilter {
    /// Every case.
    All,
    /// Cases held by the given assignee.
    AssignedTo(String),
    /// Cases created by the given reporter.
    ReportedBy(String),
}

impl DocumentFilter<CaseRecord> for CaseFilter {
    fn matches(&self, record: &CaseRecord) -> bool {
        match self {
            Self::All => true,
            Self::AssignedTo(user_id) => record.assigned_to.as_deref() == Some(user_id),
            Self::ReportedBy(user_id) => record.reported_by.as_deref() == Some(user_id),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_case() -> CaseRecord {
        CaseRecord {
            id: "case1".to_string(),
            description: "Broken streetlight on the corner".to_string(),
            location: CaseLocation {
                latitude: 19.43,
                longitude: -99.13,
                address: None,
                city: Some("Centro".to_string()),
            },
            priority: CasePriority::Medium,
            status: CaseStatus::Pending,
            assigned_to: None,
            reported_by: Some("reporter1".to_string()),
            is_anonymous: false,
            image_urls: vec![],
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_status_round_trips_through_wire_names() {
        for status in [
            CaseStatus::Pending,
            CaseStatus::Assigned,
            CaseStatus::InProgress,
            CaseStatus::Resolved,
            CaseStatus::Closed,
        ] {
            assert_eq!(status.as_str().parse::<CaseStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!("escalated".parse::<CaseStatus>().is_err());
        assert!(serde_json::from_str::<CaseStatus>("\"escalated\"").is_err());
    }

    #[test]
    fn test_status_serde_uses_snake_case() {
        let json = serde_json::to_string(&CaseStatus::InProgress).unwrap();
        assert_eq!(json, "\"in_progress\"");
    }

    #[test]
    fn test_filter_matches_by_single_field() {
        let mut case = sample_case();
        assert!(CaseFilter::All.matches(&case));
        assert!(CaseFilter::ReportedBy("reporter1".to_string()).matches(&case));
        assert!(!CaseFilter::ReportedBy("reporter2".to_string()).matches(&case));
        assert!(!CaseFilter::AssignedTo("enc1".to_string()).matches(&case));

        case.assigned_to = Some("enc1".to_string());
        assert!(CaseFilter::AssignedTo("enc1".to_string()).matches(&case));
    }

    #[test]
    fn test_anonymous_case_has_no_reporter_match() {
        let mut case = sample_case();
        case.is_anonymous = true;
        case.reported_by = None;
        assert!(!CaseFilter::ReportedBy("reporter1".to_string()).matches(&case));
        assert!(CaseFilter::All.matches(&case));
    }
}
