//! Role-scoped query building.
//!
//! Every list screen reads through a role-shaped filter, and the mapping
//! from role to filter lives in exactly one place: [`case_scope`]. The
//! match is exhaustive over the closed [`Role`] set, so adding a role fails
//! compilation here instead of silently defaulting open (or closed).

use vigia_store::{CaseFilter, CaseRecord, DocumentFilter, Role, UserRecord};

/// The acting user queries and mutations are issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    /// Account ID.
    pub user_id: String,
    /// Parsed role; unparseable roles never get this far.
    pub role: Role,
}

impl Caller {
    /// Create a caller.
    pub fn new(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

impl From<&UserRecord> for Caller {
    fn from(user: &UserRecord) -> Self {
        Self {
            user_id: user.id.clone(),
            role: user.role,
        }
    }
}

/// The case query a caller is entitled to.
///
/// Admin sees every case; an assignee sees the cases they hold; a reporter
/// sees the cases they created.
#[must_use]
pub fn case_scope(caller: &Caller) -> CaseFilter {
    match caller.role {
        Role::Admin => CaseFilter::All,
        Role::Assignee => CaseFilter::AssignedTo(caller.user_id.clone()),
        Role::Reporter => CaseFilter::ReportedBy(caller.user_id.clone()),
    }
}

/// Per-record ownership check for reads that bypass a scoped query
/// (detail screens, deep links).
///
/// Reuses the scope filter, so list queries and point reads can never
/// disagree about visibility.
#[must_use]
pub fn scope_allows(caller: &Caller, case: &CaseRecord) -> bool {
    case_scope(caller).matches(case)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vigia_store::{CaseLocation, CasePriority, CaseStatus};

    fn case(reported_by: Option<&str>, assigned_to: Option<&str>) -> CaseRecord {
        CaseRecord {
            id: "case1".to_string(),
            description: "Fallen tree blocking the street".to_string(),
            location: CaseLocation {
                latitude: 19.0,
                longitude: -99.0,
                address: None,
                city: None,
            },
            priority: CasePriority::High,
            status: if assigned_to.is_some() {
                CaseStatus::Assigned
            } else {
                CaseStatus::Pending
            },
            assigned_to: assigned_to.map(String::from),
            reported_by: reported_by.map(String::from),
            is_anonymous: reported_by.is_none(),
            image_urls: vec![],
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_admin_scope_is_unrestricted() {
        let admin = Caller::new("a1", Role::Admin);
        assert_eq!(case_scope(&admin), CaseFilter::All);
        assert!(scope_allows(&admin, &case(None, None)));
        assert!(scope_allows(&admin, &case(Some("r9"), Some("e9"))));
    }

    #[test]
    fn test_assignee_sees_only_held_cases() {
        let assignee = Caller::new("e1", Role::Assignee);
        assert_eq!(
            case_scope(&assignee),
            CaseFilter::AssignedTo("e1".to_string())
        );
        assert!(scope_allows(&assignee, &case(Some("r1"), Some("e1"))));
        assert!(!scope_allows(&assignee, &case(Some("r1"), Some("e2"))));
        assert!(!scope_allows(&assignee, &case(Some("r1"), None)));
    }

    #[test]
    fn test_reporter_sees_only_own_cases() {
        let reporter = Caller::new("r1", Role::Reporter);
        assert_eq!(
            case_scope(&reporter),
            CaseFilter::ReportedBy("r1".to_string())
        );
        assert!(scope_allows(&reporter, &case(Some("r1"), None)));
        assert!(!scope_allows(&reporter, &case(Some("r2"), None)));
        // Anonymous reports carry no reporter, not even for their author.
        assert!(!scope_allows(&reporter, &case(None, None)));
    }

    #[test]
    fn test_caller_from_user_record() {
        let user = UserRecord {
            id: "e1".to_string(),
            name: "Luis".to_string(),
            email: "luis@example.com".to_string(),
            role: Role::Assignee,
            is_active: true,
            is_verified: true,
            organization: Some("Obras Publicas".to_string()),
            phone: None,
            zone: Some("Norte".to_string()),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        };
        let caller = Caller::from(&user);
        assert_eq!(caller.user_id, "e1");
        assert_eq!(caller.role, Role::Assignee);
    }
}
