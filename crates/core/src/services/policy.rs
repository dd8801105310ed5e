//! Client-side mutation pre-flight guards.
//!
//! The backend re-checks all of this; the guards exist so that violations
//! fail fast, offline, and with a message the UI can show directly.

use vigia_common::{AppError, AppResult};
use vigia_store::{CaseRecord, Role};

use crate::services::scope::{Caller, scope_allows};

/// Check that the caller may open the given case at all.
pub fn ensure_can_view(caller: &Caller, case: &CaseRecord) -> AppResult<()> {
    if scope_allows(caller, case) {
        Ok(())
    } else {
        Err(AppError::PermissionDenied(format!(
            "case {} is outside your scope",
            case.id
        )))
    }
}

/// Check that the caller may delete the given case.
///
/// Admins always may. A reporter may delete their own report only while no
/// assignee holds it; once assigned, the report belongs to the workflow.
/// Assignees never delete reports.
pub fn ensure_can_delete_case(caller: &Caller, case: &CaseRecord) -> AppResult<()> {
    match caller.role {
        Role::Admin => Ok(()),
        Role::Reporter => {
            if case.reported_by.as_deref() != Some(caller.user_id.as_str()) {
                return Err(AppError::Forbidden(
                    "only your own reports can be deleted".to_string(),
                ));
            }
            if case.is_assigned() {
                return Err(AppError::Forbidden(
                    "report already has an assignee and can no longer be deleted".to_string(),
                ));
            }
            Ok(())
        }
        Role::Assignee => Err(AppError::Forbidden(
            "assignees cannot delete reports".to_string(),
        )),
    }
}

/// Reject account-level actions aimed at the acting user itself.
///
/// Deactivating or deleting one's own account is refused for every role,
/// admins included.
pub fn ensure_not_self(caller_id: &str, target_id: &str) -> AppResult<()> {
    if caller_id == target_id {
        Err(AppError::Validation(
            "action cannot target your own account".to_string(),
        ))
    } else {
        Ok(())
    }
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
            description: "Leaking hydrant".to_string(),
            location: CaseLocation {
                latitude: 19.0,
                longitude: -99.0,
                address: None,
                city: None,
            },
            priority: CasePriority::Medium,
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
    fn test_reporter_can_delete_own_unassigned_report() {
        let reporter = Caller::new("r1", Role::Reporter);
        assert!(ensure_can_delete_case(&reporter, &case(Some("r1"), None)).is_ok());
    }

    #[test]
    fn test_reporter_cannot_delete_once_assigned() {
        let reporter = Caller::new("r1", Role::Reporter);
        let err = ensure_can_delete_case(&reporter, &case(Some("r1"), Some("e1"))).unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");
        assert!(err.to_string().contains("assignee"));
    }

    #[test]
    fn test_reporter_cannot_delete_foreign_report() {
        let reporter = Caller::new("r1", Role::Reporter);
        let err = ensure_can_delete_case(&reporter, &case(Some("r2"), None)).unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");
    }

    #[test]
    fn test_admin_deletes_regardless_of_assignment() {
        let admin = Caller::new("a1", Role::Admin);
        assert!(ensure_can_delete_case(&admin, &case(Some("r1"), Some("e1"))).is_ok());
        assert!(ensure_can_delete_case(&admin, &case(None, None)).is_ok());
    }

    #[test]
    fn test_assignee_never_deletes() {
        let assignee = Caller::new("e1", Role::Assignee);
        let err = ensure_can_delete_case(&assignee, &case(Some("r1"), Some("e1"))).unwrap_err();
        assert_eq!(err.error_code(), "FORBIDDEN");
    }

    #[test]
    fn test_self_action_is_rejected_for_any_role() {
        let err = ensure_not_self("a1", "a1").unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION_ERROR");
        assert!(ensure_not_self("a1", "u2").is_ok());
    }

    #[test]
    fn test_view_check_mirrors_scope() {
        let assignee = Caller::new("e1", Role::Assignee);
        assert!(ensure_can_view(&assignee, &case(Some("r1"), Some("e1"))).is_ok());

        let err = ensure_can_view(&assignee, &case(Some("r1"), Some("e2"))).unwrap_err();
        assert_eq!(err.error_code(), "PERMISSION_DENIED");
    }
}
