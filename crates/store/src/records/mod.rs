//! Typed records for every collection the system reads.

pub mod case;
pub mod case_update;
pub mod notification;
pub mod user;

pub use case::{CaseFilter, CaseLocation, CasePriority, CaseRecord, CaseStatus};
pub use case_update::{CaseUpdateRecord, UpdateFilter, UpdateKind};
pub use notification::{NotificationFilter, NotificationKind, NotificationRecord};
pub use user::{Role, UserFilter, UserRecord};
