//! Live views, access policy, and aggregation services.

#![allow(missing_docs)]

pub mod detail;
pub mod policy;
pub mod projection;
pub mod scope;
pub mod session;
pub mod supplement;
pub mod view;

pub use detail::{CaseDetailView, CaseSummary, DetailPhase};
pub use policy::{ensure_can_delete_case, ensure_can_view, ensure_not_self};
pub use projection::{
    case_stats, filter_by_window, top_cities, unread_count, CaseStats, CityCount, PriorityCounts,
    StatusCounts, TimeWindow,
};
pub use scope::{case_scope, scope_allows, Caller};
pub use session::{Session, SessionStore};
pub use supplement::{FetchOrigin, Supplement};
pub use view::{LiveView, ViewPhase};
