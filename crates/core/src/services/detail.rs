//! Case detail screen state.
//!
//! The detail screen combines a point-read of the case, a live list of its
//! follow-ups, and an on-demand generated summary. Missing and
//! out-of-scope cases are ordinary phases of the screen, not errors: both
//! happen in normal use (deleted case still on screen, deep link into a
//! foreign case).

use chrono::{DateTime, Utc};
use tracing::debug;
use vigia_common::{AppError, AppResult};
use vigia_store::{CaseRecord, CaseUpdateRecord, LiveStore, UpdateFilter};

use crate::services::policy::ensure_can_view;
use crate::services::scope::Caller;
use crate::services::supplement::{FetchOrigin, Supplement};
use crate::services::view::LiveView;

/// Lifecycle of the detail screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailPhase {
    /// Case loaded, follow-ups streaming.
    Ready,
    /// The case does not exist, or no longer does.
    Missing,
    /// The case exists but is outside the viewer's scope.
    NoPermission,
    /// The follow-up live query failed terminally.
    Errored,
}

/// On-demand generated case summary. A local artifact, never written to
/// the store.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseSummary {
    /// Generated text.
    pub text: String,
    /// When generation finished.
    pub generated_at: DateTime<Utc>,
}

/// Composite state for one case's detail screen.
pub struct CaseDetailView {
    viewer: Caller,
    case_id: String,
    phase: DetailPhase,
    case: Option<CaseRecord>,
    updates: LiveView<CaseUpdateRecord>,
    summary: Supplement<CaseSummary>,
}

impl CaseDetailView {
    /// Open the detail view: fetch the case, ownership-check it, and
    /// subscribe to its follow-ups.
    ///
    /// A missing or out-of-scope case yields `Ok` with the corresponding
    /// phase; only store access failures are errors.
    pub async fn open(store: &dyn LiveStore, viewer: Caller, case_id: &str) -> AppResult<Self> {
        let mut view = Self {
            viewer,
            case_id: case_id.to_string(),
            phase: DetailPhase::Missing,
            case: None,
            updates: LiveView::new(),
            summary: Supplement::empty(),
        };

        let Some(case) = store.get_case(case_id).await? else {
            debug!(case_id, "detail view opened on absent case");
            return Ok(view);
        };

        if ensure_can_view(&view.viewer, &case).is_err() {
            view.phase = DetailPhase::NoPermission;
            return Ok(view);
        }

        let subscription = store
            .subscribe_case_updates(UpdateFilter::ForCase(case_id.to_string()))
            .await?;
        view.updates.attach(subscription);
        view.case = Some(case);
        view.phase = DetailPhase::Ready;
        Ok(view)
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> DetailPhase {
        self.phase
    }

    /// The viewer this screen was opened for.
    #[must_use]
    pub const fn viewer(&self) -> &Caller {
        &self.viewer
    }

    /// The case, while present.
    #[must_use]
    pub const fn case(&self) -> Option<&CaseRecord> {
        self.case.as_ref()
    }

    /// Follow-ups, newest first.
    #[must_use]
    pub fn updates(&self) -> &[CaseUpdateRecord] {
        self.updates.records()
    }

    /// The generated summary, if one is installed.
    #[must_use]
    pub fn summary(&self) -> Option<&CaseSummary> {
        self.summary.get()
    }

    /// Await the next follow-up emission and reconcile the parent case.
    ///
    /// The parent is re-read on every emission: a status change lands as a
    /// follow-up entry plus a case mutation, so the re-read keeps both
    /// sides of the screen on the same snapshot. A vanished parent moves
    /// the view to Missing; a parent that left the viewer's scope moves it
    /// to NoPermission. Both tear the subscription down.
    pub async fn next_change(&mut self, store: &dyn LiveStore) -> AppResult<()> {
        if self.phase != DetailPhase::Ready {
            return Err(AppError::Subscription(
                "detail view is not live".to_string(),
            ));
        }

        if let Err(err) = self.updates.next_change().await {
            self.phase = DetailPhase::Errored;
            return Err(err);
        }

        match store.get_case(&self.case_id).await? {
            Some(case) => {
                if ensure_can_view(&self.viewer, &case).is_err() {
                    self.phase = DetailPhase::NoPermission;
                    self.case = None;
                    self.updates.detach();
                } else {
                    self.case = Some(case);
                }
            }
            None => {
                debug!(case_id = %self.case_id, "case vanished under open detail view");
                self.phase = DetailPhase::Missing;
                self.case = None;
                self.updates.detach();
            }
        }
        Ok(())
    }

    /// Install a generated summary.
    ///
    /// Returns whether it was accepted. Results for a view that is no
    /// longer live are discarded: a late response must not resurrect an
    /// abandoned screen.
    pub fn apply_summary(&mut self, summary: CaseSummary, origin: FetchOrigin) -> bool {
        if self.phase != DetailPhase::Ready {
            debug!(case_id = %self.case_id, "summary for inactive detail view discarded");
            return false;
        }
        self.summary.apply(summary, origin)
    }
}
