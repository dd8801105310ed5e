//! Live view synchronizer.
//!
//! A [`LiveView`] owns one subscription and the list it materializes.
//! State is exclusively per-view; two views over the same collection stay
//! consistent only because both observe the same upstream store, never by
//! talking to each other.

use tracing::{debug, warn};
use vigia_common::{AppError, AppResult};
use vigia_store::{Document, Subscription};

/// Lifecycle of one live view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    /// No live query attached.
    Idle,
    /// Subscription open, first snapshot not yet applied.
    Loading,
    /// At least one snapshot applied; records mirror the store.
    Synced,
    /// The live query failed terminally. Stays here until an explicit
    /// re-attach.
    Errored,
}

/// One live, ordered list plus its synchronization state.
pub struct LiveView<D: Document> {
    phase: ViewPhase,
    records: Vec<D>,
    subscription: Option<Subscription<D>>,
    last_error: Option<String>,
}

impl<D: Document> LiveView<D> {
    /// An idle view with no records.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: ViewPhase::Idle,
            records: Vec::new(),
            subscription: None,
            last_error: None,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> ViewPhase {
        self.phase
    }

    /// Current materialization, newest first.
    #[must_use]
    pub fn records(&self) -> &[D] {
        &self.records
    }

    /// Message of the terminal error, while in [`ViewPhase::Errored`].
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Attach a fresh subscription and move to Loading.
    ///
    /// Valid from any phase; this is also the explicit recovery path out of
    /// Errored. Records from a previous subscription stay visible until the
    /// first new snapshot lands.
    pub fn attach(&mut self, subscription: Subscription<D>) {
        self.subscription = Some(subscription);
        self.phase = ViewPhase::Loading;
        self.last_error = None;
    }

    /// Tear down to Idle, releasing the subscription handle and the
    /// materialized records.
    pub fn detach(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.records.clear();
        self.phase = ViewPhase::Idle;
        self.last_error = None;
    }

    /// Await the next emission and apply it.
    ///
    /// On `Ok` the records were replaced with a fresh snapshot (sorted by
    /// creation time descending, store order preserved among ties) and the
    /// phase is Synced. A terminal subscription failure, or the stream
    /// ending, moves the view to Errored and surfaces the error; the stale
    /// records remain readable alongside it.
    pub async fn next_change(&mut self) -> AppResult<()> {
        let Some(subscription) = self.subscription.as_mut() else {
            return Err(AppError::Subscription(
                "view has no live query attached".to_string(),
            ));
        };

        match subscription.next().await {
            Some(Ok(snapshot)) => {
                self.apply_snapshot(snapshot);
                Ok(())
            }
            Some(Err(err)) => {
                warn!(collection = D::COLLECTION, error = %err, "live view failed");
                self.enter_errored(err.to_string());
                Err(err)
            }
            None => {
                let err = AppError::Subscription("live query ended".to_string());
                self.enter_errored(err.to_string());
                Err(err)
            }
        }
    }

    fn apply_snapshot(&mut self, mut snapshot: Vec<D>) {
        // Stable sort: equal timestamps keep the store's insertion order.
        snapshot.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        debug!(
            collection = D::COLLECTION,
            records = snapshot.len(),
            "applied live snapshot"
        );
        self.records = snapshot;
        self.phase = ViewPhase::Synced;
    }

    fn enter_errored(&mut self, message: String) {
        self.subscription = None;
        self.phase = ViewPhase::Errored;
        self.last_error = Some(message);
    }
}

impl<D: Document> Default for LiveView<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use vigia_store::{CaseFilter, CaseLocation, CasePriority, CaseRecord, CaseStatus, LiveStore, MemoryStore};

    fn case_at(id: &str, hour: u32) -> CaseRecord {
        CaseRecord {
            id: id.to_string(),
            description: format!("Incident {id}"),
            location: CaseLocation {
                latitude: 19.0,
                longitude: -99.0,
                address: None,
                city: None,
            },
            priority: CasePriority::Low,
            status: CaseStatus::Pending,
            assigned_to: None,
            reported_by: Some("r1".to_string()),
            is_anonymous: false,
            image_urls: vec![],
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, hour, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_phase_walk_idle_loading_synced() {
        let store = MemoryStore::new();
        let mut view: LiveView<CaseRecord> = LiveView::new();
        assert_eq!(view.phase(), ViewPhase::Idle);

        let err = view.next_change().await.unwrap_err();
        assert_eq!(err.error_code(), "SUBSCRIPTION_ERROR");

        view.attach(store.subscribe_cases(CaseFilter::All).await.unwrap());
        assert_eq!(view.phase(), ViewPhase::Loading);

        view.next_change().await.unwrap();
        assert_eq!(view.phase(), ViewPhase::Synced);
        assert!(view.records().is_empty());
    }

    #[tokio::test]
    async fn test_snapshots_are_sorted_newest_first_with_stable_ties() {
        let store = MemoryStore::new();
        store.cases().insert(case_at("old", 8)).await;
        store.cases().insert(case_at("tie_a", 10)).await;
        store.cases().insert(case_at("tie_b", 10)).await;
        store.cases().insert(case_at("new", 12)).await;

        let mut view = LiveView::new();
        view.attach(store.subscribe_cases(CaseFilter::All).await.unwrap());
        view.next_change().await.unwrap();

        let ids: Vec<&str> = view.records().iter().map(|c| c.id.as_str()).collect();
        // Descending by creation time; the two ties keep store order.
        assert_eq!(ids, vec!["new", "tie_a", "tie_b", "old"]);
    }

    #[tokio::test]
    async fn test_terminal_error_requires_explicit_reattach() {
        let store = MemoryStore::new();
        store.cases().insert(case_at("a", 9)).await;

        let mut view = LiveView::new();
        view.attach(store.subscribe_cases(CaseFilter::All).await.unwrap());
        view.next_change().await.unwrap();

        store.cases().fail("listener revoked");
        let err = view.next_change().await.unwrap_err();
        assert_eq!(err.error_code(), "SUBSCRIPTION_ERROR");
        assert_eq!(view.phase(), ViewPhase::Errored);
        assert_eq!(view.last_error(), Some("Subscription error: listener revoked"));
        // Stale records stay readable next to the error.
        assert_eq!(view.records().len(), 1);

        // Errored is terminal until a new subscription is attached.
        assert!(view.next_change().await.is_err());
        assert_eq!(view.phase(), ViewPhase::Errored);

        view.attach(store.subscribe_cases(CaseFilter::All).await.unwrap());
        assert_eq!(view.phase(), ViewPhase::Loading);
        view.next_change().await.unwrap();
        assert_eq!(view.phase(), ViewPhase::Synced);
        assert!(view.last_error().is_none());
    }

    #[tokio::test]
    async fn test_detach_releases_the_subscription_handle() {
        let store = MemoryStore::new();
        let mut view = LiveView::new();
        view.attach(store.subscribe_cases(CaseFilter::All).await.unwrap());
        assert_eq!(store.active_subscriptions(), 1);

        view.detach();
        assert_eq!(view.phase(), ViewPhase::Idle);
        assert!(view.records().is_empty());
        assert_eq!(store.active_subscriptions(), 0);
    }
}
