//! Live query primitives: documents, filters, subscriptions.
//!
//! The upstream entity store is a subscribed document database: a query
//! yields an initial snapshot and then a fresh, full snapshot after every
//! observed change. Nothing here deals in diffs; consumers replace prior
//! state wholesale.
//!
//! Backend adapters implement [`LiveStore`]. An adapter bridges its vendor
//! stream by feeding a [`tokio::sync::broadcast`] channel of
//! [`CollectionEvent`]s and handing out [`Subscription`]s built from
//! receivers of that channel. [`crate::MemoryStore`] is the in-process
//! reference adapter.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tracing::debug;
use vigia_common::{AppError, AppResult};

use crate::records::{
    CaseFilter, CaseRecord, CaseUpdateRecord, NotificationFilter, NotificationRecord,
    UpdateFilter, UserFilter, UserRecord,
};

/// A record stored in one of the subscribed collections.
pub trait Document:
    Clone + PartialEq + std::fmt::Debug + Send + Sync + 'static
{
    /// Collection name on the wire.
    const COLLECTION: &'static str;

    /// Query shapes available for this collection.
    type Filter: DocumentFilter<Self> + Clone + std::fmt::Debug + Send + Sync + 'static;

    /// Document ID within the collection.
    fn doc_id(&self) -> &str;

    /// Server-side creation timestamp.
    fn created_at(&self) -> DateTime<Utc>;
}

/// Predicate applied client- or adapter-side to select matching documents.
pub trait DocumentFilter<D>: Send + Sync {
    /// Returns whether the record belongs to this query's result set.
    fn matches(&self, record: &D) -> bool;
}

/// One event on a collection's change channel.
#[derive(Debug, Clone)]
pub enum CollectionEvent<D> {
    /// The full collection contents after a change.
    Snapshot(Vec<D>),
    /// The backend revoked the listener; terminal for every subscriber.
    Failed(String),
}

/// Decrements the adapter's live-handle count when the subscription goes
/// away, whichever exit path drops it.
#[derive(Debug)]
struct HandleGuard {
    handles: Arc<AtomicUsize>,
}

impl Drop for HandleGuard {
    fn drop(&mut self) {
        self.handles.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Handle to one live query.
///
/// [`Subscription::next`] yields `Ok(snapshot)` zero or more times, then at
/// most one `Err` (terminal), then `None` forever. Dropping the handle
/// unsubscribes; there is no other teardown to perform.
pub struct Subscription<D: Document> {
    filter: D::Filter,
    pending_initial: Option<Vec<D>>,
    events: BroadcastStream<CollectionEvent<D>>,
    last: Option<Vec<D>>,
    finished: bool,
    guard: Option<HandleGuard>,
}

impl<D: Document> Subscription<D> {
    /// Build a subscription from a collection's change channel.
    ///
    /// `initial` is the collection contents at subscribe time; it is
    /// filtered and delivered as the first snapshot. The receiver must have
    /// been created before `initial` was read, so no change can fall
    /// between them.
    #[must_use]
    pub fn new(
        filter: D::Filter,
        initial: Vec<D>,
        events: broadcast::Receiver<CollectionEvent<D>>,
    ) -> Self {
        Self {
            filter,
            pending_initial: Some(initial),
            events: BroadcastStream::new(events),
            last: None,
            finished: false,
            guard: None,
        }
    }

    /// Register this handle in an adapter's live-handle count.
    pub(crate) fn counted(mut self, handles: Arc<AtomicUsize>) -> Self {
        handles.fetch_add(1, Ordering::SeqCst);
        self.guard = Some(HandleGuard { handles });
        self
    }

    /// The query this subscription was opened with.
    pub const fn filter(&self) -> &D::Filter {
        &self.filter
    }

    /// Await the next snapshot.
    ///
    /// Returns `Some(Ok(records))` for each materialization, `Some(Err(_))`
    /// exactly once if the live query fails terminally, and `None` after a
    /// terminal error or once the adapter shuts the channel down.
    ///
    /// A receiver that lags behind the channel capacity skips the dropped
    /// events; snapshots are authoritative replacements, so nothing is lost
    /// by coalescing. Changes that leave this query's result set untouched
    /// are swallowed.
    pub async fn next(&mut self) -> Option<AppResult<Vec<D>>> {
        if self.finished {
            return None;
        }

        if let Some(table) = self.pending_initial.take() {
            let snapshot = self.materialize(&table);
            self.last = Some(snapshot.clone());
            return Some(Ok(snapshot));
        }

        loop {
            match self.events.next().await {
                Some(Ok(CollectionEvent::Snapshot(table))) => {
                    let snapshot = self.materialize(&table);
                    if self.last.as_ref() == Some(&snapshot) {
                        continue;
                    }
                    self.last = Some(snapshot.clone());
                    return Some(Ok(snapshot));
                }
                Some(Ok(CollectionEvent::Failed(message))) => {
                    self.finished = true;
                    return Some(Err(AppError::Subscription(message)));
                }
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    debug!(
                        collection = D::COLLECTION,
                        skipped, "subscription lagged, coalescing to newer snapshot"
                    );
                }
                None => {
                    self.finished = true;
                    return None;
                }
            }
        }
    }

    /// Tear the subscription down explicitly.
    ///
    /// Equivalent to dropping the handle; spelled out for call sites where
    /// the teardown is the point.
    pub fn unsubscribe(self) {
        drop(self);
    }

    fn materialize(&self, table: &[D]) -> Vec<D> {
        table
            .iter()
            .filter(|record| self.filter.matches(record))
            .cloned()
            .collect()
    }
}

impl<D: Document> std::fmt::Debug for Subscription<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("collection", &D::COLLECTION)
            .field("filter", &self.filter)
            .field("finished", &self.finished)
            .finish_non_exhaustive()
    }
}

/// The store surface the rest of the system consumes.
///
/// Object safe so hosts can swap the production adapter for
/// [`crate::MemoryStore`] behind [`SharedStore`].
#[async_trait]
pub trait LiveStore: Send + Sync {
    /// Open a live query over the case collection.
    async fn subscribe_cases(&self, filter: CaseFilter) -> AppResult<Subscription<CaseRecord>>;

    /// Open a live query over the case-update collection.
    async fn subscribe_case_updates(
        &self,
        filter: UpdateFilter,
    ) -> AppResult<Subscription<CaseUpdateRecord>>;

    /// Open a live query over the user collection.
    async fn subscribe_users(&self, filter: UserFilter) -> AppResult<Subscription<UserRecord>>;

    /// Open a live query over the notification collection.
    async fn subscribe_notifications(
        &self,
        filter: NotificationFilter,
    ) -> AppResult<Subscription<NotificationRecord>>;

    /// Fetch a single case by ID.
    async fn get_case(&self, id: &str) -> AppResult<Option<CaseRecord>>;

    /// Fetch a single case update by ID.
    async fn get_case_update(&self, id: &str) -> AppResult<Option<CaseUpdateRecord>>;

    /// Fetch a single user by ID.
    async fn get_user(&self, id: &str) -> AppResult<Option<UserRecord>>;

    /// Delete one document directly in the store.
    ///
    /// Deleting an absent document is a no-op, matching upstream semantics.
    async fn delete(&self, collection: &str, id: &str) -> AppResult<()>;
}

/// Shared handle to a live store implementation.
pub type SharedStore = Arc<dyn LiveStore>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::records::{CaseLocation, CasePriority, CaseStatus};
    use chrono::TimeZone;

    fn case(id: &str, reported_by: Option<&str>) -> CaseRecord {
        CaseRecord {
            id: id.to_string(),
            description: "Pothole near the market".to_string(),
            location: CaseLocation {
                latitude: 19.0,
                longitude: -99.0,
                address: None,
                city: None,
            },
            priority: CasePriority::Low,
            status: CaseStatus::Pending,
            assigned_to: None,
            reported_by: reported_by.map(String::from),
            is_anonymous: reported_by.is_none(),
            image_urls: vec![],
            created_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_initial_snapshot_is_filtered_and_immediate() {
        let (tx, rx) = broadcast::channel(8);
        drop(tx);

        let initial = vec![case("a", Some("r1")), case("b", Some("r2"))];
        let mut sub = Subscription::new(CaseFilter::ReportedBy("r1".to_string()), initial, rx);

        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].id, "a");

        // Channel closed and initial consumed: stream has ended.
        assert!(sub.next().await.is_none());
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_unrelated_changes_are_swallowed() {
        let (tx, rx) = broadcast::channel(8);
        let mut sub = Subscription::new(
            CaseFilter::ReportedBy("r1".to_string()),
            vec![case("a", Some("r1"))],
            rx,
        );

        // Initial.
        assert_eq!(sub.next().await.unwrap().unwrap().len(), 1);

        // A change that does not touch r1's result set, then one that does.
        tx.send(CollectionEvent::Snapshot(vec![
            case("a", Some("r1")),
            case("b", Some("r2")),
        ]))
        .unwrap();
        tx.send(CollectionEvent::Snapshot(vec![
            case("a", Some("r1")),
            case("b", Some("r2")),
            case("c", Some("r1")),
        ]))
        .unwrap();

        let snapshot = sub.next().await.unwrap().unwrap();
        assert_eq!(
            snapshot.iter().map(|c| c.id.as_str()).collect::<Vec<_>>(),
            vec!["a", "c"]
        );
    }

    #[tokio::test]
    async fn test_terminal_error_fuses_the_subscription() {
        let (tx, rx) = broadcast::channel(8);
        let mut sub = Subscription::new(CaseFilter::All, vec![], rx);

        assert!(sub.next().await.unwrap().unwrap().is_empty());

        tx.send(CollectionEvent::Failed("listener revoked".to_string()))
            .unwrap();
        // Even though more events follow, the failure is terminal.
        tx.send(CollectionEvent::Snapshot(vec![case("a", None)]))
            .unwrap();

        let err = sub.next().await.unwrap().unwrap_err();
        assert_eq!(err.error_code(), "SUBSCRIPTION_ERROR");

        assert!(sub.next().await.is_none());
        assert!(sub.next().await.is_none());
    }

    #[tokio::test]
    async fn test_lagged_receiver_coalesces_to_newest() {
        let (tx, rx) = broadcast::channel(2);
        let mut sub = Subscription::new(CaseFilter::All, vec![], rx);

        assert!(sub.next().await.unwrap().unwrap().is_empty());

        // Overflow the two-slot channel while the subscriber sleeps.
        let mut table = Vec::new();
        for i in 0..6 {
            table.push(case(&format!("c{i}"), None));
            tx.send(CollectionEvent::Snapshot(table.clone())).unwrap();
        }

        // Every surfaced emission is a valid snapshot, and the newest one
        // arrives despite the dropped intermediates.
        let mut latest = Vec::new();
        while let Some(result) = sub.next().await {
            latest = result.unwrap();
            if latest.len() == 6 {
                break;
            }
        }
        assert_eq!(latest.len(), 6);
    }
}
