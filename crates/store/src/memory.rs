//! In-process store adapter.
//!
//! Serves two roles: the reference implementation of [`LiveStore`]
//! semantics, and the test double the rest of the workspace runs against.
//! The write surface ([`Collection::insert`] and friends) models the
//! backend's effects; in production a vendor adapter populates the tables,
//! in tests the suite plays the backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::{RwLock, broadcast};
use tracing::debug;
use vigia_common::{AppError, AppResult, StoreConfig};

use crate::live::{CollectionEvent, Document, LiveStore, Subscription};
use crate::records::{
    CaseFilter, CaseRecord, CaseUpdateRecord, NotificationFilter, NotificationRecord,
    UpdateFilter, UserFilter, UserRecord,
};

/// Default broadcast capacity, matching the `store.channel_capacity`
/// configuration default.
const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// One collection's documents plus its change channel.
pub struct Collection<D: Document> {
    docs: RwLock<Vec<D>>,
    events: broadcast::Sender<CollectionEvent<D>>,
    handles: Arc<AtomicUsize>,
}

impl<D: Document> Collection<D> {
    fn new(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            docs: RwLock::new(Vec::new()),
            events,
            handles: Arc::new(AtomicUsize::new(0)),
        }
    }

    async fn subscribe(&self, filter: D::Filter) -> Subscription<D> {
        // Receiver before the initial read: a write landing in between is
        // seen twice at most, never missed. The subscription drops the
        // duplicate.
        let receiver = self.events.subscribe();
        let initial = self.docs.read().await.clone();
        debug!(collection = D::COLLECTION, filter = ?filter, "opened live query");
        Subscription::new(filter, initial, receiver).counted(Arc::clone(&self.handles))
    }

    /// Append a document and notify subscribers.
    pub async fn insert(&self, doc: D) {
        let mut docs = self.docs.write().await;
        docs.push(doc);
        // Sent while the write lock is held so emission order matches
        // mutation order. Send only fails with zero receivers.
        let _ = self.events.send(CollectionEvent::Snapshot(docs.clone()));
    }

    /// Replace the document with the same ID in place, keeping its
    /// position. Returns whether a document was found.
    pub async fn update(&self, doc: D) -> bool {
        let mut docs = self.docs.write().await;
        let Some(slot) = docs.iter_mut().find(|d| d.doc_id() == doc.doc_id()) else {
            return false;
        };
        *slot = doc;
        let _ = self.events.send(CollectionEvent::Snapshot(docs.clone()));
        true
    }

    /// Remove the document with the given ID. Returns whether a document
    /// was found.
    pub async fn remove(&self, id: &str) -> bool {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|d| d.doc_id() != id);
        if docs.len() == before {
            return false;
        }
        let _ = self.events.send(CollectionEvent::Snapshot(docs.clone()));
        true
    }

    /// Fetch one document by ID.
    pub async fn get(&self, id: &str) -> Option<D> {
        self.docs.read().await.iter().find(|d| d.doc_id() == id).cloned()
    }

    /// Number of documents currently stored.
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    /// Returns whether the collection is empty.
    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }

    /// Deliver a terminal failure to every live subscription of this
    /// collection. Each handle surfaces it exactly once; later
    /// subscriptions start fresh.
    pub fn fail(&self, message: &str) {
        let _ = self
            .events
            .send(CollectionEvent::Failed(message.to_string()));
    }

    fn handle_count(&self) -> usize {
        self.handles.load(Ordering::SeqCst)
    }
}

/// In-memory [`LiveStore`] adapter.
pub struct MemoryStore {
    cases: Collection<CaseRecord>,
    case_updates: Collection<CaseUpdateRecord>,
    users: Collection<UserRecord>,
    notifications: Collection<NotificationRecord>,
}

impl MemoryStore {
    /// Create an empty store with the default channel capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CHANNEL_CAPACITY)
    }

    /// Create an empty store with the given broadcast channel capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cases: Collection::new(capacity),
            case_updates: Collection::new(capacity),
            users: Collection::new(capacity),
            notifications: Collection::new(capacity),
        }
    }

    /// Create an empty store sized per configuration.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::with_capacity(config.channel_capacity)
    }

    /// The case collection.
    pub const fn cases(&self) -> &Collection<CaseRecord> {
        &self.cases
    }

    /// The case-update collection.
    pub const fn case_updates(&self) -> &Collection<CaseUpdateRecord> {
        &self.case_updates
    }

    /// The user collection.
    pub const fn users(&self) -> &Collection<UserRecord> {
        &self.users
    }

    /// The notification collection.
    pub const fn notifications(&self) -> &Collection<NotificationRecord> {
        &self.notifications
    }

    /// Number of live subscription handles across all collections.
    ///
    /// Lets tests prove that every exit path releases its handle.
    #[must_use]
    pub fn active_subscriptions(&self) -> usize {
        self.cases.handle_count()
            + self.case_updates.handle_count()
            + self.users.handle_count()
            + self.notifications.handle_count()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LiveStore for MemoryStore {
    async fn subscribe_cases(&self, filter: CaseFilter) -> AppResult<Subscription<CaseRecord>> {
        Ok(self.cases.subscribe(filter).await)
    }

    async fn subscribe_case_updates(
        &self,
        filter: UpdateFilter,
    ) -> AppResult<Subscription<CaseUpdateRecord>> {
        Ok(self.case_updates.subscribe(filter).await)
    }

    async fn subscribe_users(&self, filter: UserFilter) -> AppResult<Subscription<UserRecord>> {
        Ok(self.users.subscribe(filter).await)
    }

    async fn subscribe_notifications(
        &self,
        filter: NotificationFilter,
    ) -> AppResult<Subscription<NotificationRecord>> {
        Ok(self.notifications.subscribe(filter).await)
    }

    async fn get_case(&self, id: &str) -> AppResult<Option<CaseRecord>> {
        Ok(self.cases.get(id).await)
    }

    async fn get_case_update(&self, id: &str) -> AppResult<Option<CaseUpdateRecord>> {
        Ok(self.case_updates.get(id).await)
    }

    async fn get_user(&self, id: &str) -> AppResult<Option<UserRecord>> {
        Ok(self.users.get(id).await)
    }

    async fn delete(&self, collection: &str, id: &str) -> AppResult<()> {
        let removed = if collection == CaseRecord::COLLECTION {
            self.cases.remove(id).await
        } else if collection == CaseUpdateRecord::COLLECTION {
            self.case_updates.remove(id).await
        } else if collection == UserRecord::COLLECTION {
            self.users.remove(id).await
        } else if collection == NotificationRecord::COLLECTION {
            self.notifications.remove(id).await
        } else {
            return Err(AppError::Internal(format!(
                "unknown collection: {collection}"
            )));
        };
        if !removed {
            debug!(collection, id, "delete of absent document ignored");
        }
        Ok(())
    }
}
