//! Live entity store for vigia-rs.
//!
//! This crate defines the typed records the platform reads
//! ([`CaseRecord`], [`CaseUpdateRecord`], [`UserRecord`],
//! [`NotificationRecord`]), the closed filter model those collections
//! support, and the [`LiveStore`] subscription surface every backend
//! adapter implements. [`MemoryStore`] is the in-process adapter used as
//! the reference implementation and as the test double across the
//! workspace.
//!
//! Live queries deal in whole snapshots: every emission replaces the
//! previous result set, so consumers never track diffs and a coalesced
//! (lagged) subscriber loses nothing but intermediate states.

pub mod live;
pub mod memory;
pub mod records;

pub use live::{
    CollectionEvent, Document, DocumentFilter, LiveStore, SharedStore, Subscription,
};
pub use memory::{Collection, MemoryStore};
pub use records::{
    CaseFilter, CaseLocation, CasePriority, CaseRecord, CaseStatus, CaseUpdateRecord,
    NotificationFilter, NotificationKind, NotificationRecord, Role, UpdateFilter, UpdateKind,
    UserFilter, UserRecord,
};
