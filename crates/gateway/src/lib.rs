//! REST mutation gateway for vigia-rs.
//!
//! State-changing requests go to the backend over HTTP; their effects are
//! never applied locally. The document store re-emits the authoritative
//! snapshot, and the live views pick it up from there.

pub mod auth;
pub mod cases;
pub mod client;
pub mod notifications;
pub mod updates;
pub mod users;

pub use auth::{LoginInput, LoginResponse, RegisterInput, StoreCredential};
pub use cases::{CreateCaseInput, ImageAttachment};
pub use client::ApiClient;
pub use updates::CreateCaseUpdateInput;
