//! Common utilities and shared types for vigia-rs.
//!
//! This crate provides foundational components used across all vigia-rs crates:
//!
//! - **Configuration**: Application settings via [`Config`]
//! - **Error handling**: Unified error types via [`AppError`] and [`AppResult`]
//! - **ID Generation**: ULID-based unique identifiers via [`IdGenerator`]
//! - **Logging**: Tracing subscriber setup via [`logging::init`]
//!
//! # Example
//!
//! ```no_run
//! use vigia_common::{Config, IdGenerator, AppResult};
//!
//! fn example() -> AppResult<()> {
//!     let config = Config::load()?;
//!     let id_gen = IdGenerator::new();
//!     let id = id_gen.generate();
//!     println!("Generated ID: {}", id);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod id;
pub mod logging;

pub use config::{ApiConfig, Config, SessionConfig, StoreConfig};
pub use error::{AppError, AppResult};
pub use id::IdGenerator;
