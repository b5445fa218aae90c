//! Anistream-Common: Shared types, constants, and utilities.
//!
//! This crate provides common functionality used across anistream:
//!
//! - **Typed IDs**: Numeric newtypes for animes and schedule entries
//! - **Catalog Models**: Animes, episodes, video servers, schedule entries
//! - **Video Sources**: Classification of episode sources as local or remote
//! - **Error Handling**: Common error types and result aliases
//!
//! # Examples
//!
//! ```
//! use anistream_common::{AnimeId, Error, Result, VideoSource};
//!
//! let id: AnimeId = "42".parse().unwrap();
//! assert_eq!(id.get(), 42);
//!
//! let source = VideoSource::classify("https://cdn.example.com/ep1.mp4");
//! assert!(source.is_remote());
//!
//! fn lookup(id: AnimeId) -> Result<()> {
//!     Err(Error::not_found("anime", id))
//! }
//! assert!(lookup(id).is_err());
//! ```

pub mod error;
pub mod ids;
pub mod models;
pub mod source;

pub use error::{Error, Result};
pub use ids::*;
pub use models::*;
pub use source::VideoSource;
