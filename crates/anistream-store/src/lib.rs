//! Anistream-Store: whole-document JSON persistence for catalog collections.
//!
//! Every collection (the anime list, each anime's episode list, the trending
//! settings and the schedule) is one JSON document that is read and written
//! in full. This crate provides:
//!
//! - [`DocumentStore`] - the raw byte-level backend interface
//! - [`JsonFileStore`] - files under a data directory, written atomically
//! - [`MemoryStore`] - in-process backend for tests
//! - [`Store`] - typed load/save/update on top of a backend, serializing
//!   read-modify-write cycles per collection key
//!
//! # Example
//!
//! ```
//! use anistream_common::{Anime, AnimeId};
//! use anistream_store::{Collection, MemoryStore, Store};
//!
//! let store = Store::new(MemoryStore::default());
//! store
//!     .update(&Collection::Animes, |animes: &mut Vec<Anime>| {
//!         animes.push(Anime::new(AnimeId::new(1), "Frieren"));
//!         Ok(())
//!     })
//!     .unwrap();
//!
//! let animes: Vec<Anime> = store.load(&Collection::Animes).unwrap();
//! assert_eq!(animes[0].title, "Frieren");
//! ```

mod collection;
mod file;
mod memory;
mod store;

pub use collection::Collection;
pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use store::{DocumentStore, Store};
