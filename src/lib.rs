//! Anistream - Anime catalog and video streaming backend
//!
//! This library crate exposes the core functionality for integration testing.

pub mod catalog;
pub mod config;
pub mod server;
pub mod streaming;
