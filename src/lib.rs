//! Pictor - a terminal client for self-hosted image catalogs.
//!
//! This crate provides a terminal client over the catalog's REST surface
//! with clean architecture: a shared response cache with request
//! coalescing and invalidation, a sequential upload pipeline, and a TUI.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

/// Application layer containing the synchronization services.
pub mod application;
/// Domain layer containing entities, errors, and port definitions.
pub mod domain;
/// Infrastructure layer containing adapters for external services.
pub mod infrastructure;
/// Presentation layer containing UI components and event handling.
pub mod presentation;

/// Current version of the application.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name.
pub const NAME: &str = "pictor";
