//! Shared test utilities for the bundle resolver workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`repo`]: [`TestBundleRepo`](repo::TestBundleRepo) builder for
//!   throwaway repositories, and the path of the checked-in fixture
//!   repository
//! - [`closure`]: walks module configurations the way a dependency engine
//!   would

pub mod closure;
pub mod repo;

pub use closure::{ClosureError, resolve_closure};
pub use repo::{TestBundleRepo, fixture_repository};
