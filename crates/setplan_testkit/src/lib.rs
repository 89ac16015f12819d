//! # SetPlan Testkit
//!
//! Test utilities for SetPlan.
//!
//! This crate provides:
//! - A seeded club with locations, handlers, dogs and one practice
//! - A store harness wired to an applier and a change feed
//! - Property-based generators for batches and reducer actions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use setplan_testkit::prelude::*;
//!
//! #[test]
//! fn rounds_stay_unique() {
//!     let h = TestStore::new();
//!     h.create(&h.club.ring, 1);
//!     assert_eq!(h.rounds(h.club.ring.id), vec![1]);
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
