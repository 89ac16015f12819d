//! # SetPlan Client
//!
//! Client-side consistency for a practice's set list.
//!
//! This crate provides:
//! - A pure reducer over typed actions ([`reduce`])
//! - A single-writer dispatcher task owning the reducer state
//! - A cancellable debouncer for coalescing rapid edits
//! - The [`SetService`] transport abstraction with a loopback and a mock
//! - [`PracticeSession`], tying the pieces to a bus subscription
//!
//! # Consistency model
//!
//! The client never applies local edits speculatively. Edits go to the
//! service and only confirmed rows reach the state, through the same
//! serialized dispatch point as pushed events. A pushed event for the same
//! set simply overwrites with server truth.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod config;
mod debounce;
mod dispatcher;
mod error;
mod reducer;
mod session;
mod transport;

pub use config::ClientConfig;
pub use debounce::{DebounceHandle, Debouncer};
pub use dispatcher::Dispatcher;
pub use error::{ClientError, ClientResult};
pub use reducer::{reduce, Action, SetListState};
pub use session::{PracticeSession, SessionEvent};
pub use transport::{LocalService, MockService, SetService};
