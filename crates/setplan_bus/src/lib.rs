//! # SetPlan Bus
//!
//! Live change propagation for SetPlan.
//!
//! This crate provides:
//! - Topics keyed by entity kind and lifecycle stage
//! - Practice and club scoped subscriptions
//! - A delivery filter enforcing club membership and private practices
//! - A JSON wire envelope for transports
//!
//! # Delivery
//!
//! Delivery is at-most-once per live connection. Each subscription owns a
//! bounded stream; a full stream drops the event. There is no durable
//! queue: a client that disconnects or misses events reconciles through a
//! full refetch.
//!
//! Events for one entity reach a subscriber in commit order. There is no
//! ordering guarantee across entities.
//!
//! ```rust,ignore
//! use setplan_bus::{BusConfig, EventBus, Scope};
//!
//! let bus = Arc::new(EventBus::new(BusConfig::default(), store.clone()));
//! let applier = BatchApplier::new(store, bus.clone());
//!
//! let mut subscription = bus.subscribe(&caller, Scope::Practice(practice_id))?;
//! while let Some(event) = subscription.recv().await {
//!     // ...
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod bus;
mod config;
mod error;
mod topic;
mod wire;

pub use bus::{BusStats, EventBus, EventPredicate, PracticeDirectory, Subscription, SubscriptionId};
pub use config::BusConfig;
pub use error::{BusError, BusResult};
pub use topic::{Scope, Topic};
pub use wire::WireEnvelope;
