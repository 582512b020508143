//! Room-based job progress fanout with late-subscriber replay.
//!
//! A long-running job gets a [`Progress`] handle; everything it emits is
//! broadcast to the subscribers of that job's room and recorded as the
//! job's last-known snapshot. A subscriber joining after the job started
//! receives that snapshot first, then live events in publish order.
//!
//! # Design
//!
//! The [`ProgressRegistry`] keeps one `tokio::broadcast` channel per job,
//! so subscribers of job A never receive job B's events. State is
//! process-local: in a horizontally scaled deployment a client must stay
//! connected to the instance running its job (sticky routing is a
//! deployment concern). The registry's surface (`create` / `subscribe` /
//! `get_last`) is transport-shaped so a broker-backed implementation
//! could replace it without changing call sites.
//!
//! Terminal snapshots are evicted a configurable TTL after the terminal
//! event, bounding memory on long-lived servers; see
//! [`ProgressRegistry::spawn_eviction`].

mod progress;
mod registry;

pub use progress::{Progress, ProgressUpdate};
pub use registry::{ProgressRegistry, ProgressSubscription, RegistryConfig};
