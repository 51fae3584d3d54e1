//! Subscription registry
//!
//! The registry answers "who is subscribed to this channel" for fan-out
//! code and "which connection belongs to this user" for private delivery.
//! It never sends anything itself.
//!
//! # Architecture
//!
//! ```text
//!                       Arc<SubscriptionRegistry>
//!              ┌──────────────────────────────────────┐
//!              │ RwLock<Indices> {                    │
//!              │   connection_channels: Id → {Chan}   │
//!              │   channel_connections: Chan → {Id →  │
//!              │                          Handle}     │
//!              │   user_connection:     User → Id     │
//!              │ }                                    │
//!              └──────────┬──────────────────┬────────┘
//!                         │                  │
//!         subscribe()     │                  │   connections()
//!         unsubscribe()   │                  │   connection_by_user_id()
//!         remove()        │                  │
//!                         ▼                  ▼
//!                   [Dispatcher]       [fan-out code] ──► transport
//! ```
//!
//! # Locking
//!
//! The three indices describe one relation, so they share one lock. Writers
//! update every view inside the same critical section and report the new
//! index sizes to the `MetricsCollector` before releasing it.

mod index;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use index::ConnectionHandle;
pub use store::{SubscriptionRegistry, SubscriptionStore};
