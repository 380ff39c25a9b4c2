//! Coordination substrate for the transfer system.
//!
//! - [`LockProvider`] serializes the read-decide-write cycle per aggregate
//!   id across concurrently-handling instances; ownership travels in an
//!   explicit [`LockToken`], never ambient task identity.
//! - [`RetryPolicy`] is the shared capped-exponential-backoff schedule.
//! - [`listener`] hosts the at-least-once stream listener that feeds
//!   consumed log entries into in-process channels and acknowledges them
//!   only after delivery.

pub mod listener;
pub mod lock;
pub mod retry;

pub use listener::{
    Delivery, ListenerConfig, ListenerHandle, spawn_listener, spawn_listener_mapped,
};
pub use lock::{
    DEFAULT_ACQUIRE_WAIT, InMemoryLockProvider, LockError, LockProvider, LockToken,
    acquire_with_retry, with_lock, with_lock_using,
};
pub use retry::RetryPolicy;
