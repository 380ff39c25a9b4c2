//! Choreographed saga closing the loop between accounts and transactions.
//!
//! There is no central orchestrator: the account side publishes what
//! happened to it, and this crate reacts. [`translator`] is the pure
//! event-to-command mapping; [`TransferChoreography`] consumes deliveries
//! from the stream listener and dispatches the mapped commands through the
//! transaction service, tolerating the duplicates and reordering an
//! at-least-once stream produces.

pub mod choreography;
pub mod translator;

pub use choreography::TransferChoreography;
pub use translator::{SagaReaction, react};
