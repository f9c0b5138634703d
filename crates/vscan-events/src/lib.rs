//! Event fanout for live status viewers.
//!
//! Every connected client holds one [`Subscription`]; publishers call
//! [`EventBus::publish`] and never observe delivery failures.

pub mod bus;

pub use bus::{EventBus, SubscriberId, Subscription, DEFAULT_BUFFER};
