//! Notification core.
//!
//! - [`SubscriptionRegistry`] - per-client watch sets and watermarks
//! - [`Notifier`] - wakes on every commit and posts snapshot deliveries to
//!   dirty subscriptions
//! - [`Delivery`] - the (snapshot, metadata) unit posted to a subscription

mod notifier;
mod subscription;

pub use notifier::*;
pub use subscription::*;

#[cfg(test)]
mod notifier_test;
