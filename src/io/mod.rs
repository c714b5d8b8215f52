//! IO modules - external system interfaces
//!
//! This module contains all external IO operations:
//! - `provider` - Page-data provider returning raw fare listings
//! - `notifier` - Webhook notifications for new lowest fares
//! - `state_store` - JSON snapshot persistence of the tracking state

pub mod notifier;
pub mod provider;
pub mod state_store;

// Re-export commonly used types
pub use notifier::{format_message, LogNotifier, Notifier, WebhookNotifier};
pub use provider::{HttpListingProvider, ListingProvider};
pub use state_store::{JsonFileStore, StateStore};
