//! Service layer: business logic orchestration.
//!
//! [`MarketService`] is the engagement state machine: it runs every
//! mutating operation as one bounded store transaction and dispatches
//! post-commit notifications through the [`crate::domain::Notifier`].

pub mod market_service;

pub use market_service::{GigDetail, MarketService};
