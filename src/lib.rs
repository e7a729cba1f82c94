//! # gigboard
//!
//! REST API and WebSocket gateway for a gig marketplace hiring workflow.
//!
//! A gig is posted by an owner, candidates place competing bids, and the
//! owner hires exactly one bidder: an atomic transition that rejects
//! every competing pending bid and notifies the hired bidder over any
//! live WebSocket sessions.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP, WebSocket)
//!     │
//!     ├── REST Handlers (api/)
//!     ├── WS Handler (ws/)
//!     │
//!     ├── MarketService (service/)
//!     ├── Notifier + SessionRegistry (domain/)
//!     │
//!     └── MarketStore (persistence/: PostgreSQL or in-memory)
//! ```

pub mod api;
pub mod app_state;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod service;
pub mod ws;
