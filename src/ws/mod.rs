//! WebSocket layer: connection handling, message routing, registration.
//!
//! The WebSocket endpoint at `/ws` delivers real-time notifications.
//! A client registers its user id once after connecting; from then on
//! the connection receives every notification addressed to that user
//! until it unregisters or disconnects.

pub mod connection;
pub mod handler;
pub mod messages;
