//! Lobby HTTP server.
//!
//! Exposes the profile revision engine and the party coordinator over HTTP
//! and delivers their notifications over per-account `WebSocket` queues.
//!
//! # Modules
//!
//! - [`config`] -- YAML configuration with environment overrides
//! - [`error`] -- HTTP error mapping
//! - [`handlers`] -- REST handlers
//! - [`hub`] -- Notification channel implementation
//! - [`router`] -- Route table
//! - [`server`] -- Listener lifecycle
//! - [`state`] -- Shared services
//! - [`ws`] -- Notification socket

pub mod config;
pub mod error;
pub mod handlers;
pub mod hub;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;
