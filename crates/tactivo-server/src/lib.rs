//! HTTP/JSON API server for editing client training programs.
//!
//! Holds each client's programs in memory, applies edits optimistically,
//! pushes changed row placements to the row store in concurrent batches and
//! reports the outcome as short-lived notifications. Drag sessions are kept
//! apart from the program state and advanced by a frame pump.

pub mod config;
pub mod drag;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod persist;
pub mod router;
pub mod schema;
pub mod service;
pub mod state;
