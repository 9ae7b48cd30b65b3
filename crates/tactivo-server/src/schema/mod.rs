//! API request/response types for the tactivo HTTP API.

pub mod catalog;
pub mod common;
pub mod drag;
pub mod programs;
