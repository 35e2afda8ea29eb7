//! HTTP/JSON front end for the tourney engine.
//!
//! The binary in `main.rs` wires configuration, logging and storage together;
//! the router lives here so integration tests can drive it without a socket.

pub mod api;
pub mod config;
pub mod logging;
