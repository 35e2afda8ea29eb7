//! Pool play scheduling.
//!
//! This module provides:
//! - Round robin pairing generation (circle method) with a best-effort
//!   anti-adjacency reordering
//! - Sequential kickoff time assignment

pub mod kickoff;
pub mod round_robin;

pub use kickoff::kickoff_times;
pub use round_robin::{Pairing, reduce_adjacency, round_robin};
