//! Placement brackets.
//!
//! A bracket is a set of matches whose participants are not known at setup.
//! Each slot references either a final pool rank or the winner or loser of
//! another bracket match. Slots are resolved when the referenced pool
//! completes or the referenced match is decided.

pub mod graph;
pub mod models;

pub use graph::{BracketGraph, FinalRank, MAX_FINAL_RANK};
pub use models::{
    BracketMatch, BracketMatchTemplate, BracketSlot, MatchOutcome, SlotRef, SlotState, ordinal,
    winning_side,
};
