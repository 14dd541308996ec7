// src/analyze/mod.rs
//! Scoring and selection of candidate posts.

pub mod rank;
pub mod scoring;

pub use crate::analyze::rank::select;
pub use crate::analyze::scoring::{extract_cashtags, ScoreBreakdown, Scorer};
