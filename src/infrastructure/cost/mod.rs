//! Cost estimation and spend ledger

mod tracker;

pub use tracker::CostTracker;
