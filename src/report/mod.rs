//! Report rendering for finished reviews.

pub mod generator;

pub use generator::write_report;
