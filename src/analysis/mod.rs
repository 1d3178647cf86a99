//! Static analysis modules.
//!
//! Wraps external linters so the review agent can ask for their output.

pub mod lint;

pub use lint::run_linter;
