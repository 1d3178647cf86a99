//! Version-control helpers for the review tools.

pub mod diff;

pub use diff::get_git_diff;
