//! Tool-calling review agent.
//!
//! The agent drives a chat model through a bounded tool loop over the
//! working tree and returns the model's final review.

pub mod agent_loop;
pub mod client;
pub mod conversation;
pub mod error;
pub mod tools;

pub use agent_loop::{AgentConfig, ReviewAgent, ReviewProgress};
pub use client::{ChatClient, ClientConfig};
pub use error::ReviewError;
pub use tools::ToolExecutor;
