//! Upstream HTTP transport (§4.8): one pooled client, one retry policy.

mod client;
mod retry;

pub use client::{build_client, user_agent};
pub use retry::retry_unary;
