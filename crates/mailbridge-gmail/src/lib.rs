//! Gmail provider client
//!
//! Implements the unified operation set against the Gmail REST API. The
//! query planner translates the abstract filter vocabulary into Gmail's
//! flat `field:value` search syntax; raw message resources are normalized
//! into the shared message record.

mod client;
mod error;
mod normalize;
mod query;
mod types;

pub use client::GmailClient;
pub use error::{GmailError, GmailResult};
pub use query::{plan_search, GmailQuery};
