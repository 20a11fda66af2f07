//! Outlook provider client over Microsoft Graph
//!
//! Implements the unified operation set against Graph's mail endpoints. The
//! query planner is where the provider divergence is reconciled: the flat
//! label vocabulary becomes a folder-scoped request path, an OData `$filter`
//! expression, or both, depending on how the label classifies.

mod client;
mod error;
mod normalize;
mod query;
mod types;

pub use client::OutlookClient;
pub use error::{GraphError, GraphResult};
pub use query::{plan_search, to_graph_datetime, well_known_folder, GraphQuery};
