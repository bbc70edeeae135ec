//! SARTopo map integration: wire types, HTTP client, and the feature
//! cache that incremental polls merge into.

pub mod api_types;
pub mod client;
pub mod store;
pub mod symbols;
pub mod types;
