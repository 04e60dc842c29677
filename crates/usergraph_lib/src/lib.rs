pub mod config;
pub mod graphql_api;

#[cfg(feature = "tests")]
pub mod test_utils;

pub use usergraph_backend_client as backend;

pub const USERGRAPH_VERSION: &str = env!("CARGO_PKG_VERSION");
