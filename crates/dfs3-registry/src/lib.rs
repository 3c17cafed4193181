//! # dfs3-registry
//!
//! Node and user directories: read-through caches over a SQLite-backed
//! relational store, rebuilt entirely from the events each node has
//! observed (`node_registered`, `node_status`, `user_registered`). Cache
//! invalidation always precedes the write it guards, so a reader can
//! never observe a cache hit that is stale relative to the row it backs.

pub mod cache;
pub mod errors;
pub mod nodes;
pub mod schema;
pub mod users;

pub use errors::RegistryError;
pub use nodes::NodeRegistry;
pub use users::UserRegistry;
