//! # dfs3-auth
//!
//! Challenge/response login and bearer session issuance: the one part of
//! the original dfs3 node left as an unimplemented stub, built here from
//! the specification's literal byte layout and TTLs plus the shape of the
//! HTTP handlers that were meant to call into it.

pub mod challenge;
pub mod errors;
pub mod service;
pub mod session;

pub use challenge::ChallengeStore;
pub use errors::AuthError;
pub use service::AuthService;
pub use session::SessionStore;
