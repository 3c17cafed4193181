//! # dfs3 Shared Types
//!
//! Domain entities, typed identifiers, event payload schemas and the
//! signed event envelope, shared by every other dfs3 crate.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: cross-crate wire/storage types live here.
//! - **Parse, don't validate**: identifiers are typed newtypes (`ids.rs`);
//!   an invalid `node_id`/`file_id`/`filename` cannot be constructed.
//! - **Envelope Integrity**: `EventEnvelope` is the sole wrapper for every
//!   domain event published to the ledger.

pub mod entities;
pub mod envelope;
pub mod errors;
pub mod events;
pub mod ids;

pub use entities::*;
pub use envelope::{EventEnvelope, PROTOCOL};
pub use errors::{ApiError, ValidationError};
pub use events::*;
pub use ids::*;
