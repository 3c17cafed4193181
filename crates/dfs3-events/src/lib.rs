//! # dfs3-events
//!
//! Turns the tiny pointers announced over the bus into durable state:
//! fetches the full signed envelope from the ledger, verifies it against
//! the emitting node's identity key, indexes it for exactly-once
//! ingestion, and dispatches it into the node/user registries and file
//! metadata store. The one piece of `file_created` handling this crate
//! cannot do on its own — fetching and writing a cloned replica — is
//! delegated to an injected [`ports::CloneCoordinator`].

pub mod dispatch;
pub mod errors;
pub mod index;
pub mod listener;
pub mod ports;
pub mod publish;
pub mod verify;

pub use dispatch::EventDispatcher;
pub use errors::EventError;
pub use index::{EventIndex, EventIndexEntry};
pub use listener::{AnnouncementSource, EventListener};
pub use ports::CloneCoordinator;
pub use publish::EventPublisher;
pub use verify::verify_envelope;
