//! In-memory adapter implementations for testing and embedded hosts.
//!
//! These adapters provide simple, thread-safe implementations suitable for
//! unit testing and for hosts that do not need durability. Recording
//! variants expose what they received for assertions.

mod external;
mod notifier;
mod recipients;
mod repository;

pub use external::InMemoryExternalCalls;
pub use notifier::{RecordingNotifier, SentNotification};
pub use recipients::StaticRecipientResolver;
pub use repository::{InMemoryRecordRepository, StoredRecord};
