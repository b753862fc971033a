//! Port trait definitions for the workflow subsystem.
//!
//! Ports define the abstract interfaces that the engine requires from
//! infrastructure. Adapters implement these ports to connect the engine
//! to databases, notification transports, and host integrations.

pub mod external;
pub mod notifier;
pub mod recipients;
pub mod repository;

pub use external::{ExternalCallError, ExternalCallPort, ExternalCallResult};
pub use notifier::{Notifier, NotifierError, NotifierResult};
pub use recipients::{RecipientError, RecipientResolver, RecipientResult};
pub use repository::{RecordRepository, RepositoryError, RepositoryResult};
