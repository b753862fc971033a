//! Workflow definitions, the execution engine, and automation routing.
//!
//! A workflow is a named, ordered sequence of conditional steps. The engine
//! executes registered workflows against a caller-seeded context, skipping
//! steps whose conditions do not hold and dispatching the rest to the
//! collaborator ports (repository, notifier, recipient resolver, external
//! calls). The automation manager maps external event types onto registered
//! workflows with templated seed contexts.
//!
//! # Architecture
//!
//! The module follows hexagonal architecture principles:
//!
//! - **Domain**: Pure domain types ([`domain::WorkflowDefinition`],
//!   [`domain::Step`], [`domain::Action`], [`domain::ExecutionContext`], etc.)
//! - **Ports**: Abstract trait interfaces ([`ports::RecordRepository`],
//!   [`ports::Notifier`], [`ports::RecipientResolver`],
//!   [`ports::ExternalCallPort`])
//! - **Adapters**: Concrete implementations
//!   ([`adapters::memory::InMemoryRecordRepository`], etc.)
//! - **Services**: The engine itself ([`services::WorkflowEngine`]) and the
//!   automation facade ([`services::AutomationManager`])
//!
//! # Example
//!
//! ```
//! use barragan::workflow::domain::{
//!     Action, Condition, ConditionOperator, ModelName, Step, WorkflowDefinition, WorkflowId,
//! };
//! use std::collections::BTreeMap;
//!
//! let mut fields = BTreeMap::new();
//! fields.insert("description".to_owned(), "{description}".into());
//!
//! let definition = WorkflowDefinition::new(WorkflowId::new("ticket_intake"), "Ticket intake")
//!     .with_step(
//!         Step::new(
//!             "create_ticket",
//!             Action::CreateRecord {
//!                 model: ModelName::new("ticket"),
//!                 fields,
//!             },
//!         )
//!         .with_condition(Condition::new("description", ConditionOperator::Equals, "leak")),
//!     );
//!
//! assert_eq!(definition.steps().len(), 1);
//! ```

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
