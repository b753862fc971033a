//! Per-session conversational task state machine.
//!
//! A session moves between three modes: free conversation, multi-turn
//! task execution (maintenance requests, visit scheduling, amenity
//! reservations), and emergency response. Task flows collect structured
//! data one message at a time and commit through the workflow engine;
//! emergencies override whatever is in progress.
//!
//! # Architecture
//!
//! - **Domain**: [`domain::ConversationSession`], [`domain::SessionMode`],
//!   [`domain::ActiveTask`], [`domain::Intent`], [`domain::TaskFlow`]
//! - **Ports**: [`ports::IntentClassifier`], [`ports::SessionStore`]
//! - **Adapters**: [`adapters::memory::InMemorySessionStore`],
//!   [`adapters::memory::KeywordIntentClassifier`]
//! - **Services**: [`services::ConversationService`], the built-in task
//!   flows, and their commit workflows

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;
