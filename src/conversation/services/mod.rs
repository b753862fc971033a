//! Application services for the conversation subsystem.
//!
//! The state machine advances sessions turn by turn; the built-in task
//! flows implement the maintenance, visit, and reservation conversations
//! and the workflows they commit through.

mod flows;
mod state_machine;

#[cfg(test)]
mod state_machine_tests;

pub use flows::{
    MaintenanceFlow, ReservationFlow, TaskRegistry, VisitFlow, default_task_workflows,
    emergency_workflow_id, maintenance_workflow_id, reservation_workflow_id, visit_workflow_id,
};
pub use state_machine::{ConversationService, TurnReply};
