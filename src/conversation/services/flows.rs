//! Built-in task flows and the workflows they commit through.
//!
//! Three flows ship with the crate, matching the conversations the
//! building chatbot handles: maintenance requests, visit scheduling, and
//! amenity reservations. Prompts and replies are in Spanish, the language
//! the deployed system speaks. Commit replies may reference keys of the
//! final execution context (for example `{visit_id}`); the state machine
//! renders them after the workflow ran.

use chrono::{NaiveDate, NaiveTime};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::conversation::domain::{StepOutcome, TaskFlow, TaskFlowError, TaskKind, TaskStepName};
use crate::workflow::domain::{
    Action, Condition, ConditionOperator, ExecutionContext, ModelName, NotificationChannel,
    RecipientSelector, Step, WorkflowDefinition, WorkflowId,
};

/// Identifier of the workflow committed by the maintenance flow.
#[must_use]
pub fn maintenance_workflow_id() -> WorkflowId {
    WorkflowId::new("maintenance_intake")
}

/// Identifier of the workflow committed by the visit flow.
#[must_use]
pub fn visit_workflow_id() -> WorkflowId {
    WorkflowId::new("visit_registration")
}

/// Identifier of the workflow committed by the reservation flow.
#[must_use]
pub fn reservation_workflow_id() -> WorkflowId {
    WorkflowId::new("reservation_booking")
}

/// Identifier of the workflow fired on emergency messages.
#[must_use]
pub fn emergency_workflow_id() -> WorkflowId {
    WorkflowId::new("emergency_alert")
}

/// Registry of task flows, keyed by task kind.
///
/// Built once at process start and read-only afterwards.
#[derive(Clone, Default)]
pub struct TaskRegistry {
    flows: HashMap<TaskKind, Arc<dyn TaskFlow>>,
}

impl TaskRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the three built-in flows.
    #[must_use]
    pub fn with_default_flows() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(MaintenanceFlow));
        registry.register(Arc::new(VisitFlow));
        registry.register(Arc::new(ReservationFlow));
        registry
    }

    /// Registers a flow under its kind, replacing any previous one.
    pub fn register(&mut self, flow: Arc<dyn TaskFlow>) {
        self.flows.insert(flow.kind(), flow);
    }

    /// Returns the flow for a kind, if registered.
    #[must_use]
    pub fn get(&self, kind: TaskKind) -> Option<Arc<dyn TaskFlow>> {
        self.flows.get(&kind).cloned()
    }
}

impl std::fmt::Debug for TaskRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kinds: Vec<&str> = self.flows.keys().map(TaskKind::as_str).collect();
        f.debug_struct("TaskRegistry").field("kinds", &kinds).finish()
    }
}

/// Builds the workflow definitions the built-in flows commit through.
///
/// Hosts register these with the engine at startup, alongside their own.
#[must_use]
pub fn default_task_workflows() -> Vec<WorkflowDefinition> {
    vec![
        maintenance_intake_workflow(),
        visit_registration_workflow(),
        reservation_booking_workflow(),
        emergency_alert_workflow(),
    ]
}

fn string_fields(entries: &[(&str, &str)]) -> BTreeMap<String, Value> {
    entries
        .iter()
        .map(|(key, value)| ((*key).to_owned(), Value::String((*value).to_owned())))
        .collect()
}

fn maintenance_intake_workflow() -> WorkflowDefinition {
    WorkflowDefinition::new(maintenance_workflow_id(), "Alta de solicitud de mantenimiento")
        .with_step(Step::new(
            "create_request",
            Action::CreateRecord {
                model: ModelName::new("maintenance_request"),
                fields: string_fields(&[
                    ("description", "{description}"),
                    ("location", "{location}"),
                    ("priority", "{priority}"),
                    ("reported_by", "{user_id}"),
                    ("status", "open"),
                ]),
            },
        ))
        .with_step(
            Step::new(
                "alert_staff",
                Action::Notify {
                    recipients: RecipientSelector::role("maintenance_staff"),
                    title: "Solicitud de mantenimiento prioritaria".to_owned(),
                    body: "{description} en {location} (prioridad {priority})".to_owned(),
                    channel: NotificationChannel::Whatsapp,
                },
            )
            .with_condition(Condition::new("escalate", ConditionOperator::Equals, true)),
        )
}

fn visit_registration_workflow() -> WorkflowDefinition {
    WorkflowDefinition::new(visit_workflow_id(), "Registro de visita")
        .with_step(Step::new(
            "create_visit",
            Action::CreateRecord {
                model: ModelName::new("visit"),
                fields: string_fields(&[
                    ("visitor_name", "{visitor_name}"),
                    ("visit_date", "{visit_date}"),
                    ("host", "{user_id}"),
                    ("status", "expected"),
                ]),
            },
        ))
        .with_step(Step::new(
            "notify_front_desk",
            Action::Notify {
                recipients: RecipientSelector::role("front_desk"),
                title: "Visita programada".to_owned(),
                body: "Visita de {visitor_name} el {visit_date}".to_owned(),
                channel: NotificationChannel::Push,
            },
        ))
}

fn reservation_booking_workflow() -> WorkflowDefinition {
    WorkflowDefinition::new(reservation_workflow_id(), "Reserva de amenidad")
        .with_step(Step::new(
            "create_reservation",
            Action::CreateRecord {
                model: ModelName::new("reservation"),
                fields: string_fields(&[
                    ("amenity", "{amenity}"),
                    ("reservation_date", "{reservation_date}"),
                    ("time_slot", "{time_slot}"),
                    ("reserved_by", "{user_id}"),
                    ("status", "confirmed"),
                ]),
            },
        ))
}

fn emergency_alert_workflow() -> WorkflowDefinition {
    WorkflowDefinition::new(emergency_workflow_id(), "Alerta de emergencia")
        .with_step(Step::new(
            "create_incident",
            Action::CreateRecord {
                model: ModelName::new("incident"),
                fields: string_fields(&[
                    ("description", "{message}"),
                    ("reported_by", "{user_id}"),
                    ("status", "open"),
                ]),
            },
        ))
        .with_step(Step::new(
            "notify_security",
            Action::Notify {
                recipients: RecipientSelector::role("security_staff"),
                title: "Alerta de emergencia".to_owned(),
                body: "{message}".to_owned(),
                channel: NotificationChannel::Sms,
            },
        ))
}

fn context_from_data(data: &BTreeMap<String, Value>) -> ExecutionContext {
    let mut context = ExecutionContext::new();
    for (key, value) in data {
        context.insert(key.clone(), value.clone());
    }
    context
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(input, "%d/%m/%Y"))
        .ok()
}

/// Maintenance request flow: description, location, urgency, commit.
#[derive(Debug, Default, Clone, Copy)]
pub struct MaintenanceFlow;

impl MaintenanceFlow {
    const DESCRIBE: &'static str = "describe_issue";
    const LOCATE: &'static str = "locate_issue";
    const URGENCY: &'static str = "rate_urgency";

    fn parse_priority(input: &str) -> Option<&'static str> {
        match input.trim().to_lowercase().as_str() {
            "1" | "baja" => Some("low"),
            "2" | "media" => Some("medium"),
            "3" | "alta" => Some("high"),
            "4" | "urgente" => Some("urgent"),
            _ => None,
        }
    }
}

impl TaskFlow for MaintenanceFlow {
    fn kind(&self) -> TaskKind {
        TaskKind::MaintenanceRequest
    }

    fn first_step(&self) -> TaskStepName {
        TaskStepName::new(Self::DESCRIBE)
    }

    fn opening_prompt(&self) -> String {
        "Claro, levantemos una solicitud de mantenimiento. ¿Qué problema encontraste?".to_owned()
    }

    fn handle(
        &self,
        step: &TaskStepName,
        raw_input: &str,
        data: &mut BTreeMap<String, Value>,
    ) -> Result<StepOutcome, TaskFlowError> {
        let input = raw_input.trim();
        match step.as_str() {
            Self::DESCRIBE => {
                if input.is_empty() {
                    return Ok(StepOutcome::stay(
                        "Necesito una descripción del problema para continuar.",
                    ));
                }
                data.insert("description".to_owned(), Value::String(input.to_owned()));
                Ok(StepOutcome::next(
                    "¿En qué lugar se encuentra el problema?",
                    TaskStepName::new(Self::LOCATE),
                ))
            }

            Self::LOCATE => {
                if input.is_empty() {
                    return Ok(StepOutcome::stay("¿Me indicas el lugar, por favor?"));
                }
                data.insert("location".to_owned(), Value::String(input.to_owned()));
                Ok(StepOutcome::next(
                    "Del 1 al 4, ¿qué tan urgente es? (1 baja, 2 media, 3 alta, 4 urgente)",
                    TaskStepName::new(Self::URGENCY),
                ))
            }

            Self::URGENCY => {
                let Some(priority) = Self::parse_priority(input) else {
                    return Ok(StepOutcome::stay(
                        "No entendí la urgencia. Responde con un número del 1 al 4.",
                    ));
                };
                data.insert("priority".to_owned(), Value::String(priority.to_owned()));
                data.insert(
                    "escalate".to_owned(),
                    Value::Bool(matches!(priority, "high" | "urgent")),
                );
                Ok(StepOutcome::commit(
                    "Listo, registré tu solicitud de mantenimiento con prioridad {priority}. \
                     Folio: {maintenance_request_id}.",
                    maintenance_workflow_id(),
                    context_from_data(data),
                ))
            }

            _ => Err(TaskFlowError::HandlerMismatch {
                kind: self.kind(),
                step: step.clone(),
            }),
        }
    }
}

/// Visit scheduling flow: visitor, date, confirmation, commit.
///
/// A declined confirmation loops back to visitor collection instead of
/// committing; the session stays in task execution.
#[derive(Debug, Default, Clone, Copy)]
pub struct VisitFlow;

impl VisitFlow {
    const VISITOR: &'static str = "collect_visitor";
    const DATE: &'static str = "collect_date";
    const CONFIRM: &'static str = "confirm";
}

impl TaskFlow for VisitFlow {
    fn kind(&self) -> TaskKind {
        TaskKind::VisitSchedule
    }

    fn first_step(&self) -> TaskStepName {
        TaskStepName::new(Self::VISITOR)
    }

    fn opening_prompt(&self) -> String {
        "Con gusto agendamos una visita. ¿Cuál es el nombre del visitante?".to_owned()
    }

    fn handle(
        &self,
        step: &TaskStepName,
        raw_input: &str,
        data: &mut BTreeMap<String, Value>,
    ) -> Result<StepOutcome, TaskFlowError> {
        let input = raw_input.trim();
        match step.as_str() {
            Self::VISITOR => {
                if input.is_empty() {
                    return Ok(StepOutcome::stay("¿Me das el nombre del visitante?"));
                }
                data.insert("visitor_name".to_owned(), Value::String(input.to_owned()));
                Ok(StepOutcome::next(
                    "¿Qué día será la visita? Usa el formato AAAA-MM-DD.",
                    TaskStepName::new(Self::DATE),
                ))
            }

            Self::DATE => {
                let Some(date) = parse_date(input) else {
                    return Ok(StepOutcome::stay(
                        "No entendí la fecha. Usa el formato AAAA-MM-DD, por ejemplo 2026-03-14.",
                    ));
                };
                let formatted = date.format("%Y-%m-%d").to_string();
                data.insert("visit_date".to_owned(), Value::String(formatted.clone()));

                let visitor = data
                    .get("visitor_name")
                    .and_then(Value::as_str)
                    .unwrap_or("(visitante)")
                    .to_owned();
                Ok(StepOutcome::next(
                    format!("Visita de {visitor} el {formatted}. ¿Confirmo el registro? (sí/no)"),
                    TaskStepName::new(Self::CONFIRM),
                ))
            }

            Self::CONFIRM => match input.to_lowercase().as_str() {
                "si" | "sí" => Ok(StepOutcome::commit(
                    "Tu visita quedó registrada. Folio: {visit_id}.",
                    visit_workflow_id(),
                    context_from_data(data),
                )),
                "no" => Ok(StepOutcome::restart(
                    "De acuerdo, empecemos de nuevo. ¿Cuál es el nombre del visitante?",
                    TaskStepName::new(Self::VISITOR),
                )),
                _ => Ok(StepOutcome::stay("Responde sí o no, por favor.")),
            },

            _ => Err(TaskFlowError::HandlerMismatch {
                kind: self.kind(),
                step: step.clone(),
            }),
        }
    }
}

/// Amenity reservation flow: amenity, date, time slot, commit.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReservationFlow;

impl ReservationFlow {
    const AMENITY: &'static str = "choose_amenity";
    const DATE: &'static str = "choose_date";
    const SLOT: &'static str = "choose_slot";
}

impl TaskFlow for ReservationFlow {
    fn kind(&self) -> TaskKind {
        TaskKind::ReservationBook
    }

    fn first_step(&self) -> TaskStepName {
        TaskStepName::new(Self::AMENITY)
    }

    fn opening_prompt(&self) -> String {
        "Claro, hagamos una reserva. ¿Qué área quieres reservar? (salón, gimnasio, alberca...)"
            .to_owned()
    }

    fn handle(
        &self,
        step: &TaskStepName,
        raw_input: &str,
        data: &mut BTreeMap<String, Value>,
    ) -> Result<StepOutcome, TaskFlowError> {
        let input = raw_input.trim();
        match step.as_str() {
            Self::AMENITY => {
                if input.is_empty() {
                    return Ok(StepOutcome::stay("¿Qué área te gustaría reservar?"));
                }
                data.insert("amenity".to_owned(), Value::String(input.to_owned()));
                Ok(StepOutcome::next(
                    "¿Para qué fecha? Usa el formato AAAA-MM-DD.",
                    TaskStepName::new(Self::DATE),
                ))
            }

            Self::DATE => {
                let Some(date) = parse_date(input) else {
                    return Ok(StepOutcome::stay(
                        "No entendí la fecha. Usa el formato AAAA-MM-DD, por ejemplo 2026-03-14.",
                    ));
                };
                data.insert(
                    "reservation_date".to_owned(),
                    Value::String(date.format("%Y-%m-%d").to_string()),
                );
                Ok(StepOutcome::next(
                    "¿En qué horario? (por ejemplo 16:00)",
                    TaskStepName::new(Self::SLOT),
                ))
            }

            Self::SLOT => {
                if NaiveTime::parse_from_str(input, "%H:%M").is_err() {
                    return Ok(StepOutcome::stay(
                        "No entendí el horario. Usa el formato HH:MM, por ejemplo 16:00.",
                    ));
                }
                data.insert("time_slot".to_owned(), Value::String(input.to_owned()));
                Ok(StepOutcome::commit(
                    "Tu reserva del {amenity} quedó registrada. Folio: {reservation_id}.",
                    reservation_workflow_id(),
                    context_from_data(data),
                ))
            }

            _ => Err(TaskFlowError::HandlerMismatch {
                kind: self.kind(),
                step: step.clone(),
            }),
        }
    }
}
