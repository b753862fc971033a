//! Keyword-table implementation of the [`IntentClassifier`] port.
//!
//! A fallback for hosts without an NLU backend: Spanish keyword tables
//! checked in priority order, emergencies first. Accented and unaccented
//! spellings are both listed because chat input rarely carries correct
//! accents.

use async_trait::async_trait;

use crate::conversation::domain::Intent;
use crate::conversation::ports::classifier::{ClassifierResult, IntentClassifier};

const EMERGENCY_KEYWORDS: &[&str] = &[
    "emergencia",
    "incendio",
    "fuego",
    "inundación",
    "inundacion",
    "fuga de gas",
    "ambulancia",
    "911",
];

const MAINTENANCE_KEYWORDS: &[&str] = &[
    "mantenimiento",
    "reparar",
    "reparación",
    "reparacion",
    "descompuesto",
    "descompuesta",
    "roto",
    "rota",
    "averiado",
    "averiada",
    "no funciona",
    "fuga",
    "gotea",
];

const VISIT_KEYWORDS: &[&str] = &[
    "visita",
    "visitante",
    "invitado",
    "invitada",
];

const RESERVATION_KEYWORDS: &[&str] = &[
    "reservar",
    "reserva",
    "apartar",
    "salón",
    "salon",
    "gimnasio",
    "alberca",
    "palapa",
];

/// Keyword-matching implementation of [`IntentClassifier`].
#[derive(Debug, Default, Clone)]
pub struct KeywordIntentClassifier;

impl KeywordIntentClassifier {
    /// Creates the classifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn matches(text: &str, keywords: &[&str]) -> bool {
        keywords.iter().any(|keyword| text.contains(keyword))
    }
}

#[async_trait]
impl IntentClassifier for KeywordIntentClassifier {
    async fn classify(&self, text: &str) -> ClassifierResult<Intent> {
        let normalized = text.to_lowercase();

        // Priority order: an emergency mention wins over everything.
        if Self::matches(&normalized, EMERGENCY_KEYWORDS) {
            return Ok(Intent::Emergency);
        }
        if Self::matches(&normalized, MAINTENANCE_KEYWORDS) {
            return Ok(Intent::MaintenanceRequest);
        }
        if Self::matches(&normalized, VISIT_KEYWORDS) {
            return Ok(Intent::VisitSchedule);
        }
        if Self::matches(&normalized, RESERVATION_KEYWORDS) {
            return Ok(Intent::ReservationBook);
        }

        Ok(Intent::General)
    }
}
