//! Static-table implementation of the [`RecipientResolver`] port.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::workflow::domain::RecipientSelector;
use crate::workflow::ports::recipients::{RecipientError, RecipientResolver, RecipientResult};

/// Resolver backed by a fixed role→recipients table.
///
/// Direct selectors pass through unchanged; role selectors are looked up
/// in the table and unknown roles are rejected.
#[derive(Debug, Default, Clone)]
pub struct StaticRecipientResolver {
    roles: HashMap<String, Vec<String>>,
}

impl StaticRecipientResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a role group.
    #[must_use]
    pub fn with_role(
        mut self,
        role: impl Into<String>,
        recipients: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.roles
            .insert(role.into(), recipients.into_iter().map(Into::into).collect());
        self
    }
}

#[async_trait]
impl RecipientResolver for StaticRecipientResolver {
    async fn resolve(&self, selector: &RecipientSelector) -> RecipientResult<Vec<String>> {
        match selector {
            RecipientSelector::Direct(recipients) => Ok(recipients.clone()),
            RecipientSelector::Role(role) => self
                .roles
                .get(role)
                .cloned()
                .ok_or_else(|| RecipientError::UnknownRole(role.clone())),
        }
    }
}
