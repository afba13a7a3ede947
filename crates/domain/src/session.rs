use std::collections::BTreeSet;

use permeon_core::{ActorId, AppError, AppResult};
use serde::{Deserialize, Serialize};

/// Per-request session consumed by permission checks.
///
/// Carries the actor identity and a flat, case-sensitive set of granted
/// permission names. The set is fixed at construction; callers replace the
/// whole session rather than mutate grants incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    actor_id: ActorId,
    granted_permissions: BTreeSet<String>,
}

impl Session {
    /// Creates a session with validated permission names.
    pub fn new(
        actor_id: ActorId,
        granted_permissions: impl IntoIterator<Item = String>,
    ) -> AppResult<Self> {
        let mut validated = BTreeSet::new();
        for name in granted_permissions {
            if name.trim().is_empty() {
                return Err(AppError::Validation(
                    "granted permission names must not be empty or whitespace".to_owned(),
                ));
            }
            validated.insert(name);
        }

        Ok(Self {
            actor_id,
            granted_permissions: validated,
        })
    }

    /// Creates a session with no grants at all.
    #[must_use]
    pub fn anonymous(actor_id: ActorId) -> Self {
        Self {
            actor_id,
            granted_permissions: BTreeSet::new(),
        }
    }

    /// Returns the actor this session was issued to.
    #[must_use]
    pub fn actor_id(&self) -> ActorId {
        self.actor_id
    }

    /// Returns whether the session grants a permission name exactly.
    #[must_use]
    pub fn has_permission(&self, name: &str) -> bool {
        self.granted_permissions.contains(name)
    }

    /// Returns all granted permission names in sorted order.
    #[must_use]
    pub fn granted_permissions(&self) -> &BTreeSet<String> {
        &self.granted_permissions
    }
}
