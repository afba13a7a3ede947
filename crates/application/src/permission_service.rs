use std::sync::Arc;

use permeon_core::AppResult;
use permeon_domain::CheckerReference;

use crate::checker::{CheckerRegistry, CustomPermissionChecker};

mod catalog;
mod checks;
mod resolver;

/// Stateless decision engine over instance metadata and sessions.
///
/// Every call takes the instance and session explicitly; the service owns
/// nothing but the checker registry, so one service can safely serve
/// concurrent checks against any number of instances.
#[derive(Clone)]
pub struct PermissionService {
    registry: Arc<CheckerRegistry>,
}

impl PermissionService {
    /// Creates a service using the given checker registry.
    #[must_use]
    pub fn new(registry: Arc<CheckerRegistry>) -> Self {
        Self { registry }
    }

    /// Creates a service with only the built-in checker kinds available.
    #[must_use]
    pub fn with_builtin_checkers() -> Self {
        Self::new(Arc::new(CheckerRegistry::with_builtin_checkers()))
    }

    /// Resolves a checker reference through the service's registry.
    pub fn resolve_checker(
        &self,
        reference: &CheckerReference,
    ) -> AppResult<Arc<dyn CustomPermissionChecker>> {
        self.registry.resolve(reference)
    }
}
