use std::collections::HashMap;
use std::sync::Arc;

use permeon_core::{AppError, AppResult, NonEmptyString};
use permeon_domain::{
    AvailablePermission, CheckerReference, InstanceMetadata, SecurableKind, Session,
    TablePermissionSubType,
};
use serde_json::Value;

use crate::PermissionService;

mod builtin;

pub use builtin::{UseOtherPermissionNameChecker, UseTablePermissionChecker};

/// Upper bound on chained checker delegation before a check fails.
///
/// Delegation deeper than this can only come from a reference cycle in the
/// instance metadata; the bound turns unbounded recursion into a loud
/// misconfiguration error.
pub(crate) const MAX_DELEGATION_DEPTH: usize = 16;

/// Everything a custom checker may consult while deciding one check.
///
/// Carries a handle back to the owning service so checkers can recurse
/// into the resolver for another entity.
pub struct CheckContext<'a> {
    service: &'a PermissionService,
    instance: &'a InstanceMetadata,
    session: &'a Session,
    kind: SecurableKind,
    entity_name: &'a NonEmptyString,
    sub_action: Option<TablePermissionSubType>,
    depth: usize,
}

impl<'a> CheckContext<'a> {
    pub(crate) fn new(
        service: &'a PermissionService,
        instance: &'a InstanceMetadata,
        session: &'a Session,
        kind: SecurableKind,
        entity_name: &'a NonEmptyString,
        sub_action: Option<TablePermissionSubType>,
        depth: usize,
    ) -> Self {
        Self {
            service,
            instance,
            session,
            kind,
            entity_name,
            sub_action,
            depth,
        }
    }

    /// Recursively checks a table permission on behalf of this checker.
    ///
    /// Prefer this over calling the service directly: it carries the
    /// delegation depth forward so reference cycles fail as a validation
    /// error instead of recursing without bound.
    pub fn check_table_permission(
        &self,
        table_name: &str,
        sub_type: TablePermissionSubType,
    ) -> AppResult<bool> {
        self.service.has_table_permission_at(
            self.instance,
            self.session,
            table_name,
            sub_type,
            self.depth + 1,
        )
    }

    /// Returns the service running the check, for recursive resolution.
    #[must_use]
    pub fn service(&self) -> &PermissionService {
        self.service
    }

    /// Returns the instance metadata snapshot.
    #[must_use]
    pub fn instance(&self) -> &InstanceMetadata {
        self.instance
    }

    /// Returns the session being checked.
    #[must_use]
    pub fn session(&self) -> &Session {
        self.session
    }

    /// Returns the kind of the entity nominally being checked.
    #[must_use]
    pub fn kind(&self) -> SecurableKind {
        self.kind
    }

    /// Returns the name of the entity nominally being checked.
    #[must_use]
    pub fn entity_name(&self) -> &NonEmptyString {
        self.entity_name
    }

    /// Returns the attempted table sub-action, when the check is table-scoped.
    #[must_use]
    pub fn sub_action(&self) -> Option<TablePermissionSubType> {
        self.sub_action
    }
}

/// Context handed to checkers during catalog enumeration.
///
/// Enumeration never consults a session; it only needs the instance and a
/// way back into the service for recursive enumeration.
pub struct EnumerationContext<'a> {
    service: &'a PermissionService,
    instance: &'a InstanceMetadata,
    kind: SecurableKind,
    entity_name: &'a NonEmptyString,
    depth: usize,
}

impl<'a> EnumerationContext<'a> {
    pub(crate) fn new(
        service: &'a PermissionService,
        instance: &'a InstanceMetadata,
        kind: SecurableKind,
        entity_name: &'a NonEmptyString,
    ) -> Self {
        Self {
            service,
            instance,
            kind,
            entity_name,
            depth: 0,
        }
    }

    /// Derives a context for enumerating an entity this checker delegates to.
    pub(crate) fn nested<'b>(
        &self,
        kind: SecurableKind,
        entity_name: &'b NonEmptyString,
    ) -> EnumerationContext<'b>
    where
        'a: 'b,
    {
        EnumerationContext {
            service: self.service,
            instance: self.instance,
            kind,
            entity_name,
            depth: self.depth + 1,
        }
    }

    /// Returns how many delegation hops led to this enumeration.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Returns the service running the enumeration.
    #[must_use]
    pub fn service(&self) -> &PermissionService {
        self.service
    }

    /// Returns the instance metadata snapshot.
    #[must_use]
    pub fn instance(&self) -> &InstanceMetadata {
        self.instance
    }

    /// Returns the kind of the entity being enumerated.
    #[must_use]
    pub fn kind(&self) -> SecurableKind {
        self.kind
    }

    /// Returns the name of the entity being enumerated.
    #[must_use]
    pub fn entity_name(&self) -> &NonEmptyString {
        self.entity_name
    }
}

/// Pluggable strategy that fully replaces built-in level evaluation for
/// one entity.
pub trait CustomPermissionChecker: Send + Sync {
    /// Decides whether the session may perform the attempted check.
    fn check(&self, context: &CheckContext<'_>) -> AppResult<bool>;

    /// Enumerates every permission name this checker could ever require,
    /// so the catalog can report it instead of deriving names from the
    /// entity's level and base name.
    fn required_permissions(
        &self,
        context: &EnumerationContext<'_>,
    ) -> AppResult<Vec<AvailablePermission>>;
}

type CheckerFactory = Box<dyn Fn(&Value) -> AppResult<Arc<dyn CustomPermissionChecker>> + Send + Sync>;

/// Registry mapping checker-reference kinds to factories.
///
/// Factories run against the reference's JSON config and must reject
/// malformed payloads loudly; a broken checker never silently grants or
/// denies.
pub struct CheckerRegistry {
    factories: HashMap<String, CheckerFactory>,
}

impl CheckerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Creates a registry with the built-in checker kinds registered.
    #[must_use]
    pub fn with_builtin_checkers() -> Self {
        let mut registry = Self::new();

        registry.insert(UseOtherPermissionNameChecker::KIND, |config| {
            Ok(Arc::new(UseOtherPermissionNameChecker::from_config(config)?))
        });
        registry.insert(UseTablePermissionChecker::KIND, |config| {
            Ok(Arc::new(UseTablePermissionChecker::from_config(config)?))
        });

        registry
    }

    /// Registers a factory for a checker kind, rejecting duplicates.
    pub fn register(
        &mut self,
        kind: impl Into<String>,
        factory: impl Fn(&Value) -> AppResult<Arc<dyn CustomPermissionChecker>> + Send + Sync + 'static,
    ) -> AppResult<()> {
        let kind = kind.into();
        if self.factories.contains_key(&kind) {
            return Err(AppError::Conflict(format!(
                "checker kind '{kind}' is already registered"
            )));
        }

        self.factories.insert(kind, Box::new(factory));
        Ok(())
    }

    fn insert(
        &mut self,
        kind: &str,
        factory: impl Fn(&Value) -> AppResult<Arc<dyn CustomPermissionChecker>> + Send + Sync + 'static,
    ) {
        self.factories.insert(kind.to_owned(), Box::new(factory));
    }

    /// Resolves a checker reference to a ready checker instance.
    pub fn resolve(
        &self,
        reference: &CheckerReference,
    ) -> AppResult<Arc<dyn CustomPermissionChecker>> {
        let factory = self.factories.get(reference.kind().as_str()).ok_or_else(|| {
            AppError::Validation(format!(
                "unknown custom checker kind '{}'",
                reference.kind().as_str()
            ))
        })?;

        factory(reference.config())
    }
}

impl Default for CheckerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
