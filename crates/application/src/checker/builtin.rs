use permeon_core::{AppError, AppResult, NonEmptyString};
use permeon_domain::{
    AvailablePermission, EffectivePermissionRules, PermissionLevel, SecurableKind,
    TablePermissionSubType,
};
use serde::Deserialize;
use serde_json::Value;

use super::{CheckContext, CustomPermissionChecker, EnumerationContext, MAX_DELEGATION_DEPTH};

/// Checker that ignores the entity's own computed permission name and
/// tests a single configured literal name instead.
///
/// The entity's natural names never grant access while this checker is
/// attached, even when the session happens to hold them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseOtherPermissionNameChecker {
    permission_name: NonEmptyString,
}

#[derive(Debug, Deserialize)]
struct UseOtherPermissionNameConfig {
    permission_name: String,
}

impl UseOtherPermissionNameChecker {
    /// Registry kind selecting this checker.
    pub const KIND: &'static str = "use_other_permission_name";

    /// Creates a checker requiring the given literal permission name.
    pub fn new(permission_name: impl Into<String>) -> AppResult<Self> {
        Ok(Self {
            permission_name: NonEmptyString::new(permission_name)?,
        })
    }

    /// Builds the checker from a checker-reference config payload.
    pub fn from_config(config: &Value) -> AppResult<Self> {
        let config: UseOtherPermissionNameConfig = serde_json::from_value(config.clone())
            .map_err(|error| {
                AppError::Validation(format!(
                    "invalid config for checker kind '{}': {error}",
                    Self::KIND
                ))
            })?;

        Self::new(config.permission_name)
    }

    /// Returns the literal permission name this checker requires.
    #[must_use]
    pub fn permission_name(&self) -> &NonEmptyString {
        &self.permission_name
    }
}

impl CustomPermissionChecker for UseOtherPermissionNameChecker {
    fn check(&self, context: &CheckContext<'_>) -> AppResult<bool> {
        Ok(context.session().has_permission(self.permission_name.as_str()))
    }

    fn required_permissions(
        &self,
        context: &EnumerationContext<'_>,
    ) -> AppResult<Vec<AvailablePermission>> {
        Ok(vec![AvailablePermission::new(
            self.permission_name.clone(),
            context.kind(),
            context.entity_name().clone(),
            None,
        )])
    }
}

/// Checker that defers the decision to a different table's permission.
///
/// The nominal entity's name plays no part; the delegate table's own
/// rules (level, base-name override, even a nested checker) decide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UseTablePermissionChecker {
    table_name: NonEmptyString,
    sub_type: TablePermissionSubType,
}

#[derive(Debug, Deserialize)]
struct UseTablePermissionConfig {
    table_name: String,
    sub_type: TablePermissionSubType,
}

impl UseTablePermissionChecker {
    /// Registry kind selecting this checker.
    pub const KIND: &'static str = "use_table_permission";

    /// Creates a checker delegating to a table's sub-action permission.
    pub fn new(
        table_name: impl Into<String>,
        sub_type: TablePermissionSubType,
    ) -> AppResult<Self> {
        Ok(Self {
            table_name: NonEmptyString::new(table_name)?,
            sub_type,
        })
    }

    /// Builds the checker from a checker-reference config payload.
    pub fn from_config(config: &Value) -> AppResult<Self> {
        let config: UseTablePermissionConfig =
            serde_json::from_value(config.clone()).map_err(|error| {
                AppError::Validation(format!(
                    "invalid config for checker kind '{}': {error}",
                    Self::KIND
                ))
            })?;

        Self::new(config.table_name, config.sub_type)
    }

    /// Returns the delegate table name.
    #[must_use]
    pub fn table_name(&self) -> &NonEmptyString {
        &self.table_name
    }

    /// Returns the delegate sub-action.
    #[must_use]
    pub fn sub_type(&self) -> TablePermissionSubType {
        self.sub_type
    }
}

impl CustomPermissionChecker for UseTablePermissionChecker {
    fn check(&self, context: &CheckContext<'_>) -> AppResult<bool> {
        context.check_table_permission(self.table_name.as_str(), self.sub_type)
    }

    fn required_permissions(
        &self,
        context: &EnumerationContext<'_>,
    ) -> AppResult<Vec<AvailablePermission>> {
        if context.depth() >= MAX_DELEGATION_DEPTH {
            return Err(AppError::Validation(format!(
                "custom checker delegation for '{}' exceeds {MAX_DELEGATION_DEPTH} levels; \
                 delegation cycle suspected",
                context.entity_name().as_str()
            )));
        }

        let table = context
            .instance()
            .table(self.table_name.as_str())
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "table '{}' delegated to by '{}' is not declared in this instance",
                    self.table_name.as_str(),
                    context.entity_name().as_str()
                ))
            })?;

        let effective = EffectivePermissionRules::resolve(
            table.permission_rules(),
            context.instance().default_permission_rules(),
            table.name(),
        );
        let Some(effective) = effective else {
            return Ok(Vec::new());
        };

        if effective.level() == PermissionLevel::NotProtected {
            return Ok(Vec::new());
        }

        if let Some(reference) = effective.custom_checker() {
            let checker = context.service().resolve_checker(reference)?;
            let nested = context.nested(SecurableKind::Table, table.name());
            return checker.required_permissions(&nested);
        }

        let Some(scope) = effective.level().required_scope(Some(self.sub_type)) else {
            return Ok(Vec::new());
        };

        let name = NonEmptyString::new(scope.permission_name(effective.permission_base_name()))?;
        Ok(vec![AvailablePermission::new(
            name,
            SecurableKind::Table,
            table.name().clone(),
            Some(scope),
        )])
    }
}
