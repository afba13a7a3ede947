use permeon_core::{AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{DenyBehavior, PermissionLevel};

/// Serializable reference to a custom permission checker.
///
/// The `kind` selects a factory in the checker registry; `config` is the
/// factory's payload. References are data so instances can be stored and
/// shipped; resolution to a checker happens at instance-load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckerReference {
    kind: NonEmptyString,
    #[serde(default)]
    config: Value,
}

impl CheckerReference {
    /// Creates a checker reference with a validated kind.
    pub fn new(kind: impl Into<String>, config: Value) -> AppResult<Self> {
        Ok(Self {
            kind: NonEmptyString::new(kind)?,
            config,
        })
    }

    /// Returns the registry kind this reference selects.
    #[must_use]
    pub fn kind(&self) -> &NonEmptyString {
        &self.kind
    }

    /// Returns the factory configuration payload.
    #[must_use]
    pub fn config(&self) -> &Value {
        &self.config
    }
}

/// Per-entity permission configuration.
///
/// Every field is optional; unset fields fall back to the instance-wide
/// default rules and finally to hardcoded open defaults. An entity with no
/// rules at all, in an instance with no default rules, is fully accessible.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionRules {
    #[serde(default)]
    level: Option<PermissionLevel>,
    #[serde(default)]
    deny_behavior: Option<DenyBehavior>,
    #[serde(default)]
    permission_base_name: Option<NonEmptyString>,
    #[serde(default)]
    custom_checker: Option<CheckerReference>,
}

impl PermissionRules {
    /// Creates empty rules where every field falls back.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the enforcement level.
    #[must_use]
    pub fn with_level(mut self, level: PermissionLevel) -> Self {
        self.level = Some(level);
        self
    }

    /// Sets the deny behavior.
    #[must_use]
    pub fn with_deny_behavior(mut self, deny_behavior: DenyBehavior) -> Self {
        self.deny_behavior = Some(deny_behavior);
        self
    }

    /// Sets a permission base name used instead of the entity's own name.
    pub fn with_permission_base_name(mut self, base_name: impl Into<String>) -> AppResult<Self> {
        self.permission_base_name = Some(NonEmptyString::new(base_name)?);
        Ok(self)
    }

    /// Attaches a custom checker reference that replaces the built-in
    /// level evaluation for the entity.
    #[must_use]
    pub fn with_custom_checker(mut self, reference: CheckerReference) -> Self {
        self.custom_checker = Some(reference);
        self
    }

    /// Returns the declared enforcement level, if any.
    #[must_use]
    pub fn level(&self) -> Option<PermissionLevel> {
        self.level
    }

    /// Returns the declared deny behavior, if any.
    #[must_use]
    pub fn deny_behavior(&self) -> Option<DenyBehavior> {
        self.deny_behavior
    }

    /// Returns the permission base name override, if any.
    #[must_use]
    pub fn permission_base_name(&self) -> Option<&NonEmptyString> {
        self.permission_base_name.as_ref()
    }

    /// Returns the custom checker reference, if any.
    #[must_use]
    pub fn custom_checker(&self) -> Option<&CheckerReference> {
        self.custom_checker.as_ref()
    }
}

/// Fully-populated rules after the entity → instance default → hardcoded
/// fallback chain has been applied, computed once per check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectivePermissionRules {
    level: PermissionLevel,
    deny_behavior: DenyBehavior,
    permission_base_name: NonEmptyString,
    custom_checker: Option<CheckerReference>,
}

impl EffectivePermissionRules {
    /// Resolves effective rules for one entity.
    ///
    /// `level` and `deny_behavior` resolve through the three-tier chain:
    /// the entity's own value wins, then the instance default's, then the
    /// hardcoded default (`NotProtected`, `Hide`). `permission_base_name`
    /// and `custom_checker` are entity-scoped and never inherited from the
    /// instance default: the base name falls back to the entity's own name,
    /// and only a checker the entity itself declares is attached. Returns
    /// `None` when neither the entity nor the instance declares any rules,
    /// which callers treat as full access.
    #[must_use]
    pub fn resolve(
        entity_rules: Option<&PermissionRules>,
        instance_default_rules: Option<&PermissionRules>,
        entity_name: &NonEmptyString,
    ) -> Option<Self> {
        if entity_rules.is_none() && instance_default_rules.is_none() {
            return None;
        }

        let level = entity_rules
            .and_then(PermissionRules::level)
            .or_else(|| instance_default_rules.and_then(PermissionRules::level))
            .unwrap_or(PermissionLevel::NotProtected);

        let deny_behavior = entity_rules
            .and_then(PermissionRules::deny_behavior)
            .or_else(|| instance_default_rules.and_then(PermissionRules::deny_behavior))
            .unwrap_or(DenyBehavior::Hide);

        let permission_base_name = entity_rules
            .and_then(|rules| rules.permission_base_name().cloned())
            .unwrap_or_else(|| entity_name.clone());

        let custom_checker = entity_rules.and_then(|rules| rules.custom_checker().cloned());

        Some(Self {
            level,
            deny_behavior,
            permission_base_name,
            custom_checker,
        })
    }

    /// Returns the effective enforcement level.
    #[must_use]
    pub fn level(&self) -> PermissionLevel {
        self.level
    }

    /// Returns the effective deny behavior.
    #[must_use]
    pub fn deny_behavior(&self) -> DenyBehavior {
        self.deny_behavior
    }

    /// Returns the effective base for permission names.
    #[must_use]
    pub fn permission_base_name(&self) -> &NonEmptyString {
        &self.permission_base_name
    }

    /// Returns the effective custom checker reference, if any.
    #[must_use]
    pub fn custom_checker(&self) -> Option<&CheckerReference> {
        self.custom_checker.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use permeon_core::NonEmptyString;
    use serde_json::Value;

    use crate::{DenyBehavior, PermissionLevel};

    use super::{CheckerReference, EffectivePermissionRules, PermissionRules};

    fn entity_name(value: &str) -> NonEmptyString {
        NonEmptyString::new(value).unwrap_or_else(|_| unreachable!())
    }

    #[test]
    fn no_rules_anywhere_resolves_to_fully_open() {
        let resolved = EffectivePermissionRules::resolve(None, None, &entity_name("orders"));
        assert!(resolved.is_none());
    }

    #[test]
    fn missing_fields_fall_back_to_instance_default() {
        let entity_rules = PermissionRules::new().with_deny_behavior(DenyBehavior::Disabled);
        let default_rules =
            PermissionRules::new().with_level(PermissionLevel::HasAccessPermission);

        let resolved = EffectivePermissionRules::resolve(
            Some(&entity_rules),
            Some(&default_rules),
            &entity_name("orders"),
        );

        let resolved = resolved.unwrap_or_else(|| unreachable!());
        assert_eq!(resolved.level(), PermissionLevel::HasAccessPermission);
        assert_eq!(resolved.deny_behavior(), DenyBehavior::Disabled);
        assert_eq!(resolved.permission_base_name().as_str(), "orders");
    }

    #[test]
    fn entity_level_overrides_instance_default() {
        let entity_rules = PermissionRules::new().with_level(PermissionLevel::NotProtected);
        let default_rules =
            PermissionRules::new().with_level(PermissionLevel::ReadWritePermissions);

        let resolved = EffectivePermissionRules::resolve(
            Some(&entity_rules),
            Some(&default_rules),
            &entity_name("orders"),
        );

        let resolved = resolved.unwrap_or_else(|| unreachable!());
        assert_eq!(resolved.level(), PermissionLevel::NotProtected);
    }

    #[test]
    fn base_name_override_replaces_entity_name() {
        let entity_rules = PermissionRules::new()
            .with_level(PermissionLevel::HasAccessPermission)
            .with_permission_base_name("sharedBase")
            .unwrap_or_else(|_| unreachable!());

        let resolved =
            EffectivePermissionRules::resolve(Some(&entity_rules), None, &entity_name("orders"));

        let resolved = resolved.unwrap_or_else(|| unreachable!());
        assert_eq!(resolved.permission_base_name().as_str(), "sharedBase");
    }

    #[test]
    fn default_base_name_never_redirects_entities() {
        let entity_rules = PermissionRules::new().with_level(PermissionLevel::HasAccessPermission);
        let default_rules = PermissionRules::new()
            .with_permission_base_name("shared")
            .unwrap_or_else(|_| unreachable!());

        let resolved = EffectivePermissionRules::resolve(
            Some(&entity_rules),
            Some(&default_rules),
            &entity_name("orders"),
        );
        let resolved = resolved.unwrap_or_else(|| unreachable!());
        assert_eq!(resolved.permission_base_name().as_str(), "orders");

        // Same when the entity has no rules of its own.
        let resolved =
            EffectivePermissionRules::resolve(None, Some(&default_rules), &entity_name("orders"));
        let resolved = resolved.unwrap_or_else(|| unreachable!());
        assert_eq!(resolved.permission_base_name().as_str(), "orders");
    }

    #[test]
    fn default_custom_checker_never_attaches_to_entities() {
        let reference = CheckerReference::new("use_other_permission_name", Value::Null)
            .unwrap_or_else(|_| unreachable!());
        let default_rules = PermissionRules::new().with_custom_checker(reference);
        let entity_rules = PermissionRules::new().with_level(PermissionLevel::HasAccessPermission);

        let resolved = EffectivePermissionRules::resolve(
            Some(&entity_rules),
            Some(&default_rules),
            &entity_name("orders"),
        );
        let resolved = resolved.unwrap_or_else(|| unreachable!());
        assert!(resolved.custom_checker().is_none());

        let resolved =
            EffectivePermissionRules::resolve(None, Some(&default_rules), &entity_name("orders"));
        let resolved = resolved.unwrap_or_else(|| unreachable!());
        assert!(resolved.custom_checker().is_none());
    }

    #[test]
    fn instance_default_alone_is_enough_to_protect() {
        let default_rules =
            PermissionRules::new().with_level(PermissionLevel::HasAccessPermission);

        let resolved =
            EffectivePermissionRules::resolve(None, Some(&default_rules), &entity_name("orders"));

        let resolved = resolved.unwrap_or_else(|| unreachable!());
        assert_eq!(resolved.level(), PermissionLevel::HasAccessPermission);
        assert_eq!(resolved.deny_behavior(), DenyBehavior::Hide);
    }
}
