use std::str::FromStr;

use permeon_core::{AppError, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::SecurableKind;

/// Enforcement granularity declared for a securable entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// Entity is fully open; no permission is ever required.
    NotProtected,
    /// A single access permission gates every sub-action.
    HasAccessPermission,
    /// Reads and writes are gated by two separate permissions.
    ReadWritePermissions,
    /// Each table sub-action is gated by its own permission.
    ReadInsertEditDeletePermissions,
}

impl PermissionLevel {
    /// Returns a stable storage value for this level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotProtected => "not_protected",
            Self::HasAccessPermission => "has_access_permission",
            Self::ReadWritePermissions => "read_write_permissions",
            Self::ReadInsertEditDeletePermissions => "read_insert_edit_delete_permissions",
        }
    }

    /// Returns the permission scope this level requires for an attempted
    /// sub-action, or `None` when the level never requires a permission.
    ///
    /// A `None` sub-action is a non-table check (process, report, widget,
    /// app); those always reduce to the single access gate.
    #[must_use]
    pub fn required_scope(
        self,
        sub_action: Option<TablePermissionSubType>,
    ) -> Option<PermissionScope> {
        match self {
            Self::NotProtected => None,
            Self::HasAccessPermission => Some(PermissionScope::HasAccess),
            Self::ReadWritePermissions => match sub_action {
                None => Some(PermissionScope::HasAccess),
                Some(TablePermissionSubType::Read) => Some(PermissionScope::Read),
                Some(_) => Some(PermissionScope::Write),
            },
            Self::ReadInsertEditDeletePermissions => match sub_action {
                None => Some(PermissionScope::HasAccess),
                Some(sub_action) => Some(sub_action.scope()),
            },
        }
    }

    /// Returns every permission scope this level can require for entities of
    /// the given kind. Used to enumerate an instance's available permissions.
    #[must_use]
    pub fn enumerated_scopes(self, kind: SecurableKind) -> &'static [PermissionScope] {
        match (self, kind) {
            (Self::NotProtected, _) => &[],
            (_, kind) if kind != SecurableKind::Table => &[PermissionScope::HasAccess],
            (Self::HasAccessPermission, _) => &[PermissionScope::HasAccess],
            (Self::ReadWritePermissions, _) => &[PermissionScope::Read, PermissionScope::Write],
            (Self::ReadInsertEditDeletePermissions, _) => &[
                PermissionScope::Read,
                PermissionScope::Insert,
                PermissionScope::Edit,
                PermissionScope::Delete,
            ],
        }
    }
}

impl FromStr for PermissionLevel {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "not_protected" => Ok(Self::NotProtected),
            "has_access_permission" => Ok(Self::HasAccessPermission),
            "read_write_permissions" => Ok(Self::ReadWritePermissions),
            "read_insert_edit_delete_permissions" => Ok(Self::ReadInsertEditDeletePermissions),
            _ => Err(AppError::Validation(format!(
                "unknown permission level '{value}'"
            ))),
        }
    }
}

/// Finest-grained sub-action a table-targeting caller can attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TablePermissionSubType {
    /// Query or get records.
    Read,
    /// Insert new records.
    Insert,
    /// Update existing records.
    Edit,
    /// Delete records.
    Delete,
}

impl TablePermissionSubType {
    /// Returns a stable storage value for this sub-action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Insert => "insert",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }

    /// Returns the permission scope dedicated to this sub-action.
    #[must_use]
    pub fn scope(&self) -> PermissionScope {
        match self {
            Self::Read => PermissionScope::Read,
            Self::Insert => PermissionScope::Insert,
            Self::Edit => PermissionScope::Edit,
            Self::Delete => PermissionScope::Delete,
        }
    }

    /// Returns all table sub-actions.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[TablePermissionSubType] = &[
            TablePermissionSubType::Read,
            TablePermissionSubType::Insert,
            TablePermissionSubType::Edit,
            TablePermissionSubType::Delete,
        ];

        ALL
    }
}

impl FromStr for TablePermissionSubType {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "read" => Ok(Self::Read),
            "insert" => Ok(Self::Insert),
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!(
                "unknown table permission sub-type '{value}'"
            ))),
        }
    }
}

/// Scope segment appended to a permission base name.
///
/// Granted permission names are flat case-sensitive strings of the form
/// `<baseName>.<suffix>`, e.g. `"orders.read"` or `"orders.hasAccess"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionScope {
    /// Single gate covering every sub-action.
    HasAccess,
    /// Read-side gate.
    Read,
    /// Write-side gate shared by insert, edit, and delete.
    Write,
    /// Insert-only gate.
    Insert,
    /// Edit-only gate.
    Edit,
    /// Delete-only gate.
    Delete,
}

impl PermissionScope {
    /// Returns the name suffix for this scope, without the leading dot.
    #[must_use]
    pub fn as_suffix(&self) -> &'static str {
        match self {
            Self::HasAccess => "hasAccess",
            Self::Read => "read",
            Self::Write => "write",
            Self::Insert => "insert",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }

    /// Builds the full permission name for a base name under this scope.
    #[must_use]
    pub fn permission_name(&self, base_name: &NonEmptyString) -> String {
        format!("{}.{}", base_name.as_str(), self.as_suffix())
    }
}

/// Consequence a denied check has for a UI-visible entity.
///
/// Orthogonal to the boolean allow/deny outcome; only shapes how the
/// denial is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyBehavior {
    /// Omit the entity from UI-facing metadata entirely.
    Hide,
    /// Show the entity but render it disabled.
    Disabled,
}

impl DenyBehavior {
    /// Returns a stable storage value for this behavior.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hide => "hide",
            Self::Disabled => "disabled",
        }
    }
}

impl FromStr for DenyBehavior {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hide" => Ok(Self::Hide),
            "disabled" => Ok(Self::Disabled),
            _ => Err(AppError::Validation(format!(
                "unknown deny behavior '{value}'"
            ))),
        }
    }
}

/// Outcome of a single permission check, produced fresh per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionCheckResult {
    /// The session may perform the sub-action.
    Allow,
    /// Denied; the entity should be omitted from UI metadata.
    DenyHide,
    /// Denied; the entity should be shown disabled.
    DenyDisable,
}

impl PermissionCheckResult {
    /// Returns whether this result grants access.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Builds the denial result matching a deny behavior.
    #[must_use]
    pub fn denied(behavior: DenyBehavior) -> Self {
        match behavior {
            DenyBehavior::Hide => Self::DenyHide,
            DenyBehavior::Disabled => Self::DenyDisable,
        }
    }
}

/// Reporting-only record pairing a permission name with the entity and
/// scope it gates. The full set for an instance is derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailablePermission {
    name: NonEmptyString,
    kind: SecurableKind,
    entity_name: NonEmptyString,
    scope: Option<PermissionScope>,
}

impl AvailablePermission {
    /// Creates an available-permission record.
    ///
    /// `scope` is `None` for names contributed by custom checkers that are
    /// not derived from a level suffix.
    #[must_use]
    pub fn new(
        name: NonEmptyString,
        kind: SecurableKind,
        entity_name: NonEmptyString,
        scope: Option<PermissionScope>,
    ) -> Self {
        Self {
            name,
            kind,
            entity_name,
            scope,
        }
    }

    /// Returns the flat permission name a session would need to grant.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the kind of the owning entity.
    #[must_use]
    pub fn kind(&self) -> SecurableKind {
        self.kind
    }

    /// Returns the owning entity name.
    #[must_use]
    pub fn entity_name(&self) -> &NonEmptyString {
        &self.entity_name
    }

    /// Returns the scope this name gates, when derived from a level.
    #[must_use]
    pub fn scope(&self) -> Option<PermissionScope> {
        self.scope
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use proptest::prelude::*;

    use crate::SecurableKind;

    use super::{DenyBehavior, PermissionLevel, PermissionScope, TablePermissionSubType};

    #[test]
    fn level_roundtrip_storage_value() {
        for level in [
            PermissionLevel::NotProtected,
            PermissionLevel::HasAccessPermission,
            PermissionLevel::ReadWritePermissions,
            PermissionLevel::ReadInsertEditDeletePermissions,
        ] {
            let restored = PermissionLevel::from_str(level.as_str());
            assert_eq!(restored.ok(), Some(level));
        }
    }

    #[test]
    fn unknown_level_is_rejected() {
        assert!(PermissionLevel::from_str("fully_protected").is_err());
    }

    #[test]
    fn deny_behavior_roundtrip_storage_value() {
        for behavior in [DenyBehavior::Hide, DenyBehavior::Disabled] {
            let restored = DenyBehavior::from_str(behavior.as_str());
            assert_eq!(restored.ok(), Some(behavior));
        }
    }

    #[test]
    fn read_write_level_maps_mutations_to_write_scope() {
        let level = PermissionLevel::ReadWritePermissions;
        assert_eq!(
            level.required_scope(Some(TablePermissionSubType::Read)),
            Some(PermissionScope::Read)
        );
        for sub_action in [
            TablePermissionSubType::Insert,
            TablePermissionSubType::Edit,
            TablePermissionSubType::Delete,
        ] {
            assert_eq!(
                level.required_scope(Some(sub_action)),
                Some(PermissionScope::Write)
            );
        }
    }

    #[test]
    fn enumerated_scope_counts_match_levels() {
        let kind = SecurableKind::Table;
        assert_eq!(
            PermissionLevel::NotProtected.enumerated_scopes(kind).len(),
            0
        );
        assert_eq!(
            PermissionLevel::HasAccessPermission
                .enumerated_scopes(kind)
                .len(),
            1
        );
        assert_eq!(
            PermissionLevel::ReadWritePermissions
                .enumerated_scopes(kind)
                .len(),
            2
        );
        assert_eq!(
            PermissionLevel::ReadInsertEditDeletePermissions
                .enumerated_scopes(kind)
                .len(),
            4
        );
    }

    #[test]
    fn non_table_kinds_enumerate_single_access_gate() {
        for kind in [
            SecurableKind::Process,
            SecurableKind::Report,
            SecurableKind::Widget,
            SecurableKind::App,
        ] {
            assert_eq!(
                PermissionLevel::ReadInsertEditDeletePermissions.enumerated_scopes(kind),
                &[PermissionScope::HasAccess]
            );
        }
    }

    fn any_level() -> impl Strategy<Value = PermissionLevel> {
        prop_oneof![
            Just(PermissionLevel::NotProtected),
            Just(PermissionLevel::HasAccessPermission),
            Just(PermissionLevel::ReadWritePermissions),
            Just(PermissionLevel::ReadInsertEditDeletePermissions),
        ]
    }

    fn any_sub_action() -> impl Strategy<Value = Option<TablePermissionSubType>> {
        prop_oneof![
            Just(None),
            Just(Some(TablePermissionSubType::Read)),
            Just(Some(TablePermissionSubType::Insert)),
            Just(Some(TablePermissionSubType::Edit)),
            Just(Some(TablePermissionSubType::Delete)),
        ]
    }

    proptest! {
        #[test]
        fn scope_mapping_is_total_and_only_open_for_not_protected(
            level in any_level(),
            sub_action in any_sub_action(),
        ) {
            let scope = level.required_scope(sub_action);
            prop_assert_eq!(scope.is_none(), level == PermissionLevel::NotProtected);
        }

        #[test]
        fn scope_mapping_is_deterministic(
            level in any_level(),
            sub_action in any_sub_action(),
        ) {
            prop_assert_eq!(
                level.required_scope(sub_action),
                level.required_scope(sub_action)
            );
        }

        #[test]
        fn independent_sub_actions_never_share_a_scope(
            first in prop_oneof![
                Just(TablePermissionSubType::Read),
                Just(TablePermissionSubType::Insert),
                Just(TablePermissionSubType::Edit),
                Just(TablePermissionSubType::Delete),
            ],
            second in prop_oneof![
                Just(TablePermissionSubType::Read),
                Just(TablePermissionSubType::Insert),
                Just(TablePermissionSubType::Edit),
                Just(TablePermissionSubType::Delete),
            ],
        ) {
            let level = PermissionLevel::ReadInsertEditDeletePermissions;
            let same_scope =
                level.required_scope(Some(first)) == level.required_scope(Some(second));
            prop_assert_eq!(same_scope, first == second);
        }
    }
}
