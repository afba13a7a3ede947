use std::collections::BTreeSet;

use permeon_core::{AppError, AppResult, NonEmptyString};
use permeon_domain::{
    AvailablePermission, CheckerReference, EffectivePermissionRules, InstanceMetadata,
    PermissionLevel, PermissionRules, Securable,
};

use crate::checker::{EnumerationContext, UseTablePermissionChecker};

use super::PermissionService;

impl PermissionService {
    /// Enumerates every permission an instance could ever check, as
    /// reporting records for role-management and documentation tooling.
    pub fn all_available_permissions(
        &self,
        instance: &InstanceMetadata,
    ) -> AppResult<Vec<AvailablePermission>> {
        let mut permissions = Vec::new();
        for securable in instance.securables() {
            permissions.extend(self.available_permissions_for(instance, securable)?);
        }

        Ok(permissions)
    }

    /// Enumerates every permission name an instance could ever check.
    pub fn all_available_permission_names(
        &self,
        instance: &InstanceMetadata,
    ) -> AppResult<BTreeSet<String>> {
        let names = self
            .all_available_permissions(instance)?
            .into_iter()
            .map(|permission| permission.name().as_str().to_owned())
            .collect();

        Ok(names)
    }

    /// Resolves every checker reference declared anywhere in the instance
    /// and walks table-delegation chains for cycles, so misconfiguration
    /// surfaces at load time instead of mid-check.
    pub fn validate_instance(&self, instance: &InstanceMetadata) -> AppResult<()> {
        if let Some(rules) = instance.default_permission_rules() {
            self.validate_rules(rules, "instance default rules")?;
        }

        for securable in instance.securables() {
            if let Some(rules) = securable.permission_rules() {
                self.validate_rules(rules, securable.name().as_str())?;
                if let Some(reference) = rules.custom_checker() {
                    self.validate_delegation_chain(
                        instance,
                        securable.name().as_str(),
                        reference,
                    )?;
                }
            }
        }

        Ok(())
    }

    fn validate_rules(&self, rules: &PermissionRules, owner: &str) -> AppResult<()> {
        if let Some(reference) = rules.custom_checker() {
            self.registry.resolve(reference).map_err(|error| {
                AppError::Validation(format!("{owner}: {error}"))
            })?;
        }

        Ok(())
    }

    /// Follows `use_table_permission` references from one entity until the
    /// chain ends, rejecting revisits of a table already on the path.
    fn validate_delegation_chain(
        &self,
        instance: &InstanceMetadata,
        owner: &str,
        reference: &CheckerReference,
    ) -> AppResult<()> {
        let mut visited: BTreeSet<String> = BTreeSet::new();
        let mut next = Some(reference.clone());

        while let Some(reference) = next {
            if reference.kind().as_str() != UseTablePermissionChecker::KIND {
                break;
            }

            let checker = UseTablePermissionChecker::from_config(reference.config())
                .map_err(|error| AppError::Validation(format!("{owner}: {error}")))?;
            let table_name = checker.table_name().as_str().to_owned();
            if !visited.insert(table_name.clone()) {
                return Err(AppError::Validation(format!(
                    "{owner}: cyclic table permission delegation through '{table_name}'"
                )));
            }

            let table = instance.table(&table_name).ok_or_else(|| {
                AppError::NotFound(format!(
                    "table '{table_name}' delegated to by '{owner}' is not declared \
                     in this instance"
                ))
            })?;

            next = table
                .permission_rules()
                .and_then(PermissionRules::custom_checker)
                .cloned();
        }

        Ok(())
    }

    /// Enumerates the permissions one entity contributes.
    ///
    /// A `NotProtected` effective level contributes nothing, even when a
    /// custom checker is attached; disabled enforcement suppresses checker
    /// enumeration as well as built-in names.
    fn available_permissions_for(
        &self,
        instance: &InstanceMetadata,
        securable: &dyn Securable,
    ) -> AppResult<Vec<AvailablePermission>> {
        let effective = EffectivePermissionRules::resolve(
            securable.permission_rules(),
            instance.default_permission_rules(),
            securable.name(),
        );
        let Some(effective) = effective else {
            return Ok(Vec::new());
        };

        if effective.level() == PermissionLevel::NotProtected {
            return Ok(Vec::new());
        }

        if let Some(reference) = effective.custom_checker() {
            let checker = self.registry.resolve(reference)?;
            let context =
                EnumerationContext::new(self, instance, securable.kind(), securable.name());
            return checker.required_permissions(&context);
        }

        let mut permissions = Vec::new();
        for scope in effective.level().enumerated_scopes(securable.kind()) {
            let name = NonEmptyString::new(scope.permission_name(effective.permission_base_name()))?;
            permissions.push(AvailablePermission::new(
                name,
                securable.kind(),
                securable.name().clone(),
                Some(*scope),
            ));
        }

        Ok(permissions)
    }
}
