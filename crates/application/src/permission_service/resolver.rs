use permeon_core::{AppError, AppResult, NonEmptyString};
use permeon_domain::{
    DenyBehavior, EffectivePermissionRules, InstanceMetadata, PermissionRules, SecurableKind,
    Session, TablePermissionSubType,
};
use tracing::debug;

use crate::checker::{CheckContext, MAX_DELEGATION_DEPTH};

use super::PermissionService;

/// Outcome of one evaluation, before shaping into the caller-facing API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Decision {
    pub(super) allowed: bool,
    pub(super) deny_behavior: DenyBehavior,
}

impl Decision {
    fn allow(deny_behavior: DenyBehavior) -> Self {
        Self {
            allowed: true,
            deny_behavior,
        }
    }
}

impl PermissionService {
    /// Evaluates one check against an entity's rules.
    ///
    /// Order: resolve effective rules (fully open when nothing is declared
    /// anywhere); delegate entirely to a custom checker when one is
    /// attached, regardless of effective level; otherwise map the level and
    /// sub-action to a required name and test the session's grants.
    ///
    /// `depth` counts checker delegation hops; crossing
    /// [`MAX_DELEGATION_DEPTH`] means the instance's checker references
    /// form a cycle and the check fails as a validation error.
    pub(super) fn decide(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        kind: SecurableKind,
        entity_name: &NonEmptyString,
        entity_rules: Option<&PermissionRules>,
        sub_action: Option<TablePermissionSubType>,
        depth: usize,
    ) -> AppResult<Decision> {
        if depth > MAX_DELEGATION_DEPTH {
            return Err(AppError::Validation(format!(
                "custom checker delegation for '{}' exceeds {MAX_DELEGATION_DEPTH} levels; \
                 delegation cycle suspected",
                entity_name.as_str()
            )));
        }

        let effective = EffectivePermissionRules::resolve(
            entity_rules,
            instance.default_permission_rules(),
            entity_name,
        );
        let Some(effective) = effective else {
            return Ok(Decision::allow(DenyBehavior::Hide));
        };

        if let Some(reference) = effective.custom_checker() {
            let checker = self.registry.resolve(reference)?;
            let context =
                CheckContext::new(self, instance, session, kind, entity_name, sub_action, depth);
            let allowed = checker.check(&context)?;
            if !allowed {
                debug!(
                    kind = kind.as_str(),
                    entity = entity_name.as_str(),
                    checker = reference.kind().as_str(),
                    "custom checker denied"
                );
            }

            return Ok(Decision {
                allowed,
                deny_behavior: effective.deny_behavior(),
            });
        }

        let Some(scope) = effective.level().required_scope(sub_action) else {
            return Ok(Decision::allow(effective.deny_behavior()));
        };

        let permission_name = scope.permission_name(effective.permission_base_name());
        let allowed = session.has_permission(&permission_name);
        if !allowed {
            debug!(
                kind = kind.as_str(),
                entity = entity_name.as_str(),
                sub_action = sub_action.map(|value| value.as_str()),
                required = permission_name.as_str(),
                "permission check denied"
            );
        }

        Ok(Decision {
            allowed,
            deny_behavior: effective.deny_behavior(),
        })
    }
}
