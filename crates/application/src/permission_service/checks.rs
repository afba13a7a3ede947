use permeon_core::{AppError, AppResult};
use permeon_domain::{
    InstanceMetadata, PermissionCheckResult, Securable, SecurableKind, Session,
    TablePermissionSubType,
};

use super::PermissionService;
use super::resolver::Decision;

impl PermissionService {
    /// Returns whether the session may perform a sub-action on a table.
    pub fn has_table_permission(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        table_name: &str,
        sub_type: TablePermissionSubType,
    ) -> AppResult<bool> {
        Ok(self
            .table_decision(instance, session, table_name, sub_type, 0)?
            .allowed)
    }

    /// Table check entered from inside a custom checker's delegation.
    ///
    /// `depth` is the number of delegation hops taken so far; the resolver
    /// rejects the check once it crosses the delegation bound.
    pub(crate) fn has_table_permission_at(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        table_name: &str,
        sub_type: TablePermissionSubType,
        depth: usize,
    ) -> AppResult<bool> {
        Ok(self
            .table_decision(instance, session, table_name, sub_type, depth)?
            .allowed)
    }

    /// Returns `Ok(())` or a `PermissionDenied` error for a table sub-action.
    pub fn require_table_permission(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        table_name: &str,
        sub_type: TablePermissionSubType,
    ) -> AppResult<()> {
        let decision = self.table_decision(instance, session, table_name, sub_type, 0)?;
        if decision.allowed {
            return Ok(());
        }

        Err(AppError::PermissionDenied {
            entity_name: table_name.to_owned(),
            sub_action: Some(sub_type.as_str().to_owned()),
        })
    }

    /// Returns the UI-facing check result for a table sub-action.
    pub fn table_permission_check_result(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        table_name: &str,
        sub_type: TablePermissionSubType,
    ) -> AppResult<PermissionCheckResult> {
        let decision = self.table_decision(instance, session, table_name, sub_type, 0)?;
        Ok(Self::to_check_result(decision))
    }

    /// Returns whether the session may run a process.
    pub fn has_process_permission(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        process_name: &str,
    ) -> AppResult<bool> {
        let process = Self::lookup(instance.process(process_name), "process", process_name)?;
        Ok(self.entity_decision(instance, session, process)?.allowed)
    }

    /// Returns `Ok(())` or a `PermissionDenied` error for a process.
    pub fn require_process_permission(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        process_name: &str,
    ) -> AppResult<()> {
        let process = Self::lookup(instance.process(process_name), "process", process_name)?;
        Self::require(self.entity_decision(instance, session, process)?, process_name)
    }

    /// Returns the UI-facing check result for a process.
    pub fn process_permission_check_result(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        process_name: &str,
    ) -> AppResult<PermissionCheckResult> {
        let process = Self::lookup(instance.process(process_name), "process", process_name)?;
        Ok(Self::to_check_result(
            self.entity_decision(instance, session, process)?,
        ))
    }

    /// Returns whether the session may view a report.
    pub fn has_report_permission(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        report_name: &str,
    ) -> AppResult<bool> {
        let report = Self::lookup(instance.report(report_name), "report", report_name)?;
        Ok(self.entity_decision(instance, session, report)?.allowed)
    }

    /// Returns `Ok(())` or a `PermissionDenied` error for a report.
    pub fn require_report_permission(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        report_name: &str,
    ) -> AppResult<()> {
        let report = Self::lookup(instance.report(report_name), "report", report_name)?;
        Self::require(self.entity_decision(instance, session, report)?, report_name)
    }

    /// Returns the UI-facing check result for a report.
    pub fn report_permission_check_result(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        report_name: &str,
    ) -> AppResult<PermissionCheckResult> {
        let report = Self::lookup(instance.report(report_name), "report", report_name)?;
        Ok(Self::to_check_result(
            self.entity_decision(instance, session, report)?,
        ))
    }

    /// Returns whether the session may render a widget.
    pub fn has_widget_permission(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        widget_name: &str,
    ) -> AppResult<bool> {
        let widget = Self::lookup(instance.widget(widget_name), "widget", widget_name)?;
        Ok(self.entity_decision(instance, session, widget)?.allowed)
    }

    /// Returns `Ok(())` or a `PermissionDenied` error for a widget.
    pub fn require_widget_permission(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        widget_name: &str,
    ) -> AppResult<()> {
        let widget = Self::lookup(instance.widget(widget_name), "widget", widget_name)?;
        Self::require(self.entity_decision(instance, session, widget)?, widget_name)
    }

    /// Returns the UI-facing check result for a widget.
    pub fn widget_permission_check_result(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        widget_name: &str,
    ) -> AppResult<PermissionCheckResult> {
        let widget = Self::lookup(instance.widget(widget_name), "widget", widget_name)?;
        Ok(Self::to_check_result(
            self.entity_decision(instance, session, widget)?,
        ))
    }

    /// Returns whether the session may open an app.
    pub fn has_app_permission(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        app_name: &str,
    ) -> AppResult<bool> {
        let app = Self::lookup(instance.app(app_name), "app", app_name)?;
        Ok(self.entity_decision(instance, session, app)?.allowed)
    }

    /// Returns `Ok(())` or a `PermissionDenied` error for an app.
    pub fn require_app_permission(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        app_name: &str,
    ) -> AppResult<()> {
        let app = Self::lookup(instance.app(app_name), "app", app_name)?;
        Self::require(self.entity_decision(instance, session, app)?, app_name)
    }

    /// Returns the UI-facing check result for an app.
    pub fn app_permission_check_result(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        app_name: &str,
    ) -> AppResult<PermissionCheckResult> {
        let app = Self::lookup(instance.app(app_name), "app", app_name)?;
        Ok(Self::to_check_result(
            self.entity_decision(instance, session, app)?,
        ))
    }

    fn table_decision(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        table_name: &str,
        sub_type: TablePermissionSubType,
        depth: usize,
    ) -> AppResult<Decision> {
        let table = Self::lookup(instance.table(table_name), "table", table_name)?;
        self.decide(
            instance,
            session,
            SecurableKind::Table,
            table.name(),
            table.permission_rules(),
            Some(sub_type),
            depth,
        )
    }

    fn entity_decision(
        &self,
        instance: &InstanceMetadata,
        session: &Session,
        entity: &dyn Securable,
    ) -> AppResult<Decision> {
        self.decide(
            instance,
            session,
            entity.kind(),
            entity.name(),
            entity.permission_rules(),
            None,
            0,
        )
    }

    fn lookup<'a, T>(entity: Option<&'a T>, kind: &str, name: &str) -> AppResult<&'a T> {
        entity.ok_or_else(|| {
            AppError::NotFound(format!("{kind} '{name}' is not declared in this instance"))
        })
    }

    fn require(decision: Decision, entity_name: &str) -> AppResult<()> {
        if decision.allowed {
            return Ok(());
        }

        Err(AppError::PermissionDenied {
            entity_name: entity_name.to_owned(),
            sub_action: None,
        })
    }

    fn to_check_result(decision: Decision) -> PermissionCheckResult {
        if decision.allowed {
            PermissionCheckResult::Allow
        } else {
            PermissionCheckResult::denied(decision.deny_behavior)
        }
    }
}
