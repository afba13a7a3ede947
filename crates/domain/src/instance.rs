use std::collections::BTreeMap;

use permeon_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};

use crate::PermissionRules;

/// Kind of securable entity inside an instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurableKind {
    /// Record-holding table.
    Table,
    /// Executable process.
    Process,
    /// Saved report.
    Report,
    /// Dashboard widget.
    Widget,
    /// Application grouping of entities.
    App,
}

impl SecurableKind {
    /// Returns a stable storage value for this kind.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Table => "table",
            Self::Process => "process",
            Self::Report => "report",
            Self::Widget => "widget",
            Self::App => "app",
        }
    }
}

/// Common read surface shared by all securable entity metadata.
pub trait Securable {
    /// Returns this entity's kind.
    fn kind(&self) -> SecurableKind;

    /// Returns the stable entity name.
    fn name(&self) -> &NonEmptyString;

    /// Returns the entity's own permission rules, if declared.
    fn permission_rules(&self) -> Option<&PermissionRules>;
}

macro_rules! securable_metadata {
    ($(#[$doc:meta])* $type_name:ident, $kind:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $type_name {
            name: NonEmptyString,
            display_name: NonEmptyString,
            #[serde(default)]
            permission_rules: Option<PermissionRules>,
        }

        impl $type_name {
            /// Creates validated metadata with no permission rules.
            pub fn new(
                name: impl Into<String>,
                display_name: impl Into<String>,
            ) -> AppResult<Self> {
                Ok(Self {
                    name: NonEmptyString::new(name)?,
                    display_name: NonEmptyString::new(display_name)?,
                    permission_rules: None,
                })
            }

            /// Attaches permission rules to this entity.
            #[must_use]
            pub fn with_permission_rules(mut self, rules: PermissionRules) -> Self {
                self.permission_rules = Some(rules);
                self
            }

            /// Returns the stable entity name.
            #[must_use]
            pub fn name(&self) -> &NonEmptyString {
                &self.name
            }

            /// Returns the display name.
            #[must_use]
            pub fn display_name(&self) -> &NonEmptyString {
                &self.display_name
            }

            /// Returns the entity's own permission rules, if declared.
            #[must_use]
            pub fn permission_rules(&self) -> Option<&PermissionRules> {
                self.permission_rules.as_ref()
            }
        }

        impl Securable for $type_name {
            fn kind(&self) -> SecurableKind {
                $kind
            }

            fn name(&self) -> &NonEmptyString {
                self.name()
            }

            fn permission_rules(&self) -> Option<&PermissionRules> {
                self.permission_rules()
            }
        }
    };
}

securable_metadata!(
    /// Metadata for a record-holding table.
    TableMetadata,
    SecurableKind::Table
);
securable_metadata!(
    /// Metadata for an executable process.
    ProcessMetadata,
    SecurableKind::Process
);
securable_metadata!(
    /// Metadata for a saved report.
    ReportMetadata,
    SecurableKind::Report
);
securable_metadata!(
    /// Metadata for a dashboard widget.
    WidgetMetadata,
    SecurableKind::Widget
);
securable_metadata!(
    /// Metadata for an application grouping.
    AppMetadata,
    SecurableKind::App
);

/// Read-only snapshot of an instance's securable entities.
///
/// Produced by the metadata-loading subsystem; treated as immutable once
/// checks start running against it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceMetadata {
    #[serde(default)]
    tables: BTreeMap<String, TableMetadata>,
    #[serde(default)]
    processes: BTreeMap<String, ProcessMetadata>,
    #[serde(default)]
    reports: BTreeMap<String, ReportMetadata>,
    #[serde(default)]
    widgets: BTreeMap<String, WidgetMetadata>,
    #[serde(default)]
    apps: BTreeMap<String, AppMetadata>,
    #[serde(default)]
    default_permission_rules: Option<PermissionRules>,
}

impl InstanceMetadata {
    /// Creates an empty instance snapshot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the instance-wide default permission rules.
    #[must_use]
    pub fn with_default_permission_rules(mut self, rules: PermissionRules) -> Self {
        self.default_permission_rules = Some(rules);
        self
    }

    /// Returns the instance-wide default permission rules, if set.
    #[must_use]
    pub fn default_permission_rules(&self) -> Option<&PermissionRules> {
        self.default_permission_rules.as_ref()
    }

    /// Adds a table, rejecting duplicate names.
    pub fn add_table(&mut self, table: TableMetadata) -> AppResult<()> {
        Self::insert(&mut self.tables, table.name().as_str().to_owned(), table)
    }

    /// Adds a process, rejecting duplicate names.
    pub fn add_process(&mut self, process: ProcessMetadata) -> AppResult<()> {
        Self::insert(
            &mut self.processes,
            process.name().as_str().to_owned(),
            process,
        )
    }

    /// Adds a report, rejecting duplicate names.
    pub fn add_report(&mut self, report: ReportMetadata) -> AppResult<()> {
        Self::insert(&mut self.reports, report.name().as_str().to_owned(), report)
    }

    /// Adds a widget, rejecting duplicate names.
    pub fn add_widget(&mut self, widget: WidgetMetadata) -> AppResult<()> {
        Self::insert(&mut self.widgets, widget.name().as_str().to_owned(), widget)
    }

    /// Adds an app, rejecting duplicate names.
    pub fn add_app(&mut self, app: AppMetadata) -> AppResult<()> {
        Self::insert(&mut self.apps, app.name().as_str().to_owned(), app)
    }

    /// Looks up a table by name.
    #[must_use]
    pub fn table(&self, name: &str) -> Option<&TableMetadata> {
        self.tables.get(name)
    }

    /// Looks up a process by name.
    #[must_use]
    pub fn process(&self, name: &str) -> Option<&ProcessMetadata> {
        self.processes.get(name)
    }

    /// Looks up a report by name.
    #[must_use]
    pub fn report(&self, name: &str) -> Option<&ReportMetadata> {
        self.reports.get(name)
    }

    /// Looks up a widget by name.
    #[must_use]
    pub fn widget(&self, name: &str) -> Option<&WidgetMetadata> {
        self.widgets.get(name)
    }

    /// Looks up an app by name.
    #[must_use]
    pub fn app(&self, name: &str) -> Option<&AppMetadata> {
        self.apps.get(name)
    }

    /// Iterates all tables in name order.
    pub fn tables(&self) -> impl Iterator<Item = &TableMetadata> {
        self.tables.values()
    }

    /// Iterates all processes in name order.
    pub fn processes(&self) -> impl Iterator<Item = &ProcessMetadata> {
        self.processes.values()
    }

    /// Iterates all reports in name order.
    pub fn reports(&self) -> impl Iterator<Item = &ReportMetadata> {
        self.reports.values()
    }

    /// Iterates all widgets in name order.
    pub fn widgets(&self) -> impl Iterator<Item = &WidgetMetadata> {
        self.widgets.values()
    }

    /// Iterates all apps in name order.
    pub fn apps(&self) -> impl Iterator<Item = &AppMetadata> {
        self.apps.values()
    }

    /// Iterates every securable entity of every kind.
    pub fn securables(&self) -> impl Iterator<Item = &dyn Securable> {
        let tables = self.tables.values().map(|entity| entity as &dyn Securable);
        let processes = self
            .processes
            .values()
            .map(|entity| entity as &dyn Securable);
        let reports = self.reports.values().map(|entity| entity as &dyn Securable);
        let widgets = self.widgets.values().map(|entity| entity as &dyn Securable);
        let apps = self.apps.values().map(|entity| entity as &dyn Securable);

        tables
            .chain(processes)
            .chain(reports)
            .chain(widgets)
            .chain(apps)
    }

    fn insert<T>(registry: &mut BTreeMap<String, T>, name: String, entity: T) -> AppResult<()> {
        if registry.contains_key(&name) {
            return Err(AppError::Conflict(format!(
                "entity '{name}' is already declared in this instance"
            )));
        }

        registry.insert(name, entity);
        Ok(())
    }
}
