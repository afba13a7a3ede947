//! Domain entities and invariants for the Permeon permission engine.

#![forbid(unsafe_code)]

mod instance;
mod permission;
mod rules;
mod session;

pub use instance::{
    AppMetadata, InstanceMetadata, ProcessMetadata, ReportMetadata, Securable, SecurableKind,
    TableMetadata, WidgetMetadata,
};
pub use permission::{
    AvailablePermission, DenyBehavior, PermissionCheckResult, PermissionLevel, PermissionScope,
    TablePermissionSubType,
};
pub use rules::{CheckerReference, EffectivePermissionRules, PermissionRules};
pub use session::Session;
