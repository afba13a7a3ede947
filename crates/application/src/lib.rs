//! Application services for permission resolution and enumeration.

#![forbid(unsafe_code)]

mod checker;
mod permission_service;

pub use checker::{
    CheckContext, CheckerRegistry, CustomPermissionChecker, EnumerationContext,
    UseOtherPermissionNameChecker, UseTablePermissionChecker,
};
pub use permission_service::PermissionService;
