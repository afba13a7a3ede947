//! Permission-catalog audit tool.
//!
//! Loads an instance metadata snapshot from a JSON file and prints every
//! permission name the instance could ever check, for role-management and
//! documentation workflows.

#![forbid(unsafe_code)]

use std::env;
use std::fs;

use permeon_application::PermissionService;
use permeon_core::{AppError, AppResult};
use permeon_domain::InstanceMetadata;
use tracing::info;
use tracing_subscriber::EnvFilter;

struct AuditConfig {
    instance_path: String,
    as_json: bool,
}

fn main() -> Result<(), AppError> {
    init_tracing();

    let config = parse_args(env::args().skip(1))?;
    let instance = load_instance(config.instance_path.as_str())?;

    let service = PermissionService::with_builtin_checkers();
    service.validate_instance(&instance)?;

    if config.as_json {
        let permissions = service.all_available_permissions(&instance)?;
        info!(count = permissions.len(), "enumerated available permissions");
        let rendered = serde_json::to_string_pretty(&permissions)
            .map_err(|error| AppError::Internal(error.to_string()))?;
        println!("{rendered}");
    } else {
        let names = service.all_available_permission_names(&instance)?;
        info!(count = names.len(), "enumerated available permissions");
        for name in names {
            println!("{name}");
        }
    }

    Ok(())
}

fn parse_args(args: impl Iterator<Item = String>) -> AppResult<AuditConfig> {
    let mut instance_path = None;
    let mut as_json = false;

    for arg in args {
        if arg == "--json" {
            as_json = true;
        } else if instance_path.is_none() {
            instance_path = Some(arg);
        } else {
            return Err(usage_error());
        }
    }

    let Some(instance_path) = instance_path else {
        return Err(usage_error());
    };

    Ok(AuditConfig {
        instance_path,
        as_json,
    })
}

fn usage_error() -> AppError {
    AppError::Validation("usage: permeon-audit <instance.json> [--json]".to_owned())
}

fn load_instance(path: &str) -> AppResult<InstanceMetadata> {
    let raw = fs::read_to_string(path).map_err(|error| {
        AppError::NotFound(format!("cannot read instance file '{path}': {error}"))
    })?;

    serde_json::from_str(&raw)
        .map_err(|error| AppError::Validation(format!("invalid instance metadata: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[cfg(test)]
mod tests {
    use super::parse_args;

    #[test]
    fn parse_args_requires_a_path() {
        let result = parse_args(std::iter::empty());
        assert!(result.is_err());
    }

    #[test]
    fn parse_args_accepts_json_flag_in_any_position() {
        let args = ["--json".to_owned(), "instance.json".to_owned()];
        let config = parse_args(args.into_iter()).unwrap_or_else(|_| unreachable!());
        assert!(config.as_json);
        assert_eq!(config.instance_path, "instance.json");
    }
}
