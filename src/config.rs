use once_cell::sync::Lazy;
use serde_json::Value;

use crate::billing::PlanCatalog;

/// Secret used for JWT verification. Must be set via the `JWT_SECRET` env variable.
pub static JWT_SECRET: Lazy<String> =
    Lazy::new(|| std::env::var("JWT_SECRET").expect("JWT_SECRET must be set"));

/// Address the HTTP server should bind to. Defaults to `0.0.0.0`.
pub static BIND_ADDRESS: Lazy<String> =
    Lazy::new(|| std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0".to_string()));

/// Port the HTTP server should listen on. Defaults to `3000`.
pub static BIND_PORT: Lazy<u16> = Lazy::new(|| {
    std::env::var("BIND_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3000)
});

/// When set to a truthy value, allows the application to continue running even if database
/// migrations fail. Defaults to `false`.
pub static ALLOW_MIGRATION_FAILURE: Lazy<bool> = Lazy::new(|| {
    std::env::var("ALLOW_MIGRATION_FAILURE")
        .ok()
        .map(|value| {
            let normalized = value.trim().to_ascii_lowercase();
            matches!(normalized.as_str(), "1" | "true" | "yes")
        })
        .unwrap_or(false)
});

/// key: billing-config -> package plan catalog
///
/// JSON map of partner tag to `{price_cents, credit_cents}`, parsed once
/// at startup. An empty catalog means no partner can purchase a package.
pub static PACKAGE_PLANS: Lazy<PlanCatalog> = Lazy::new(|| {
    let raw = json_from_env("PACKAGE_PLANS", Value::Object(Default::default()));
    PlanCatalog::from_json(&raw.to_string())
        .unwrap_or_else(|err| panic!("failed to parse PACKAGE_PLANS: {err}"))
});

fn json_from_env(var: &str, default_value: Value) -> Value {
    match std::env::var(var) {
        Ok(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                default_value
            } else {
                serde_json::from_str(trimmed)
                    .unwrap_or_else(|err| panic!("failed to parse {var} as JSON: {err}"))
            }
        }
        Err(_) => default_value,
    }
}
