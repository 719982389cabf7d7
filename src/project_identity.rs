//! Central project identity contract.
//!
//! Single source of truth for runtime identity values.

pub const BINARY_NAME: &str = "procpack";
pub const PROJECT_QUALIFIER: &str = "com";
pub const PROJECT_ORG: &str = "procpack";
pub const CONFIG_DIR_NAME: &str = "procpack";
pub const ENV_PREFIX: &str = "PROCPACK";
pub const SETTINGS_FILE_BASENAME: &str = "settings.kdl";

pub fn env_key(suffix: &str) -> String {
    format!("{}_{}", ENV_PREFIX, suffix)
}

pub fn env_get(suffix: &str) -> Option<String> {
    std::env::var(env_key(suffix)).ok()
}

pub fn user_agent() -> String {
    format!("{}/{}", BINARY_NAME, env!("CARGO_PKG_VERSION"))
}
