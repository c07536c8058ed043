//! Build metadata baked in by `build.rs`.

use crate::config::Env;

pub const BUILD_DATE: &str = env!("BUILD_DATE");
pub const BUILD_COMMIT: &str = env!("BUILD_COMMIT");
pub const BUILD_BRANCH: &str = env!("BUILD_BRANCH");
pub const PKG_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Value of the `x-service-version` header.
///
/// Production reports the released package version, everything else the
/// commit it was built from.
pub fn format_version_for_env(env: &Env) -> String {
    match env {
        Env::Prod => format!("stable:{PKG_VERSION}"),
        Env::Local | Env::Test => format!("main:{BUILD_COMMIT}"),
    }
}
