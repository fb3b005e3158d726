//! Image build constants.

/// Hostname suffix of the regional artifact registry.
/// Full hostname = `{region}` + this suffix.
pub const REGISTRY_HOSTNAME_SUFFIX: &str = "-docker.pkg.dev";

/// Builder image used for every build step.
pub const BUILDER_IMAGE: &str = "gcr.io/cloud-builders/docker";

/// Machine type the remote build runs on.
pub const BUILD_MACHINE_TYPE: &str = "E2_HIGHCPU_8";

/// Remote build timeout.
pub const BUILD_TIMEOUT: &str = "600s";

/// Tag pushed alongside every content-hash tag.
pub const LATEST_TAG: &str = "latest";

/// File patterns that contribute to the source-tree digest.
pub const DIGEST_PATTERNS: &[&str] = &["*.py", "*.toml", "Dockerfile", "*.md"];

/// Directories excluded from the source-tree digest.
pub const DIGEST_IGNORE_DIRS: &[&str] = &[".venv"];
