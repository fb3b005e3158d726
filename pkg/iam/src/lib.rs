//! Service account identity and role grants.
//!
//! Accepts role configuration in a strongly-typed form or an untyped
//! key-mapping form, normalizes both to the same internal shape, and
//! declares one uniquely-named grant resource per role.

pub mod account;
pub mod config;
pub mod slug;

pub use account::ServiceAccount;
pub use config::{
    BucketRole, RepositoryRole, RoleConfig, SecretRole, ServiceAccountConfig, ServiceRole,
};
pub use slug::role_slug;
