//! Managed secret component.

use anyhow::Result;
use pkg_engine::{Input, ResourceDecl, ResourceRef, Stack};
use pkg_types::validate::validate_name;
use serde_json::json;
use tracing::debug;

/// A managed secret container plus its first version.
///
/// The container owns all versions; the payload supplied here lands in
/// version 1. Other components reference the container (for IAM grants)
/// or the version (for boot-time injection) without owning either.
#[derive(Debug, Clone)]
pub struct Secret {
    name: String,
    secret: ResourceRef,
    version: ResourceRef,
}

impl Secret {
    /// Declare the secret container and its first version.
    ///
    /// `base64` marks the payload as already base64-encoded.
    pub fn declare(stack: &mut Stack, name: &str, data: &str, base64: bool) -> Result<Self> {
        validate_name(name)?;

        let secret = stack.declare(
            ResourceDecl::new(name, "gcp:secretmanager/secret")
                .props(json!({
                    "secret_id": name,
                    "replication": {"auto": {}},
                }))
                .parent(name),
        )?;
        let version = stack.declare(
            ResourceDecl::new(format!("{name}-v1"), "gcp:secretmanager/secret-version")
                .props(json!({
                    "secret": Input::output(secret.output("id")),
                    "secret_data": data,
                    "is_secret_data_base64": base64,
                }))
                .depends_on([secret.clone()])
                .parent(name),
        )?;
        debug!("declared secret {name}");

        Ok(Self {
            name: name.to_string(),
            secret,
            version,
        })
    }

    /// Resource slug this secret was declared under.
    pub fn resource_name(&self) -> &str {
        &self.name
    }

    /// The secret container, the target of accessor grants.
    pub fn secret(&self) -> &ResourceRef {
        &self.secret
    }

    /// The first version, which boot configurations must wait for.
    pub fn version(&self) -> &ResourceRef {
        &self.version
    }

    /// Environment variable key derived from the secret name:
    /// uppercased, hyphens replaced with underscores.
    pub fn env_key(&self) -> String {
        self.name.to_uppercase().replace('-', "_")
    }

    /// Access path of the newest version, readable once the accessor role
    /// is granted: `projects/{project}/secrets/{name}/versions/latest`.
    pub fn access_path(&self, project: &str) -> String {
        format!("projects/{project}/secrets/{}/versions/latest", self.name)
    }
}
