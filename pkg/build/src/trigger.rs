use std::path::Path;

use anyhow::Result;
use pkg_constants::build::{DIGEST_IGNORE_DIRS, DIGEST_PATTERNS, REGISTRY_HOSTNAME_SUFFIX};
use pkg_engine::{ResourceDecl, ResourceRef, Stack};
use pkg_types::ContainerReference;
use pkg_types::validate::validate_name;
use serde_json::{Value, json};
use tracing::info;

use crate::descriptor::build_descriptor;
use crate::digest::source_tree_digest;

/// A local build trigger: hashes the source tree, declares a remote
/// build-and-push command, and exposes the resulting image reference.
///
/// The digest doubles as the immutable image tag and as the declared
/// command's change trigger, so the engine re-runs the build exactly
/// when a matched source file changes.
#[derive(Debug, Clone)]
pub struct BuildTrigger {
    name: String,
    tag: String,
    image: String,
    descriptor: Value,
    command: ResourceRef,
}

impl BuildTrigger {
    pub fn declare(
        stack: &mut Stack,
        name: &str,
        region: &str,
        project: &str,
        repository: &str,
        source_dir: &Path,
    ) -> Result<Self> {
        validate_name(name)?;

        let tag = source_tree_digest(source_dir, DIGEST_PATTERNS, DIGEST_IGNORE_DIRS)?;
        let hostname = format!("{region}{REGISTRY_HOSTNAME_SUFFIX}");
        let descriptor = build_descriptor(&hostname, project, repository, name, &tag);

        let command = stack.declare(
            ResourceDecl::new(format!("{name}-cloud-build-image"), "command:local/run")
                .props(json!({
                    "create": format!(
                        "gcloud builds submit --config=/dev/stdin --project={project} {}",
                        source_dir.display()
                    ),
                    "stdin": descriptor.to_string(),
                }))
                .trigger(&tag)
                .parent(name),
        )?;
        info!("declared build trigger {name} (tag {})", &tag[..12.min(tag.len())]);

        Ok(Self {
            name: name.to_string(),
            tag,
            image: format!("{hostname}/{project}/{repository}/{name}"),
            descriptor,
            command,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Content-hash tag of the built image.
    pub fn tag(&self) -> &str {
        &self.tag
    }

    /// Image path without a tag.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// The build request document submitted on change.
    pub fn descriptor(&self) -> &Value {
        &self.descriptor
    }

    pub fn command(&self) -> &ResourceRef {
        &self.command
    }

    /// Image reference pinned to the content-hash tag.
    pub fn container(&self) -> Result<ContainerReference> {
        ContainerReference::new(self.image.clone(), Some(self.tag.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn declares_one_command_keyed_on_the_digest() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();
        fs::write(dir.path().join("Dockerfile"), "FROM python:3.12\n").unwrap();

        let mut stack = Stack::new("test");
        let trigger = BuildTrigger::declare(
            &mut stack,
            "worker",
            "europe-west4",
            "my-project",
            "images",
            dir.path(),
        )
        .unwrap();

        assert_eq!(stack.len(), 1);
        let command = stack.get("worker-cloud-build-image").unwrap();
        assert_eq!(command.triggers, vec![trigger.tag().to_string()]);
        assert!(
            command.props["create"]
                .as_str()
                .unwrap()
                .starts_with("gcloud builds submit --config=/dev/stdin")
        );
    }

    #[test]
    fn container_reference_is_hash_pinned() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.py"), "print('hi')\n").unwrap();

        let mut stack = Stack::new("test");
        let trigger = BuildTrigger::declare(
            &mut stack,
            "worker",
            "europe-west4",
            "my-project",
            "images",
            dir.path(),
        )
        .unwrap();

        let container = trigger.container().unwrap();
        assert_eq!(
            container.image,
            "europe-west4-docker.pkg.dev/my-project/images/worker"
        );
        assert_eq!(container.tag.as_deref(), Some(trigger.tag()));
        assert_eq!(container.registry_hostname(), "europe-west4-docker.pkg.dev");
    }
}
