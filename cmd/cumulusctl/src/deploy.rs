use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use pkg_build::BuildTrigger;
use pkg_cluster::{AutoScalingCluster, ClusterSpec, EnvValue};
use pkg_engine::Stack;
use pkg_iam::RoleConfig;
use pkg_secrets::Secret;
use pkg_types::config::DeploymentFile;
use pkg_types::{ClusterSizingPolicy, ContainerReference};

/// Everything declared from one deployment file.
#[derive(Debug)]
pub struct Deployment {
    pub stack: Stack,
    pub cluster: Option<AutoScalingCluster>,
    pub build: Option<BuildTrigger>,
}

/// Declare the full stack described by a deployment file.
///
/// Order matters: secrets first (so environment entries can reference
/// them), then the build trigger (so the cluster can consume its image),
/// then the cluster itself.
pub fn declare(file: &DeploymentFile) -> Result<Deployment> {
    let project = file.project()?;
    let region = file.region()?;
    let mut stack = Stack::new(project);

    let mut secrets: BTreeMap<String, Secret> = BTreeMap::new();
    for (name, entry) in &file.secrets {
        let secret = Secret::declare(&mut stack, name, &entry.data, entry.base64)?;
        secrets.insert(name.clone(), secret);
    }

    let build = match &file.build {
        Some(entry) => Some(BuildTrigger::declare(
            &mut stack,
            &entry.name,
            region,
            project,
            &entry.repository,
            Path::new(&entry.source_dir),
        )?),
        None => None,
    };

    let cluster = match &file.cluster {
        Some(entry) => {
            let container = match (&entry.image, &build) {
                (Some(image), _) => ContainerReference::new(image.clone(), entry.tag.clone())?,
                (None, Some(trigger)) => trigger.container()?,
                (None, None) => bail!(
                    "cluster '{}' needs an `image` or a `build` section",
                    entry.name
                ),
            };

            let mut environment = BTreeMap::new();
            for (key, value) in &entry.environment {
                let env_value = match value.strip_prefix("secret:") {
                    Some(secret_name) => {
                        let secret = secrets.get(secret_name).with_context(|| {
                            format!(
                                "environment variable {key} references undeclared secret '{secret_name}'"
                            )
                        })?;
                        EnvValue::from(secret.clone())
                    }
                    None => EnvValue::from(value.clone()),
                };
                environment.insert(key.clone(), env_value);
            }

            let spec = ClusterSpec {
                name: entry.name.clone(),
                container,
                project: project.to_string(),
                region: region.to_string(),
                machine_type: entry.machine_type.clone(),
                sizing: ClusterSizingPolicy {
                    enabled: entry.enabled,
                    min_replicas: entry.min_replicas,
                    max_replicas: entry.max_replicas,
                    cpu_target: entry.cpu_target,
                },
                environment,
                roles: entry.roles.clone().map(RoleConfig::from),
            };
            Some(AutoScalingCluster::declare(&mut stack, spec)?)
        }
        None => None,
    };

    Ok(Deployment {
        stack,
        cluster,
        build,
    })
}
