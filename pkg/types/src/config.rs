use std::collections::BTreeMap;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

/// Deployment file (YAML).
///
/// Example `deployment.yaml`:
/// ```yaml
/// project: my-project
/// region: europe-west4
/// secrets:
///   api-key:
///     data: s3cret
/// build:
///   name: worker
///   repository: images
///   source-dir: ./worker
/// cluster:
///   name: worker
///   machine-type: e2-medium
///   cpu-target: 0.6
///   enabled: true
///   min-replicas: 1
///   max-replicas: 10
///   environment:
///     LOG_LEVEL: info
///     API_KEY: secret:api-key
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeploymentFile {
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub secrets: BTreeMap<String, SecretEntry>,
    #[serde(default)]
    pub build: Option<BuildEntry>,
    #[serde(default)]
    pub cluster: Option<ClusterEntry>,
}

/// One managed secret: payload for its first version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretEntry {
    pub data: String,
    /// Whether `data` is already base64-encoded.
    #[serde(default)]
    pub base64: bool,
}

/// Remote image build driven by a source-tree content hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildEntry {
    pub name: String,
    /// Artifact registry repository id.
    pub repository: String,
    #[serde(alias = "source-dir")]
    pub source_dir: String,
}

/// Auto-scaling cluster section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterEntry {
    pub name: String,
    /// Image path; may be omitted when a `build` section supplies it.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(alias = "machine-type", default = "default_machine_type")]
    pub machine_type: String,
    #[serde(alias = "cpu-target", default = "default_cpu_target")]
    pub cpu_target: f64,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(alias = "min-replicas", default = "default_min_replicas")]
    pub min_replicas: u32,
    #[serde(alias = "max-replicas", default = "default_max_replicas")]
    pub max_replicas: u32,
    /// Values of the form `secret:{name}` reference a declared secret.
    #[serde(default)]
    pub environment: BTreeMap<String, String>,
    /// Extra role configuration, in the untyped mapping form.
    #[serde(default)]
    pub roles: Option<serde_json::Value>,
}

fn default_machine_type() -> String {
    "e2-medium".to_string()
}

fn default_cpu_target() -> f64 {
    0.6
}

fn default_enabled() -> bool {
    true
}

fn default_min_replicas() -> u32 {
    1
}

fn default_max_replicas() -> u32 {
    1
}

impl DeploymentFile {
    /// Project id, required before anything can be declared.
    pub fn project(&self) -> Result<&str> {
        match self.project.as_deref() {
            Some(p) if !p.is_empty() => Ok(p),
            _ => bail!("deployment file must set `project` (or pass --project)"),
        }
    }

    /// Region, required before anything can be declared.
    pub fn region(&self) -> Result<&str> {
        match self.region.as_deref() {
            Some(r) if !r.is_empty() => Ok(r),
            _ => bail!("deployment file must set `region` (or pass --region)"),
        }
    }
}

/// Load a YAML config file, returning the default if the file doesn't exist.
pub fn load_config_file<T: serde::de::DeserializeOwned + Default>(path: &str) -> Result<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(T::default());
        }
        Err(e) => return Err(e).with_context(|| format!("reading config file {path}")),
    };
    let config: T =
        serde_yaml::from_str(&content).with_context(|| format!("parsing config file {path}"))?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kebab_case_aliases_accepted() {
        let yaml = r#"
project: my-project
region: europe-west4
cluster:
  name: worker
  machine-type: n2-standard-4
  cpu-target: 0.75
  min-replicas: 2
  max-replicas: 8
"#;
        let file: DeploymentFile = serde_yaml::from_str(yaml).unwrap();
        let cluster = file.cluster.unwrap();
        assert_eq!(cluster.machine_type, "n2-standard-4");
        assert_eq!(cluster.cpu_target, 0.75);
        assert_eq!(cluster.min_replicas, 2);
        assert_eq!(cluster.max_replicas, 8);
        assert!(cluster.enabled);
    }

    #[test]
    fn missing_sections_default() {
        let file: DeploymentFile = serde_yaml::from_str("project: p\nregion: r\n").unwrap();
        assert!(file.secrets.is_empty());
        assert!(file.build.is_none());
        assert!(file.cluster.is_none());
        assert_eq!(file.project().unwrap(), "p");
    }

    #[test]
    fn missing_project_is_an_error() {
        let file = DeploymentFile::default();
        assert!(file.project().is_err());
        assert!(file.region().is_err());
    }
}
