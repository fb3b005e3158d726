use std::collections::BTreeMap;

use pkg_secrets::Secret;

/// Environment value handed to the container: a literal, or a reference
/// to a managed secret whose payload is injected at boot.
#[derive(Debug, Clone)]
pub enum EnvValue {
    Literal(String),
    Secret(Secret),
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        EnvValue::Literal(value.to_string())
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        EnvValue::Literal(value)
    }
}

impl From<Secret> for EnvValue {
    fn from(secret: Secret) -> Self {
        EnvValue::Secret(secret)
    }
}

/// Split of a caller environment into literals and secret references.
#[derive(Debug, Clone, Default)]
pub struct PartitionedEnv {
    /// Literal variables, passed through to the container unchanged.
    pub literals: BTreeMap<String, String>,
    /// Referenced secrets, keyed by their derived environment variable name.
    pub secrets: BTreeMap<String, Secret>,
}

impl PartitionedEnv {
    /// Distinct secrets referenced by the environment.
    pub fn used_secrets(&self) -> impl Iterator<Item = &Secret> {
        self.secrets.values()
    }
}

/// Partition a caller environment map.
///
/// Entries are visited in key-sorted order so downstream configuration
/// stays diff-stable across redeployments. Secret references are keyed by
/// the secret's env key (slug uppercased, hyphens to underscores); the
/// caller's variable name for a secret entry is not used.
pub fn partition_environment(environment: BTreeMap<String, EnvValue>) -> PartitionedEnv {
    let mut partitioned = PartitionedEnv::default();
    for (key, value) in environment {
        match value {
            EnvValue::Literal(literal) => {
                partitioned.literals.insert(key, literal);
            }
            EnvValue::Secret(secret) => {
                partitioned.secrets.insert(secret.env_key(), secret);
            }
        }
    }
    partitioned
}
