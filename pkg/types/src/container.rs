use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

/// Reference to a container image: repository path plus tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerReference {
    /// Full image path, e.g. `europe-west4-docker.pkg.dev/proj/repo/worker`.
    pub image: String,
    /// Image tag. Unset means the mutable `latest` marker.
    #[serde(default)]
    pub tag: Option<String>,
}

impl ContainerReference {
    pub fn new(image: impl Into<String>, tag: Option<String>) -> Result<Self> {
        let reference = Self {
            image: image.into(),
            tag,
        };
        reference.validate()?;
        Ok(reference)
    }

    pub fn validate(&self) -> Result<()> {
        if self.image.is_empty() {
            bail!("container image must not be empty");
        }
        if self.tag.as_deref() == Some("") {
            bail!(
                "container tag cannot be empty; leave it unset or set it to `latest` explicitly"
            );
        }
        Ok(())
    }

    /// Tag to deploy, falling back to the mutable `latest` marker.
    pub fn tag_or_latest(&self) -> &str {
        self.tag.as_deref().unwrap_or("latest")
    }

    /// Registry hostname, i.e. everything before the first `/`.
    pub fn registry_hostname(&self) -> &str {
        self.image.split('/').next().unwrap_or(&self.image)
    }

    /// `image:tag` form consumed by the container runtime.
    pub fn qualified(&self) -> String {
        format!("{}:{}", self.image, self.tag_or_latest())
    }
}
