use std::collections::BTreeSet;
use std::fmt;

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::value::OutputRef;

/// Non-owning reference to a declared resource.
///
/// References never control the referent's lifecycle; they only name it so
/// the engine can wire dependency edges and resolve deferred outputs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceRef {
    name: String,
}

impl ResourceRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Deferred attribute of the referenced resource.
    pub fn output(&self, attribute: &str) -> OutputRef {
        OutputRef::new(&self.name, attribute)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// One resource declaration handed to the provisioning engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDecl {
    pub name: String,
    /// Provider type token, e.g. `gcp:compute/network`.
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub props: Value,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<ResourceRef>,
    /// Component scope this resource belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Values whose change forces the engine to re-run this resource.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub triggers: Vec<String>,
}

impl ResourceDecl {
    pub fn new(name: impl Into<String>, kind: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: kind.into(),
            props: Value::Null,
            depends_on: Vec::new(),
            parent: None,
            triggers: Vec::new(),
        }
    }

    pub fn props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }

    pub fn depends_on(mut self, refs: impl IntoIterator<Item = ResourceRef>) -> Self {
        self.depends_on.extend(refs);
        self
    }

    pub fn parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn trigger(mut self, value: impl Into<String>) -> Self {
        self.triggers.push(value.into());
        self
    }
}

/// Rendered form of a stack, serialized as the engine manifest.
#[derive(Serialize)]
struct Manifest<'a> {
    stack: &'a str,
    resources: &'a [ResourceDecl],
}

/// Named declaration scope.
///
/// Collects resource declarations in declaration order and rejects
/// duplicate names, so every generated grant/resource name is unique
/// before the engine ever sees the graph.
#[derive(Debug, Default)]
pub struct Stack {
    name: String,
    resources: Vec<ResourceDecl>,
    names: BTreeSet<String>,
}

impl Stack {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            resources: Vec::new(),
            names: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Record a resource declaration. Fails if the name is already taken.
    pub fn declare(&mut self, decl: ResourceDecl) -> Result<ResourceRef> {
        if !self.names.insert(decl.name.clone()) {
            bail!(
                "resource '{}' is already declared in stack '{}'",
                decl.name,
                self.name
            );
        }
        debug!("declared {} ({})", decl.name, decl.kind);
        let reference = ResourceRef::new(&decl.name);
        self.resources.push(decl);
        Ok(reference)
    }

    pub fn resources(&self) -> &[ResourceDecl] {
        &self.resources
    }

    pub fn get(&self, name: &str) -> Option<&ResourceDecl> {
        self.resources.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    /// Render the declared graph as a YAML manifest, in declaration order.
    /// The output is stable across runs for identical declarations.
    pub fn manifest(&self) -> Result<String> {
        let manifest = Manifest {
            stack: &self.name,
            resources: &self.resources,
        };
        Ok(serde_yaml::to_string(&manifest)?)
    }
}
