use serde::{Deserialize, Serialize};

/// Deferred attribute of a declared resource.
///
/// The value is unknown until the engine applies the resource; the engine
/// substitutes the resolved attribute wherever the reference is embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputRef {
    /// Name of the resource that produces the value.
    pub resource: String,
    /// Attribute to read once the resource exists (e.g. `self_link`, `email`).
    pub attribute: String,
}

impl OutputRef {
    pub fn new(resource: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            attribute: attribute.into(),
        }
    }
}

/// A property value that is either known at declaration time or produced
/// by another resource during apply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Input {
    /// Deferred value, serialized as `{"output": {"resource": .., "attribute": ..}}`.
    Output { output: OutputRef },
    /// Plain JSON value, passed to the engine verbatim.
    Literal(serde_json::Value),
}

impl Input {
    pub fn literal(value: impl Into<serde_json::Value>) -> Self {
        Input::Literal(value.into())
    }

    pub fn output(output: OutputRef) -> Self {
        Input::Output { output }
    }
}

impl From<OutputRef> for Input {
    fn from(output: OutputRef) -> Self {
        Input::Output { output }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_ref_round_trip() {
        let input = Input::output(OutputRef::new("worker-network", "self_link"));
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "output": {"resource": "worker-network", "attribute": "self_link"}
            })
        );
        let back: Input = serde_json::from_value(json).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn literal_stays_literal() {
        let input = Input::literal("10.10.0.0/24");
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json, serde_json::json!("10.10.0.0/24"));
        let back: Input = serde_json::from_value(json).unwrap();
        assert_eq!(back, input);
    }
}
