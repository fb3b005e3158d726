//! Container image build trigger.
//!
//! Hashes a source tree into an immutable image tag and declares a
//! remote build-and-push command keyed on that hash, so the engine only
//! rebuilds when the source actually changes.

pub mod descriptor;
pub mod digest;
pub mod trigger;

pub use descriptor::build_descriptor;
pub use digest::source_tree_digest;
pub use trigger::BuildTrigger;
