//! Declaration contract consumed by the external provisioning engine.
//!
//! Components in this workspace never talk to the cloud API themselves.
//! They record uniquely-named resource declarations into a [`Stack`],
//! together with the dependency edges the engine needs to apply them in
//! the right order. Graph resolution, state diffing, and the apply loop
//! all happen on the engine side of this contract.

pub mod stack;
pub mod value;

pub use stack::{ResourceDecl, ResourceRef, Stack};
pub use value::{Input, OutputRef};
