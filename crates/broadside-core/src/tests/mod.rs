//! Cross-module tests.
//!
//! - `integration.rs`: end-to-end behavior of modules, ships and the world
//! - `determinism.rs`: same seed and inputs give identical runs
//! - `properties.rs`: property tests over module state machines
//! - `helpers.rs`: scenario setup shared by the above

mod helpers;
mod integration;

pub use helpers::*;
