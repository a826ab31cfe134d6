//! ## Crate layout
//! - `core`: templates, observers, change tracking, proxies and commands.
//!
//! The `prelude` module mirrors the surface an application needs to declare
//! domain types and drive an engine.

pub use umbra_core as core;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use umbra_core::{Error, engine::Engine};

///
/// Prelude
///

pub mod prelude {
    pub use crate::core::prelude::*;
}
