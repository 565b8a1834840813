//! Configuration types
//!
//! Board-level constants that shape the pulse train, command limits, and the
//! parameter values loaded at boot.

pub mod defaults;
pub mod settings;

pub use defaults::*;
pub use settings::*;
