//! Core domain types, numerical configuration and the crate-wide error.

pub mod config;
pub mod error;
pub mod types;

pub use config::{ElementKind, NumericConfig, SolverKind};
pub use error::{PdeError, Result};
pub use types::*;
