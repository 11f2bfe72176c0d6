use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Plain-vanilla option side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OptionType {
    /// Call option payoff profile.
    #[default]
    Call,
    /// Put option payoff profile.
    Put,
}

impl OptionType {
    /// Returns +1.0 for calls and -1.0 for puts.
    pub fn sign(self) -> f64 {
        match self {
            Self::Call => 1.0,
            Self::Put => -1.0,
        }
    }

    /// Returns `true` for the call side.
    pub fn is_call(self) -> bool {
        matches!(self, Self::Call)
    }
}

/// Exercise rights for an option contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ExerciseStyle {
    /// Exercise only at expiry.
    #[default]
    European,
    /// Exercise at any time up to expiry.
    ///
    /// Enforced by projecting every time step onto the terminal payoff,
    /// `v[i+1] = max(v[i+1], v[0])`. This is a first-order approximation of
    /// the free-boundary problem, not a linear-complementarity solve.
    American,
}

impl ExerciseStyle {
    /// Returns `true` when early exercise is allowed.
    pub fn is_american(self) -> bool {
        matches!(self, Self::American)
    }
}

/// Identifier of one mesh generation.
///
/// Every mesh built or refined receives a fresh id. Degree-of-freedom vectors
/// are only meaningful against the basis of the generation that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Generation(pub u64);

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

impl Generation {
    /// Allocates a new, process-unique generation id.
    pub fn next() -> Self {
        Self(NEXT_GENERATION.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "gen#{}", self.0)
    }
}
