//! OpenFerric-FEM prices derivatives by solving the Feynman–Kac PDE of a Markov
//! process with finite elements in space and a generalized θ-scheme in time.
//!
//! The crate combines pluggable dynamics (Black-Scholes, Heston, Heston with a
//! stochastic short rate, credit intensity), closed-form payoffs used as boundary
//! data, Dirichlet or natural boundary strategies, early-exercise projection and
//! residual/gradient driven adaptive refinement under one namespace.
//!
//! References used across modules include:
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 15 and 27.
//! - Heston (1993) for the stochastic-volatility dynamics.
//! - Verfürth (2013) for residual a-posteriori estimators.
//! - Dörfler (1996) for bulk marking.
//!
//! Numerical considerations:
//! - Crank–Nicolson (`θ = ½`) is second order but can ring near payoff kinks; use
//!   `θ = 1` when monotonicity matters more than order.
//! - American exercise is a projection onto the payoff after each step, first order
//!   at the exercise boundary.
//! - The built-in linear algebra is sized for research meshes: dense LU up to a
//!   configurable dof count, Jacobi BiCGStab beyond.
//!
//! # Feature Flags
//! - `parallel`: enables Rayon-powered parallel solves over sampled dynamics.
//!
//! # Quick Start
//! Price an at-the-money call on `[0, 2]`:
//! ```rust
//! use std::sync::Arc;
//! use openferric_fem::core::ExerciseStyle;
//! use openferric_fem::fem::create_mesh;
//! use openferric_fem::models::BlackScholes;
//! use openferric_fem::payoff::EuropeanOptionBs;
//! use openferric_fem::space::SpaceSolver;
//! use openferric_fem::time::ThetaScheme;
//!
//! let mut space = SpaceSolver::builder()
//!     .mesh(create_mesh(&[2.0], 3).unwrap())
//!     .dynamics(Arc::new(BlackScholes::new(0.03, 0.0, 0.2)))
//!     .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
//!     .build()
//!     .unwrap();
//! let times = [0.0, 0.25, 0.5, 0.75, 1.0];
//! let solution = ThetaScheme::crank_nicolson()
//!     .solve(&times, &mut space, None, ExerciseStyle::European)
//!     .unwrap();
//! let atm = space.nearest_dof(&[1.0]).unwrap();
//! let px = solution.final_values()[atm];
//! assert!(px > 0.09 && px < 0.1);
//! ```

pub mod core;
pub mod fem;
pub mod linalg;
pub mod math;
pub mod models;
pub mod payoff;
pub mod problems;
pub mod space;
pub mod time;
pub mod transform;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::{
        ElementKind, ExerciseStyle, Generation, NumericConfig, OptionType, PdeError, Result,
        SolverKind,
    };
    pub use crate::fem::{SimplexMesh, create_mesh, create_tensor_mesh};
    pub use crate::models::{BlackScholes, CreditRisk, CreditRiskJump, DynamicsModel, Heston, Heston3d};
    pub use crate::payoff::{CreditRiskPayoff, EuropeanOptionBs, Payoff};
    pub use crate::problems::{CreditRiskProblem, OptionPricingProblem, Problem};
    pub use crate::space::{
        AdaptiveMesh, BoundaryCondition, Criterion, DirichletBc, MarkingRule, NoBoundary,
        SpaceDiscretization, SpaceSolver, SpaceSolverBuilder,
    };
    pub use crate::time::{MarchState, Solution, ThetaMarch, ThetaScheme};
    pub use crate::transform::{AxisMapping, CoordinateTransform};
}
