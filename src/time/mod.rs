//! Time marching of the semi-discrete system.

pub mod solution;
pub mod theta;

pub use solution::Solution;
pub use theta::{MarchState, ThetaMarch, ThetaScheme};
