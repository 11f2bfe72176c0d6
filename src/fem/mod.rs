//! Finite-element layer: meshes, Lagrange bases, quadrature and assembly.

pub mod assemble;
pub mod basis;
pub mod form;
pub mod mesh;
pub mod quadrature;

pub use assemble::{assemble_bilinear, assemble_facet_linear, assemble_linear, project};
pub use basis::Basis;
pub use form::{BilinearForm, FacetLinearForm, LaplaceForm, LinearForm, MassForm, ShapeValue};
pub use mesh::{
    box_boundaries, create_mesh, create_tensor_mesh, tensor_mesh, BoundaryPredicate, BoundarySet, Facet, SimplexMesh,
};
pub use quadrature::QuadratureRule;
