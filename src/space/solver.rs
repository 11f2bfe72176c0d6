use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::{AdaptiveMesh, PdeForms, SpaceDiscretization};
use crate::core::{Generation, NumericConfig, OptionType, PdeError, Result};
use crate::fem::{assemble_linear, Basis, SimplexMesh};
use crate::linalg::{CsrMatrix, LinearSolver};
use crate::models::DynamicsModel;
use crate::payoff::Payoff;
use crate::time::Solution;
use crate::transform::CoordinateTransform;

/// Finite-element space owning the mesh, basis and assembled operators.
///
/// The `(mesh, basis, M, K)` tuple is replaced as a whole by
/// [`SpaceSolver::refine_mesh`]; anything built from the previous generation
/// must not be reused afterwards.
pub struct SpaceSolver {
    forms: PdeForms,
    basis: Basis,
    mass: CsrMatrix,
    stiffness: CsrMatrix,
    adaptive: Option<AdaptiveMesh>,
    config: NumericConfig,
    projector: LinearSolver,
}

impl fmt::Debug for SpaceSolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpaceSolver")
            .field("forms", &self.forms)
            .field("n_dofs", &self.basis.n_dofs())
            .field("n_cells", &self.basis.mesh().n_cells())
            .field("generation", &self.basis.generation())
            .field("adaptive", &self.adaptive)
            .field("config", &self.config)
            .finish()
    }
}

impl SpaceSolver {
    /// Starts a space-solver builder.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use openferric_fem::fem::create_mesh;
    /// use openferric_fem::models::BlackScholes;
    /// use openferric_fem::payoff::EuropeanOptionBs;
    /// use openferric_fem::space::{SpaceDiscretization, SpaceSolver};
    ///
    /// let space = SpaceSolver::builder()
    ///     .mesh(create_mesh(&[2.0], 3).unwrap())
    ///     .dynamics(Arc::new(BlackScholes::new(0.03, 0.0, 0.2)))
    ///     .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert_eq!(space.n_dofs(), 17);
    /// ```
    #[inline]
    pub fn builder() -> SpaceSolverBuilder {
        SpaceSolverBuilder::default()
    }

    /// Current basis.
    #[inline]
    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    /// Current mesh.
    #[inline]
    pub fn mesh(&self) -> &Arc<SimplexMesh> {
        self.basis.mesh()
    }

    /// Weak-form ingredients.
    #[inline]
    pub fn forms(&self) -> &PdeForms {
        &self.forms
    }

    /// Assembled mass matrix.
    #[inline]
    pub fn mass(&self) -> &CsrMatrix {
        &self.mass
    }

    /// Assembled stiffness matrix.
    #[inline]
    pub fn stiffness(&self) -> &CsrMatrix {
        &self.stiffness
    }

    /// Call or put side.
    pub fn option_type(&self) -> OptionType {
        self.forms.option
    }

    /// Physical coordinates of the interpolation node of dof `i`.
    pub fn physical_location(&self, i: usize) -> Vec<f64> {
        let x = self.basis.dof_location(i);
        let mut out = vec![0.0; x.len()];
        self.forms.transform.untransform_state(x, &mut out);
        out
    }

    /// Dof whose node is closest to the physical point `x`.
    pub fn nearest_dof(&self, x: &[f64]) -> Result<usize> {
        let mut working = vec![0.0; x.len()];
        if x.len() == self.basis.dim() {
            self.forms.transform.transform_state(x, &mut working);
        }
        self.basis.nearest_dof(&working)
    }

    /// L2 projection of a pointwise function of physical coordinates.
    pub fn project<F>(&mut self, f: F) -> Result<Vec<f64>>
    where
        F: Fn(&[f64]) -> f64,
    {
        let transform = self.forms.transform;
        let dim = self.basis.dim();
        let physical = |x: &[f64]| {
            let mut phys = [0.0; 3];
            transform.untransform_state(x, &mut phys[..dim]);
            f(&phys[..dim])
        };
        let load = assemble_linear(&self.basis, &physical);
        self.projector.solve(&self.mass, &load, None)
    }

    /// Refines the mesh from the indicator of `u` and reassembles every operator.
    ///
    /// # Errors
    /// [`PdeError::NotConfigured`] when no [`AdaptiveMesh`] was supplied and
    /// [`PdeError::DimensionMismatch`] when `u` does not match the current basis.
    pub fn refine_mesh(&mut self, u: &[f64]) -> Result<Arc<SimplexMesh>> {
        let adaptive = self
            .adaptive
            .as_ref()
            .ok_or(PdeError::NotConfigured("adaptive mesh refinement"))?;
        let refined = adaptive.refine(&self.basis, u)?;
        self.rebuild(refined)
    }

    /// Removes the lowest-indicator half of the elements and reassembles.
    pub fn coarsen_mesh(&mut self, u: &[f64]) -> Result<Arc<SimplexMesh>> {
        let adaptive = self
            .adaptive
            .as_ref()
            .ok_or(PdeError::NotConfigured("adaptive mesh coarsening"))?;
        let coarse = adaptive.coarsen(&self.basis, u)?;
        self.rebuild(coarse)
    }

    /// Refines from the last row of a solution computed on the current mesh.
    pub fn refine_from(&mut self, solution: &Solution) -> Result<Arc<SimplexMesh>> {
        if solution.generation() != self.generation() {
            return Err(PdeError::StaleGeneration {
                expected: self.generation(),
                found: solution.generation(),
            });
        }
        self.refine_mesh(solution.final_values())
    }

    fn rebuild(&mut self, mesh: SimplexMesh) -> Result<Arc<SimplexMesh>> {
        let previous = self.generation();
        let (basis, mass, stiffness) = assemble_space(&self.forms, Arc::new(mesh), &self.config)?;
        self.basis = basis;
        self.mass = mass;
        self.stiffness = stiffness;
        self.projector = LinearSolver::new(self.config);
        debug!(
            from = %previous,
            to = %self.generation(),
            n_dofs = self.basis.n_dofs(),
            "replaced space"
        );
        Ok(self.basis.mesh().clone())
    }

    fn check_time(t: f64) -> Result<()> {
        if !t.is_finite() {
            return Err(PdeError::InvalidInput(format!("time must be finite, got {t}")));
        }
        Ok(())
    }
}

fn assemble_space(
    forms: &PdeForms,
    mesh: Arc<SimplexMesh>,
    config: &NumericConfig,
) -> Result<(Basis, CsrMatrix, CsrMatrix)> {
    if forms.dynamics.dim() != mesh.dim() {
        return Err(PdeError::DimensionMismatch {
            context: "dynamics vs mesh",
            expected: mesh.dim(),
            found: forms.dynamics.dim(),
        });
    }
    let basis = Basis::new(mesh, config.element)?;
    let mass = forms.mass(&basis)?;
    let stiffness = forms.stiffness(&basis)?;
    Ok((basis, mass, stiffness))
}

impl SpaceDiscretization for SpaceSolver {
    fn n_dofs(&self) -> usize {
        self.basis.n_dofs()
    }

    fn generation(&self) -> Generation {
        self.basis.generation()
    }

    fn config(&self) -> &NumericConfig {
        &self.config
    }

    fn initial_condition(&mut self) -> Result<Vec<f64>> {
        let payoff = self.forms.payoff.clone();
        let option = self.forms.option;
        self.project(|x| payoff.intrinsic(option, x[0]))
    }

    fn matrices(&self, theta: f64, dt: f64) -> Result<(CsrMatrix, CsrMatrix)> {
        if !(0.0..=1.0).contains(&theta) {
            return Err(PdeError::InvalidInput(format!(
                "theta must lie in [0, 1], got {theta}"
            )));
        }
        if !dt.is_finite() || dt <= 0.0 {
            return Err(PdeError::InvalidInput(format!("dt must be > 0, got {dt}")));
        }
        let a = self.mass.linear_combination(1.0, &self.stiffness, -theta * dt)?;
        let b = self.mass.linear_combination(1.0, &self.stiffness, (1.0 - theta) * dt)?;
        Ok((a, b))
    }

    fn boundary_term(&self, t: f64) -> Result<Vec<f64>> {
        Self::check_time(t)?;
        Ok(self.forms.boundary(&self.basis, t))
    }

    fn dirichlet(&mut self, t: f64) -> Result<Vec<f64>> {
        Self::check_time(t)?;
        let th = self.forms.transform.untransform_time(t);
        let payoff = self.forms.payoff.clone();
        let dynamics = self.forms.dynamics.clone();
        let option = self.forms.option;
        let config = self.config;
        self.project(|x| {
            let v = dynamics.mean_variance(th, x.get(1).copied().unwrap_or(0.0), &config);
            payoff.price(option, th, x[0], v)
        })
    }

    fn apply_dirichlet(
        &self,
        a: &CsrMatrix,
        b: &[f64],
        boundaries: &[String],
        values: &[f64],
    ) -> Result<(CsrMatrix, Vec<f64>)> {
        let dofs = self.basis.boundary_dofs(boundaries)?;
        a.enforce_rows(b, &dofs, values)
    }
}

/// Builder for [`SpaceSolver`].
#[derive(Default)]
pub struct SpaceSolverBuilder {
    mesh: Option<Arc<SimplexMesh>>,
    dynamics: Option<Arc<dyn DynamicsModel>>,
    payoff: Option<Arc<dyn Payoff>>,
    option: OptionType,
    transform: CoordinateTransform,
    adaptive: Option<AdaptiveMesh>,
    config: NumericConfig,
}

impl SpaceSolverBuilder {
    /// Sets the mesh in solver coordinates.
    #[inline]
    pub fn mesh(mut self, mesh: impl Into<Arc<SimplexMesh>>) -> Self {
        self.mesh = Some(mesh.into());
        self
    }

    /// Sets the Markov dynamics.
    #[inline]
    pub fn dynamics(mut self, dynamics: Arc<dyn DynamicsModel>) -> Self {
        self.dynamics = Some(dynamics);
        self
    }

    /// Sets the payoff and reference price.
    #[inline]
    pub fn payoff(mut self, payoff: Arc<dyn Payoff>) -> Self {
        self.payoff = Some(payoff);
        self
    }

    /// Selects the call or put payoff (default call).
    #[inline]
    pub fn option_type(mut self, option: OptionType) -> Self {
        self.option = option;
        self
    }

    /// Sets the coordinate transform (identity by default).
    #[inline]
    pub fn transform(mut self, transform: CoordinateTransform) -> Self {
        self.transform = transform;
        self
    }

    /// Enables [`SpaceSolver::refine_mesh`].
    #[inline]
    pub fn adaptive(mut self, adaptive: AdaptiveMesh) -> Self {
        self.adaptive = Some(adaptive);
        self
    }

    /// Overrides the numerical configuration.
    #[inline]
    pub fn config(mut self, config: NumericConfig) -> Self {
        self.config = config;
        self
    }

    /// Validates inputs and assembles mass and stiffness.
    ///
    /// # Errors
    /// [`PdeError::NotConfigured`] when mesh, dynamics or payoff is missing,
    /// [`PdeError::DimensionMismatch`] when the dynamics and mesh dimensions differ.
    pub fn build(self) -> Result<SpaceSolver> {
        let mesh = self.mesh.ok_or(PdeError::NotConfigured("space solver mesh"))?;
        let dynamics = self
            .dynamics
            .ok_or(PdeError::NotConfigured("space solver dynamics"))?;
        let payoff = self.payoff.ok_or(PdeError::NotConfigured("space solver payoff"))?;
        self.config.validate()?;
        dynamics.validate()?;

        let forms = PdeForms::new(dynamics, payoff, self.option, self.transform);
        let (basis, mass, stiffness) = assemble_space(&forms, mesh, &self.config)?;
        Ok(SpaceSolver {
            forms,
            basis,
            mass,
            stiffness,
            adaptive: self.adaptive,
            config: self.config,
            projector: LinearSolver::new(self.config),
        })
    }
}
