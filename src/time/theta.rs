//! Generalized θ-scheme.
//!
//! `θ = 1` is implicit Euler, `θ = 0` explicit Euler and `θ = ½`
//! Crank–Nicolson. Crank–Nicolson is second order but may ring near payoff
//! kinks; the scheme is never switched automatically.

use tracing::trace;

use crate::core::{ExerciseStyle, Generation, PdeError, Result};
use crate::linalg::{CsrMatrix, LinearSolver};
use crate::space::{BoundaryCondition, SpaceDiscretization};

use super::Solution;

/// Generalized θ time stepper.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThetaScheme {
    pub theta: f64,
}

impl Default for ThetaScheme {
    fn default() -> Self {
        Self::crank_nicolson()
    }
}

impl ThetaScheme {
    /// Scheme with weight `theta` in `[0, 1]`.
    pub fn new(theta: f64) -> Self {
        Self { theta }
    }

    /// `θ = ½`.
    pub fn crank_nicolson() -> Self {
        Self::new(0.5)
    }

    /// `θ = 1`.
    pub fn implicit_euler() -> Self {
        Self::new(1.0)
    }

    /// `θ = 0`.
    pub fn explicit_euler() -> Self {
        Self::new(0.0)
    }

    /// Marches over all of `times` and returns every row.
    pub fn solve<S>(
        &self,
        times: &[f64],
        space: &mut S,
        boundary: Option<&dyn BoundaryCondition>,
        exercise: ExerciseStyle,
    ) -> Result<Solution>
    where
        S: SpaceDiscretization,
    {
        let mut march = self.start(times, space, boundary, exercise)?;
        march.run()?;
        Ok(march.finish())
    }

    /// Projects the initial condition and returns a steppable march.
    pub fn start<'a, S>(
        &self,
        times: &[f64],
        space: &'a mut S,
        boundary: Option<&'a dyn BoundaryCondition>,
        exercise: ExerciseStyle,
    ) -> Result<ThetaMarch<'a, S>>
    where
        S: SpaceDiscretization,
    {
        if !(0.0..=1.0).contains(&self.theta) {
            return Err(PdeError::InvalidInput(format!(
                "theta must lie in [0, 1], got {}",
                self.theta
            )));
        }
        if times.len() < 2 {
            return Err(PdeError::InvalidInput(
                "time grid needs at least two nodes".to_string(),
            ));
        }
        if times.iter().any(|t| !t.is_finite()) || times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PdeError::InvalidInput(
                "time grid must be finite and strictly increasing".to_string(),
            ));
        }

        let v0 = space.initial_condition()?;
        let generation = space.generation();
        let solver = LinearSolver::new(*space.config());
        Ok(ThetaMarch {
            theta: self.theta,
            space,
            boundary,
            exercise,
            times: times.to_vec(),
            values: vec![v0],
            generation,
            system: None,
            solver,
        })
    }
}

/// Progress of a [`ThetaMarch`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarchState {
    /// Initial condition known, no step taken.
    Initialized,
    /// `completed` steps taken, more remain.
    Stepping { completed: usize },
    /// Every time node consumed.
    Done,
}

/// Step-by-step θ-scheme over a fixed time grid.
///
/// Callers may stop between steps; the rows computed so far stay valid.
pub struct ThetaMarch<'a, S: SpaceDiscretization> {
    theta: f64,
    space: &'a mut S,
    boundary: Option<&'a dyn BoundaryCondition>,
    exercise: ExerciseStyle,
    times: Vec<f64>,
    values: Vec<Vec<f64>>,
    generation: Generation,
    system: Option<(f64, CsrMatrix, CsrMatrix)>,
    solver: LinearSolver,
}

impl<S: SpaceDiscretization> ThetaMarch<'_, S> {
    /// Current progress.
    pub fn state(&self) -> MarchState {
        let completed = self.values.len() - 1;
        if completed + 1 == self.times.len() {
            MarchState::Done
        } else if completed == 0 {
            MarchState::Initialized
        } else {
            MarchState::Stepping { completed }
        }
    }

    /// Rows computed so far.
    pub fn values(&self) -> &[Vec<f64>] {
        &self.values
    }

    /// Advances one time step. A finished march is left unchanged.
    pub fn step(&mut self) -> Result<MarchState> {
        if self.state() == MarchState::Done {
            return Ok(MarchState::Done);
        }
        if self.space.generation() != self.generation {
            return Err(PdeError::StaleGeneration {
                expected: self.generation,
                found: self.space.generation(),
            });
        }

        let i = self.values.len() - 1;
        let t = self.times[i];
        let dt = self.times[i + 1] - t;
        let rebuild = !matches!(&self.system, Some((cached, _, _)) if *cached == dt);
        if rebuild {
            let (a, b) = self.space.matrices(self.theta, dt)?;
            self.system = Some((dt, a, b));
        }
        let Some((_, a, b_mat)) = &self.system else {
            return Err(PdeError::NotConfigured("theta-scheme system matrices"));
        };
        trace!(step = i + 1, t, dt, rebuild, "theta step");

        let v_prev = &self.values[i];
        let mut rhs = b_mat.mul_vec(v_prev)?;
        let next_bt = self.space.boundary_term(t + dt)?;
        let this_bt = self.space.boundary_term(t)?;
        for ((r, n), c) in rhs.iter_mut().zip(&next_bt).zip(&this_bt) {
            *r += dt * (self.theta * n + (1.0 - self.theta) * c);
        }

        let mut next = match self.boundary {
            Some(bc) => {
                let (a_bc, rhs_bc) = bc.apply(&mut *self.space, a.clone(), rhs, t)?;
                self.solver.solve(&a_bc, &rhs_bc, Some(v_prev))
            }
            None => self.solver.solve(a, &rhs, Some(v_prev)),
        }
        .map_err(|e| e.at_step(i + 1))?;

        if self.exercise.is_american() {
            for (v, floor) in next.iter_mut().zip(&self.values[0]) {
                *v = v.max(*floor);
            }
        }
        self.values.push(next);
        Ok(self.state())
    }

    /// Steps until every time node is consumed.
    pub fn run(&mut self) -> Result<()> {
        while self.step()? != MarchState::Done {}
        Ok(())
    }

    /// Rows computed so far, tagged with the space generation.
    pub fn finish(self) -> Solution {
        let n = self.values.len();
        let mut times = self.times;
        times.truncate(n);
        Solution::new(self.generation, times, self.values)
    }
}
