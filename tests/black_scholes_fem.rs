use std::sync::Arc;

use openferric_fem::core::{ExerciseStyle, OptionType};
use openferric_fem::fem::create_mesh;
use openferric_fem::models::BlackScholes;
use openferric_fem::payoff::{EuropeanOptionBs, Payoff};
use openferric_fem::problems::OptionPricingProblem;
use openferric_fem::space::{SpaceDiscretization, SpaceSolver};
use openferric_fem::time::{Solution, ThetaScheme};

fn rel_err(x: f64, y: f64) -> f64 {
    let denom = y.abs().max(1.0e-8);
    (x - y).abs() / denom
}

fn uniform_grid(maturity: f64, steps: usize) -> Vec<f64> {
    (0..=steps).map(|i| maturity * i as f64 / steps as f64).collect()
}

fn bs_space(option: OptionType) -> SpaceSolver {
    SpaceSolver::builder()
        .mesh(create_mesh(&[2.0], 3).expect("valid mesh"))
        .dynamics(Arc::new(BlackScholes::new(0.03, 0.0, 0.2)))
        .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
        .option_type(option)
        .build()
        .expect("valid space")
}

fn price_at(space: &SpaceSolver, solution: &Solution, s: f64) -> f64 {
    let dof = space.nearest_dof(&[s]).expect("dof");
    solution.final_values()[dof]
}

#[test]
fn crank_nicolson_call_matches_black_scholes_within_one_percent() {
    let mut space = bs_space(OptionType::Call);
    let solution = ThetaScheme::crank_nicolson()
        .solve(&uniform_grid(1.0, 4), &mut space, None, ExerciseStyle::European)
        .expect("solve");

    assert_eq!(solution.len(), 5);
    assert_eq!(solution.final_values().len(), space.n_dofs());
    let px = price_at(&space, &solution, 1.0);
    assert!(rel_err(px, 0.094_134) <= 0.01, "fem price {px}");
}

#[test]
fn dirichlet_put_matches_closed_form() {
    let preset = OptionPricingProblem {
        option: OptionType::Put,
        ..OptionPricingProblem::default()
    };
    let problem = preset.problem();
    let mut space = problem
        .space(create_mesh(&[2.0], 4).expect("valid mesh"))
        .build()
        .expect("valid space");
    let solution = ThetaScheme::crank_nicolson()
        .solve(
            &uniform_grid(0.5, 10),
            &mut space,
            Some(&problem.boundary_condition),
            ExerciseStyle::European,
        )
        .expect("solve");

    let reference = preset.payoff().put(0.5, 1.0, 0.04);
    let px = price_at(&space, &solution, 1.0);
    assert!(rel_err(px, reference) <= 0.02, "fem {px} vs {reference}");

    // Dirichlet data is taken at the start of each step, so the last row holds
    // the discounted strike at th = 0.45.
    let left = space.nearest_dof(&[0.0]).expect("dof");
    let expected_left = (-0.03_f64 * 0.45).exp();
    assert!((solution.final_values()[left] - expected_left).abs() < 1e-3);
}

#[test]
fn american_put_dominates_payoff_and_european() {
    let times = uniform_grid(1.0, 10);
    let mut eu_space = bs_space(OptionType::Put);
    let european = ThetaScheme::implicit_euler()
        .solve(&times, &mut eu_space, None, ExerciseStyle::European)
        .expect("european solve");
    let mut am_space = bs_space(OptionType::Put);
    let american = ThetaScheme::implicit_euler()
        .solve(&times, &mut am_space, None, ExerciseStyle::American)
        .expect("american solve");

    let floor = american.row(0).expect("initial row").to_vec();
    for step in 1..american.len() {
        let am = american.row(step).expect("row");
        let eu = european.row(step).expect("row");
        for (j, (&a, &f)) in am.iter().zip(&floor).enumerate() {
            assert!(a >= f, "step {step} dof {j}: {a} below payoff {f}");
            // The P2 mass matrix is not monotone, so the projected floor can
            // pull a neighbouring European value very slightly above.
            assert!(a >= eu[j] - 1e-6, "step {step} dof {j}: {a} < {}", eu[j]);
        }
    }

    let s = 0.5;
    let am = price_at(&am_space, &american, s);
    let eu = price_at(&eu_space, &european, s);
    assert!(am > eu, "deep in-the-money premium missing: {am} vs {eu}");
}

#[test]
fn implicit_euler_converges_to_same_price_as_crank_nicolson() {
    let mut space = bs_space(OptionType::Call);
    let cn = ThetaScheme::crank_nicolson()
        .solve(&uniform_grid(1.0, 20), &mut space, None, ExerciseStyle::European)
        .expect("cn");
    let ie = ThetaScheme::implicit_euler()
        .solve(&uniform_grid(1.0, 200), &mut space, None, ExerciseStyle::European)
        .expect("ie");
    let a = price_at(&space, &cn, 1.0);
    let b = price_at(&space, &ie, 1.0);
    assert!(rel_err(b, a) <= 0.01, "cn {a} vs ie {b}");
}

#[test]
fn american_call_never_falls_below_european_call() {
    let times = uniform_grid(1.0, 4);
    let mut eu_space = bs_space(OptionType::Call);
    let european = ThetaScheme::crank_nicolson()
        .solve(&times, &mut eu_space, None, ExerciseStyle::European)
        .expect("european solve");
    let mut am_space = bs_space(OptionType::Call);
    let american = ThetaScheme::crank_nicolson()
        .solve(&times, &mut am_space, None, ExerciseStyle::American)
        .expect("american solve");

    for (am, eu) in american.rows().iter().zip(european.rows()) {
        for (a, e) in am.iter().zip(eu) {
            assert!(*a >= *e - 1e-12, "{a} < {e}");
        }
    }
}
