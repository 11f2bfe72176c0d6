use std::sync::Arc;

use openferric_fem::core::{ElementKind, ExerciseStyle, NumericConfig, OptionType, PdeError};
use openferric_fem::fem::{box_boundaries, create_mesh, create_tensor_mesh};
use openferric_fem::models::{BlackScholes, Heston};
use openferric_fem::payoff::{EuropeanOptionBs, Payoff};
use openferric_fem::space::{AdaptiveMesh, Criterion, MarkingRule, SpaceDiscretization, SpaceSolver};
use openferric_fem::time::ThetaScheme;

fn heston_space(adaptive: Option<AdaptiveMesh>) -> SpaceSolver {
    let mut builder = SpaceSolver::builder()
        .mesh(create_tensor_mesh(&[0.0, 1.0, 2.0], &[0.0, 0.25, 0.5]).expect("mesh"))
        .dynamics(Arc::new(Heston {
            rate: 0.03,
            dividend_yield: 0.0,
            kappa: 1.0,
            theta: 0.04,
            sigma: 0.2,
            rho: -0.5,
        }))
        .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
        .option_type(OptionType::Put)
        .config(NumericConfig::default().with_element(ElementKind::P1));
    if let Some(a) = adaptive {
        builder = builder.adaptive(a);
    }
    builder.build().expect("space")
}

#[test]
fn refine_then_coarsen_changes_cell_count_and_generation() {
    let mut space = heston_space(Some(AdaptiveMesh::new(Criterion::Gradient)));
    let cells = space.mesh().n_cells();
    let generation = space.generation();

    let payoff = EuropeanOptionBs::new(1.0, 0.03, 0.0);
    let u = space.project(|x| payoff.put_payoff(x[0])).expect("projection");
    let refined = space.refine_mesh(&u).expect("refine");
    assert!(refined.n_cells() > cells);
    assert_ne!(space.generation(), generation);
    assert_eq!(space.basis().n_dofs(), refined.n_points());

    let u = space.project(|x| payoff.put_payoff(x[0])).expect("projection");
    let before = space.mesh().n_cells();
    let coarse = space.coarsen_mesh(&u).expect("coarsen");
    assert_eq!(coarse.n_cells(), before - before / 2);
}

#[test]
fn refinement_concentrates_at_the_strike() {
    let mut space = SpaceSolver::builder()
        .mesh(create_mesh(&[2.0], 3).expect("mesh"))
        .dynamics(Arc::new(BlackScholes::new(0.03, 0.0, 0.2)))
        .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
        .config(NumericConfig::default().with_element(ElementKind::P1))
        .adaptive(
            AdaptiveMesh::new(Criterion::Residual)
                .marking(MarkingRule::Quantile)
                .theta(0.2)
                .boundaries(box_boundaries(&[0.0], &[2.0])),
        )
        .build()
        .expect("space");
    let times = [0.0, 0.01];
    let solution = ThetaScheme::implicit_euler()
        .solve(&times, &mut space, None, ExerciseStyle::European)
        .expect("solve");
    let mesh = space.refine_from(&solution).expect("refine");

    assert!(mesh.n_cells() > 8);
    let smallest = (0..mesh.n_cells())
        .min_by(|&a, &b| mesh.cell_volume(a).total_cmp(&mesh.cell_volume(b)))
        .expect("cells");
    let centre: f64 = mesh.cell(smallest).iter().map(|&v| mesh.point(v)[0]).sum::<f64>() / 2.0;
    assert!((centre - 1.0).abs() < 0.25, "finest cell centred at {centre}");
    assert_eq!(mesh.boundary_facets("left").expect("left").len(), 1);
}

#[test]
fn refine_without_adaptive_is_not_configured() {
    let mut space = heston_space(None);
    let u = vec![0.0; space.n_dofs()];
    let err = space.refine_mesh(&u).unwrap_err();
    assert!(matches!(err, PdeError::NotConfigured(_)));
}

#[test]
fn stale_solution_is_rejected_after_refinement() {
    let mut space = heston_space(Some(AdaptiveMesh::default()));
    let solution = ThetaScheme::implicit_euler()
        .solve(&[0.0, 0.1], &mut space, None, ExerciseStyle::European)
        .expect("solve");
    assert_eq!(solution.generation(), space.generation());

    space.refine_from(&solution).expect("first refinement");
    let err = space.refine_from(&solution).unwrap_err();
    assert!(matches!(err, PdeError::StaleGeneration { .. }));
}

#[test]
fn coarsening_one_cell_is_invalid() {
    let mut space = SpaceSolver::builder()
        .mesh(create_mesh(&[2.0], 0).expect("mesh"))
        .dynamics(Arc::new(BlackScholes::new(0.03, 0.0, 0.2)))
        .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
        .adaptive(AdaptiveMesh::default())
        .build()
        .expect("space");
    let u = vec![1.0; space.n_dofs()];
    assert!(matches!(space.coarsen_mesh(&u), Err(PdeError::InvalidInput(_))));
}
