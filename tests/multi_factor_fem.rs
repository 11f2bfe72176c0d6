use std::sync::Arc;

use openferric_fem::core::{ElementKind, ExerciseStyle, NumericConfig, OptionType, PdeError};
use openferric_fem::fem::create_mesh;
use openferric_fem::models::{Heston, Heston3d};
use openferric_fem::payoff::EuropeanOptionBs;
use openferric_fem::space::{DirichletBc, SpaceDiscretization, SpaceSolver};
use openferric_fem::time::ThetaScheme;

fn heston() -> Heston {
    Heston {
        rate: 0.03,
        dividend_yield: 0.0,
        kappa: 1.5,
        theta: 0.04,
        sigma: 0.3,
        rho: -0.7,
    }
}

#[test]
fn heston_2d_march_produces_finite_rows() {
    let mut space = SpaceSolver::builder()
        .mesh(create_mesh(&[2.0, 0.5], 2).expect("mesh"))
        .dynamics(Arc::new(heston()))
        .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
        .option_type(OptionType::Put)
        .build()
        .expect("space");
    let bc = DirichletBc::default();
    let times = [0.0, 0.1, 0.2, 0.3];
    let solution = ThetaScheme::crank_nicolson()
        .solve(&times, &mut space, Some(&bc), ExerciseStyle::European)
        .expect("solve");

    assert_eq!(solution.len(), times.len());
    for row in solution.rows() {
        assert_eq!(row.len(), space.n_dofs());
        assert!(row.iter().all(|v| v.is_finite()));
    }
    let atm = space.nearest_dof(&[1.0, 0.04]).expect("dof");
    let px = solution.final_values()[atm];
    assert!(px > 0.0 && px < 0.2, "heston put {px}");
}

#[test]
fn heston_2d_with_dirichlet_edges() {
    let mut space = SpaceSolver::builder()
        .mesh(create_mesh(&[2.0, 0.5], 2).expect("mesh"))
        .dynamics(Arc::new(heston()))
        .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
        .build()
        .expect("space");
    let bc = DirichletBc::new(["s_min", "s_max"]);
    let solution = ThetaScheme::implicit_euler()
        .solve(&[0.0, 0.25, 0.5], &mut space, Some(&bc), ExerciseStyle::European)
        .expect("solve");
    assert!(solution.final_values().iter().all(|v| v.is_finite()));

    let unknown = DirichletBc::new(["nowhere"]);
    let err = ThetaScheme::implicit_euler()
        .solve(&[0.0, 0.25], &mut space, Some(&unknown), ExerciseStyle::European)
        .unwrap_err();
    assert_eq!(err, PdeError::UnknownBoundary("nowhere".to_string()));
}

#[test]
fn heston_3d_march_on_coarse_cube() {
    let dynamics = Heston3d {
        rate: 0.03,
        dividend_yield: 0.0,
        kappa: 1.5,
        theta: 0.04,
        sigma_v: 0.3,
        rho: -0.5,
        kappa_r: 0.5,
        theta_r: 0.03,
        sigma_r: 0.01,
    };
    let mut space = SpaceSolver::builder()
        .mesh(create_mesh(&[2.0, 0.5, 0.1], 1).expect("mesh"))
        .dynamics(Arc::new(dynamics))
        .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
        .config(NumericConfig::default().with_element(ElementKind::P1))
        .build()
        .expect("space");
    assert_eq!(space.n_dofs(), 27);

    let solution = ThetaScheme::implicit_euler()
        .solve(&[0.0, 0.1, 0.2], &mut space, Some(&DirichletBc::default()), ExerciseStyle::European)
        .expect("solve");
    assert_eq!(solution.len(), 3);
    assert!(solution.rows().iter().flatten().all(|v| v.is_finite()));
}

#[test]
fn dynamics_dimension_must_match_mesh() {
    let err = SpaceSolver::builder()
        .mesh(create_mesh(&[2.0, 0.5, 0.1], 1).expect("mesh"))
        .dynamics(Arc::new(heston()))
        .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
        .build()
        .unwrap_err();
    assert!(matches!(
        err,
        PdeError::DimensionMismatch {
            expected: 3,
            found: 2,
            ..
        }
    ));
}
