use std::sync::Arc;

use openferric_fem::fem::create_mesh;
use openferric_fem::linalg::CsrMatrix;
use openferric_fem::models::BlackScholes;
use openferric_fem::payoff::EuropeanOptionBs;
use openferric_fem::space::{SpaceDiscretization, SpaceSolver};
use proptest::prelude::*;

fn dense_system() -> impl Strategy<Value = (usize, Vec<f64>, Vec<f64>, Vec<usize>)> {
    (2usize..9).prop_flat_map(|n| {
        (
            Just(n),
            prop::collection::vec(-5.0f64..5.0, n * n),
            prop::collection::vec(-5.0f64..5.0, n),
            prop::collection::vec(0..n, 0..n),
        )
    })
}

proptest! {
    #[test]
    fn eliminated_rows_are_unit_and_others_untouched(
        (n, dense, rhs, dofs) in dense_system(),
        fill in -3.0f64..3.0,
    ) {
        let a = CsrMatrix::from_dense(n, n, &dense).unwrap();
        let values: Vec<f64> = (0..n).map(|i| fill + i as f64).collect();
        let (a_bc, b_bc) = a.enforce_rows(&rhs, &dofs, &values).unwrap();

        for i in 0..n {
            if dofs.contains(&i) {
                for j in 0..n {
                    let expected = if i == j { 1.0 } else { 0.0 };
                    prop_assert_eq!(a_bc.get(i, j), expected);
                }
                prop_assert_eq!(b_bc[i].to_bits(), values[i].to_bits());
            } else {
                prop_assert_eq!(a_bc.row(i), a.row(i));
                prop_assert_eq!(b_bc[i].to_bits(), rhs[i].to_bits());
            }
        }
    }
}

#[test]
fn space_eliminates_named_boundary_dofs() {
    let space = SpaceSolver::builder()
        .mesh(create_mesh(&[2.0], 2).unwrap())
        .dynamics(Arc::new(BlackScholes::new(0.03, 0.0, 0.2)))
        .payoff(Arc::new(EuropeanOptionBs::new(1.0, 0.03, 0.0)))
        .build()
        .unwrap();
    let (a, _) = space.matrices(0.5, 0.1).unwrap();
    let n = space.n_dofs();
    let rhs: Vec<f64> = (0..n).map(|i| i as f64 * 0.1).collect();
    let values = vec![7.0; n];
    let right = space.nearest_dof(&[2.0]).unwrap();

    let (a_bc, b_bc) = space
        .apply_dirichlet(&a, &rhs, &["right".to_string()], &values)
        .unwrap();
    assert_eq!(a_bc.row(right), (&[right][..], &[1.0][..]));
    assert_eq!(b_bc[right], 7.0);
    for i in (0..n).filter(|&i| i != right) {
        assert_eq!(a_bc.row(i), a.row(i));
        assert_eq!(b_bc[i], rhs[i]);
    }
}
