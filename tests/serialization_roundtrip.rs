use openferric_fem::core::{ElementKind, NumericConfig, OptionType, SolverKind};
use openferric_fem::models::{BlackScholes, Heston3d};
use openferric_fem::problems::{CreditRiskProblem, OptionPricingProblem};
use openferric_fem::space::{Criterion, MarkingRule};
use openferric_fem::transform::{AxisMapping, CoordinateTransform};

fn roundtrip<T>(value: &T) -> T
where
    T: serde::Serialize + serde::de::DeserializeOwned,
{
    let json = serde_json::to_string(value).expect("serialize");
    serde_json::from_str(&json).expect("deserialize")
}

#[test]
fn numeric_config_roundtrip() {
    let config = NumericConfig::default()
        .with_element(ElementKind::P1)
        .with_solver(SolverKind::BiCgStab)
        .with_eps(1e-8);
    assert_eq!(roundtrip(&config), config);
}

#[test]
fn presets_roundtrip() {
    let option = OptionPricingProblem {
        option: OptionType::Put,
        sigma: 0.35,
        ..OptionPricingProblem::default()
    };
    assert_eq!(roundtrip(&option), option);

    let credit = CreditRiskProblem::default();
    assert_eq!(roundtrip(&credit), credit);
}

#[test]
fn dynamics_and_controls_roundtrip() {
    let bs = BlackScholes::new(0.01, 0.02, 0.3).with_natural_boundary(true);
    assert_eq!(roundtrip(&bs), bs);

    let h3 = Heston3d {
        rate: 0.02,
        dividend_yield: 0.0,
        kappa: 2.0,
        theta: 0.05,
        sigma_v: 0.4,
        rho: -0.6,
        kappa_r: 0.3,
        theta_r: 0.02,
        sigma_r: 0.01,
    };
    assert_eq!(roundtrip(&h3), h3);

    assert_eq!(roundtrip(&MarkingRule::Bulk), MarkingRule::Bulk);
    assert_eq!(roundtrip(&Criterion::Gradient), Criterion::Gradient);
}

#[test]
fn transform_roundtrip() {
    let transform = CoordinateTransform::new(
        AxisMapping::LogPrice,
        AxisMapping::SqrtVol,
        AxisMapping::TimeToMaturity { maturity: 1.5 },
    );
    assert_eq!(roundtrip(&transform), transform);
}
