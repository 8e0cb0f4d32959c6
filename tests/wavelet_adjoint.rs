use approx::assert_relative_eq;
use mri_ops::{
    CoefficientSet, ConfigError, Error, LinearOperator, PaddingMode, ShapeError, WaveletConfig,
    WaveletN,
};
use ndarray::{ArrayD, IxDyn};
use num_complex::Complex64;
use proptest::prelude::*;
use rand::{rngs::StdRng, Rng, SeedableRng};

const N: usize = 64;
const TRIALS: u64 = 10;
const RTOL: f64 = 1e-6;

struct Case {
    family: &'static str,
    dim: usize,
    padding: PaddingMode,
    scales: usize,
}

const HAAR: &str = "HaarWaveletTransform";
const STARLET: &str = "BsplineWaveletTransformATrousAlgorithm";

const fn case(family: &'static str, dim: usize, padding: PaddingMode, scales: usize) -> Case {
    Case {
        family,
        dim,
        padding,
        scales,
    }
}

const CASES: &[Case] = &[
    case(HAAR, 2, PaddingMode::Zero, 4),
    case("sym8", 2, PaddingMode::Zero, 4),
    case("sym8", 3, PaddingMode::Periodization, 4),
    case(HAAR, 3, PaddingMode::Zero, 4),
    case(HAAR, 2, PaddingMode::Periodization, 4),
    case("db4", 2, PaddingMode::Symmetric, 3),
    case("coif1", 2, PaddingMode::Reflect, 3),
    case("db2", 3, PaddingMode::Constant, 2),
    case("bior2.2", 2, PaddingMode::Periodic, 3),
    case(STARLET, 2, PaddingMode::Periodic, 4),
];

fn random_image(rng: &mut StdRng, shape: &[usize]) -> ArrayD<Complex64> {
    ArrayD::from_shape_fn(IxDyn(shape), |_| {
        Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0))
    })
}

fn random_coeffs(rng: &mut StdRng, template: &CoefficientSet<f64>) -> CoefficientSet<f64> {
    let (flat, layout) = template.flatten();
    let values: Vec<Complex64> = flat
        .iter()
        .map(|_| Complex64::new(rng.gen_range(-1.0..1.0), rng.gen_range(-1.0..1.0)))
        .collect();
    CoefficientSet::unflatten(&values, layout).unwrap()
}

fn image_vdot(a: &ArrayD<Complex64>, b: &ArrayD<Complex64>) -> Complex64 {
    a.iter().zip(b.iter()).map(|(x, y)| x.conj() * y).sum()
}

/// `<W x, y>` against `<x, W^H y>` for one operator; returns a description of
/// the first failing trial, if any.
fn check_adjoint<W>(op: &W, case: usize, shape: &[usize]) -> Option<String>
where
    W: LinearOperator<f64, Domain = ArrayD<Complex64>, Range = CoefficientSet<f64>>,
{
    for trial in 0..TRIALS {
        let mut rng = StdRng::seed_from_u64(1000 * case as u64 + trial);
        let x = random_image(&mut rng, shape);
        let wx = op.op(&x).unwrap();
        let y = random_coeffs(&mut rng, &wx);
        let lhs = wx.vdot(&y).unwrap();
        let rhs = image_vdot(&x, &op.adj_op(&y).unwrap());
        let scale = lhs.norm().max(rhs.norm()).max(1.0);
        if (lhs - rhs).norm() > RTOL * scale {
            return Some(format!("trial {trial}: <Wx, y> = {lhs}, <x, W^H y> = {rhs}"));
        }
    }
    None
}

#[test]
fn adjoint_identity_for_catalog() {
    let mut failures = Vec::new();
    for (idx, case) in CASES.iter().enumerate() {
        let config = WaveletConfig::new(case.family, case.scales)
            .with_dim(case.dim)
            .with_padding(case.padding);
        let op = WaveletN::<f64>::new(config).unwrap();
        let shape = vec![N; case.dim];
        if let Some(msg) = check_adjoint(&op, idx, &shape) {
            failures.push(format!("{} dim={} {}: {msg}", case.family, case.dim, case.padding));
        }
    }
    assert!(failures.is_empty(), "adjoint failures:\n{}", failures.join("\n"));
}

#[test]
fn orthogonal_periodized_transform_is_invertible() {
    let mut rng = StdRng::seed_from_u64(7);
    let op = WaveletN::<f64>::from_params("sym8", 3, 2, "periodization").unwrap();
    let x = random_image(&mut rng, &[N, N]);
    let c = op.op(&x).unwrap();
    assert_eq!(c.len(), N * N);
    let back = op.adj_op(&c).unwrap();
    for (p, q) in x.iter().zip(back.iter()) {
        assert_relative_eq!(p.re, q.re, epsilon = 1e-10);
        assert_relative_eq!(p.im, q.im, epsilon = 1e-10);
    }
}

#[test]
fn unknown_family_is_a_config_error() {
    let err = WaveletN::<f64>::from_params("not_a_wavelet", 3, 2, "zero").err().unwrap();
    assert!(matches!(err, Error::Config(ConfigError::UnknownFamily { .. })));
    assert!(err.to_string().contains("HaarWaveletTransform"));
}

#[test]
fn foreign_coefficients_are_a_shape_error() {
    let mut rng = StdRng::seed_from_u64(11);
    let x = random_image(&mut rng, &[N, N]);
    let sym8 = WaveletN::<f64>::from_params("sym8", 3, 2, "zero").unwrap();
    let db4 = WaveletN::<f64>::from_params("db4", 3, 2, "zero").unwrap();
    let c = sym8.op(&x).unwrap();
    assert!(matches!(db4.adj_op(&c), Err(Error::Shape(ShapeError::LayoutMismatch { .. }))));
    let small = WaveletN::<f64>::from_params("sym8", 3, 2, "zero").unwrap();
    let c_small = small.op(&random_image(&mut rng, &[N, N / 2])).unwrap();
    assert!(matches!(
        sym8.op(&random_image(&mut rng, &[N])),
        Err(Error::Shape(ShapeError::Rank { .. }))
    ));
    assert_eq!(sym8.adj_op(&c_small).unwrap().shape(), &[N, N / 2]);
}

#[test]
fn short_extent_needs_periodization() {
    // 16 -> 15 at scale 2, below the 16-tap filter
    let x = ArrayD::<Complex64>::zeros(IxDyn(&[16, 16]));
    let zero = WaveletN::<f64>::from_params("sym8", 3, 2, "symmetric").unwrap();
    assert!(matches!(zero.op(&x), Err(Error::Shape(ShapeError::TooShort { .. }))));
    let periodized = WaveletN::<f64>::from_params("sym8", 3, 2, "periodization").unwrap();
    assert!(periodized.op(&x).is_ok());
}

#[test]
fn haar_engine_needs_periodization_for_odd_extents() {
    let mut rng = StdRng::seed_from_u64(13);
    // 48 -> 24 -> 12 -> 6 -> 3, odd entering scale 5
    let x = random_image(&mut rng, &[48, 48]);
    let strict = WaveletN::<f64>::from_params(HAAR, 5, 2, "zero").unwrap();
    assert!(matches!(
        strict.op(&x),
        Err(Error::Shape(ShapeError::NotDyadic { scale: 5, len: 3, .. }))
    ));
    let periodized = WaveletN::<f64>::from_params(HAAR, 5, 2, "periodization").unwrap();
    let general = WaveletN::<f64>::from_params("haar", 5, 2, "periodization").unwrap();
    let fast = periodized.op(&x).unwrap();
    let reference = general.describe(&[48, 48]).unwrap();
    assert_eq!(fast.layout().bands()[0].shape, reference.bands()[0].shape);
    assert!(check_adjoint(&periodized, 100, &[48, 48]).is_none());
}

#[test]
fn fixed_engines_reject_unsupported_padding() {
    for mode in ["symmetric", "reflect", "periodic", "constant"] {
        assert!(
            matches!(
                WaveletN::<f64>::from_params(HAAR, 2, 2, mode),
                Err(Error::Config(ConfigError::UnsupportedPadding { .. }))
            ),
            "{HAAR} accepted {mode}"
        );
    }
    for mode in ["zero", "symmetric", "reflect", "constant"] {
        assert!(
            matches!(
                WaveletN::<f64>::from_params(STARLET, 2, 2, mode),
                Err(Error::Config(ConfigError::UnsupportedPadding { .. }))
            ),
            "{STARLET} accepted {mode}"
        );
    }
}

#[test]
fn starlet_rejects_scales_wider_than_the_image() {
    let x = ArrayD::<Complex64>::zeros(IxDyn(&[8, 8]));
    let deep = WaveletN::<f64>::from_params(STARLET, 70, 2, "periodic").unwrap();
    assert!(matches!(
        deep.op(&x),
        Err(Error::Shape(ShapeError::SupportTooWide { .. }))
    ));
    let shallow = WaveletN::<f64>::from_params(STARLET, 1, 2, "periodic").unwrap();
    assert!(shallow.op(&x).is_ok());
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn adjoint_holds_on_random_shapes(
        rows in 8usize..40,
        cols in 8usize..40,
        scales in 1usize..4,
        mode_idx in 0usize..PaddingMode::ALL.len(),
        seed in any::<u64>(),
    ) {
        let config = WaveletConfig::new("db2", scales).with_padding(PaddingMode::ALL[mode_idx]);
        let op = WaveletN::<f64>::new(config).unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let x = random_image(&mut rng, &[rows, cols]);
        // shapes too short for the chosen mode are rejected, never mis-transformed
        if let Ok(wx) = op.op(&x) {
            let y = random_coeffs(&mut rng, &wx);
            let lhs = wx.vdot(&y).unwrap();
            let rhs = image_vdot(&x, &op.adj_op(&y).unwrap());
            prop_assert!((lhs - rhs).norm() <= RTOL * lhs.norm().max(rhs.norm()).max(1.0));
        }
    }
}
