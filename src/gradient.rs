//! Gradients of the least-squares data-fidelity term `0.5 * ||A v - d||^2`.
//!
//! In the analysis formulation the unknown `v` is an image and `A` is the
//! imaging model; the wavelet operator is carried along for the solver's
//! regularization step. In the synthesis formulation the unknown is a set of
//! wavelet coefficients and `A = F W^H`.

use crate::{
    error::{ConfigError, Result},
    fourier::ImagingModel,
    layout::{CoefficientSet, Layout},
    operator::WaveletN,
    parallel::SensitivityModel,
    utils::{expect_shape, vdot},
    Real,
};
use log::{debug, trace};
use ndarray::{ArrayD, IxDyn};
use num_complex::Complex;
use rand::{rngs::StdRng, Rng, SeedableRng};

const POWER_SEED: u64 = 0;

/// A smooth data-fidelity term as seen by an iterative solver.
pub trait Gradient<T: Real> {
    type Variable;

    /// `A^H (A v - d)`
    fn gradient(&self, v: &Self::Variable) -> Result<Self::Variable>;

    /// `0.5 * ||A v - d||^2`
    fn cost(&self, v: &Self::Variable) -> Result<T>;

    /// Largest eigenvalue of `A^H A`, the Lipschitz constant of the gradient.
    ///
    /// Power iteration from a fixed pseudo-random start; stops after
    /// `max_iter` steps or once the estimate changes by less than `tol`
    /// relative to itself.
    fn spectral_radius(&self, max_iter: usize, tol: T) -> Result<T>;
}

fn image_norm<T: Real>(x: &ArrayD<Complex<T>>) -> T {
    vdot(x.view(), x.view()).re.sqrt()
}

fn residual<T: Real, M: ImagingModel<T>>(
    model: &M,
    data: &ArrayD<Complex<T>>,
    image: &ArrayD<Complex<T>>,
) -> Result<ArrayD<Complex<T>>> {
    Ok(model.apply(image)? - data)
}

fn random_values<T: Real>(rng: &mut StdRng, n: usize) -> Vec<Complex<T>> {
    let mut draw = || T::from_f64(rng.gen_range(-1.0..1.0)).unwrap_or_else(T::zero);
    (0..n).map(|_| Complex::new(draw(), draw())).collect()
}

/// Shared power iteration. `step` applies the normal operator and returns the
/// norm of its output, `normalize` divides the iterate by that norm.
fn power_iteration<T, V, S, N>(
    mut v: V,
    max_iter: usize,
    tol: T,
    step: S,
    normalize: N,
) -> Result<T>
where
    T: Real,
    S: Fn(&V) -> Result<(V, T)>,
    N: Fn(&mut V, T),
{
    let mut estimate = T::zero();
    for iter in 0..max_iter {
        let (next, norm) = step(&v)?;
        if norm == T::zero() {
            return Ok(T::zero());
        }
        v = next;
        normalize(&mut v, norm);
        let change = (norm - estimate) / norm;
        trace!("power iteration {iter}: estimate {:?}", norm.to_f64());
        estimate = norm;
        if change < tol && -change < tol {
            break;
        }
    }
    Ok(estimate)
}

fn check_data<T: Real, M: ImagingModel<T>>(model: &M, data: &ArrayD<Complex<T>>) -> Result<()> {
    expect_shape(model.data_shape(), data.shape()).map_err(|_| ConfigError::DataShape {
        expected: model.data_shape().to_vec(),
        found: data.shape().to_vec(),
    })?;
    Ok(())
}

fn check_wavelet<T: Real, M: ImagingModel<T>>(model: &M, wavelet: &WaveletN<T>) -> Result<Layout> {
    wavelet.describe(model.image_shape()).map_err(|e| {
        ConfigError::IncompatibleShapes {
            model: model.image_shape().to_vec(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// Gradient with respect to the image.
pub struct GradAnalysis<T, M> {
    model: M,
    wavelet: WaveletN<T>,
    data: ArrayD<Complex<T>>,
    layout: Layout,
}

impl<T, M> GradAnalysis<T, M>
where
    T: Real,
    M: ImagingModel<T>,
{
    pub fn new(model: M, wavelet: WaveletN<T>, data: ArrayD<Complex<T>>) -> Result<Self> {
        let layout = check_wavelet(&model, &wavelet)?;
        check_data(&model, &data)?;
        debug!(
            "analysis gradient: image {:?}, data {:?}, {} coefficients",
            model.image_shape(),
            model.data_shape(),
            layout.len()
        );
        Ok(Self {
            model,
            wavelet,
            data,
            layout,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// The sparsifying transform for the solver's regularization step.
    pub fn wavelet(&self) -> &WaveletN<T> {
        &self.wavelet
    }

    pub fn data(&self) -> &ArrayD<Complex<T>> {
        &self.data
    }

    /// Layout of `wavelet().op(image)` for the model's images.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }
}

impl<T, M> Gradient<T> for GradAnalysis<T, M>
where
    T: Real,
    M: ImagingModel<T>,
{
    type Variable = ArrayD<Complex<T>>;

    fn gradient(&self, image: &Self::Variable) -> Result<Self::Variable> {
        self.model.adjoint(&residual(&self.model, &self.data, image)?)
    }

    fn cost(&self, image: &Self::Variable) -> Result<T> {
        let r = residual(&self.model, &self.data, image)?;
        Ok(vdot(r.view(), r.view()).re / (T::one() + T::one()))
    }

    fn spectral_radius(&self, max_iter: usize, tol: T) -> Result<T> {
        let mut rng = StdRng::seed_from_u64(POWER_SEED);
        let shape = self.model.image_shape().to_vec();
        let values = random_values::<T>(&mut rng, shape.iter().product());
        let start: ArrayD<Complex<T>> = ArrayD::from_shape_vec(IxDyn(&shape), values)
            .map_err(|_| ConfigError::InvalidModel(format!("bad image shape {shape:?}")))?;
        let norm = image_norm(&start);
        let start = start.mapv(|v| v / norm);
        power_iteration(
            start,
            max_iter,
            tol,
            |x| {
                let y = self.model.adjoint(&self.model.apply(x)?)?;
                let n = image_norm(&y);
                Ok((y, n))
            },
            |x, n| x.mapv_inplace(|v| v / n),
        )
    }
}

/// Gradient with respect to the wavelet coefficients of the image.
pub struct GradSynthesis<T, M> {
    model: M,
    wavelet: WaveletN<T>,
    data: ArrayD<Complex<T>>,
    layout: Layout,
}

impl<T, M> GradSynthesis<T, M>
where
    T: Real,
    M: ImagingModel<T>,
{
    pub fn new(model: M, wavelet: WaveletN<T>, data: ArrayD<Complex<T>>) -> Result<Self> {
        let layout = check_wavelet(&model, &wavelet)?;
        check_data(&model, &data)?;
        debug!(
            "synthesis gradient: image {:?}, data {:?}, {} coefficients",
            model.image_shape(),
            model.data_shape(),
            layout.len()
        );
        Ok(Self {
            model,
            wavelet,
            data,
            layout,
        })
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn wavelet(&self) -> &WaveletN<T> {
        &self.wavelet
    }

    pub fn data(&self) -> &ArrayD<Complex<T>> {
        &self.data
    }

    /// Layout of the optimization variable.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Image represented by a coefficient set, `W^H coeffs`.
    pub fn image(&self, coeffs: &CoefficientSet<T>) -> Result<ArrayD<Complex<T>>> {
        self.wavelet.adj_op(coeffs)
    }
}

impl<T, M> Gradient<T> for GradSynthesis<T, M>
where
    T: Real,
    M: ImagingModel<T>,
{
    type Variable = CoefficientSet<T>;

    fn gradient(&self, coeffs: &Self::Variable) -> Result<Self::Variable> {
        let image = self.wavelet.adj_op(coeffs)?;
        let back = self.model.adjoint(&residual(&self.model, &self.data, &image)?)?;
        self.wavelet.op(&back)
    }

    fn cost(&self, coeffs: &Self::Variable) -> Result<T> {
        let r = residual(&self.model, &self.data, &self.wavelet.adj_op(coeffs)?)?;
        Ok(vdot(r.view(), r.view()).re / (T::one() + T::one()))
    }

    fn spectral_radius(&self, max_iter: usize, tol: T) -> Result<T> {
        let mut rng = StdRng::seed_from_u64(POWER_SEED);
        let values = random_values::<T>(&mut rng, self.layout.len());
        let mut start: CoefficientSet<T> =
            CoefficientSet::unflatten(&values, self.layout.clone())?;
        let norm = start.norm_sqr().sqrt();
        start.map_inplace(|v| *v = *v / norm);
        power_iteration(
            start,
            max_iter,
            tol,
            |c| {
                let image = self.wavelet.adj_op(c)?;
                let y = self.wavelet.op(&self.model.adjoint(&self.model.apply(&image)?)?)?;
                let n = y.norm_sqr().sqrt();
                Ok((y, n))
            },
            |c, n| c.map_inplace(|v| *v = *v / n),
        )
    }
}

/// Analysis gradient over multi-coil data.
pub type GradParallelAnalysis<T> = GradAnalysis<T, SensitivityModel<T>>;

/// Synthesis gradient over multi-coil data.
pub type GradParallelSynthesis<T> = GradSynthesis<T, SensitivityModel<T>>;
