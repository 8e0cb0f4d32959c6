//! Multi-coil (parallel MRI) imaging model.

use crate::{
    error::{ConfigError, Result},
    fourier::{FourierMask, ImagingModel},
    utils::expect_shape,
    Real,
};
use log::debug;
use ndarray::{ArrayD, Axis, IxDyn};
use num_complex::Complex;
use rayon::prelude::*;

/// Sensitivity-weighted Fourier sampling for an array of receiver coils.
///
/// Data carries a leading coil axis: `y[c] = mask * F(s_c * x)`. The adjoint
/// sums `conj(s_c) * F^H(mask * y[c])` over coils. Coils are processed on the
/// rayon pool and reduced in coil order, so results do not depend on thread
/// scheduling.
pub struct SensitivityModel<T> {
    fourier: FourierMask<T>,
    sensitivities: ArrayD<Complex<T>>,
    conj_sensitivities: ArrayD<Complex<T>>,
    data_shape: Vec<usize>,
}

impl<T> SensitivityModel<T>
where
    T: Real,
{
    /// `sensitivities` has shape `[n_coils, ..image_shape]`.
    pub fn new(fourier: FourierMask<T>, sensitivities: ArrayD<Complex<T>>) -> Result<Self> {
        let image_shape = fourier.image_shape();
        let found = sensitivities.shape();
        if found.len() != image_shape.len() + 1 || &found[1..] != image_shape || found[0] == 0 {
            return Err(ConfigError::InvalidModel(format!(
                "coil sensitivities of shape {found:?} do not match [n_coils, {image_shape:?}]"
            ))
            .into());
        }
        let data_shape = found.to_vec();
        debug!("parallel model: {} coils, image shape {:?}", found[0], image_shape);
        let conj_sensitivities = sensitivities.mapv(|s| s.conj());
        Ok(Self {
            fourier,
            sensitivities,
            conj_sensitivities,
            data_shape,
        })
    }

    pub fn n_coils(&self) -> usize {
        self.data_shape[0]
    }

    pub fn fourier(&self) -> &FourierMask<T> {
        &self.fourier
    }

    pub fn sensitivities(&self) -> &ArrayD<Complex<T>> {
        &self.sensitivities
    }
}

impl<T> ImagingModel<T> for SensitivityModel<T>
where
    T: Real,
{
    fn image_shape(&self) -> &[usize] {
        self.fourier.image_shape()
    }

    fn data_shape(&self) -> &[usize] {
        &self.data_shape
    }

    fn apply(&self, image: &ArrayD<Complex<T>>) -> Result<ArrayD<Complex<T>>> {
        expect_shape(self.image_shape(), image.shape())?;
        let per_coil = (0..self.n_coils())
            .into_par_iter()
            .map(|c| {
                let weighted = &self.sensitivities.index_axis(Axis(0), c) * image;
                self.fourier.apply(&weighted)
            })
            .collect::<Result<Vec<_>>>()?;
        let mut data = ArrayD::zeros(IxDyn(&self.data_shape));
        for (c, k) in per_coil.iter().enumerate() {
            data.index_axis_mut(Axis(0), c).assign(k);
        }
        Ok(data)
    }

    fn adjoint(&self, data: &ArrayD<Complex<T>>) -> Result<ArrayD<Complex<T>>> {
        expect_shape(&self.data_shape, data.shape())?;
        let per_coil = (0..self.n_coils())
            .into_par_iter()
            .map(|c| {
                let x = self.fourier.adjoint(&data.index_axis(Axis(0), c).to_owned())?;
                Ok(x * &self.conj_sensitivities.index_axis(Axis(0), c))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut image = ArrayD::zeros(IxDyn(self.image_shape()));
        for x in &per_coil {
            image += x;
        }
        Ok(image)
    }
}
