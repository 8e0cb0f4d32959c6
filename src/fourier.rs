//! Cartesian undersampled Fourier model.

use crate::{
    error::{ConfigError, Result},
    utils::expect_shape,
    Real,
};
use ndarray::{ArrayD, Axis, Zip};
use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// The forward model a gradient operator wraps: image in, measured data out.
///
/// `adjoint` must satisfy `<apply(x), y> = <x, adjoint(y)>`, the same contract
/// the wavelet operator honours.
pub trait ImagingModel<T>: Send + Sync {
    fn image_shape(&self) -> &[usize];

    fn data_shape(&self) -> &[usize];

    fn apply(&self, image: &ArrayD<Complex<T>>) -> Result<ArrayD<Complex<T>>>;

    fn adjoint(&self, data: &ArrayD<Complex<T>>) -> Result<ArrayD<Complex<T>>>;
}

/// Orthonormal N-D FFT followed by a real k-space weighting (usually a 0/1
/// sampling mask). The mask is indexed in unshifted FFT order, DC at index 0.
pub struct FourierMask<T> {
    shape: Vec<usize>,
    mask: ArrayD<T>,
    fwd: Vec<Arc<dyn Fft<T>>>,
    inv: Vec<Arc<dyn Fft<T>>>,
    norm: T,
}

impl<T> FourierMask<T>
where
    T: Real,
{
    pub fn new(mask: ArrayD<T>) -> Result<Self> {
        let shape = mask.shape().to_vec();
        if shape.is_empty() || shape.contains(&0) {
            let reason = format!("sampling mask has empty shape {shape:?}");
            return Err(ConfigError::InvalidModel(reason).into());
        }
        let mut planner = FftPlanner::<T>::new();
        let fwd = shape.iter().map(|&n| planner.plan_fft_forward(n)).collect();
        let inv = shape.iter().map(|&n| planner.plan_fft_inverse(n)).collect();
        let total = T::from_usize(mask.len()).unwrap_or_else(T::one);
        Ok(Self {
            shape,
            mask,
            fwd,
            inv,
            norm: T::one() / total.sqrt(),
        })
    }

    /// Fully sampled model of the given image shape.
    pub fn full(shape: &[usize]) -> Result<Self> {
        Self::new(ArrayD::from_elem(shape.to_vec(), T::one()))
    }

    pub fn mask(&self) -> &ArrayD<T> {
        &self.mask
    }

    /// Orthonormal FFT over every axis, in place.
    pub fn fft(&self, x: &mut ArrayD<Complex<T>>) {
        self.transform(x, &self.fwd);
    }

    /// Orthonormal inverse FFT over every axis, in place.
    pub fn ifft(&self, x: &mut ArrayD<Complex<T>>) {
        self.transform(x, &self.inv);
    }

    fn transform(&self, x: &mut ArrayD<Complex<T>>, plans: &[Arc<dyn Fft<T>>]) {
        for (axis, plan) in plans.iter().enumerate() {
            Zip::from(x.lanes_mut(Axis(axis))).par_for_each(|mut lane| {
                let mut buffer: Vec<Complex<T>> = lane.iter().copied().collect();
                plan.process(&mut buffer);
                lane.iter_mut().zip(buffer).for_each(|(dst, src)| *dst = src);
            });
        }
        let norm = self.norm;
        x.map_inplace(|v| *v = *v * norm);
    }
}

impl<T> ImagingModel<T> for FourierMask<T>
where
    T: Real,
{
    fn image_shape(&self) -> &[usize] {
        &self.shape
    }

    fn data_shape(&self) -> &[usize] {
        &self.shape
    }

    fn apply(&self, image: &ArrayD<Complex<T>>) -> Result<ArrayD<Complex<T>>> {
        expect_shape(&self.shape, image.shape())?;
        let mut k = image.clone();
        self.fft(&mut k);
        Zip::from(&mut k).and(&self.mask).for_each(|v, &m| *v = *v * m);
        Ok(k)
    }

    fn adjoint(&self, data: &ArrayD<Complex<T>>) -> Result<ArrayD<Complex<T>>> {
        expect_shape(&self.shape, data.shape())?;
        let mut x = data.clone();
        Zip::from(&mut x).and(&self.mask).for_each(|v, &m| *v = *v * m);
        self.ifft(&mut x);
        Ok(x)
    }
}
