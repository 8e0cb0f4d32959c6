//! Separable multilevel decomposition over 2-D and 3-D arrays.
//!
//! Each level filters every lane along axis 0, then every lane of both
//! outputs along axis 1, and so on, giving `2^dim` subbands. Band index bits
//! record the filter applied on each axis, with axis 0 as the most
//! significant bit; band 0 (all low-pass) feeds the next level.

use crate::{
    dwt::LaneKernel,
    error::{Result, ShapeError},
    layout::{CoefficientSet, Layout},
    operator::TransformEngine,
    utils::with_axis_len,
    Real,
};
use ndarray::{ArrayD, ArrayViewD, Axis, IxDyn, Zip};
use num_complex::Complex;

pub struct SeparableEngine<K> {
    kernel: K,
    dim: usize,
    scale_count: usize,
}

impl<K> SeparableEngine<K> {
    pub fn new(kernel: K, dim: usize, scale_count: usize) -> Self {
        Self {
            kernel,
            dim,
            scale_count,
        }
    }

    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    fn n_bands(&self) -> usize {
        1 << self.dim
    }
}

/// Filters every lane of `x` along `axis` into low- and high-pass halves.
pub fn dwt_axis<T, K>(
    x: ArrayViewD<Complex<T>>,
    axis: usize,
    kernel: &K,
) -> (ArrayD<Complex<T>>, ArrayD<Complex<T>>)
where
    T: Real,
    K: LaneKernel<T>,
{
    let n_coeffs = kernel.coeff_len(x.len_of(Axis(axis)));
    let out_shape = with_axis_len(x.shape(), axis, n_coeffs);
    let mut approx = ArrayD::zeros(IxDyn(&out_shape));
    let mut detail = ArrayD::zeros(IxDyn(&out_shape));
    Zip::from(x.lanes(Axis(axis)))
        .and(approx.lanes_mut(Axis(axis)))
        .and(detail.lanes_mut(Axis(axis)))
        .par_for_each(|s, a, d| kernel.analyze(s, a, d));
    (approx, detail)
}

/// Adjoint of [`dwt_axis`], producing lanes of `sig_len` samples.
pub fn dwt_axis_adjoint<T, K>(
    approx: ArrayViewD<Complex<T>>,
    detail: ArrayViewD<Complex<T>>,
    axis: usize,
    sig_len: usize,
    kernel: &K,
) -> ArrayD<Complex<T>>
where
    T: Real,
    K: LaneKernel<T>,
{
    let out_shape = with_axis_len(approx.shape(), axis, sig_len);
    let mut signal = ArrayD::zeros(IxDyn(&out_shape));
    Zip::from(approx.lanes(Axis(axis)))
        .and(detail.lanes(Axis(axis)))
        .and(signal.lanes_mut(Axis(axis)))
        .par_for_each(|a, d, s| kernel.analyze_adjoint(a, d, s));
    signal
}

impl<T, K> TransformEngine<T> for SeparableEngine<K>
where
    T: Real,
    K: LaneKernel<T>,
{
    fn dim(&self) -> usize {
        self.dim
    }

    fn describe(&self, image_shape: &[usize]) -> Result<Layout> {
        let mut shape = image_shape.to_vec();
        let mut scale_shapes = Vec::with_capacity(self.scale_count);
        for scale in 1..=self.scale_count {
            for (axis, len) in shape.iter_mut().enumerate() {
                self.kernel.check(axis, scale, *len)?;
                *len = self.kernel.coeff_len(*len);
            }
            scale_shapes.push(shape.clone());
        }
        let orientations: Vec<usize> = (1..self.n_bands()).collect();
        Ok(Layout::pyramid(image_shape, scale_shapes, &orientations))
    }

    fn forward(&self, image: ArrayViewD<Complex<T>>, layout: Layout) -> Result<CoefficientSet<T>> {
        let mut approx = image.to_owned();
        // details per level, finest first
        let mut levels = Vec::with_capacity(self.scale_count);
        for _ in 0..self.scale_count {
            let mut bands = vec![approx];
            for axis in 0..self.dim {
                bands = bands
                    .iter()
                    .flat_map(|b| {
                        let (lo, hi) = dwt_axis(b.view(), axis, &self.kernel);
                        [lo, hi]
                    })
                    .collect();
            }
            let details = bands.split_off(1);
            approx = bands.pop().ok_or(ShapeError::BandCount {
                expected: self.n_bands(),
                found: 0,
            })?;
            levels.push(details);
        }
        let mut out = Vec::with_capacity(layout.band_count());
        out.push(approx);
        out.extend(levels.into_iter().rev().flatten());
        CoefficientSet::new(layout, out)
    }

    fn adjoint(&self, coeffs: &CoefficientSet<T>) -> Result<ArrayD<Complex<T>>> {
        let layout = coeffs.layout();
        let mut approx = coeffs.band(0).to_owned();
        for scale in (1..=self.scale_count).rev() {
            let target = layout.input_shape(scale).to_vec();
            let mut bands: Vec<ArrayD<Complex<T>>> = Some(approx)
                .into_iter()
                .chain(coeffs.bands()[layout.detail_range(scale)].iter().cloned())
                .collect();
            if bands.len() != self.n_bands() {
                return Err(ShapeError::BandCount {
                    expected: self.n_bands(),
                    found: bands.len(),
                }
                .into());
            }
            // undo the axes in reverse; pairs differ only in the last axis still split
            for axis in (0..self.dim).rev() {
                bands = bands
                    .chunks(2)
                    .map(|pair| {
                        let (lo, hi) = (pair[0].view(), pair[1].view());
                        dwt_axis_adjoint(lo, hi, axis, target[axis], &self.kernel)
                    })
                    .collect();
            }
            approx = bands.pop().ok_or(ShapeError::BandCount {
                expected: 1,
                found: 0,
            })?;
        }
        Ok(approx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::PaddingMode,
        dwt::WaveletXForm1D,
        layout::Subband,
        wavelet::{Wavelet, WaveletType},
    };
    use ndarray::Array3;
    use num_complex::Complex64;

    fn engine(
        wt: WaveletType,
        mode: PaddingMode,
        dim: usize,
        scales: usize,
    ) -> SeparableEngine<WaveletXForm1D<f64>> {
        SeparableEngine::new(WaveletXForm1D::new(Wavelet::new(wt), mode), dim, scales)
    }

    #[test]
    fn axis_output_shapes() {
        let x = Array3::<Complex64>::zeros((12, 9, 5)).into_dyn();
        let db2 = Wavelet::<f64>::new(WaveletType::Daubechies2);
        let xf = WaveletXForm1D::new(db2, PaddingMode::Symmetric);
        let (lo, hi) = dwt_axis(x.view(), 1, &xf);
        assert_eq!(lo.shape(), &[12, 6, 5]);
        assert_eq!(hi.shape(), &[12, 6, 5]);
        let back = dwt_axis_adjoint(lo.view(), hi.view(), 1, 9, &xf);
        assert_eq!(back.shape(), &[12, 9, 5]);
    }

    #[test]
    fn constant_image_has_no_detail() {
        // periodized orthogonal filters annihilate constants in every detail band
        let e = engine(WaveletType::Daubechies4, PaddingMode::Periodization, 2, 3);
        let image = ArrayD::from_elem(IxDyn(&[32, 32]), Complex64::new(1.0, -2.0));
        let layout = e.describe(image.shape()).unwrap();
        let c = e.forward(image.view(), layout).unwrap();
        for (spec, band) in c.layout().bands().iter().zip(c.bands()) {
            if let Subband::Detail { .. } = spec.subband {
                assert!(
                    band.iter().all(|v| v.norm() < 1e-9),
                    "scale {} {:?}",
                    spec.scale,
                    spec.subband
                );
            }
        }
        // orthonormal: energy is preserved
        assert!((c.norm_sqr() - 5.0 * 1024.0).abs() < 1e-6);
    }

    #[test]
    fn orientation_bits_follow_axes() {
        // an image varying only along axis 1 puts energy in orientation 0b01 only
        let e = engine(WaveletType::Haar, PaddingMode::Periodization, 2, 1);
        let image = ArrayD::from_shape_fn(IxDyn(&[8, 8]), |ix| {
            Complex64::new(if ix[1] % 2 == 0 { 1.0 } else { -1.0 }, 0.0)
        });
        let layout = e.describe(image.shape()).unwrap();
        let c = e.forward(image.view(), layout).unwrap();
        let energy = |o| {
            let band = c.get(1, Subband::Detail { orientation: o }).unwrap();
            band.iter().map(|v| v.norm_sqr()).sum::<f64>()
        };
        assert!(energy(1) > 1.0);
        assert!(energy(2) < 1e-20);
        assert!(energy(3) < 1e-20);
    }
}
