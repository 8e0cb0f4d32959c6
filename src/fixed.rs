//! Fast engines for a small fixed catalog of transforms.

use crate::{
    dwt::LaneKernel,
    error::{Result, ShapeError},
    layout::{CoefficientSet, Layout},
    operator::TransformEngine,
    Real,
};
use ndarray::{ArrayD, ArrayView1, ArrayViewD, ArrayViewMut1, Axis, Zip};
use num_complex::Complex;
use num_traits::Zero;

/// Orthonormal Haar step. Lanes must have even length unless the kernel is
/// periodized, in which case an odd lane is extended by repeating its last
/// sample.
pub struct HaarXForm1D<T> {
    scale: T,
    periodize: bool,
}

impl<T: Real> HaarXForm1D<T> {
    pub fn new() -> Self {
        Self {
            scale: T::one() / (T::one() + T::one()).sqrt(),
            periodize: false,
        }
    }

    pub fn periodized() -> Self {
        Self {
            periodize: true,
            ..Self::new()
        }
    }
}

impl<T: Real> Default for HaarXForm1D<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Real> LaneKernel<T> for HaarXForm1D<T> {
    fn coeff_len(&self, sig_len: usize) -> usize {
        if self.periodize {
            (sig_len + 1) / 2
        } else {
            sig_len / 2
        }
    }

    fn check(
        &self,
        axis: usize,
        scale: usize,
        sig_len: usize,
    ) -> std::result::Result<(), ShapeError> {
        if !self.periodize && sig_len % 2 != 0 {
            return Err(ShapeError::NotDyadic {
                axis,
                scale,
                len: sig_len,
            });
        }
        Ok(())
    }

    fn analyze(
        &self,
        signal: ArrayView1<Complex<T>>,
        mut approx: ArrayViewMut1<Complex<T>>,
        mut detail: ArrayViewMut1<Complex<T>>,
    ) {
        let last = signal.len() - 1;
        for i in 0..approx.len() {
            let (even, odd) = (signal[2 * i], signal[(2 * i + 1).min(last)]);
            approx[i] = (even + odd) * self.scale;
            detail[i] = (even - odd) * self.scale;
        }
    }

    fn analyze_adjoint(
        &self,
        approx: ArrayView1<Complex<T>>,
        detail: ArrayView1<Complex<T>>,
        mut signal: ArrayViewMut1<Complex<T>>,
    ) {
        signal.fill(Complex::zero());
        // an odd periodized lane folds both taps of its last pair onto the final sample
        let last = signal.len() - 1;
        for i in 0..approx.len() {
            let (a, d) = (approx[i], detail[i]);
            signal[2 * i] += (a + d) * self.scale;
            signal[(2 * i + 1).min(last)] += (a - d) * self.scale;
        }
    }
}

/// Undecimated starlet transform (a trous algorithm with the B3-spline kernel).
///
/// Every scale keeps a full-size detail band `c_(j-1) - c_j`, where
/// `c_j = h_(j-1) * c_(j-1)` and `h_j` is the kernel dilated by `2^j`.
/// Boundaries wrap periodically. The transform is redundant, so its adjoint
/// is not its inverse (the inverse is simply the sum of all bands).
pub struct ATrousEngine<T> {
    dim: usize,
    scale_count: usize,
    taps: [T; 5],
}

impl<T: Real> ATrousEngine<T> {
    pub fn new(dim: usize, scale_count: usize) -> Self {
        let c = |v: f64| T::from_f64(v / 16.0).unwrap_or_else(T::zero);
        Self {
            dim,
            scale_count,
            taps: [c(1.0), c(4.0), c(6.0), c(4.0), c(1.0)],
        }
    }

    /// Support of the kernel dilated for `scale` (1-based), `None` on overflow.
    fn support(scale: usize) -> Option<usize> {
        let step = 1usize.checked_shl(u32::try_from(scale - 1).ok()?)?;
        step.checked_mul(4)?.checked_add(1)
    }

    /// Separable smoothing at dilation `step`, or its transpose.
    fn smooth(
        &self,
        x: ArrayViewD<Complex<T>>,
        step: usize,
        transpose: bool,
    ) -> ArrayD<Complex<T>> {
        let mut cur = x.to_owned();
        for axis in 0..self.dim {
            let mut out = ArrayD::zeros(cur.raw_dim());
            Zip::from(cur.lanes(Axis(axis)))
                .and(out.lanes_mut(Axis(axis)))
                .par_for_each(|s, o| self.smooth_lane(s, o, step, transpose));
            cur = out;
        }
        cur
    }

    fn smooth_lane(
        &self,
        signal: ArrayView1<Complex<T>>,
        mut out: ArrayViewMut1<Complex<T>>,
        step: usize,
        transpose: bool,
    ) {
        let n = signal.len() as isize;
        let step = step as isize;
        for i in 0..n {
            let mut acc = Complex::<T>::zero();
            for (k, &h) in self.taps.iter().enumerate() {
                let offset = (k as isize - 2) * step;
                let v = if transpose { i - offset } else { i + offset };
                acc += signal[v.rem_euclid(n) as usize] * h;
            }
            out[i as usize] = acc;
        }
    }
}

impl<T: Real> TransformEngine<T> for ATrousEngine<T> {
    fn dim(&self) -> usize {
        self.dim
    }

    fn describe(&self, image_shape: &[usize]) -> Result<Layout> {
        for scale in 1..=self.scale_count {
            let support = Self::support(scale).unwrap_or(usize::MAX);
            let narrow = image_shape.iter().enumerate().find(|&(_, &n)| n < support);
            if let Some((axis, &len)) = narrow {
                return Err(ShapeError::SupportTooWide {
                    axis,
                    scale,
                    len,
                    support,
                }
                .into());
            }
        }
        let scale_shapes = vec![image_shape.to_vec(); self.scale_count];
        Ok(Layout::pyramid(image_shape, scale_shapes, &[0]))
    }

    fn forward(&self, image: ArrayViewD<Complex<T>>, layout: Layout) -> Result<CoefficientSet<T>> {
        let mut coarse = image.to_owned();
        let mut details = Vec::with_capacity(self.scale_count);
        for j in 0..self.scale_count {
            let next = self.smooth(coarse.view(), 1 << j, false);
            details.push(&coarse - &next);
            coarse = next;
        }
        let mut bands = Vec::with_capacity(self.scale_count + 1);
        bands.push(coarse);
        bands.extend(details.into_iter().rev());
        CoefficientSet::new(layout, bands)
    }

    fn adjoint(&self, coeffs: &CoefficientSet<T>) -> Result<ArrayD<Complex<T>>> {
        let layout = coeffs.layout();
        let k = self.scale_count;
        // detail band of scale j (1-based)
        let y = |j: usize| coeffs.band(layout.detail_range(j).start);
        let mut r = coeffs.band(0) - y(k);
        for j in (0..k).rev() {
            let u = if j == 0 { y(1).to_owned() } else { y(j + 1) - y(j) };
            r = self.smooth(r.view(), 1 << j, true) + u;
        }
        Ok(r)
    }
}
