use crate::{
    config::PaddingMode,
    error::ShapeError,
    wavelet::{Wavelet, WaveletFilter},
    Real,
};
use ndarray::{ArrayView1, ArrayViewMut1};
use num_complex::Complex;
use num_traits::Zero;

/// A two-channel, critically sampled 1-D transform applied lane by lane.
///
/// `analyze_adjoint` must be the exact transpose of `analyze`; the separable
/// engine builds both directions of the N-D transform from these two calls.
pub trait LaneKernel<T>: Send + Sync {
    /// Number of approximation (and detail) coefficients for a lane of `sig_len`.
    fn coeff_len(&self, sig_len: usize) -> usize;

    /// Rejects lane lengths this kernel cannot decompose at `scale`.
    fn check(&self, axis: usize, scale: usize, sig_len: usize) -> Result<(), ShapeError>;

    fn analyze(
        &self,
        signal: ArrayView1<Complex<T>>,
        approx: ArrayViewMut1<Complex<T>>,
        detail: ArrayViewMut1<Complex<T>>,
    );

    fn analyze_adjoint(
        &self,
        approx: ArrayView1<Complex<T>>,
        detail: ArrayView1<Complex<T>>,
        signal: ArrayViewMut1<Complex<T>>,
    );
}

/// Filter-bank transform of one lane with an arbitrary boundary extension.
pub struct WaveletXForm1D<T> {
    wavelet: Wavelet<T>,
    mode: PaddingMode,
    /// offset of the first tap in the virtual signal
    shift: isize,
}

impl<T> WaveletXForm1D<T>
where
    T: Real,
{
    pub fn new(wavelet: Wavelet<T>, mode: PaddingMode) -> Self {
        let shift = match mode {
            PaddingMode::Periodization => (wavelet.filt_len() / 2) as isize - 1,
            _ => 0,
        };
        Self {
            wavelet,
            mode,
            shift,
        }
    }

    pub fn wavelet(&self) -> &Wavelet<T> {
        &self.wavelet
    }

    pub fn mode(&self) -> PaddingMode {
        self.mode
    }

    #[inline]
    fn virtual_idx(&self, coeff_idx: usize, tap: usize) -> isize {
        2 * coeff_idx as isize + 1 - tap as isize + self.shift
    }
}

impl<T> LaneKernel<T> for WaveletXForm1D<T>
where
    T: Real,
{
    fn coeff_len(&self, sig_len: usize) -> usize {
        match self.mode {
            PaddingMode::Periodization => (sig_len + 1) / 2,
            _ => (sig_len + self.wavelet.filt_len() - 1) / 2,
        }
    }

    fn check(&self, axis: usize, scale: usize, sig_len: usize) -> Result<(), ShapeError> {
        let filt_len = self.wavelet.filt_len();
        if self.mode != PaddingMode::Periodization && sig_len < filt_len {
            return Err(ShapeError::TooShort {
                axis,
                scale,
                len: sig_len,
                filt_len,
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
        let lo_d = self.wavelet.lo_d();
        let hi_d = self.wavelet.hi_d();
        let sig_len = signal.len();
        let ext_len = 2 * approx.len();

        for i in 0..approx.len() {
            let mut sa = Complex::<T>::zero();
            let mut sd = Complex::<T>::zero();
            for (j, (&lo, &hi)) in lo_d.iter().zip(hi_d).enumerate() {
                if let Some(p) = self.mode.resolve(self.virtual_idx(i, j), sig_len, ext_len) {
                    let x = signal[p];
                    sa += x * lo;
                    sd += x * hi;
                }
            }
            approx[i] = sa;
            detail[i] = sd;
        }
    }

    fn analyze_adjoint(
        &self,
        approx: ArrayView1<Complex<T>>,
        detail: ArrayView1<Complex<T>>,
        mut signal: ArrayViewMut1<Complex<T>>,
    ) {
        let lo_d = self.wavelet.lo_d();
        let hi_d = self.wavelet.hi_d();
        let sig_len = signal.len();
        let ext_len = 2 * approx.len();

        signal.fill(Complex::zero());
        for i in 0..approx.len() {
            let (a, d) = (approx[i], detail[i]);
            for (j, (&lo, &hi)) in lo_d.iter().zip(hi_d).enumerate() {
                // scatter through the same index map the analysis gathers from
                if let Some(p) = self.mode.resolve(self.virtual_idx(i, j), sig_len, ext_len) {
                    signal[p] += a * lo + d * hi;
                }
            }
        }
    }
}

/// Returns the maximum number of wavelet decomposition levels to avoid boundary effects
pub fn w_max_level(sig_len: usize, filt_len: usize) -> usize {
    if filt_len <= 1 {
        return 0;
    }
    (sig_len as f32 / (filt_len as f32 - 1.)).log2() as usize
}
