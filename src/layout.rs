//! Shape bookkeeping for multiscale decompositions.
//!
//! A [`Layout`] lists every band a transform produces, coarsest approximation
//! first, then the detail bands from the coarsest scale down to scale 1. It
//! is the single authority on band shapes: engines build it once per image
//! shape and both `op` and `adj_op` are checked against it.

use crate::{
    config::WaveletConfig,
    error::{Result, ShapeError},
    operator::WaveletN,
    utils::vdot,
    Real,
};
use ndarray::{ArrayD, ArrayViewMutD, IxDyn, Zip};
use num_complex::Complex;
use num_traits::Zero;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Subband {
    Approximation,
    /// Bit `dim - 1 - axis` of `orientation` is set when the band is high-pass
    /// along `axis`. Undecimated transforms use orientation 0 for their single
    /// isotropic detail band.
    Detail { orientation: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BandSpec {
    pub scale: usize,
    pub subband: Subband,
    pub shape: Vec<usize>,
}

impl BandSpec {
    pub fn len(&self) -> usize {
        self.shape.iter().product()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Layout {
    image_shape: Vec<usize>,
    scale_count: usize,
    bands: Vec<BandSpec>,
}

impl Layout {
    /// Builds a layout from the band shape of every scale (index 0 is scale 1)
    /// and the detail orientations present at each scale.
    pub(crate) fn pyramid(
        image_shape: &[usize],
        scale_shapes: Vec<Vec<usize>>,
        orientations: &[usize],
    ) -> Self {
        let scale_count = scale_shapes.len();
        let mut bands = Vec::with_capacity(1 + scale_count * orientations.len());
        if let Some(coarsest) = scale_shapes.last() {
            bands.push(BandSpec {
                scale: scale_count,
                subband: Subband::Approximation,
                shape: coarsest.clone(),
            });
        }
        for (idx, shape) in scale_shapes.iter().enumerate().rev() {
            for &orientation in orientations {
                bands.push(BandSpec {
                    scale: idx + 1,
                    subband: Subband::Detail { orientation },
                    shape: shape.clone(),
                });
            }
        }
        Self {
            image_shape: image_shape.to_vec(),
            scale_count,
            bands,
        }
    }

    pub fn image_shape(&self) -> &[usize] {
        &self.image_shape
    }

    pub fn scale_count(&self) -> usize {
        self.scale_count
    }

    pub fn bands(&self) -> &[BandSpec] {
        &self.bands
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Total number of coefficients.
    pub fn len(&self) -> usize {
        self.bands.iter().map(BandSpec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Offset of every band inside the flattened coefficient vector.
    pub fn offsets(&self) -> Vec<usize> {
        self.bands
            .iter()
            .scan(0, |acc, b| {
                let start = *acc;
                *acc += b.len();
                Some(start)
            })
            .collect()
    }

    pub fn find(&self, scale: usize, subband: Subband) -> Option<usize> {
        self.bands
            .iter()
            .position(|b| b.scale == scale && b.subband == subband)
    }

    /// Indices of the detail bands at `scale`.
    pub fn detail_range(&self, scale: usize) -> Range<usize> {
        let start = self
            .bands
            .iter()
            .position(|b| b.scale == scale && b.subband != Subband::Approximation)
            .unwrap_or(self.bands.len());
        let len = self.bands[start..]
            .iter()
            .take_while(|b| b.scale == scale)
            .count();
        start..start + len
    }

    /// Shape of the signal entering the decomposition at `scale`.
    pub fn input_shape(&self, scale: usize) -> &[usize] {
        if scale <= 1 {
            return &self.image_shape;
        }
        let r = self.detail_range(scale - 1);
        &self.bands[r.start].shape
    }
}

/// Computes the layout `op` produces for an image of `image_shape` under `config`.
pub fn describe(image_shape: &[usize], config: &WaveletConfig) -> Result<Layout> {
    WaveletN::<f64>::new(config.clone())?.describe(image_shape)
}

/// A set of complex bands, one per entry of its [`Layout`].
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientSet<T> {
    layout: Layout,
    bands: Vec<ArrayD<Complex<T>>>,
}

impl<T> CoefficientSet<T>
where
    T: Real,
{
    pub fn new(layout: Layout, bands: Vec<ArrayD<Complex<T>>>) -> Result<Self> {
        if bands.len() != layout.band_count() {
            return Err(ShapeError::BandCount {
                expected: layout.band_count(),
                found: bands.len(),
            }
            .into());
        }
        for (idx, (band, spec)) in bands.iter().zip(layout.bands()).enumerate() {
            if band.shape() != spec.shape.as_slice() {
                return Err(ShapeError::BandShape {
                    band: idx,
                    expected: spec.shape.clone(),
                    found: band.shape().to_vec(),
                }
                .into());
            }
        }
        Ok(Self { layout, bands })
    }

    pub fn zeros(layout: Layout) -> Self {
        let bands = layout
            .bands()
            .iter()
            .map(|b| ArrayD::zeros(IxDyn(&b.shape)))
            .collect();
        Self { layout, bands }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn bands(&self) -> &[ArrayD<Complex<T>>] {
        &self.bands
    }

    pub fn band(&self, idx: usize) -> &ArrayD<Complex<T>> {
        &self.bands[idx]
    }

    pub fn band_mut(&mut self, idx: usize) -> ArrayViewMutD<'_, Complex<T>> {
        self.bands[idx].view_mut()
    }

    pub fn get(&self, scale: usize, subband: Subband) -> Option<&ArrayD<Complex<T>>> {
        self.layout.find(scale, subband).map(|i| &self.bands[i])
    }

    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// Concatenates every band in layout order, each band in row-major order.
    pub fn flatten(&self) -> (Vec<Complex<T>>, Layout) {
        let mut flat = Vec::with_capacity(self.len());
        for band in &self.bands {
            flat.extend(band.iter().copied());
        }
        (flat, self.layout.clone())
    }

    /// Inverse of [`flatten`](Self::flatten).
    pub fn unflatten(data: &[Complex<T>], layout: Layout) -> Result<Self> {
        if data.len() != layout.len() {
            return Err(ShapeError::FlatLength {
                expected: layout.len(),
                found: data.len(),
            }
            .into());
        }
        let mut start = 0;
        let mut bands = Vec::with_capacity(layout.band_count());
        for spec in layout.bands() {
            let stop = start + spec.len();
            let band = ArrayD::from_shape_vec(IxDyn(&spec.shape), data[start..stop].to_vec())
                .map_err(|_| ShapeError::FlatLength {
                    expected: spec.len(),
                    found: stop - start,
                })?;
            bands.push(band);
            start = stop;
        }
        Ok(Self { layout, bands })
    }

    fn check_layout(&self, other: &Self) -> Result<()> {
        if self.layout != other.layout {
            return Err(ShapeError::LayoutMismatch {
                image_shape: other.layout.image_shape().to_vec(),
            }
            .into());
        }
        Ok(())
    }

    /// Hermitian inner product, conjugating `self`.
    pub fn vdot(&self, other: &Self) -> Result<Complex<T>> {
        self.check_layout(other)?;
        Ok(self
            .bands
            .iter()
            .zip(&other.bands)
            .fold(Complex::zero(), |acc, (a, b)| acc + vdot(a.view(), b.view())))
    }

    pub fn norm_sqr(&self) -> T {
        self.bands
            .iter()
            .flat_map(|b| b.iter())
            .map(|c| c.norm_sqr())
            .sum()
    }

    /// `self += alpha * other`
    pub fn scaled_add(&mut self, alpha: Complex<T>, other: &Self) -> Result<()> {
        self.check_layout(other)?;
        for (a, b) in self.bands.iter_mut().zip(&other.bands) {
            Zip::from(a).and(b).for_each(|a, &b| *a += alpha * b);
        }
        Ok(())
    }

    pub fn map_inplace<F>(&mut self, f: F)
    where
        F: Fn(&mut Complex<T>),
    {
        self.bands.iter_mut().for_each(|b| b.map_inplace(&f));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PaddingMode;
    use num_complex::Complex64;
    use proptest::prelude::*;

    fn sample_layout() -> Layout {
        Layout::pyramid(
            &[10, 7],
            vec![vec![5, 4], vec![3, 2]],
            &[1, 2, 3],
        )
    }

    #[test]
    fn pyramid_orders_coarse_to_fine() {
        let layout = sample_layout();
        assert_eq!(layout.band_count(), 7);
        assert_eq!(layout.bands()[0].subband, Subband::Approximation);
        assert_eq!(layout.bands()[0].scale, 2);
        assert_eq!(layout.detail_range(2), 1..4);
        assert_eq!(layout.detail_range(1), 4..7);
        assert_eq!(layout.input_shape(1), &[10, 7]);
        assert_eq!(layout.input_shape(2), &[5, 4]);
        assert_eq!(layout.len(), 6 + 3 * 6 + 3 * 20);
        assert_eq!(layout.offsets(), vec![0, 6, 12, 18, 24, 44, 64]);
        assert_eq!(layout.find(1, Subband::Detail { orientation: 3 }), Some(6));
    }

    #[test]
    fn unflatten_rejects_wrong_length() {
        let layout = sample_layout();
        let data = vec![Complex64::zero(); layout.len() - 1];
        assert!(matches!(
            CoefficientSet::unflatten(&data, layout),
            Err(crate::Error::Shape(ShapeError::FlatLength { .. }))
        ));
    }

    #[test]
    fn new_rejects_bad_band_shape() {
        let layout = sample_layout();
        let mut bands: Vec<_> = CoefficientSet::<f64>::zeros(layout.clone()).bands().to_vec();
        bands[3] = ArrayD::zeros(IxDyn(&[3, 3]));
        assert!(matches!(
            CoefficientSet::new(layout, bands),
            Err(crate::Error::Shape(ShapeError::BandShape { band: 3, .. }))
        ));
    }

    #[test]
    fn arithmetic_checks_layout() {
        let a = CoefficientSet::<f64>::zeros(sample_layout());
        let other = Layout::pyramid(&[10, 7], vec![vec![5, 4]], &[1, 2, 3]);
        let b = CoefficientSet::<f64>::zeros(other);
        assert!(a.vdot(&b).is_err());
        let mut c = a.clone();
        let ones = {
            let mut o = a.clone();
            o.map_inplace(|x| *x = Complex64::new(1.0, -1.0));
            o
        };
        c.scaled_add(Complex64::new(0.0, 2.0), &ones).unwrap();
        // 2i * (1 - i) = 2 + 2i
        assert!(c.band(0).iter().all(|&x| x == Complex64::new(2.0, 2.0)));
        assert_eq!(ones.norm_sqr(), 2.0 * ones.len() as f64);
        assert_eq!(ones.vdot(&c).unwrap(), Complex64::new(0.0, 4.0) * ones.len() as f64);
    }

    #[test]
    fn describe_matches_config() {
        let cfg = WaveletConfig::new("sym8", 4);
        let layout = describe(&[64, 64], &cfg).unwrap();
        assert_eq!(layout.band_count(), 1 + 4 * 3);
        assert_eq!(layout.bands()[0].shape, vec![18, 18]);
        let periodized_cfg = cfg.clone().with_padding(PaddingMode::Periodization);
        let periodized = describe(&[64, 64], &periodized_cfg).unwrap();
        assert_eq!(periodized.bands()[0].shape, vec![4, 4]);
        assert_eq!(periodized.len(), 64 * 64);
    }

    proptest! {
        #[test]
        fn flatten_round_trip(
            nx in 1usize..40,
            ny in 1usize..40,
            scales in 1usize..4,
            seed in proptest::collection::vec(-1e3f64..1e3, 1..64),
        ) {
            let cfg = WaveletConfig::new("haar", scales).with_padding(PaddingMode::Periodization);
            let layout = describe(&[nx, ny], &cfg).unwrap();
            let data: Vec<Complex64> = (0..layout.len())
                .map(|i| {
                    let (re, im) = (seed[i % seed.len()], seed[(i * 7 + 3) % seed.len()]);
                    Complex64::new(re, im + i as f64)
                })
                .collect();
            let c = CoefficientSet::unflatten(&data, layout.clone()).unwrap();
            let (flat, l2) = c.flatten();
            prop_assert_eq!(&l2, &layout);
            prop_assert_eq!(&flat, &data);
            prop_assert_eq!(CoefficientSet::unflatten(&flat, l2).unwrap(), c);
        }

        #[test]
        fn describe_is_deterministic(
            n in 16usize..80,
            scales in 1usize..4,
            dim in 2usize..4,
            mode in proptest::sample::select(PaddingMode::ALL.to_vec()),
        ) {
            let cfg = WaveletConfig::new("db2", scales).with_dim(dim).with_padding(mode);
            let shape = vec![n; dim];
            let a = describe(&shape, &cfg).unwrap();
            let b = describe(&shape, &cfg).unwrap();
            prop_assert_eq!(a, b);
        }
    }
}
