//! The wavelet operator and the engine catalog behind it.

use crate::{
    config::{PaddingMode, WaveletConfig},
    dwt::WaveletXForm1D,
    dwtn::SeparableEngine,
    error::{ConfigError, Result, ShapeError},
    fixed::{ATrousEngine, HaarXForm1D},
    layout::{CoefficientSet, Layout},
    wavelet::{Wavelet, WaveletType},
    Real,
};
use log::{debug, warn};
use ndarray::{ArrayD, ArrayViewD};
use num_complex::Complex;

/// A linear map together with its adjoint.
pub trait LinearOperator<T> {
    type Domain;
    type Range;

    fn op(&self, x: &Self::Domain) -> Result<Self::Range>;

    fn adj_op(&self, y: &Self::Range) -> Result<Self::Domain>;
}

/// A concrete decomposition. Implementations receive inputs whose shapes have
/// already been validated against their own `describe`.
pub trait TransformEngine<T>: Send + Sync {
    fn dim(&self) -> usize;

    /// Layout of the decomposition of an image of `image_shape` (rank == `dim`).
    fn describe(&self, image_shape: &[usize]) -> Result<Layout>;

    fn forward(&self, image: ArrayViewD<Complex<T>>, layout: Layout) -> Result<CoefficientSet<T>>;

    fn adjoint(&self, coeffs: &CoefficientSet<T>) -> Result<ArrayD<Complex<T>>>;
}

type EngineBuilder<T> = fn(&WaveletConfig) -> Box<dyn TransformEngine<T>>;

struct FixedFamily<T> {
    name: &'static str,
    dims: &'static [usize],
    paddings: &'static [PaddingMode],
    build: EngineBuilder<T>,
}

const GENERAL_DIMS: &[usize] = &[2, 3];

fn fixed_catalog<T: Real>() -> [FixedFamily<T>; 2] {
    [
        FixedFamily {
            name: "HaarWaveletTransform",
            dims: &[2, 3],
            // zero padding never applies to even lanes, so it means strictly dyadic
            paddings: &[PaddingMode::Zero, PaddingMode::Periodization],
            build: |cfg| {
                let kernel = match cfg.padding_mode {
                    PaddingMode::Periodization => HaarXForm1D::<T>::periodized(),
                    _ => HaarXForm1D::<T>::new(),
                };
                Box::new(SeparableEngine::new(kernel, cfg.dim, cfg.scale_count))
            },
        },
        FixedFamily {
            name: "BsplineWaveletTransformATrousAlgorithm",
            dims: &[2],
            paddings: &[PaddingMode::Periodic, PaddingMode::Periodization],
            build: |cfg| Box::new(ATrousEngine::<T>::new(cfg.dim, cfg.scale_count)),
        },
    ]
}

/// Every family name accepted by [`WaveletN::new`].
pub fn supported_families() -> Vec<&'static str> {
    let mut names: Vec<&'static str> =
        fixed_catalog::<f64>().iter().map(|f| f.name).collect();
    names.extend(WaveletType::ALL.iter().map(|w| w.name()));
    names.push("db1");
    names
}

/// Multiscale wavelet transform of 2-D or 3-D complex images.
///
/// The engine is selected once from the family name: a fixed-family fast
/// engine when the name is in the fixed catalog, otherwise the general
/// filter-bank engine with the configured padding mode. `adj_op` is the
/// exact adjoint of `op` for every family; it coincides with the inverse
/// only for orthogonal families under periodization.
pub struct WaveletN<T> {
    config: WaveletConfig,
    engine: Box<dyn TransformEngine<T>>,
}

impl<T> WaveletN<T>
where
    T: Real,
{
    pub fn new(config: WaveletConfig) -> Result<Self> {
        if config.scale_count == 0 {
            return Err(ConfigError::ZeroScales.into());
        }

        let fixed = fixed_catalog::<T>()
            .into_iter()
            .find(|f| f.name == config.family);
        let engine: Box<dyn TransformEngine<T>> = if let Some(fixed) = fixed {
            check_dim(&config, fixed.dims)?;
            check_padding(&config, fixed.paddings)?;
            debug!(
                "wavelet {}: fixed engine, dim={}, scales={}, padding={}",
                fixed.name, config.dim, config.scale_count, config.padding_mode
            );
            (fixed.build)(&config)
        } else if let Some(wt) = WaveletType::from_name(&config.family) {
            check_dim(&config, GENERAL_DIMS)?;
            debug!(
                "wavelet {}: filter-bank engine, dim={}, scales={}, padding={}",
                wt.name(),
                config.dim,
                config.scale_count,
                config.padding_mode
            );
            let kernel = WaveletXForm1D::new(Wavelet::<T>::new(wt), config.padding_mode);
            Box::new(SeparableEngine::new(kernel, config.dim, config.scale_count))
        } else {
            return Err(ConfigError::UnknownFamily {
                name: config.family.clone(),
                supported: supported_families(),
            }
            .into());
        };

        Ok(Self { config, engine })
    }

    /// Convenience constructor from the named parameters.
    pub fn from_params(
        family: &str,
        scale_count: usize,
        dim: usize,
        padding_mode: &str,
    ) -> Result<Self> {
        let padding_mode: PaddingMode = padding_mode.parse()?;
        Self::new(
            WaveletConfig::new(family, scale_count)
                .with_dim(dim)
                .with_padding(padding_mode),
        )
    }

    pub fn config(&self) -> &WaveletConfig {
        &self.config
    }

    pub fn dim(&self) -> usize {
        self.engine.dim()
    }

    /// Layout `op` produces for an image of `image_shape`.
    pub fn describe(&self, image_shape: &[usize]) -> Result<Layout> {
        if image_shape.len() != self.dim() {
            return Err(ShapeError::Rank {
                expected: self.dim(),
                found: image_shape.len(),
            }
            .into());
        }
        if image_shape.contains(&0) {
            return Err(ShapeError::Empty {
                shape: image_shape.to_vec(),
            }
            .into());
        }
        self.engine.describe(image_shape)
    }

    /// Forward decomposition.
    pub fn op(&self, image: &ArrayD<Complex<T>>) -> Result<CoefficientSet<T>> {
        let layout = self.describe(image.shape()).map_err(|e| {
            warn!("{}: rejecting image of shape {:?}: {}", self.config.family, image.shape(), e);
            e
        })?;
        self.engine.forward(image.view(), layout)
    }

    /// Adjoint of [`op`](Self::op).
    pub fn adj_op(&self, coeffs: &CoefficientSet<T>) -> Result<ArrayD<Complex<T>>> {
        let layout = coeffs.layout();
        let expected = self.describe(layout.image_shape()).map_err(|e| {
            warn!(
                "{}: rejecting coefficients for image shape {:?}: {}",
                self.config.family,
                layout.image_shape(),
                e
            );
            e
        })?;
        if &expected != layout {
            warn!(
                "{}: coefficient layout does not match image shape {:?}",
                self.config.family,
                layout.image_shape()
            );
            return Err(ShapeError::LayoutMismatch {
                image_shape: layout.image_shape().to_vec(),
            }
            .into());
        }
        self.engine.adjoint(coeffs)
    }
}

impl<T: Real> LinearOperator<T> for WaveletN<T> {
    type Domain = ArrayD<Complex<T>>;
    type Range = CoefficientSet<T>;

    fn op(&self, x: &Self::Domain) -> Result<Self::Range> {
        WaveletN::op(self, x)
    }

    fn adj_op(&self, y: &Self::Range) -> Result<Self::Domain> {
        WaveletN::adj_op(self, y)
    }
}

fn check_padding(config: &WaveletConfig, supported: &'static [PaddingMode]) -> Result<()> {
    if !supported.contains(&config.padding_mode) {
        return Err(ConfigError::UnsupportedPadding {
            family: config.family.clone(),
            mode: config.padding_mode.to_string(),
            supported: supported.iter().map(|m| m.name()).collect(),
        }
        .into());
    }
    Ok(())
}

fn check_dim(config: &WaveletConfig, supported: &'static [usize]) -> Result<()> {
    if !supported.contains(&config.dim) {
        return Err(ConfigError::UnsupportedDim {
            family: config.family.clone(),
            dim: config.dim,
            supported,
        }
        .into());
    }
    Ok(())
}
