//! Linear operators for compressed-sensing MRI reconstruction.
//!
//! The central piece is [`WaveletN`], a multiscale wavelet transform over 2D or
//! 3D complex images whose `adj_op` is the exact adjoint of `op`. The gradient
//! operators in [`gradient`] compose it with an [`ImagingModel`] (masked
//! Fourier sampling, optionally weighted by coil sensitivities) so that an
//! iterative solver can minimise a least-squares data-fidelity term.

use num_traits::{Float, NumAssign};
use rustfft::FftNum;
use std::iter::Sum;

pub mod config;
pub mod dwt;
pub mod dwtn;
pub mod error;
pub mod fixed;
pub mod fourier;
pub mod gradient;
pub mod layout;
pub mod operator;
pub mod parallel;
mod utils;
pub mod wavelet;

pub use config::{PaddingMode, WaveletConfig};
pub use dwt::w_max_level;
pub use error::{ConfigError, Error, Result, ShapeError};
pub use fourier::{FourierMask, ImagingModel};
pub use gradient::{
    GradAnalysis, GradParallelAnalysis, GradParallelSynthesis, GradSynthesis, Gradient,
};
pub use layout::{describe, BandSpec, CoefficientSet, Layout, Subband};
pub use operator::{LinearOperator, WaveletN};
pub use parallel::SensitivityModel;

/// Scalar type of the real and imaginary parts of every array in this crate.
pub trait Real: FftNum + Float + NumAssign + Sum {}

impl<T> Real for T where T: FftNum + Float + NumAssign + Sum {}
