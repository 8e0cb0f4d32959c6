use thiserror::Error;

/// Errors raised while building an operator. These never occur mid-computation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown wavelet family `{name}`; supported families: {}", .supported.join(", "))]
    UnknownFamily {
        name: String,
        supported: Vec<&'static str>,
    },
    #[error("wavelet family `{family}` does not support dim={dim}; supported: {supported:?}")]
    UnsupportedDim {
        family: String,
        dim: usize,
        supported: &'static [usize],
    },
    #[error("scale count must be 1 or more")]
    ZeroScales,
    #[error("unknown padding mode `{mode}`; supported modes: {}", .supported.join(", "))]
    UnknownPaddingMode {
        mode: String,
        supported: Vec<&'static str>,
    },
    #[error(
        "unsupported padding mode `{mode}` for wavelet family `{family}`; supported modes: {}",
        .supported.join(", ")
    )]
    UnsupportedPadding {
        family: String,
        mode: String,
        supported: Vec<&'static str>,
    },
    #[error(
        "imaging model image shape {model:?} is incompatible with the wavelet operator: {reason}"
    )]
    IncompatibleShapes { model: Vec<usize>, reason: String },
    #[error(
        "observed data shape {found:?} does not match the imaging model data shape {expected:?}"
    )]
    DataShape {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("invalid imaging model: {0}")]
    InvalidModel(String),
}

/// Errors raised by `op`/`adj_op` before any computation takes place.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShapeError {
    #[error("expected an array of rank {expected}, got rank {found}")]
    Rank { expected: usize, found: usize },
    #[error("array has an empty axis: {shape:?}")]
    Empty { shape: Vec<usize> },
    #[error(
        "axis {axis} has length {len} at scale {scale}, shorter than the filter length {filt_len}; \
         reduce the scale count or use periodization"
    )]
    TooShort {
        axis: usize,
        scale: usize,
        len: usize,
        filt_len: usize,
    },
    #[error(
        "axis {axis} has odd length {len} at scale {scale}; \
         the Haar engine needs dyadic extents unless it uses periodization"
    )]
    NotDyadic { axis: usize, scale: usize, len: usize },
    #[error(
        "axis {axis} has length {len} at scale {scale}, narrower than the dilated kernel \
         support {support}; reduce the scale count"
    )]
    SupportTooWide {
        axis: usize,
        scale: usize,
        len: usize,
        support: usize,
    },
    #[error(
        "coefficient layout does not match the layout this operator produces \
         for image shape {image_shape:?}"
    )]
    LayoutMismatch { image_shape: Vec<usize> },
    #[error("band {band} has shape {found:?}, expected {expected:?}")]
    BandShape {
        band: usize,
        expected: Vec<usize>,
        found: Vec<usize>,
    },
    #[error("expected {expected} bands, got {found}")]
    BandCount { expected: usize, found: usize },
    #[error("flat coefficient vector has length {found}, layout needs {expected}")]
    FlatLength { expected: usize, found: usize },
    #[error("array shape {found:?} does not match the expected shape {expected:?}")]
    Mismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
}

pub type Result<T> = std::result::Result<T, Error>;
