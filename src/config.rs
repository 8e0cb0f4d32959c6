use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Boundary extension applied to a lane before filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaddingMode {
    /// out-of-range samples are zero
    #[default]
    Zero,
    /// half-sample mirror: ... x1 x0 | x0 x1 ... x(n-1) | x(n-1) x(n-2) ...
    Symmetric,
    /// whole-sample mirror: ... x2 x1 | x0 x1 ... x(n-1) | x(n-2) ...
    Reflect,
    /// periodic wrap with redundant boundary coefficients
    Periodic,
    /// edge samples repeated
    Constant,
    /// periodic wrap producing exactly ceil(n / 2) coefficients per band
    Periodization,
}

impl PaddingMode {
    pub const ALL: [PaddingMode; 6] = [
        PaddingMode::Zero,
        PaddingMode::Symmetric,
        PaddingMode::Reflect,
        PaddingMode::Periodic,
        PaddingMode::Constant,
        PaddingMode::Periodization,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            PaddingMode::Zero => "zero",
            PaddingMode::Symmetric => "symmetric",
            PaddingMode::Reflect => "reflect",
            PaddingMode::Periodic => "periodic",
            PaddingMode::Constant => "constant",
            PaddingMode::Periodization => "periodization",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|m| m.name()).collect()
    }

    /// Maps a virtual (possibly out-of-range) lane index to a real sample index.
    /// `None` means the sample is an implicit zero. `ext_len` is only used by
    /// periodization, where it is the even-padded lane length.
    #[inline]
    pub fn resolve(&self, virtual_idx: isize, sig_len: usize, ext_len: usize) -> Option<usize> {
        let n = sig_len as isize;
        let mut v = virtual_idx;
        match self {
            PaddingMode::Zero => (v >= 0 && v < n).then_some(v as usize),
            PaddingMode::Symmetric => {
                while v < 0 || v >= n {
                    v = if v < 0 { -v - 1 } else { 2 * n - 1 - v };
                }
                Some(v as usize)
            }
            PaddingMode::Reflect => {
                if n == 1 {
                    return Some(0);
                }
                while v < 0 || v >= n {
                    v = if v < 0 { -v } else { 2 * n - 2 - v };
                }
                Some(v as usize)
            }
            PaddingMode::Periodic => Some(v.rem_euclid(n) as usize),
            PaddingMode::Constant => Some(v.clamp(0, n - 1) as usize),
            PaddingMode::Periodization => {
                // odd lanes are padded with a copy of their last sample
                let p = v.rem_euclid(ext_len as isize) as usize;
                Some(p.min(sig_len - 1))
            }
        }
    }
}

impl fmt::Display for PaddingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaddingMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|m| m.name() == s)
            .ok_or_else(|| ConfigError::UnknownPaddingMode {
                mode: s.to_string(),
                supported: Self::names(),
            })
    }
}

/// Named parameters selecting a wavelet operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveletConfig {
    pub family: String,
    pub scale_count: usize,
    #[serde(default = "default_dim")]
    pub dim: usize,
    #[serde(default)]
    pub padding_mode: PaddingMode,
}

fn default_dim() -> usize {
    2
}

impl WaveletConfig {
    pub fn new(family: impl Into<String>, scale_count: usize) -> Self {
        Self {
            family: family.into(),
            scale_count,
            dim: default_dim(),
            padding_mode: PaddingMode::default(),
        }
    }

    pub fn with_dim(mut self, dim: usize) -> Self {
        self.dim = dim;
        self
    }

    pub fn with_padding(mut self, padding_mode: PaddingMode) -> Self {
        self.padding_mode = padding_mode;
        self
    }
}
