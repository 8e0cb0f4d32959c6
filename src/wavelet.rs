//! Filter banks for the general wavelet engine.

use crate::Real;
use std::fmt::Debug;

/// Access to the four filters of a two-channel filter bank.
pub trait WaveletFilter<T> {
    fn lo_d(&self) -> &[T];
    fn hi_d(&self) -> &[T];
    fn lo_r(&self) -> &[T];
    fn hi_r(&self) -> &[T];
    fn filt_len(&self) -> usize {
        self.lo_d().len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveletType {
    Haar,
    Daubechies2,
    Daubechies3,
    Daubechies4,
    Symlet4,
    Symlet8,
    Coiflet1,
    Biorthogonal2_2,
}

impl WaveletType {
    pub const ALL: [WaveletType; 8] = [
        WaveletType::Haar,
        WaveletType::Daubechies2,
        WaveletType::Daubechies3,
        WaveletType::Daubechies4,
        WaveletType::Symlet4,
        WaveletType::Symlet8,
        WaveletType::Coiflet1,
        WaveletType::Biorthogonal2_2,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            WaveletType::Haar => "haar",
            WaveletType::Daubechies2 => "db2",
            WaveletType::Daubechies3 => "db3",
            WaveletType::Daubechies4 => "db4",
            WaveletType::Symlet4 => "sym4",
            WaveletType::Symlet8 => "sym8",
            WaveletType::Coiflet1 => "coif1",
            WaveletType::Biorthogonal2_2 => "bior2.2",
        }
    }

    /// Looks a family up by name. `db1` is accepted as an alias of `haar`.
    pub fn from_name(name: &str) -> Option<Self> {
        if name == "db1" {
            return Some(WaveletType::Haar);
        }
        Self::ALL.iter().copied().find(|w| w.name() == name)
    }

    pub fn is_orthogonal(&self) -> bool {
        !matches!(self, WaveletType::Biorthogonal2_2)
    }
}

#[derive(Clone, Debug)]
pub struct Wavelet<T> {
    wavelet_type: WaveletType,
    lo_d: Vec<T>,
    hi_d: Vec<T>,
    lo_r: Vec<T>,
    hi_r: Vec<T>,
}

impl<T> Wavelet<T>
where
    T: Real,
{
    pub fn new(wavelet_type: WaveletType) -> Self {
        match wavelet_type {
            WaveletType::Biorthogonal2_2 => Self::bior2_2(),
            orthogonal => Self::from_lo_d(orthogonal, orthogonal_lo_d(orthogonal)),
        }
    }

    pub fn wavelet_type(&self) -> WaveletType {
        self.wavelet_type
    }

    /// Builds an orthogonal bank from its decomposition low-pass filter using
    /// the quadrature mirror relations.
    fn from_lo_d(wavelet_type: WaveletType, lo_d: &[f64]) -> Self {
        let lo_d: Vec<T> = lo_d.iter().map(|&c| cast(c)).collect();
        let lo_r: Vec<T> = lo_d.iter().rev().copied().collect();
        let hi_r: Vec<T> = lo_d
            .iter()
            .enumerate()
            .map(|(k, &c)| if k % 2 == 0 { c } else { -c })
            .collect();
        let hi_d: Vec<T> = hi_r.iter().rev().copied().collect();
        Self {
            wavelet_type,
            lo_d,
            hi_d,
            lo_r,
            hi_r,
        }
    }

    fn bior2_2() -> Self {
        let s = std::f64::consts::SQRT_2;
        let conv = |v: [f64; 6]| v.iter().map(|&c| cast(c)).collect::<Vec<T>>();
        Self {
            wavelet_type: WaveletType::Biorthogonal2_2,
            lo_d: conv([0., -s / 8., s / 4., 3. * s / 4., s / 4., -s / 8.]),
            hi_d: conv([0., s / 4., -s / 2., s / 4., 0., 0.]),
            lo_r: conv([0., s / 4., s / 2., s / 4., 0., 0.]),
            hi_r: conv([0., s / 8., s / 4., -3. * s / 4., s / 4., s / 8.]),
        }
    }
}

impl<T> WaveletFilter<T> for Wavelet<T> {
    fn lo_d(&self) -> &[T] {
        &self.lo_d
    }
    fn hi_d(&self) -> &[T] {
        &self.hi_d
    }
    fn lo_r(&self) -> &[T] {
        &self.lo_r
    }
    fn hi_r(&self) -> &[T] {
        &self.hi_r
    }
}

fn cast<T: Real>(c: f64) -> T {
    // every Real is f32 or f64, both of which represent any f64 (with rounding)
    T::from_f64(c).unwrap_or_else(T::zero)
}

fn orthogonal_lo_d(wavelet_type: WaveletType) -> &'static [f64] {
    match wavelet_type {
        WaveletType::Haar => &HAAR,
        WaveletType::Daubechies2 => &DB2,
        WaveletType::Daubechies3 => &DB3,
        WaveletType::Daubechies4 => &DB4,
        WaveletType::Symlet4 => &SYM4,
        WaveletType::Symlet8 => &SYM8,
        WaveletType::Coiflet1 => &COIF1,
        WaveletType::Biorthogonal2_2 => &[],
    }
}

const HAAR: [f64; 2] = [std::f64::consts::FRAC_1_SQRT_2, std::f64::consts::FRAC_1_SQRT_2];

const DB2: [f64; 4] = [
    -0.1294095225509214464043594716713414527475833892822265625,
    0.2241438680418573470287668669698177836835384368896484375,
    0.836516303737468991386094785411842167377471923828125,
    0.482962913144690253464119678028509952127933502197265625,
];

const DB3: [f64; 6] = [
    0.035226291885709536,
    -0.08544127388202666,
    -0.13501102001025458,
    0.45987750211849154,
    0.8068915093110925,
    0.33267055295008263,
];

const DB4: [f64; 8] = [
    -0.010597401785069032,
    0.0328830116668852,
    0.030841381835560764,
    -0.18703481171909309,
    -0.027983769416859854,
    0.6308807679298589,
    0.7148465705529157,
    0.2303778133088965,
];

const SYM4: [f64; 8] = [
    -0.07576571478927333,
    -0.02963552764599851,
    0.49761866763201545,
    0.8037387518059161,
    0.29785779560527736,
    -0.09921954357684722,
    -0.012603967262037833,
    0.0322231006040427,
];

const SYM8: [f64; 16] = [
    -0.0033824159510061256,
    -0.0005421323317911481,
    0.03169508781149298,
    0.007607487324917605,
    -0.1432942383508097,
    -0.061273359067658524,
    0.4813596512583722,
    0.7771857517005235,
    0.3644418948353314,
    -0.05194583810770904,
    -0.027219029917056003,
    0.049137179673607506,
    0.003808752013890615,
    -0.01495225833704823,
    -0.0003029205147213668,
    0.0018899503327594609,
];

const COIF1: [f64; 6] = [
    -0.01565572813546454,
    -0.0727326195128539,
    0.38486484686420286,
    0.8525720202122554,
    0.3378976624578092,
    -0.0727326195128539,
];
