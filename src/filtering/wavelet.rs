//! Discrete wavelet transform and wavelet-threshold denoising.
//!
//! The transform uses symmetric (half-sample) boundary extension. At each level
//! a band of length `n` becomes an approximation and a detail band of length
//! `floor((n + F - 1) / 2)`, where `F` is the filter length. Because of this
//! padding, the reconstruction can be longer than the signal. [`denoise`]
//! truncates its result to the input length.
//!
//! # Example
//!
//! ```rust
//! use ecg_denoise::filtering::wavelet::{wavedec, waverec, Wavelet};
//!
//! let data: Vec<f64> = (0..100).map(|i| (i as f64 * 0.1).sin()).collect();
//! let wavelet: Wavelet = "db4".parse().unwrap();
//! let coeffs = wavedec(&data, wavelet, 3).unwrap();
//! let mut rebuilt = waverec(&coeffs, wavelet).unwrap();
//! rebuilt.truncate(data.len());
//! for (a, b) in data.iter().zip(rebuilt.iter()) {
//!     assert!((a - b).abs() < 1e-10);
//! }
//! ```

use crate::error::{DenoiseError, Result};
use core::fmt;
use core::str::FromStr;
use log::debug;
use nalgebra::DVectorView;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Daubechies reconstruction low-pass filters, db1 to db10.
const DAUBECHIES: [&[f64]; 10] = [
    &[
        0.7071067811865476,
        0.7071067811865476,
    ],
    &[
        0.48296291314453416,
        0.8365163037378079,
        0.2241438680420134,
        -0.12940952255126037,
    ],
    &[
        0.33267055295008263,
        0.8068915093110925,
        0.45987750211849154,
        -0.13501102001025458,
        -0.08544127388202666,
        0.03522629188570953,
    ],
    &[
        0.2303778133088965,
        0.7148465705529157,
        0.6308807679298589,
        -0.027983769416859854,
        -0.18703481171909309,
        0.030841381835560764,
        0.0328830116668852,
        -0.010597401785069032,
    ],
    &[
        0.16010239797419293,
        0.6038292697971896,
        0.7243085284377729,
        0.13842814590132074,
        -0.24229488706638203,
        -0.032244869584638375,
        0.07757149384004572,
        -0.006241490212798274,
        -0.012580751999081999,
        0.0033357252854737712,
    ],
    &[
        0.11154074335010947,
        0.49462389039845306,
        0.7511339080210954,
        0.31525035170919763,
        -0.22626469396543983,
        -0.12976686756726194,
        0.09750160558732304,
        0.027522865530305727,
        -0.03158203931748603,
        0.0005538422011614961,
        0.004777257510945511,
        -0.0010773010853084796,
    ],
    &[
        0.07785205408500918,
        0.3965393194819173,
        0.7291320908462351,
        0.4697822874051931,
        -0.14390600392856498,
        -0.22403618499387498,
        0.07130921926683026,
        0.08061260915108308,
        -0.03802993693501441,
        -0.01657454163066688,
        0.01255099855609984,
        0.0004295779729213665,
        -0.0018016407040474908,
        0.00035371379997452024,
    ],
    &[
        0.05441584224310401,
        0.31287159091429995,
        0.6756307362972898,
        0.5853546836542067,
        -0.015829105256349306,
        -0.2840155429615469,
        0.0004724845739132828,
        0.12874742662047847,
        -0.017369301001807547,
        -0.044088253930794755,
        0.013981027917398282,
        0.008746094047405777,
        -0.004870352993451574,
        -0.00039174037337694705,
        0.0006754494064505693,
        -0.00011747678412476953,
    ],
    &[
        0.038077947363878345,
        0.24383467461259034,
        0.6048231236901112,
        0.6572880780513005,
        0.13319738582500756,
        -0.2932737832791749,
        -0.09684078322297646,
        0.14854074933810638,
        0.03072568147933338,
        -0.06763282906132997,
        0.00025094711483145197,
        0.022361662123679096,
        -0.004723204757751397,
        -0.00428150368246343,
        0.0018476468830562265,
        0.00023038576352319597,
        -0.0002519631889427101,
        3.93473203162716e-05,
    ],
    &[
        0.026670057900555554,
        0.1881768000776915,
        0.5272011889317256,
        0.6884590394536035,
        0.2811723436605775,
        -0.24984642432731538,
        -0.19594627437737705,
        0.12736934033579325,
        0.09305736460357235,
        -0.07139414716639708,
        -0.029457536821875813,
        0.033212674059341,
        0.0036065535669561697,
        -0.010733175483330575,
        0.001395351747052901,
        0.001992405295185056,
        -0.0006858566949597116,
        -0.00011646685512928545,
        9.358867032006959e-05,
        -1.3264202894521244e-05,
    ],
];

/// Orthogonal wavelet basis.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wavelet {
    /// Haar wavelet, identical to db1.
    Haar,
    /// Daubechies wavelet with the given number of vanishing moments (1 to 10).
    Daubechies(u8),
}

impl Wavelet {
    /// Reconstruction low-pass filter.
    pub fn rec_lo(&self) -> Result<&'static [f64]> {
        match *self {
            Wavelet::Haar => Ok(DAUBECHIES[0]),
            Wavelet::Daubechies(n @ 1..=10) => Ok(DAUBECHIES[n as usize - 1]),
            Wavelet::Daubechies(n) => Err(DenoiseError::config(format!(
                "Daubechies order must be between 1 and 10, got {n}"
            ))),
        }
    }

    /// Length of the wavelet filters.
    pub fn filter_len(&self) -> Result<usize> {
        Ok(self.rec_lo()?.len())
    }

    fn filter_bank(&self) -> Result<QmfBank> {
        let rec_lo = self.rec_lo()?.to_vec();
        let dec_lo: Vec<f64> = rec_lo.iter().rev().copied().collect();
        let rec_hi: Vec<f64> = dec_lo
            .iter()
            .enumerate()
            .map(|(k, &h)| if k % 2 == 0 { h } else { -h })
            .collect();
        let dec_hi: Vec<f64> = rec_hi.iter().rev().copied().collect();
        Ok(QmfBank {
            dec_lo,
            dec_hi,
            rec_lo,
            rec_hi,
        })
    }
}

impl FromStr for Wavelet {
    type Err = DenoiseError;

    fn from_str(s: &str) -> Result<Self> {
        let name = s.trim().to_ascii_lowercase();
        if name == "haar" {
            return Ok(Wavelet::Haar);
        }
        let order = name
            .strip_prefix("db")
            .and_then(|n| n.parse::<u8>().ok())
            .ok_or_else(|| DenoiseError::config(format!("Unknown wavelet '{s}'")))?;
        let wavelet = Wavelet::Daubechies(order);
        wavelet.rec_lo()?;
        Ok(wavelet)
    }
}

impl fmt::Display for Wavelet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Wavelet::Haar => write!(f, "haar"),
            Wavelet::Daubechies(n) => write!(f, "db{n}"),
        }
    }
}

/// Quadrature mirror filters of an orthogonal wavelet.
struct QmfBank {
    dec_lo: Vec<f64>,
    dec_hi: Vec<f64>,
    rec_lo: Vec<f64>,
    rec_hi: Vec<f64>,
}

/// Multilevel wavelet coefficients.
///
/// `approximation` is the coarsest low-pass band. `details[0]` is the coarsest
/// detail band and the last entry is the finest.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveletCoefficients {
    pub approximation: Vec<f64>,
    pub details: Vec<Vec<f64>>,
}

/// Deepest useful decomposition level for a signal of `data_len` samples.
///
/// Returns 0 if the signal is shorter than `filter_len - 1`.
pub fn max_level(data_len: usize, filter_len: usize) -> usize {
    if filter_len < 2 || data_len < filter_len - 1 {
        return 0;
    }
    (data_len / (filter_len - 1)).ilog2() as usize
}

/// Sample at `idx` of `data` after half-sample symmetric extension.
fn symmetric_at(data: &[f64], mut idx: isize) -> f64 {
    let n = data.len() as isize;
    loop {
        if idx < 0 {
            idx = -idx - 1;
        } else if idx >= n {
            idx = 2 * n - idx - 1;
        } else {
            return data[idx as usize];
        }
    }
}

/// One analysis step: convolve with both decomposition filters and keep every second output.
fn dwt_step(data: &[f64], bank: &QmfBank) -> (Vec<f64>, Vec<f64>) {
    let f = bank.dec_lo.len();
    let out_len = (data.len() + f - 1) / 2;
    (0..out_len)
        .map(|i| {
            (0..f).fold((0.0, 0.0), |(a, d), j| {
                let x = symmetric_at(data, 2 * i as isize + 1 - j as isize);
                (a + bank.dec_lo[j] * x, d + bank.dec_hi[j] * x)
            })
        })
        .unzip()
}

/// One synthesis step: upsample both bands and convolve with the reconstruction filters.
///
/// Produces `2 * len - F + 2` samples.
fn idwt_step(approx: &[f64], detail: &[f64], bank: &QmfBank) -> Vec<f64> {
    let half = bank.rec_lo.len() / 2;
    let len = approx.len().min(detail.len());
    let mut out = Vec::with_capacity(2 * len);
    for i in half - 1..len {
        let (even, odd) = (0..half).fold((0.0, 0.0), |(even, odd), j| {
            let (a, d) = (approx[i - j], detail[i - j]);
            (
                even + bank.rec_lo[2 * j] * a + bank.rec_hi[2 * j] * d,
                odd + bank.rec_lo[2 * j + 1] * a + bank.rec_hi[2 * j + 1] * d,
            )
        });
        out.push(even);
        out.push(odd);
    }
    out
}

/// Multilevel wavelet decomposition.
///
/// # Errors
///
/// Returns a `Configuration` error if `level` is 0, exceeds
/// [`max_level`] for the data length, or if the wavelet is unknown.
pub fn wavedec(data: &[f64], wavelet: Wavelet, level: usize) -> Result<WaveletCoefficients> {
    let bank = wavelet.filter_bank()?;
    let deepest = max_level(data.len(), bank.dec_lo.len());
    if level == 0 || level > deepest {
        return Err(DenoiseError::config(format!(
            "Decomposition level must be between 1 and {deepest} for {} samples with {wavelet}, got {level}",
            data.len()
        )));
    }
    let mut approximation = data.to_vec();
    let mut details = Vec::with_capacity(level);
    for _ in 0..level {
        let (a, d) = dwt_step(&approximation, &bank);
        details.push(d);
        approximation = a;
    }
    details.reverse();
    Ok(WaveletCoefficients {
        approximation,
        details,
    })
}

/// Multilevel reconstruction from [`wavedec`] coefficients.
///
/// The result may be one sample longer than the decomposed signal.
///
/// # Errors
///
/// Returns a `Configuration` error if the wavelet is unknown.
pub fn waverec(coeffs: &WaveletCoefficients, wavelet: Wavelet) -> Result<Vec<f64>> {
    let bank = wavelet.filter_bank()?;
    Ok(coeffs
        .details
        .iter()
        .fold(coeffs.approximation.clone(), |mut approx, detail| {
            // odd-length bands leave the approximation one sample longer
            if approx.len() == detail.len() + 1 {
                approx.pop();
            }
            idwt_step(&approx, detail, &bank)
        }))
}

/// Soft thresholding: shrinks every value toward zero by `threshold`.
pub fn soft_threshold(data: &[f64], threshold: f64) -> Vec<f64> {
    data.iter()
        .map(|&x| x.signum() * (x.abs() - threshold).max(0.0))
        .collect()
}

/// Wavelet-threshold denoising.
///
/// 1. Decompose into `level` detail bands plus one approximation band.
/// 2. Take the population standard deviation of the coarsest detail band as threshold.
/// 3. Soft-threshold every detail band; the approximation is kept as is.
/// 4. Reconstruct and truncate to the input length.
///
/// # Errors
///
/// Returns a `Configuration` error under the same conditions as [`wavedec`].
pub fn denoise(data: &[f64], wavelet: Wavelet, level: usize) -> Result<Vec<f64>> {
    let WaveletCoefficients {
        approximation,
        details,
    } = wavedec(data, wavelet, level)?;

    let coarsest = DVectorView::from(details[0].as_slice());
    let threshold = coarsest.variance().sqrt();
    debug!("wavelet denoise with {wavelet}, level {level}, threshold {threshold:.6}");

    let thresholded = WaveletCoefficients {
        approximation,
        details: details
            .iter()
            .map(|band| soft_threshold(band, threshold))
            .collect(),
    };
    let mut result = waverec(&thresholded, wavelet)?;
    result.truncate(data.len());
    Ok(result)
}
