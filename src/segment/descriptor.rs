//! Fixed-length descriptor vectors summarizing one interval each.

use crate::events::AnalysisConfig;
use crate::feature::{Spectrogram, basic, chroma, contrast, frame_means, mean, mfcc};
use crate::interval::Interval;
use crate::source::SignalSource;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Which descriptor to compute for an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorMode {
    /// Mean spectral centroid followed by mean MFCCs. Used for clustering.
    Short,
    /// Mean MFCCs `c1..=c_n`, chroma and spectral contrast. Used for similarity.
    Long,
}

impl DescriptorMode {
    /// Length of the descriptor for `n_mfcc` coefficients.
    ///
    /// # Example
    /// ```
    /// use segsift::segment::DescriptorMode;
    ///
    /// assert_eq!(DescriptorMode::Short.dim(20), 21);
    /// assert_eq!(DescriptorMode::Long.dim(20), 39);
    /// ```
    pub fn dim(self, n_mfcc: usize) -> usize {
        match self {
            DescriptorMode::Short => 1 + n_mfcc,
            DescriptorMode::Long => n_mfcc + chroma::N_CHROMA + contrast::N_BANDS + 1,
        }
    }
}

/// Compute the descriptor of `interval`, decoding only that slice.
///
/// An empty slice yields a zero vector of the mode's dimension.
///
/// # Errors
/// Decoding errors from the source and `Error::NonFiniteAudio` for corrupt
/// samples.
pub fn extract(
    source: &dyn SignalSource,
    interval: &Interval,
    mode: DescriptorMode,
    config: &AnalysisConfig,
) -> crate::Result<Vec<f32>> {
    let slice = source.slice(interval)?;
    if slice.is_empty() {
        log::debug!("empty slice at {:.3}..{:.3}s, using a zero descriptor", interval.start(), interval.end());
        return Ok(vec![0.0; mode.dim(config.n_mfcc)]);
    }

    let spec = Spectrogram::compute(slice.samples(), slice.sample_rate(), config.n_fft, config.hop_length)?;
    let n = config.n_mfcc;
    let mut out = Vec::with_capacity(mode.dim(n));
    match mode {
        DescriptorMode::Short => {
            out.push(mean(&basic::spectral_centroid(&spec)));
            out.extend(frame_means(&mfcc::mfcc(&spec, n, mfcc::N_MELS)));
        }
        DescriptorMode::Long => {
            // c1..=c_n; c0 is overall level
            let coeffs = frame_means(&mfcc::mfcc(&spec, n + 1, mfcc::N_MELS));
            out.extend(coeffs.into_iter().skip(1));
            out.extend(frame_means(&chroma::chroma(&spec)));
            out.extend(contrast_means(&spec)?);
        }
    }
    Ok(out)
}

/// Mean contrast per band, zero for bands above Nyquist.
fn contrast_means(spec: &Spectrogram) -> crate::Result<Vec<f32>> {
    let mut means = vec![0.0; contrast::N_BANDS + 1];
    let n_bands = contrast::bands_below_nyquist(spec.sr, contrast::FMIN, contrast::N_BANDS);
    if n_bands > 0 {
        let fitted = frame_means(&contrast::spectral_contrast(spec, n_bands, contrast::FMIN)?);
        for (slot, v) in means.iter_mut().zip(fitted) {
            *slot = v;
        }
    }
    Ok(means)
}

/// Descriptors for every interval, one row each.
pub fn extract_batch(
    source: &dyn SignalSource,
    intervals: &[Interval],
    mode: DescriptorMode,
    config: &AnalysisConfig,
) -> crate::Result<Array2<f32>> {
    let dim = mode.dim(config.n_mfcc);
    let mut out = Array2::<f32>::zeros((intervals.len(), dim));
    for (mut row, interval) in out.rows_mut().into_iter().zip(intervals) {
        let descriptor = extract(source, interval, mode, config)?;
        row.assign(&ndarray::ArrayView1::from(&descriptor[..]));
    }
    Ok(out)
}
