use super::Spectrogram;
use ndarray::Array2;

/// Default number of octave bands (output has one more row).
pub const N_BANDS: usize = 6;
/// Default lower edge of the first band in Hz.
pub const FMIN: f32 = 200.0;

/// Largest band count, at most `limit`, whose top band starts below Nyquist.
///
/// # Example
/// ```
/// use segsift::feature::contrast::{FMIN, N_BANDS, bands_below_nyquist};
///
/// assert_eq!(bands_below_nyquist(22050, FMIN, N_BANDS), 6);
/// assert_eq!(bands_below_nyquist(8000, FMIN, N_BANDS), 5);
/// ```
pub fn bands_below_nyquist(sr: u32, fmin: f32, limit: usize) -> usize {
    let nyquist = sr as f32 / 2.0;
    if fmin <= 0.0 {
        return 0;
    }
    let mut n = 0;
    while n < limit && fmin * 2.0f32.powi(n as i32) < nyquist {
        n += 1;
    }
    n
}

/// Spectral contrast: peak-to-valley level difference in octave bands.
///
/// # Arguments
/// * `spec` - Magnitude spectrogram
/// * `n_bands` - Number of octave bands above `fmin`
/// * `fmin` - Upper edge of the lowest band (must be > 0)
///
/// # Returns
/// Contrast matrix of shape (n_bands + 1, n_frames) in dB
///
/// # Errors
/// Returns `Error::InvalidSize` if n_bands is 0 and
/// `Error::InvalidFrequencyRange` if fmin <= 0 or the top band passes Nyquist.
pub fn spectral_contrast(spec: &Spectrogram, n_bands: usize, fmin: f32) -> crate::Result<Array2<f32>> {
    if n_bands == 0 {
        return Err(crate::Error::InvalidSize {
            name: "n_bands",
            value: 0,
            reason: "must be > 0",
        });
    }
    let nyquist = spec.sr as f32 / 2.0;
    if fmin <= 0.0 || fmin * 2.0f32.powi(n_bands as i32 - 1) >= nyquist {
        return Err(crate::Error::InvalidFrequencyRange {
            fmin,
            fmax: nyquist,
            reason: "bands must lie in (0, nyquist]".to_string(),
        });
    }

    let freqs = spec.frequencies();
    let n_freq = freqs.len();
    let n_frames = spec.n_frames();

    let mut octa = vec![0.0f32; n_bands + 2];
    for (i, edge) in octa.iter_mut().skip(1).enumerate() {
        *edge = fmin * 2.0f32.powi(i as i32);
    }

    let mut valley = Array2::<f32>::zeros((n_bands + 1, n_frames));
    let mut peak = Array2::<f32>::zeros((n_bands + 1, n_frames));

    for k in 0..=n_bands {
        let (f_low, f_high) = (octa[k], octa[k + 1]);
        let mut idxs: Vec<usize> = (0..n_freq)
            .filter(|&i| freqs[i] >= f_low && freqs[i] <= f_high)
            .collect();
        let Some(&first) = idxs.first() else {
            continue;
        };
        if k > 0 && first > 0 {
            idxs.insert(0, first - 1);
        }
        if k == n_bands {
            let last = idxs.last().copied().unwrap_or(first);
            idxs.extend(last + 1..n_freq);
        }
        let band_size = idxs.len();
        if k < n_bands {
            idxs.pop();
        }
        if idxs.is_empty() {
            continue;
        }

        let q = ((0.02 * band_size as f32).round() as usize).max(1);
        for t in 0..n_frames {
            let mut mags: Vec<f32> = idxs.iter().map(|&f| spec.magnitude[(f, t)]).collect();
            mags.sort_by(|a, b| a.total_cmp(b));
            let take = q.min(mags.len());
            let low = mags.iter().take(take).sum::<f32>() / take as f32;
            let high = mags.iter().rev().take(take).sum::<f32>() / take as f32;
            valley[(k, t)] = low.max(1e-10);
            peak[(k, t)] = high.max(1e-10);
        }
    }

    let to_db = |v: f32| 10.0 * v.max(1e-10).log10();
    let max_db = peak.iter().map(|&p| to_db(p)).fold(f32::NEG_INFINITY, f32::max);
    let min_db = max_db - 80.0;
    let mut out = Array2::<f32>::zeros((n_bands + 1, n_frames));
    for ((idx, p), v) in peak.indexed_iter().zip(valley.iter()) {
        out[idx] = to_db(*p).max(min_db) - to_db(*v).max(min_db);
    }

    Ok(out)
}
