use super::Spectrogram;
use ndarray::Array2;

/// Convert frequency in Hz to the Slaney mel scale.
///
/// # Example
/// ```
/// use segsift::feature::mel::hz_to_mel;
///
/// let mel = hz_to_mel(440.0);
/// assert!(mel > 6.0 && mel < 7.0);
/// ```
pub fn hz_to_mel(hz: f32) -> f32 {
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1000.0;
    let min_log_mel = min_log_hz / f_sp;
    let logstep = (6.4f32).ln() / 27.0;
    if hz < min_log_hz {
        hz / f_sp
    } else {
        min_log_mel + (hz / min_log_hz).ln() / logstep
    }
}

/// Convert a Slaney mel value back to Hz.
pub fn mel_to_hz(mel: f32) -> f32 {
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1000.0;
    let min_log_mel = min_log_hz / f_sp;
    let logstep = (6.4f32).ln() / 27.0;
    if mel < min_log_mel {
        mel * f_sp
    } else {
        min_log_hz * (logstep * (mel - min_log_mel)).exp()
    }
}

/// `n_mels` frequencies evenly spaced on the mel scale between `fmin` and `fmax`.
pub fn mel_frequencies(n_mels: usize, fmin: f32, fmax: f32) -> Vec<f32> {
    if n_mels == 0 {
        return Vec::new();
    }
    let mel_min = hz_to_mel(fmin.max(0.0));
    let mel_max = hz_to_mel(fmax.max(fmin));
    let step = (mel_max - mel_min) / (n_mels as f32 - 1.0).max(1.0);
    (0..n_mels)
        .map(|i| mel_to_hz(mel_min + step * i as f32))
        .collect()
}

/// Slaney-normalized triangular mel filterbank, shape (n_mels, n_fft / 2 + 1).
///
/// # Example
/// ```
/// use segsift::feature::mel::mel_filterbank;
///
/// let fb = mel_filterbank(22050, 2048, 128, 0.0, 11025.0);
/// assert_eq!(fb.shape(), &[128, 1025]);
/// ```
pub fn mel_filterbank(sr: u32, n_fft: usize, n_mels: usize, fmin: f32, fmax: f32) -> Array2<f32> {
    let n_freq = n_fft / 2 + 1;
    let mut fb = Array2::<f32>::zeros((n_mels, n_freq));
    if n_mels == 0 || n_fft == 0 {
        return fb;
    }

    let fmax = fmax.min(sr as f32 / 2.0).max(fmin);
    let mel_points = mel_frequencies(n_mels + 2, fmin, fmax);
    let fft_freqs = crate::spectrum::fft_frequencies(sr, n_fft);

    for m in 0..n_mels {
        let (lo, center, hi) = (mel_points[m], mel_points[m + 1], mel_points[m + 2]);
        let denom_left = (center - lo).max(1e-8) as f64;
        let denom_right = (hi - center).max(1e-8) as f64;
        let enorm = 2.0 / (hi - lo).max(1e-8) as f64;

        for (k, &freq) in fft_freqs.iter().enumerate() {
            let lower = (freq - lo) as f64 / denom_left;
            let upper = (hi - freq) as f64 / denom_right;
            fb[(m, k)] = (lower.min(upper).max(0.0) * enorm) as f32;
        }
    }

    fb
}

/// Mel power spectrogram, shape (n_mels, n_frames).
pub fn melspectrogram(spec: &Spectrogram, n_mels: usize) -> Array2<f32> {
    let fb = mel_filterbank(spec.sr, spec.n_fft, n_mels, 0.0, spec.sr as f32 / 2.0);
    fb.dot(&spec.power())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_mel_roundtrip() {
        for hz in [0.0f32, 200.0, 999.0, 1000.0, 4000.0, 11025.0] {
            assert_relative_eq!(mel_to_hz(hz_to_mel(hz)), hz, epsilon = 0.05);
        }
    }

    #[test]
    fn test_filterbank_rows_nonzero() {
        let fb = mel_filterbank(22050, 1024, 40, 0.0, 11025.0);
        assert_eq!(fb.shape(), &[40, 513]);
        for row in fb.rows() {
            assert!(row.sum() > 0.0, "mel filter sum should be positive");
        }
    }

    #[test]
    fn test_melspectrogram_shape() {
        let y = vec![0.1f32; 22050];
        let spec = Spectrogram::compute(&y, 22050, 2048, 512).unwrap();
        let mel = melspectrogram(&spec, 128);
        assert_eq!(mel.shape(), &[128, 44]);
    }
}
