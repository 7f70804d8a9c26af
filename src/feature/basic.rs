use super::Spectrogram;

/// Compute the root mean square (RMS) energy of a signal.
///
/// # Example
/// ```
/// use segsift::feature::basic::rms;
///
/// let signal = vec![1.0, 1.0, 1.0, 1.0];
/// assert_eq!(rms(&signal), 1.0);
/// ```
pub fn rms(y: &[f32]) -> f32 {
    if y.is_empty() {
        return 0.0;
    }
    let sum: f32 = y.iter().map(|v| v * v).sum();
    (sum / y.len() as f32).sqrt()
}

/// Spectral centroid (magnitude-weighted mean frequency) of each frame.
///
/// Frames with no energy have a centroid of 0.0.
pub fn spectral_centroid(spec: &Spectrogram) -> Vec<f32> {
    let freqs = spec.frequencies();
    spec.magnitude
        .columns()
        .into_iter()
        .map(|col| {
            let total: f32 = col.sum();
            if total <= 1e-10 {
                return 0.0;
            }
            col.iter().zip(&freqs).map(|(m, f)| m * f).sum::<f32>() / total
        })
        .collect()
}

/// Spectral bandwidth (weighted standard deviation around the centroid).
pub fn spectral_bandwidth(spec: &Spectrogram) -> Vec<f32> {
    let freqs = spec.frequencies();
    let centroids = spectral_centroid(spec);
    spec.magnitude
        .columns()
        .into_iter()
        .zip(centroids)
        .map(|(col, centroid)| {
            let total: f32 = col.sum();
            if total <= 1e-10 {
                return 0.0;
            }
            let var: f32 = col
                .iter()
                .zip(&freqs)
                .map(|(m, f)| (f - centroid).powi(2) * m)
                .sum();
            (var / total).sqrt()
        })
        .collect()
}

/// Spectral rolloff: frequency below which `roll_percent` of the magnitude lies.
pub fn spectral_rolloff(spec: &Spectrogram, roll_percent: f32) -> Vec<f32> {
    let freqs = spec.frequencies();
    let top = freqs.last().copied().unwrap_or(0.0);
    spec.magnitude
        .columns()
        .into_iter()
        .map(|col| {
            let threshold = col.sum() * roll_percent;
            let mut cumsum = 0.0f32;
            for (m, f) in col.iter().zip(&freqs) {
                cumsum += m;
                if cumsum >= threshold {
                    return *f;
                }
            }
            top
        })
        .collect()
}
