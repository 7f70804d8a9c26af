use super::Spectrogram;
use super::mel::melspectrogram;
use crate::spectrum::power_to_db;
use ndarray::Array2;

/// Default number of MFCC coefficients.
pub const N_MFCC: usize = 20;
/// Default number of mel bands feeding the MFCC.
pub const N_MELS: usize = 128;

/// Orthonormal DCT Type-II of `x`, keeping the first `n_out` coefficients.
///
/// # Example
/// ```
/// use segsift::feature::mfcc::dct_type_ii;
///
/// let dct = dct_type_ii(&[1.0, 1.0, 1.0, 1.0], 2);
/// assert!((dct[0] - 2.0).abs() < 1e-6);
/// assert!(dct[1].abs() < 1e-6);
/// ```
pub fn dct_type_ii(x: &[f32], n_out: usize) -> Vec<f32> {
    let n = x.len() as f32;
    if x.is_empty() || n_out == 0 {
        return Vec::new();
    }
    (0..n_out)
        .map(|k| {
            let sum: f32 = x
                .iter()
                .enumerate()
                .map(|(i, v)| v * (std::f32::consts::PI / n * (i as f32 + 0.5) * k as f32).cos())
                .sum();
            let scale = if k == 0 {
                (1.0 / n).sqrt()
            } else {
                (2.0 / n).sqrt()
            };
            sum * scale
        })
        .collect()
}

/// Mel-frequency cepstral coefficients, shape (n_mfcc, n_frames).
///
/// Each frame's mel power spectrum is converted to dB, floored at 80 dB
/// below the frame maximum, then decorrelated with a DCT-II.
pub fn mfcc(spec: &Spectrogram, n_mfcc: usize, n_mels: usize) -> Array2<f32> {
    let mel = melspectrogram(spec, n_mels);
    let n_frames = mel.shape()[1];
    let mut out = Array2::<f32>::zeros((n_mfcc, n_frames));

    for (t, col) in mel.columns().into_iter().enumerate() {
        let mut log_mel: Vec<f32> = col.iter().map(|&p| power_to_db(p, 1.0)).collect();
        let floor = log_mel.iter().copied().fold(f32::NEG_INFINITY, f32::max) - 80.0;
        for v in &mut log_mel {
            *v = v.max(floor);
        }
        for (k, c) in dct_type_ii(&log_mel, n_mfcc).into_iter().enumerate() {
            out[(k, t)] = c;
        }
    }

    out
}
