//! Spectral features computed from a shared magnitude spectrogram.
//!
//! Every descriptor of a segment (centroid, MFCC, chroma, contrast) is
//! derived from one [`Spectrogram`], so a slice is transformed once.

pub mod basic;
pub mod chroma;
pub mod contrast;
pub mod mel;
pub mod mfcc;

use crate::spectrum::{self, StftConfig};
use ndarray::{Array2, Axis};

/// Magnitude spectrogram of a mono signal together with its framing.
#[derive(Debug, Clone)]
pub struct Spectrogram {
    /// `|STFT|`, shape (n_fft / 2 + 1, n_frames)
    pub magnitude: Array2<f32>,
    pub sr: u32,
    pub n_fft: usize,
    pub hop_length: usize,
}

impl Spectrogram {
    /// Compute the magnitude spectrogram of `y`.
    ///
    /// # Errors
    /// Returns `Error::EmptyAudio` for an empty signal.
    pub fn compute(y: &[f32], sr: u32, n_fft: usize, hop_length: usize) -> crate::Result<Self> {
        let stft = spectrum::stft(y, &StftConfig::new(n_fft, hop_length))?;
        Ok(Self {
            magnitude: spectrum::magnitude(&stft),
            sr,
            n_fft,
            hop_length,
        })
    }

    pub fn n_frames(&self) -> usize {
        self.magnitude.shape()[1]
    }

    /// Power spectrogram `|S|^2`.
    pub fn power(&self) -> Array2<f32> {
        self.magnitude.mapv(|m| m * m)
    }

    /// Frequency in Hz of each row.
    pub fn frequencies(&self) -> Vec<f32> {
        spectrum::fft_frequencies(self.sr, self.n_fft)
    }

    /// Time in seconds of each column (frame centers).
    pub fn times(&self) -> Vec<f64> {
        (0..self.n_frames())
            .map(|t| (t * self.hop_length) as f64 / self.sr as f64)
            .collect()
    }
}

/// Mean over frames of each row of a (n_features, n_frames) matrix.
///
/// A matrix without frames yields zeros.
pub fn frame_means(matrix: &Array2<f32>) -> Vec<f32> {
    match matrix.mean_axis(Axis(1)) {
        Some(means) => means.to_vec(),
        None => vec![0.0; matrix.shape()[0]],
    }
}

/// Mean of a frame series, 0.0 when empty.
pub fn mean(values: &[f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f32>() / values.len() as f32
}
