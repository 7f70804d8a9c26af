use super::Spectrogram;
use ndarray::Array2;

/// Number of pitch classes.
pub const N_CHROMA: usize = 12;

/// Convert frequencies (Hz) to fractional octave numbers. A440 is at octave 4.0.
pub fn hz_to_octs(frequencies: &[f32]) -> Vec<f32> {
    let a0 = 440.0 / 16.0;
    frequencies
        .iter()
        .map(|&f| {
            if f > 0.0 {
                (f / a0).log2()
            } else {
                f32::NEG_INFINITY
            }
        })
        .collect()
}

/// Chroma filterbank projecting STFT bins onto pitch classes, starting at C.
///
/// Gaussian bumps per pitch class, L2-normalized per bin, weighted by a
/// Gaussian over octaves centered at octave 5 with a width of 2 octaves.
pub fn chroma_filterbank(sr: u32, n_fft: usize, n_chroma: usize) -> Array2<f32> {
    let n_freq = n_fft / 2 + 1;
    let mut wts = Array2::<f32>::zeros((n_chroma, n_freq));
    if n_fft == 0 || n_chroma == 0 {
        return wts;
    }

    let n_chroma_f = n_chroma as f32;
    let frequencies: Vec<f32> = (1..n_freq)
        .map(|i| i as f32 * sr as f32 / n_fft as f32)
        .collect();
    let mut frqbins: Vec<f32> = hz_to_octs(&frequencies)
        .into_iter()
        .map(|o| o * n_chroma_f)
        .collect();
    // DC gets a made-up position 1.5 octaves below the first bin.
    let dc_bin = frqbins.first().map(|b| b - 1.5 * n_chroma_f).unwrap_or(0.0);
    frqbins.insert(0, dc_bin);

    let widths: Vec<f32> = (0..n_freq)
        .map(|i| match frqbins.get(i + 1) {
            Some(next) => (next - frqbins[i]).max(1.0),
            None => 1.0,
        })
        .collect();

    let half = (n_chroma_f / 2.0).round();
    for chroma in 0..n_chroma {
        for fbin in 0..n_freq {
            let d = ((frqbins[fbin] - chroma as f32 + half + 10.0 * n_chroma_f) % n_chroma_f) - half;
            wts[(chroma, fbin)] = (-0.5 * (2.0 * d / widths[fbin]).powi(2)).exp();
        }
    }

    for fbin in 0..n_freq {
        let norm = wts.column(fbin).iter().map(|w| w * w).sum::<f32>().sqrt().max(1e-10);
        let octave_weight = (-0.5 * ((frqbins[fbin] / n_chroma_f - 5.0) / 2.0).powi(2)).exp();
        for chroma in 0..n_chroma {
            wts[(chroma, fbin)] *= octave_weight / norm;
        }
    }

    // Filters above were built relative to A; roll so row 0 is C.
    let shift = 3 * (n_chroma / 12);
    if shift > 0 && shift < n_chroma {
        let mut rolled = Array2::<f32>::zeros((n_chroma, n_freq));
        for chroma in 0..n_chroma {
            rolled
                .row_mut((chroma + n_chroma - shift) % n_chroma)
                .assign(&wts.row(chroma));
        }
        wts = rolled;
    }

    wts
}

/// Chromagram of shape (12, n_frames), each frame normalized to a maximum of 1.
pub fn chroma(spec: &Spectrogram) -> Array2<f32> {
    let fb = chroma_filterbank(spec.sr, spec.n_fft, N_CHROMA);
    let mut out = fb.dot(&spec.power());
    for mut col in out.columns_mut() {
        let max = col.iter().fold(0.0f32, |m, v| m.max(v.abs()));
        if max > 1e-10 {
            col.mapv_inplace(|v| v / max);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hz_to_octs() {
        let octs = hz_to_octs(&[440.0, 880.0, 0.0]);
        assert!((octs[0] - 4.0).abs() < 1e-5);
        assert!((octs[1] - 5.0).abs() < 1e-5);
        assert_eq!(octs[2], f32::NEG_INFINITY);
    }

    #[test]
    fn test_filterbank_shape() {
        assert_eq!(chroma_filterbank(22050, 2048, 12).shape(), &[12, 1025]);
    }

    #[test]
    fn test_a440_lands_on_a() {
        let y = crate::io::tone(440.0, 22050, 1.0);
        let spec = Spectrogram::compute(&y, 22050, 2048, 512).unwrap();
        let c = chroma(&spec);
        let means = super::super::frame_means(&c);
        let best = means
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        // C, C#, D, D#, E, F, F#, G, G#, A
        assert_eq!(best, 9);
    }
}
