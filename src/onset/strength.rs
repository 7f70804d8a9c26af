use crate::feature::Spectrogram;

/// Spectral-flux onset strength: per frame, the sum of positive magnitude
/// increases over the previous frame.
///
/// The first frame is compared against silence.
pub fn onset_strength(spec: &Spectrogram) -> Vec<f32> {
    let n_freq = spec.magnitude.shape()[0];
    let mut prev = vec![0.0f32; n_freq];
    spec.magnitude
        .columns()
        .into_iter()
        .map(|col| {
            let mut flux = 0.0f32;
            for (p, &mag) in prev.iter_mut().zip(col.iter()) {
                flux += (mag - *p).max(0.0);
                *p = mag;
            }
            flux
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_produces_peak() {
        let mut y = vec![0.0f32; 2048];
        y.extend(vec![0.8f32; 2048]);
        let spec = Spectrogram::compute(&y, 22050, 256, 64).unwrap();
        let env = onset_strength(&spec);
        assert_eq!(env.len(), spec.n_frames());
        let peak = env
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        let peak_time = peak as f32 * 64.0;
        assert!((peak_time - 2048.0).abs() <= 256.0, "peak at sample {peak_time}");
    }

    #[test]
    fn test_silence_is_flat() {
        let spec = Spectrogram::compute(&vec![0.0f32; 4096], 22050, 512, 128).unwrap();
        assert!(onset_strength(&spec).iter().all(|&v| v == 0.0));
    }
}
