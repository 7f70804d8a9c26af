//! Tempo estimation and beat picking over an onset strength envelope.

/// Tempo reported when the envelope is too short to estimate one.
pub const DEFAULT_TEMPO: f32 = 120.0;

/// Configuration for beat tracking.
///
/// # Example
/// ```
/// use segsift::beat::BeatTrackConfig;
///
/// let config = BeatTrackConfig::new(22050).with_start_bpm(Some(100.0));
/// assert_eq!(config.hop_length, 512);
/// ```
#[derive(Debug, Clone)]
pub struct BeatTrackConfig {
    /// Sample rate
    pub sr: u32,
    /// Hop length the envelope was computed with
    pub hop_length: usize,
    /// Tempo to report when estimation is impossible
    pub start_bpm: Option<f32>,
}

impl BeatTrackConfig {
    pub fn new(sr: u32) -> Self {
        Self {
            sr,
            hop_length: 512,
            start_bpm: None,
        }
    }

    /// Set the hop length.
    pub fn with_hop_length(mut self, hop_length: usize) -> Self {
        self.hop_length = hop_length;
        self
    }

    /// Set the fallback tempo.
    pub fn with_start_bpm(mut self, start_bpm: Option<f32>) -> Self {
        self.start_bpm = start_bpm;
        self
    }

    /// Track beats in `onset_envelope` with this configuration.
    pub fn track(&self, onset_envelope: &[f32]) -> (f32, Vec<usize>) {
        beat_track(onset_envelope, self.sr, self.hop_length, self.start_bpm)
    }
}

impl Default for BeatTrackConfig {
    fn default() -> Self {
        Self::new(crate::io::DEFAULT_SAMPLE_RATE)
    }
}

/// Estimate the tempo of an onset envelope and pick one beat per period.
///
/// # Returns
/// (tempo, beat_frames) - tempo in BPM and increasing beat frame indices
pub fn beat_track(
    onset_envelope: &[f32],
    sr: u32,
    hop_length: usize,
    start_bpm: Option<f32>,
) -> (f32, Vec<usize>) {
    if onset_envelope.len() < 2 || hop_length == 0 || sr == 0 {
        return (start_bpm.unwrap_or(DEFAULT_TEMPO), Vec::new());
    }
    let tempo = estimate_tempo_from_onset(onset_envelope, sr, hop_length, start_bpm);
    let beats = find_beats(onset_envelope, tempo, sr, hop_length);
    (tempo, beats)
}

/// Estimate tempo from the envelope autocorrelation, searching 30..240 BPM
/// and clamping the result to 30..300 BPM.
pub fn estimate_tempo_from_onset(
    onset_env: &[f32],
    sr: u32,
    hop_length: usize,
    start_bpm: Option<f32>,
) -> f32 {
    let fallback = start_bpm.unwrap_or(DEFAULT_TEMPO);
    if onset_env.len() < 3 {
        return fallback;
    }

    let frames_per_sec = sr as f32 / hop_length as f32;
    let min_lag = ((frames_per_sec / 4.0) as usize).max(1);
    let max_lag = ((frames_per_sec * 2.0) as usize).min(onset_env.len() / 2);
    if min_lag >= max_lag {
        return fallback;
    }

    let mut best_lag = 0;
    let mut best_score = 0.0f32;
    for lag in min_lag..max_lag {
        let score: f32 = onset_env
            .iter()
            .zip(&onset_env[lag..])
            .map(|(a, b)| a * b)
            .sum();
        if score > best_score {
            best_score = score;
            best_lag = lag;
        }
    }
    if best_lag == 0 {
        return fallback;
    }

    let period_sec = best_lag as f32 / frames_per_sec;
    (60.0 / period_sec).clamp(30.0, 300.0)
}

/// Walk the envelope one beat period at a time, snapping each step to the
/// strongest frame within half a period.
///
/// Steps whose strongest frame is below 10% of the global maximum are skipped.
fn find_beats(onset_env: &[f32], tempo: f32, sr: u32, hop_length: usize) -> Vec<usize> {
    let period_frames = ((60.0 * sr as f32) / (tempo * hop_length as f32)).round() as usize;
    if onset_env.is_empty() || period_frames == 0 {
        return Vec::new();
    }

    let global_max = onset_env.iter().copied().fold(0.0f32, f32::max);
    if global_max <= 0.0 {
        return Vec::new();
    }
    let half = (period_frames / 2).max(1);
    let argmax = |lo: usize, hi: usize| {
        (lo..hi)
            .max_by(|&a, &b| onset_env[a].total_cmp(&onset_env[b]).then(b.cmp(&a)))
            .unwrap_or(lo)
    };

    let first = argmax(0, half.min(onset_env.len()));
    let mut beats = vec![first];
    let mut pos = first + period_frames;
    while pos < onset_env.len() {
        let lo = pos.saturating_sub(half);
        let hi = (pos + half).min(onset_env.len());
        let best = argmax(lo, hi);
        let last = beats.last().copied().unwrap_or(0);
        if onset_env[best] > global_max * 0.1 && best > last {
            beats.push(best);
        }
        pos += period_frames;
    }

    beats
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pulse_train(period: usize, len: usize) -> Vec<f32> {
        (0..len).map(|i| if i % period == 0 { 1.0 } else { 0.0 }).collect()
    }

    #[test]
    fn test_tempo_of_pulse_train() {
        // 120 BPM at 22050 Hz / 512 hop is about 21.5 frames per beat
        let env = pulse_train(22, 400);
        let tempo = estimate_tempo_from_onset(&env, 22050, 512, None);
        assert!((tempo - 117.5).abs() < 3.0, "tempo {tempo}");
    }

    #[test]
    fn test_beats_increasing() {
        let env = pulse_train(22, 400);
        let (_, beats) = beat_track(&env, 22050, 512, None);
        assert!(beats.len() > 10);
        assert!(beats.windows(2).all(|w| w[0] < w[1]));
        assert!(beats.iter().all(|b| b % 22 == 0));
    }

    #[test]
    fn test_degenerate_envelopes() {
        assert_eq!(beat_track(&[], 22050, 512, None), (DEFAULT_TEMPO, vec![]));
        let (tempo, beats) = beat_track(&[0.0; 64], 22050, 512, Some(90.0));
        assert_eq!(tempo, 90.0);
        assert!(beats.is_empty());
    }
}
