/// Configuration for onset peak picking.
///
/// # Example
/// ```
/// use segsift::onset::OnsetDetectConfig;
///
/// let config = OnsetDetectConfig::new().with_threshold(0.2).with_wait(2);
/// assert_eq!(config.wait, 2);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct OnsetDetectConfig {
    /// Minimum normalized envelope value for a peak
    pub threshold: f32,
    /// Minimum number of frames between consecutive onsets
    pub wait: usize,
    /// Frames to search backward when backtracking to an energy minimum
    pub backtrack_range: usize,
}

impl OnsetDetectConfig {
    pub fn new() -> Self {
        Self {
            threshold: 0.1,
            wait: 1,
            backtrack_range: 3,
        }
    }

    /// Set the peak-picking threshold.
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the minimum gap between onsets, in frames.
    pub fn with_wait(mut self, wait: usize) -> Self {
        self.wait = wait;
        self
    }

    /// Set the backtracking search range, in frames.
    pub fn with_backtrack_range(mut self, range: usize) -> Self {
        self.backtrack_range = range;
        self
    }
}

impl Default for OnsetDetectConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Pick onset frames from an onset strength envelope.
///
/// The envelope is normalized to a maximum of 1; a frame is an onset when it
/// exceeds `threshold`, is a local maximum, and lies at least `wait` frames
/// after the previous onset. A flat envelope has no onsets.
pub fn onset_detect(envelope: &[f32], config: &OnsetDetectConfig) -> Vec<usize> {
    let max = envelope.iter().copied().fold(0.0f32, f32::max);
    if envelope.len() < 3 || max <= 1e-10 {
        return Vec::new();
    }

    let mut peaks: Vec<usize> = Vec::new();
    for i in 1..envelope.len() - 1 {
        let v = envelope[i] / max;
        let is_peak = envelope[i] >= envelope[i - 1] && envelope[i] > envelope[i + 1];
        let far_enough = peaks.last().is_none_or(|&p| i - p >= config.wait);
        if v > config.threshold && is_peak && far_enough {
            peaks.push(i);
        }
    }
    peaks
}

/// Move each onset back to the lowest envelope value within `search_range`
/// frames before it.
///
/// # Returns
/// Refined onset frame indices, sorted and de-duplicated
pub fn onset_backtrack(envelope: &[f32], events: &[usize], search_range: usize) -> Vec<usize> {
    let mut refined: Vec<usize> = events
        .iter()
        .map(|&event| {
            if event >= envelope.len() {
                return event;
            }
            let start = event.saturating_sub(search_range);
            (start..=event)
                .rev()
                .min_by(|&a, &b| envelope[a].total_cmp(&envelope[b]))
                .unwrap_or(event)
        })
        .collect();
    refined.sort_unstable();
    refined.dedup();
    refined
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_peaks() {
        let env = vec![0.0, 1.0, 0.0, 0.05, 0.0, 0.5, 0.2, 0.0];
        let peaks = onset_detect(&env, &OnsetDetectConfig::new());
        assert_eq!(peaks, vec![1, 5]);
    }

    #[test]
    fn test_detect_wait() {
        let env = vec![0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0];
        let cfg = OnsetDetectConfig::new().with_wait(3);
        assert_eq!(onset_detect(&env, &cfg), vec![1, 5]);
    }

    #[test]
    fn test_detect_flat() {
        assert!(onset_detect(&[0.0; 16], &OnsetDetectConfig::new()).is_empty());
        assert!(onset_detect(&[1.0, 2.0], &OnsetDetectConfig::new()).is_empty());
    }

    #[test]
    fn test_backtrack() {
        let env = vec![0.5, 0.1, 0.3, 0.9, 0.2];
        assert_eq!(onset_backtrack(&env, &[3], 3), vec![1]);
        assert_eq!(onset_backtrack(&env, &[3], 1), vec![2]);
        assert_eq!(onset_backtrack(&env, &[10], 3), vec![10]);
    }
}
