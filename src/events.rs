//! Event detection: the time points and descriptor series that boundary
//! selection consumes.

use crate::beat;
use crate::convert::frames_to_time;
use crate::feature::{Spectrogram, basic};
use crate::onset::{self, OnsetDetectConfig};
use crate::source::Signal;
use serde::{Deserialize, Serialize};

/// Analysis parameters shared by event detection and descriptor extraction.
///
/// # Example
/// ```
/// use segsift::events::AnalysisConfig;
///
/// let config = AnalysisConfig::new().with_hop_length(256).with_n_mfcc(13);
/// assert_eq!(config.n_fft, 2048);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Rate audio is resampled to before analysis
    pub sample_rate: u32,
    pub n_fft: usize,
    pub hop_length: usize,
    /// Number of MFCC coefficients in descriptors
    pub n_mfcc: usize,
    /// Fraction of spectral energy below the rolloff frequency
    pub roll_percent: f32,
    pub onset: OnsetDetectConfig,
}

impl AnalysisConfig {
    pub fn new() -> Self {
        Self {
            sample_rate: crate::io::DEFAULT_SAMPLE_RATE,
            n_fft: 2048,
            hop_length: 512,
            n_mfcc: crate::feature::mfcc::N_MFCC,
            roll_percent: 0.85,
            onset: OnsetDetectConfig::new(),
        }
    }

    pub fn with_sample_rate(mut self, sample_rate: u32) -> Self {
        self.sample_rate = sample_rate;
        self
    }

    pub fn with_n_fft(mut self, n_fft: usize) -> Self {
        self.n_fft = n_fft;
        self
    }

    pub fn with_hop_length(mut self, hop_length: usize) -> Self {
        self.hop_length = hop_length;
        self
    }

    pub fn with_n_mfcc(mut self, n_mfcc: usize) -> Self {
        self.n_mfcc = n_mfcc;
        self
    }

    pub fn with_onset(mut self, onset: OnsetDetectConfig) -> Self {
        self.onset = onset;
        self
    }

    /// Check that every size is usable.
    ///
    /// # Errors
    /// Returns `Error::InvalidSize` or `Error::InvalidParameter` naming the
    /// first offending field.
    pub fn validate(&self) -> crate::Result<()> {
        for (name, value) in [
            ("sample_rate", self.sample_rate as usize),
            ("n_fft", self.n_fft),
            ("hop_length", self.hop_length),
            ("n_mfcc", self.n_mfcc),
        ] {
            if value == 0 {
                return Err(crate::Error::InvalidSize {
                    name,
                    value,
                    reason: "must be > 0",
                });
            }
        }
        if !(self.roll_percent > 0.0 && self.roll_percent < 1.0) {
            return Err(crate::Error::InvalidParameter {
                name: "roll_percent",
                value: self.roll_percent.to_string(),
                reason: "must lie in (0, 1)".into(),
            });
        }
        if !(0.0..=1.0).contains(&self.onset.threshold) {
            return Err(crate::Error::InvalidParameter {
                name: "onset.threshold",
                value: self.onset.threshold.to_string(),
                reason: "must lie in [0, 1]".into(),
            });
        }
        Ok(())
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A time series of one spectral descriptor, one value per analysis frame.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub times: Vec<f64>,
    pub values: Vec<f32>,
}

impl Series {
    pub fn new(times: Vec<f64>, values: Vec<f32>) -> Self {
        debug_assert_eq!(times.len(), values.len());
        Self { times, values }
    }

    pub fn len(&self) -> usize {
        self.times.len().min(self.values.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(time, value)` pairs in frame order.
    pub fn iter(&self) -> impl Iterator<Item = (f64, f32)> + '_ {
        self.times.iter().copied().zip(self.values.iter().copied())
    }
}

/// Everything detected in one signal. Times are in seconds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventSet {
    /// Raw onset peaks
    pub transients: Vec<f64>,
    /// Onsets moved back to the preceding energy minimum
    pub onsets: Vec<f64>,
    pub beats: Vec<f64>,
    /// Estimated tempo in BPM
    pub tempo: f32,
    pub spectral_centroid: Series,
    pub spectral_rolloff: Series,
    pub spectral_bandwidth: Series,
    /// Length of the analyzed signal in seconds
    pub duration: f64,
}

impl EventSet {
    /// An event set without any events, for a signal of `duration` seconds.
    pub fn empty(duration: f64) -> Self {
        Self {
            duration,
            tempo: beat::DEFAULT_TEMPO,
            ..Self::default()
        }
    }
}

/// Detect transients, onsets, beats and spectral descriptor series.
///
/// An empty signal yields an empty event set.
///
/// # Errors
/// Returns `Error::NonFiniteAudio` if the signal holds NaN or infinity, and
/// configuration errors from [`AnalysisConfig::validate`].
///
/// # Example
/// ```
/// use segsift::events::{AnalysisConfig, detect_events};
/// use segsift::{Signal, io};
///
/// let y = io::clicks(&[0.5, 1.0, 1.5], 22050, 44100);
/// let events = detect_events(&Signal::new(y, 22050), &AnalysisConfig::new()).unwrap();
/// assert!(!events.transients.is_empty());
/// ```
pub fn detect_events(signal: &Signal, config: &AnalysisConfig) -> crate::Result<EventSet> {
    config.validate()?;
    if signal.is_empty() {
        log::warn!("empty signal, no events detected");
        return Ok(EventSet::empty(0.0));
    }

    let sr = signal.sample_rate();
    let hop = config.hop_length;
    let spec = Spectrogram::compute(signal.samples(), sr, config.n_fft, hop)?;
    let times = spec.times();

    let envelope = onset::onset_strength(&spec);
    let peaks = onset::onset_detect(&envelope, &config.onset);
    let backtracked = onset::onset_backtrack(&envelope, &peaks, config.onset.backtrack_range);
    let (tempo, beat_frames) = beat::beat_track(&envelope, sr, hop, None);

    let events = EventSet {
        transients: frames_to_time(&peaks, sr, hop),
        onsets: frames_to_time(&backtracked, sr, hop),
        beats: frames_to_time(&beat_frames, sr, hop),
        tempo,
        spectral_centroid: Series::new(times.clone(), basic::spectral_centroid(&spec)),
        spectral_rolloff: Series::new(times.clone(), basic::spectral_rolloff(&spec, config.roll_percent)),
        spectral_bandwidth: Series::new(times, basic::spectral_bandwidth(&spec)),
        duration: signal.duration(),
    };
    log::debug!(
        "detected {} transients, {} onsets, {} beats at {:.1} BPM over {:.2}s",
        events.transients.len(),
        events.onsets.len(),
        events.beats.len(),
        events.tempo,
        events.duration
    );
    Ok(events)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io;

    #[test]
    fn test_clicks_become_transients() {
        let sr = 22050;
        let y = io::clicks(&[0.5, 1.0, 1.5], sr, 2 * sr as usize);
        let events = detect_events(&Signal::new(y, sr), &AnalysisConfig::new()).unwrap();
        assert_eq!(events.transients.len(), 3, "{:?}", events.transients);
        for (t, expected) in events.transients.iter().zip([0.5, 1.0, 1.5]) {
            assert!((t - expected).abs() < 0.06, "transient {t} vs {expected}");
        }
        for (o, t) in events.onsets.iter().zip(&events.transients) {
            assert!(o <= t);
        }
        assert!((events.duration - 2.0).abs() < 1e-9);
        assert_eq!(events.spectral_centroid.len(), events.spectral_rolloff.len());
    }

    #[test]
    fn test_empty_signal() {
        let events = detect_events(&Signal::new(vec![], 22050), &AnalysisConfig::new()).unwrap();
        assert!(events.transients.is_empty());
        assert!(events.spectral_centroid.is_empty());
        assert_eq!(events.duration, 0.0);
    }

    #[test]
    fn test_non_finite_rejected() {
        let signal = Signal::new(vec![0.0, f32::NAN, 0.0], 22050);
        assert!(matches!(
            detect_events(&signal, &AnalysisConfig::new()),
            Err(crate::Error::NonFiniteAudio)
        ));
    }

    #[test]
    fn test_validate() {
        assert!(AnalysisConfig::new().validate().is_ok());
        assert!(AnalysisConfig::new().with_hop_length(0).validate().is_err());
        let mut cfg = AnalysisConfig::new();
        cfg.roll_percent = 1.5;
        assert!(cfg.validate().is_err());
    }
}
