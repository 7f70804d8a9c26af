//! Decoded signals and the sources they are sliced from.

use crate::interval::Interval;
use std::path::{Path, PathBuf};

/// Default silence threshold in dB (RMS energy).
pub const DEFAULT_SILENCE_DB: f32 = -60.0;

/// Mono sample buffer plus sample rate. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl Signal {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds.
    pub fn duration(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }

    /// Copy out the samples covering `[start, end)`, clamped to the signal.
    pub fn slice(&self, interval: &Interval) -> Signal {
        let sr = self.sample_rate as f64;
        let len = self.samples.len();
        let start = ((interval.start().max(0.0) * sr) as usize).min(len);
        let end = ((interval.end().max(0.0) * sr) as usize).clamp(start, len);
        Signal::new(self.samples[start..end].to_vec(), self.sample_rate)
    }

    /// RMS energy in dB (`20 * log10(rms)`), floored at -200 dB.
    pub fn rms_db(&self) -> f32 {
        if self.samples.is_empty() {
            return -200.0;
        }
        let mean_sq =
            self.samples.iter().map(|v| v * v).sum::<f32>() / self.samples.len() as f32;
        (20.0 * mean_sq.sqrt().max(1e-10).log10()).max(-200.0)
    }
}

/// Something a pipeline can pull audio from, one interval at a time.
///
/// Decoding is a pure function of the requested interval, so callers may
/// slice repeatedly without holding the whole signal.
pub trait SignalSource {
    /// Base name used for output directories (the audio file stem).
    fn base_name(&self) -> String;

    /// Sample rate of the slices this source returns.
    fn sample_rate(&self) -> u32;

    /// Decode the samples covering `[start, end)`.
    fn slice(&self, interval: &Interval) -> crate::Result<Signal>;

    /// Whether the RMS energy of the slice falls below `threshold_db`.
    ///
    /// An empty slice counts as silent.
    fn is_silent(&self, interval: &Interval, threshold_db: f32) -> crate::Result<bool> {
        let slice = self.slice(interval)?;
        Ok(slice.is_empty() || slice.rms_db() < threshold_db)
    }
}

/// An audio file decoded per interval.
#[derive(Debug, Clone)]
pub struct AudioFile {
    path: PathBuf,
    sample_rate: u32,
}

impl AudioFile {
    /// Open `path` for analysis at `sample_rate` Hz.
    ///
    /// # Errors
    /// Returns `Error::Io` if the file does not exist.
    pub fn open<P: AsRef<Path>>(path: P, sample_rate: u32) -> crate::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(crate::Error::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("audio file not found: {}", path.display()),
            )));
        }
        Ok(Self { path, sample_rate })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode the whole file.
    pub fn load(&self) -> crate::Result<Signal> {
        crate::io::load_signal(&self.path, Some(self.sample_rate), None, None)
    }
}

impl SignalSource for AudioFile {
    fn base_name(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio".to_string())
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn slice(&self, interval: &Interval) -> crate::Result<Signal> {
        crate::io::load_signal(
            &self.path,
            Some(self.sample_rate),
            Some(interval.start()),
            Some(interval.duration()),
        )
    }
}

/// A signal already held in memory.
#[derive(Debug, Clone)]
pub struct InMemorySource {
    name: String,
    signal: Signal,
}

impl InMemorySource {
    pub fn new(name: impl Into<String>, signal: Signal) -> Self {
        Self {
            name: name.into(),
            signal,
        }
    }

    pub fn signal(&self) -> &Signal {
        &self.signal
    }
}

impl SignalSource for InMemorySource {
    fn base_name(&self) -> String {
        self.name.clone()
    }

    fn sample_rate(&self) -> u32 {
        self.signal.sample_rate()
    }

    fn slice(&self, interval: &Interval) -> crate::Result<Signal> {
        Ok(self.signal.slice(interval))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> InMemorySource {
        let mut y = vec![0.0f32; 1000];
        for v in y.iter_mut().skip(500) {
            *v = 0.5;
        }
        InMemorySource::new("test", Signal::new(y, 1000))
    }

    #[test]
    fn test_slice_bounds() {
        let src = source();
        let s = src.slice(&Interval::new(0.25, 0.75).unwrap()).unwrap();
        assert_eq!(s.samples().len(), 500);

        let past_end = src.slice(&Interval::new(0.9, 3.0).unwrap()).unwrap();
        assert_eq!(past_end.samples().len(), 100);

        let outside = src.slice(&Interval::new(2.0, 3.0).unwrap()).unwrap();
        assert!(outside.is_empty());
    }

    #[test]
    fn test_silence() {
        let src = source();
        let quiet = Interval::new(0.0, 0.5).unwrap();
        let loud = Interval::new(0.5, 1.0).unwrap();
        assert!(src.is_silent(&quiet, DEFAULT_SILENCE_DB).unwrap());
        assert!(!src.is_silent(&loud, DEFAULT_SILENCE_DB).unwrap());
        // Out of range slice is empty, hence silent.
        let outside = Interval::new(5.0, 6.0).unwrap();
        assert!(src.is_silent(&outside, DEFAULT_SILENCE_DB).unwrap());
    }

    #[test]
    fn test_rms_db() {
        let s = Signal::new(vec![1.0; 10], 10);
        assert!(s.rms_db().abs() < 1e-5);
        assert_eq!(Signal::new(vec![], 10).rms_db(), -200.0);
    }

    #[test]
    fn test_audio_file_missing() {
        assert!(AudioFile::open("/nonexistent/file.wav", 22050).is_err());
    }
}
