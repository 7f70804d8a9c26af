//! End-to-end segmentation driven by one immutable configuration.

use crate::cluster::{self, PartitionConfig};
use crate::events::{AnalysisConfig, EventSet, detect_events};
use crate::interval::{ClusterAssignment, Interval};
use crate::segment::{Policy, segment_all, select_boundaries};
use crate::source::{AudioFile, DEFAULT_SILENCE_DB, SignalSource};
use crate::store::{SegmentRecord, SegmentStore};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// How candidates are reduced before saving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reduction {
    /// Keep every candidate.
    #[default]
    None,
    /// DBSCAN, merging each cluster into one interval.
    Density,
    /// K-means representatives with cosine-similarity deduplication.
    Partition,
}

/// Every parameter of a pipeline run.
///
/// # Example
/// ```
/// use segsift::pipeline::{PipelineConfig, Reduction};
/// use segsift::segment::Policy;
///
/// let config = PipelineConfig::new()
///     .with_policy(Some(Policy::Beats))
///     .with_reduction(Reduction::Partition)
///     .with_n_clusters(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Boundary policy; `None` merges every event kind into one timeline
    pub policy: Option<Policy>,
    /// Shortest candidate kept, in seconds
    pub min_segment_length: f64,
    /// Centroid rise in Hz that counts as a boundary when merging events
    pub event_merge_threshold: f32,
    /// Drop candidates whose RMS level is below `silence_threshold_db`
    pub check_silence: bool,
    pub silence_threshold_db: f32,
    pub reduction: Reduction,
    /// DBSCAN neighbourhood radius in standardized descriptor units
    pub eps: f32,
    /// DBSCAN core-point size, the point itself included
    pub min_samples: usize,
    /// Requested k for partition reduction and organizing
    pub n_clusters: usize,
    pub similarity_threshold: f32,
    /// Label saved segments by k-means cluster
    pub organize: bool,
    /// Band for the `frequency` policy when parsed by name, in Hz
    pub freq_range: (f32, f32),
    pub analysis: AnalysisConfig,
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self {
            policy: None,
            min_segment_length: 0.1,
            event_merge_threshold: 0.1,
            check_silence: true,
            silence_threshold_db: DEFAULT_SILENCE_DB,
            reduction: Reduction::None,
            eps: 0.5,
            min_samples: 1,
            n_clusters: 8,
            similarity_threshold: 0.85,
            organize: false,
            freq_range: (200.0, 2000.0),
            analysis: AnalysisConfig::new(),
        }
    }

    pub fn with_policy(mut self, policy: Option<Policy>) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_min_segment_length(mut self, seconds: f64) -> Self {
        self.min_segment_length = seconds;
        self
    }

    pub fn with_event_merge_threshold(mut self, hz: f32) -> Self {
        self.event_merge_threshold = hz;
        self
    }

    pub fn with_silence_check(mut self, enabled: bool, threshold_db: f32) -> Self {
        self.check_silence = enabled;
        self.silence_threshold_db = threshold_db;
        self
    }

    pub fn with_reduction(mut self, reduction: Reduction) -> Self {
        self.reduction = reduction;
        self
    }

    pub fn with_density(mut self, eps: f32, min_samples: usize) -> Self {
        self.eps = eps;
        self.min_samples = min_samples;
        self
    }

    pub fn with_n_clusters(mut self, n_clusters: usize) -> Self {
        self.n_clusters = n_clusters;
        self
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_organize(mut self, organize: bool) -> Self {
        self.organize = organize;
        self
    }

    pub fn with_freq_range(mut self, min_hz: f32, max_hz: f32) -> Self {
        self.freq_range = (min_hz, max_hz);
        self
    }

    pub fn with_analysis(mut self, analysis: AnalysisConfig) -> Self {
        self.analysis = analysis;
        self
    }

    /// Parameters for [`cluster::partition_reduce`].
    pub fn partition(&self) -> PartitionConfig {
        PartitionConfig::new(self.n_clusters)
            .with_similarity_threshold(self.similarity_threshold)
            .with_silence_threshold(self.check_silence.then_some(self.silence_threshold_db))
    }

    /// Reject out-of-range parameters.
    ///
    /// # Errors
    /// Returns the first invalid field as `Error::InvalidParameter`,
    /// `Error::InvalidSize` or `Error::InvalidFrequencyRange`.
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |name: &'static str, value: String, reason: &str| crate::Error::InvalidParameter {
            name,
            value,
            reason: reason.to_string(),
        };

        if !(self.min_segment_length.is_finite() && self.min_segment_length >= 0.0) {
            return Err(invalid(
                "min_segment_length",
                self.min_segment_length.to_string(),
                "must be a finite, non-negative number of seconds",
            ));
        }
        if !self.event_merge_threshold.is_finite() {
            return Err(invalid("event_merge_threshold", self.event_merge_threshold.to_string(), "must be finite"));
        }
        if !self.silence_threshold_db.is_finite() {
            return Err(invalid("silence_threshold_db", self.silence_threshold_db.to_string(), "must be finite"));
        }
        if !(self.eps > 0.0 && self.eps.is_finite()) {
            return Err(invalid("eps", self.eps.to_string(), "must be > 0"));
        }
        if self.min_samples == 0 {
            return Err(crate::Error::InvalidSize {
                name: "min_samples",
                value: 0,
                reason: "must be > 0",
            });
        }
        if self.n_clusters == 0 {
            return Err(crate::Error::InvalidSize {
                name: "n_clusters",
                value: 0,
                reason: "must be > 0",
            });
        }
        if !(-1.0..=1.0).contains(&self.similarity_threshold) {
            return Err(invalid(
                "similarity_threshold",
                self.similarity_threshold.to_string(),
                "must lie in [-1, 1]",
            ));
        }
        check_band(self.freq_range.0, self.freq_range.1)?;
        if let Some(Policy::FrequencyRange { min_hz, max_hz }) = self.policy {
            check_band(min_hz, max_hz)?;
        }
        self.analysis.validate()
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn check_band(min_hz: f32, max_hz: f32) -> crate::Result<()> {
    if min_hz.is_finite() && max_hz.is_finite() && 0.0 <= min_hz && min_hz < max_hz {
        return Ok(());
    }
    Err(crate::Error::InvalidFrequencyRange {
        fmin: min_hz,
        fmax: max_hz,
        reason: "need 0 <= min < max".to_string(),
    })
}

/// Read and validate a JSON configuration file. Missing fields take their
/// defaults.
pub fn load_config<P: AsRef<Path>>(path: P) -> crate::Result<PipelineConfig> {
    let content = std::fs::read_to_string(path)?;
    let config: PipelineConfig = serde_json::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

/// Write `config` as pretty-printed JSON.
pub fn save_config<P: AsRef<Path>>(config: &PipelineConfig, path: P) -> crate::Result<()> {
    let content = serde_json::to_string_pretty(config)?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Events and candidates of one file, without reduction or export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub source: String,
    pub events: EventSet,
    pub candidates: Vec<Interval>,
}

/// Outcome of a full run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineReport {
    pub source: String,
    pub duration: f64,
    pub tempo: f32,
    pub candidates: Vec<Interval>,
    pub representatives: Vec<Interval>,
    pub assignment: ClusterAssignment,
    pub saved: Vec<SegmentRecord>,
}

/// Runs segmentation, reduction and export with a fixed configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Segment, reduce and save `path`.
    ///
    /// Segments go under `output_root`, or next to the audio file when it is
    /// `None`.
    ///
    /// # Errors
    /// Invalid configuration, unreadable audio and write failures.
    pub fn run<P: AsRef<Path>>(&self, path: P, output_root: Option<&Path>) -> crate::Result<PipelineReport> {
        self.config.validate()?;
        let file = AudioFile::open(path.as_ref(), self.config.analysis.sample_rate)?;
        let signal = file.load()?;
        let events = detect_events(&signal, &self.config.analysis)?;
        let root = match output_root {
            Some(root) => root.to_path_buf(),
            None => file.path().parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        self.process(&file, &events, &root)
    }

    /// Detect events and candidates in `path` without writing anything.
    pub fn analyze<P: AsRef<Path>>(&self, path: P) -> crate::Result<AnalysisReport> {
        self.config.validate()?;
        let file = AudioFile::open(path.as_ref(), self.config.analysis.sample_rate)?;
        let events = detect_events(&file.load()?, &self.config.analysis)?;
        let candidates = self.segment(&file, &events)?;
        Ok(AnalysisReport {
            source: file.base_name(),
            events,
            candidates,
        })
    }

    /// Run every stage after event detection against `source`.
    pub fn process(&self, source: &dyn SignalSource, events: &EventSet, output_root: &Path) -> crate::Result<PipelineReport> {
        let candidates = self.segment(source, events)?;
        let (representatives, assignment) = self.reduce(source, &candidates)?;
        let store = SegmentStore::new(output_root).with_analysis(self.config.analysis.clone());
        let saved = store.save_records(source, &representatives, &assignment)?;
        Ok(PipelineReport {
            source: source.base_name(),
            duration: events.duration,
            tempo: events.tempo,
            candidates,
            representatives,
            assignment,
            saved,
        })
    }

    /// Candidate intervals under the configured policy.
    pub fn segment(&self, source: &dyn SignalSource, events: &EventSet) -> crate::Result<Vec<Interval>> {
        let threshold_db = self.config.silence_threshold_db;
        let is_silent = |iv: &Interval| source.is_silent(iv, threshold_db);
        let silence: Option<&dyn Fn(&Interval) -> crate::Result<bool>> =
            if self.config.check_silence { Some(&is_silent) } else { None };

        let candidates = match &self.config.policy {
            Some(policy) => select_boundaries(events, policy, self.config.min_segment_length, silence)?,
            None => {
                let merged = segment_all(events, self.config.event_merge_threshold, self.config.min_segment_length);
                match silence {
                    Some(check) => {
                        let mut kept = Vec::with_capacity(merged.len());
                        for iv in merged {
                            if !check(&iv)? {
                                kept.push(iv);
                            }
                        }
                        kept
                    }
                    None => merged,
                }
            }
        };
        if candidates.is_empty() {
            log::warn!("no candidate segments in {}", source.base_name());
        } else {
            log::info!("{} candidate segments", candidates.len());
        }
        Ok(candidates)
    }

    /// Reduce candidates and, when organizing, label the survivors.
    pub fn reduce(
        &self,
        source: &dyn SignalSource,
        candidates: &[Interval],
    ) -> crate::Result<(Vec<Interval>, ClusterAssignment)> {
        let analysis = &self.config.analysis;
        let representatives = match self.config.reduction {
            Reduction::None => candidates.to_vec(),
            Reduction::Density => {
                cluster::density_reduce(source, candidates, self.config.eps, self.config.min_samples, analysis)?
            }
            Reduction::Partition => cluster::partition_reduce(source, candidates, &self.config.partition(), analysis)?,
        };
        let assignment = if self.config.organize {
            cluster::organize(source, &representatives, self.config.n_clusters, analysis)?
        } else {
            ClusterAssignment::Unclustered
        };
        Ok((representatives, assignment))
    }
}
