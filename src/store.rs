//! Writing representative intervals to disk.
//!
//! Layout: `<root>/<base>_segmented/<cluster_K | unclustered>/seg<N>_freq<Hz>_note<Name>.wav`
//! with `N` counting from 1 in ascending start order and `Hz` truncated.

use crate::convert::hz_to_note_name;
use crate::events::AnalysisConfig;
use crate::feature::{Spectrogram, basic, mean};
use crate::interval::{ClusterAssignment, Interval};
use crate::source::{Signal, SignalSource};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Directory name used when no cluster labels are given.
pub const UNCLUSTERED_DIR: &str = "unclustered";

/// One exported segment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    /// 1-based position in start order
    pub index: usize,
    pub interval: Interval,
    /// Mean spectral centroid of the slice in Hz
    pub dominant_frequency_hz: f32,
    pub note_name: String,
    /// Cluster id, `None` in the flat layout
    pub cluster: Option<usize>,
    pub path: PathBuf,
}

/// Exports intervals of a source as WAV files under a root directory.
#[derive(Debug, Clone)]
pub struct SegmentStore {
    root: PathBuf,
    analysis: AnalysisConfig,
}

impl SegmentStore {
    /// A store writing below `root`.
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            analysis: AnalysisConfig::new(),
        }
    }

    /// Use `analysis` for the dominant-frequency estimate.
    pub fn with_analysis(mut self, analysis: AnalysisConfig) -> Self {
        self.analysis = analysis;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory all segments of `source` go under.
    pub fn output_dir(&self, source: &dyn SignalSource) -> PathBuf {
        self.root.join(format!("{}_segmented", source.base_name()))
    }

    /// Save every interval and return how many files were written.
    ///
    /// # Errors
    /// See [`SegmentStore::save_records`].
    pub fn save(
        &self,
        source: &dyn SignalSource,
        intervals: &[Interval],
        assignment: &ClusterAssignment,
    ) -> crate::Result<usize> {
        Ok(self.save_records(source, intervals, assignment)?.len())
    }

    /// Save every interval, returning a record per written file.
    ///
    /// Intervals are written in ascending start order; cluster labels follow
    /// their intervals. Inputs are not modified.
    ///
    /// # Errors
    /// Returns `Error::ShapeMismatch` when a clustered assignment does not
    /// have one label per interval, and decode or write errors otherwise.
    pub fn save_records(
        &self,
        source: &dyn SignalSource,
        intervals: &[Interval],
        assignment: &ClusterAssignment,
    ) -> crate::Result<Vec<SegmentRecord>> {
        assignment.check_len(intervals.len())?;

        let mut order: Vec<usize> = (0..intervals.len()).collect();
        order.sort_by(|&a, &b| {
            intervals[a]
                .start()
                .total_cmp(&intervals[b].start())
                .then(intervals[a].end().total_cmp(&intervals[b].end()))
        });

        let base = self.output_dir(source);
        let mut records = Vec::with_capacity(intervals.len());
        for (n, &i) in order.iter().enumerate() {
            let interval = intervals[i];
            let cluster = match assignment {
                ClusterAssignment::Unclustered => None,
                ClusterAssignment::Clustered(labels) => Some(labels[i]),
            };
            let slice = source.slice(&interval)?;
            let freq = self.dominant_frequency(&slice)?;
            let note = hz_to_note_name(freq);

            let dir = base.join(cluster_dir_name(cluster));
            std::fs::create_dir_all(&dir)?;
            let path = dir.join(segment_file_name(n + 1, freq, note));
            if slice.is_empty() {
                log::warn!("segment {} at {:.3}s decoded to no samples", n + 1, interval.start());
            }
            crate::io::save_wav(&path, slice.samples(), slice.sample_rate())?;
            log::debug!("wrote {}", path.display());

            records.push(SegmentRecord {
                index: n + 1,
                interval,
                dominant_frequency_hz: freq,
                note_name: note.to_string(),
                cluster,
                path,
            });
        }
        log::info!("saved {} segments under {}", records.len(), base.display());
        Ok(records)
    }

    /// Mean spectral centroid of the slice, 0.0 when it is empty.
    fn dominant_frequency(&self, slice: &Signal) -> crate::Result<f32> {
        if slice.is_empty() {
            return Ok(0.0);
        }
        let spec = Spectrogram::compute(
            slice.samples(),
            slice.sample_rate(),
            self.analysis.n_fft,
            self.analysis.hop_length,
        )?;
        Ok(mean(&basic::spectral_centroid(&spec)))
    }
}

/// `cluster_K` or `unclustered`.
pub fn cluster_dir_name(cluster: Option<usize>) -> String {
    match cluster {
        Some(k) => format!("cluster_{k}"),
        None => UNCLUSTERED_DIR.to_string(),
    }
}

/// `seg<N>_freq<Hz>_note<Name>.wav` with the frequency truncated.
///
/// # Example
/// ```
/// use segsift::store::segment_file_name;
///
/// assert_eq!(segment_file_name(3, 440.7, "A"), "seg3_freq440_noteA.wav");
/// ```
pub fn segment_file_name(index: usize, frequency_hz: f32, note: &str) -> String {
    let hz = if frequency_hz.is_finite() && frequency_hz > 0.0 {
        frequency_hz.trunc() as u64
    } else {
        0
    };
    format!("seg{index}_freq{hz}_note{note}.wav")
}
