use super::dbscan::dbscan;
use super::kmeans::{KMeans, KMeansFit};
use super::scale::standardize;
use super::similarity::{cosine_similarity, squared_distance, variance};
use crate::events::AnalysisConfig;
use crate::interval::{ClusterAssignment, Interval, sort_by_start};
use crate::segment::{DescriptorMode, extract_batch};
use crate::source::{DEFAULT_SILENCE_DB, SignalSource};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Parameters of [`partition_reduce`].
///
/// # Example
/// ```
/// use segsift::cluster::PartitionConfig;
///
/// let config = PartitionConfig::new(4).with_similarity_threshold(0.9);
/// assert_eq!(config.n_clusters, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartitionConfig {
    /// Requested number of partitions, clamped to the candidate count
    pub n_clusters: usize,
    /// Cosine similarity above which two representatives are duplicates
    pub similarity_threshold: f32,
    /// Silence threshold in dB for dropping candidates, `None` keeps all
    pub silence_threshold_db: Option<f32>,
}

impl PartitionConfig {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            similarity_threshold: 0.85,
            silence_threshold_db: Some(DEFAULT_SILENCE_DB),
        }
    }

    pub fn with_similarity_threshold(mut self, threshold: f32) -> Self {
        self.similarity_threshold = threshold;
        self
    }

    pub fn with_silence_threshold(mut self, threshold_db: Option<f32>) -> Self {
        self.silence_threshold_db = threshold_db;
        self
    }
}

impl Default for PartitionConfig {
    fn default() -> Self {
        Self::new(8)
    }
}

/// Merge every DBSCAN cluster of the candidates into one interval.
///
/// Short descriptors are standardized over `candidates` and clustered with
/// `eps` and `min_samples`; noise points stay as singleton clusters. Each
/// cluster becomes the span of its members. Clusters are not required to be
/// contiguous in time, so merged spans may overlap or cover gaps.
///
/// # Returns
/// One interval per cluster, sorted by start
pub fn density_reduce(
    source: &dyn SignalSource,
    candidates: &[Interval],
    eps: f32,
    min_samples: usize,
    analysis: &AnalysisConfig,
) -> crate::Result<Vec<Interval>> {
    if candidates.is_empty() {
        log::info!("density reduction: no candidates");
        return Ok(Vec::new());
    }
    let short = standardize(&extract_batch(source, candidates, DescriptorMode::Short, analysis)?);
    let labels = dbscan(&short, eps, min_samples);
    let merged = merge_clusters(candidates, &labels);
    log::info!("density reduction: {} candidates -> {} intervals", candidates.len(), merged.len());
    Ok(merged)
}

/// Span each labelled group of `candidates`; unlabelled ones pass through.
pub fn merge_clusters(candidates: &[Interval], labels: &[Option<usize>]) -> Vec<Interval> {
    let n_labelled = labels.iter().flatten().max().map_or(0, |&m| m + 1);
    let mut groups: Vec<Vec<Interval>> = vec![Vec::new(); n_labelled];
    let mut out = Vec::new();
    for (iv, label) in candidates.iter().zip(labels) {
        match label {
            Some(c) => groups[*c].push(*iv),
            None => out.push(*iv),
        }
    }
    out.extend(groups.iter().filter_map(|g| Interval::span(g)));
    sort_by_start(&mut out);
    out
}

/// Keep the member nearest each k-means centroid, then drop near-duplicate
/// representatives by cosine similarity of their long descriptors.
///
/// Silent candidates are dropped first when `config.silence_threshold_db` is
/// set. The result never holds more intervals than `candidates`.
///
/// # Returns
/// Representatives sorted by start
pub fn partition_reduce(
    source: &dyn SignalSource,
    candidates: &[Interval],
    config: &PartitionConfig,
    analysis: &AnalysisConfig,
) -> crate::Result<Vec<Interval>> {
    let audible = match config.silence_threshold_db {
        Some(db) => {
            let mut kept = Vec::with_capacity(candidates.len());
            for iv in candidates {
                if !source.is_silent(iv, db)? {
                    kept.push(*iv);
                }
            }
            if kept.len() < candidates.len() {
                log::debug!("dropped {} silent candidates", candidates.len() - kept.len());
            }
            kept
        }
        None => candidates.to_vec(),
    };
    if audible.is_empty() {
        log::info!("partition reduction: no audible candidates");
        return Ok(Vec::new());
    }

    let short = extract_batch(source, &audible, DescriptorMode::Short, analysis)?;
    let long = extract_batch(source, &audible, DescriptorMode::Long, analysis)?;
    let mut kept: Vec<Interval> = select_representatives(&short, &long, config)
        .into_iter()
        .map(|i| audible[i])
        .collect();
    sort_by_start(&mut kept);
    log::info!("partition reduction: {} candidates -> {} representatives", candidates.len(), kept.len());
    Ok(kept)
}

/// Row indices of the representatives chosen from precomputed descriptors.
///
/// `short` rows are standardized and clustered; `long` rows are compared
/// during the similarity sweep. Indices come back in sweep order.
pub fn select_representatives(short: &Array2<f32>, long: &Array2<f32>, config: &PartitionConfig) -> Vec<usize> {
    if short.nrows() == 0 {
        return Vec::new();
    }
    let scaled = standardize(short);
    let fit = KMeans::new(config.n_clusters).fit(&scaled);
    let nearest = nearest_to_centroids(&scaled, &fit);
    log::debug!("{} partitions, {} non-empty", fit.n_clusters(), nearest.len());
    similarity_sweep(&nearest, long, config.similarity_threshold)
}

/// For each cluster in index order, the member closest to its centroid.
///
/// Ties go to the lowest row index; empty clusters contribute nothing.
pub fn nearest_to_centroids(data: &Array2<f32>, fit: &KMeansFit) -> Vec<usize> {
    (0..fit.n_clusters())
        .filter_map(|c| {
            let centroid = fit.centroids.row(c);
            fit.members(c)
                .into_iter()
                .map(|i| (i, squared_distance(data.row(i), centroid)))
                .fold(None, |best: Option<(usize, f32)>, cur| match best {
                    Some(b) if b.1 <= cur.1 => Some(b),
                    _ => Some(cur),
                })
                .map(|(i, _)| i)
        })
        .collect()
}

/// Accept representatives one by one, dropping near-duplicates.
///
/// A newcomer conflicts with the most similar accepted row whose cosine
/// similarity exceeds `threshold`. It replaces that row in place when its
/// own descriptor variance is strictly higher and is discarded otherwise.
/// Zero-norm descriptors never conflict.
pub fn similarity_sweep(order: &[usize], long: &Array2<f32>, threshold: f32) -> Vec<usize> {
    let mut accepted: Vec<usize> = Vec::with_capacity(order.len());
    for &r in order {
        let candidate = long.row(r).to_vec();

        let conflict = accepted
            .iter()
            .enumerate()
            .filter_map(|(pos, &a)| {
                let other = long.row(a).to_vec();
                cosine_similarity(&candidate, &other).map(|s| (pos, s))
            })
            .filter(|&(_, s)| s > threshold)
            .fold(None, |best: Option<(usize, f32)>, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            });

        match conflict {
            None => accepted.push(r),
            Some((pos, sim)) => {
                let incumbent = accepted[pos];
                let incumbent_var = variance(&long.row(incumbent).to_vec());
                if variance(&candidate) > incumbent_var {
                    log::debug!("segment {r} replaces {incumbent} (similarity {sim:.3})");
                    accepted[pos] = r;
                } else {
                    log::debug!("segment {r} duplicates {incumbent} (similarity {sim:.3})");
                }
            }
        }
    }
    accepted
}

/// Label every candidate with a k-means partition of its short descriptor.
///
/// Nothing is discarded; the assignment has one id per candidate.
pub fn organize(
    source: &dyn SignalSource,
    candidates: &[Interval],
    n_clusters: usize,
    analysis: &AnalysisConfig,
) -> crate::Result<ClusterAssignment> {
    if candidates.is_empty() {
        return Ok(ClusterAssignment::Clustered(Vec::new()));
    }
    let short = standardize(&extract_batch(source, candidates, DescriptorMode::Short, analysis)?);
    let fit = KMeans::new(n_clusters).fit(&short);
    log::info!("organized {} candidates into {} clusters", candidates.len(), fit.n_clusters());
    Ok(ClusterAssignment::Clustered(fit.labels))
}
