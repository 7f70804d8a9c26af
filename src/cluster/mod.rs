//! Reducing candidate intervals to representatives.
//!
//! Two strategies are exposed: [`density_reduce`] merges each DBSCAN cluster
//! into one spanning interval, while [`partition_reduce`] keeps the k-means
//! member nearest each centroid and then drops near-duplicates by cosine
//! similarity. [`organize`] labels every candidate without discarding any.

pub mod dbscan;
pub mod kmeans;
pub mod reduce;
pub mod scale;
pub mod similarity;

pub use dbscan::dbscan;
pub use kmeans::{KMeans, KMeansFit};
pub use reduce::{PartitionConfig, density_reduce, organize, partition_reduce};
pub use scale::standardize;
pub use similarity::{cosine_similarity, variance};
