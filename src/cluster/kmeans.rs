use super::similarity::squared_distance;
use ndarray::{Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used unless another is requested, so repeated runs agree.
pub const DEFAULT_SEED: u64 = 0;

/// K-means clustering with k-means++ initialisation and Lloyd iterations.
///
/// # Example
/// ```
/// use ndarray::array;
/// use segsift::cluster::KMeans;
///
/// let data = array![[0.0, 0.0], [0.1, 0.0], [5.0, 5.0], [5.1, 5.0]];
/// let fit = KMeans::new(2).fit(&data);
/// assert_eq!(fit.labels[0], fit.labels[1]);
/// assert_ne!(fit.labels[0], fit.labels[2]);
/// ```
#[derive(Debug, Clone)]
pub struct KMeans {
    pub n_clusters: usize,
    pub max_iter: usize,
    pub seed: u64,
}

/// Result of a k-means run.
#[derive(Debug, Clone)]
pub struct KMeansFit {
    /// Cluster index of each row
    pub labels: Vec<usize>,
    /// One centroid per cluster, shape (k, n_features)
    pub centroids: Array2<f32>,
}

impl KMeansFit {
    /// Number of clusters actually fitted.
    pub fn n_clusters(&self) -> usize {
        self.centroids.nrows()
    }

    /// Row indices assigned to `cluster`, ascending.
    pub fn members(&self, cluster: usize) -> Vec<usize> {
        self.labels
            .iter()
            .enumerate()
            .filter(|&(_, &l)| l == cluster)
            .map(|(i, _)| i)
            .collect()
    }
}

impl KMeans {
    pub fn new(n_clusters: usize) -> Self {
        Self {
            n_clusters,
            max_iter: 300,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Cluster the rows of `data`.
    ///
    /// The number of clusters is clamped to the number of rows; empty input
    /// gives no labels and no centroids.
    pub fn fit(&self, data: &Array2<f32>) -> KMeansFit {
        let n = data.nrows();
        let k = self.n_clusters.min(n);
        if k < self.n_clusters {
            log::debug!("k-means: clamping k from {} to {}", self.n_clusters, k);
        }
        if k == 0 {
            return KMeansFit {
                labels: Vec::new(),
                centroids: Array2::zeros((0, data.ncols())),
            };
        }

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut centroids = init_plus_plus(data, k, &mut rng);
        let mut labels = vec![usize::MAX; n];

        for iteration in 0..self.max_iter.max(1) {
            let assigned: Vec<usize> = data.rows().into_iter().map(|row| nearest(row, &centroids).0).collect();
            if assigned == labels {
                log::debug!("k-means converged after {iteration} iterations");
                break;
            }
            labels = assigned;

            let mut sums = Array2::<f32>::zeros(centroids.raw_dim());
            let mut counts = vec![0usize; k];
            for (row, &c) in data.rows().into_iter().zip(&labels) {
                counts[c] += 1;
                let mut sum = sums.row_mut(c);
                sum += &row;
            }
            for c in 0..k {
                if counts[c] > 0 {
                    let mean = sums.row(c).mapv(|v| v / counts[c] as f32);
                    centroids.row_mut(c).assign(&mean);
                } else {
                    // Re-seed an empty cluster with the point farthest from its centroid.
                    let far = farthest_point(data, &centroids, &labels);
                    centroids.row_mut(c).assign(&data.row(far));
                    labels[far] = c;
                }
            }
        }

        KMeansFit { labels, centroids }
    }
}

/// Index of and squared distance to the closest centroid; ties go to the
/// lowest index.
fn nearest<'a>(point: ArrayView1<'a, f32>, centroids: &'a Array2<f32>) -> (usize, f32) {
    centroids
        .rows()
        .into_iter()
        .enumerate()
        .map(|(c, centroid)| (c, squared_distance(point, centroid)))
        .fold((0, f32::INFINITY), |best, cur| if cur.1 < best.1 { cur } else { best })
}

fn farthest_point(data: &Array2<f32>, centroids: &Array2<f32>, labels: &[usize]) -> usize {
    let mut best = (0, -1.0f32);
    for (i, row) in data.rows().into_iter().enumerate() {
        let d = labels
            .get(i)
            .and_then(|&l| (l < centroids.nrows()).then(|| squared_distance(row, centroids.row(l))))
            .unwrap_or(0.0);
        if d > best.1 {
            best = (i, d);
        }
    }
    best.0
}

/// k-means++ seeding: each new centre is drawn with probability proportional
/// to its squared distance from the nearest chosen centre.
fn init_plus_plus(data: &Array2<f32>, k: usize, rng: &mut StdRng) -> Array2<f32> {
    let n = data.nrows();
    let mut chosen = vec![rng.gen_range(0..n)];
    let mut dist: Vec<f32> = data
        .rows()
        .into_iter()
        .map(|row| squared_distance(row, data.row(chosen[0])))
        .collect();

    while chosen.len() < k {
        let total: f64 = dist.iter().map(|&d| d as f64).sum();
        let next = if total > 0.0 {
            let target = rng.r#gen::<f64>() * total;
            let mut acc = 0.0f64;
            let mut pick = dist.iter().rposition(|&d| d > 0.0).unwrap_or(n - 1);
            for (i, &d) in dist.iter().enumerate() {
                acc += d as f64;
                if acc > target && d > 0.0 {
                    pick = i;
                    break;
                }
            }
            pick
        } else {
            // All remaining points coincide with a centre; take the first unused one.
            (0..n).find(|i| !chosen.contains(i)).unwrap_or(0)
        };
        chosen.push(next);
        for (d, row) in dist.iter_mut().zip(data.rows()) {
            *d = d.min(squared_distance(row, data.row(next)));
        }
    }

    data.select(Axis(0), &chosen)
}
