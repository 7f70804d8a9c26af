use super::similarity::squared_distance;
use ndarray::Array2;
use std::collections::VecDeque;

/// DBSCAN over the rows of `data` with Euclidean distance.
///
/// A row is a core point when at least `min_samples` rows, itself included,
/// lie within `eps`. Returns one label per row: `Some(cluster)` with clusters
/// numbered in order of discovery, or `None` for noise.
///
/// # Example
/// ```
/// use ndarray::array;
/// use segsift::cluster::dbscan;
///
/// let data = array![[0.0], [0.1], [5.0]];
/// assert_eq!(dbscan(&data, 0.5, 2), vec![Some(0), Some(0), None]);
/// ```
pub fn dbscan(data: &Array2<f32>, eps: f32, min_samples: usize) -> Vec<Option<usize>> {
    let n = data.nrows();
    let eps_sq = eps * eps;
    let neighbours = |i: usize| -> Vec<usize> {
        (0..n)
            .filter(|&j| squared_distance(data.row(i), data.row(j)) <= eps_sq)
            .collect()
    };

    let mut labels: Vec<Option<usize>> = vec![None; n];
    let mut visited = vec![false; n];
    let mut next_cluster = 0;

    for i in 0..n {
        if visited[i] {
            continue;
        }
        visited[i] = true;
        let seeds = neighbours(i);
        if seeds.len() < min_samples {
            continue;
        }

        let cluster = next_cluster;
        next_cluster += 1;
        labels[i] = Some(cluster);
        let mut queue: VecDeque<usize> = seeds.into_iter().collect();
        while let Some(j) = queue.pop_front() {
            if labels[j].is_none() {
                labels[j] = Some(cluster);
            }
            if visited[j] {
                continue;
            }
            visited[j] = true;
            let reach = neighbours(j);
            if reach.len() >= min_samples {
                queue.extend(reach.into_iter().filter(|&r| !visited[r] || labels[r].is_none()));
            }
        }
    }

    labels
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_min_samples_one_has_no_noise() {
        let data = array![[0.0, 0.0], [0.3, 0.0], [4.0, 4.0]];
        assert_eq!(dbscan(&data, 0.5, 1), vec![Some(0), Some(0), Some(1)]);
    }

    #[test]
    fn test_chain_reaches_through_core_points() {
        let data = array![[0.0], [0.4], [0.8], [1.2], [9.0]];
        let labels = dbscan(&data, 0.5, 2);
        assert_eq!(&labels[..4], &[Some(0); 4]);
        assert_eq!(labels[4], None);
    }

    #[test]
    fn test_border_point_joins_but_does_not_expand() {
        // only 0.4 is a core point; 1.35 is out of reach of every core point
        let data = array![[0.0], [0.4], [0.8], [1.35]];
        let labels = dbscan(&data, 0.5, 3);
        assert_eq!(labels, vec![Some(0), Some(0), Some(0), None]);
    }

    #[test]
    fn test_empty() {
        assert!(dbscan(&Array2::zeros((0, 2)), 0.5, 1).is_empty());
    }
}
