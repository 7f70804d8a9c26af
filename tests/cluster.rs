use ndarray::array;
use segsift::cluster::reduce::{select_representatives, similarity_sweep};
use segsift::cluster::{PartitionConfig, cosine_similarity, density_reduce, organize, partition_reduce, variance};
use segsift::events::AnalysisConfig;
use segsift::source::{InMemorySource, Signal};
use segsift::{ClusterAssignment, Interval, io};

const SR: u32 = 22050;

/// One second each of the given tones, with `None` for silence.
fn tones(freqs: &[Option<f32>]) -> InMemorySource {
    let mut y = Vec::new();
    for f in freqs {
        match f {
            Some(hz) => y.extend(io::tone(*hz, SR, 1.0)),
            None => y.extend(vec![0.0f32; SR as usize]),
        }
    }
    InMemorySource::new("tones", Signal::new(y, SR))
}

fn seconds(n: usize) -> Vec<Interval> {
    (0..n).map(|i| Interval::new(i as f64, i as f64 + 1.0).unwrap()).collect()
}

#[test]
fn k_is_clamped_to_audible_candidates() {
    let source = tones(&[Some(220.0), None, Some(1500.0), Some(6000.0)]);
    let candidates = seconds(4);
    let config = PartitionConfig::new(5);
    assert_eq!(config.similarity_threshold, 0.85);
    let reps = partition_reduce(&source, &candidates, &config, &AnalysisConfig::new()).unwrap();
    let starts: Vec<f64> = reps.iter().map(|iv| iv.start()).collect();
    assert_eq!(starts, vec![0.0, 2.0, 3.0]);
}

#[test]
fn distinct_tones_stay_apart_under_default_threshold() {
    let source = tones(&[Some(220.0), Some(1500.0), Some(6000.0)]);
    let long = segsift::segment::extract_batch(
        &source,
        &seconds(3),
        segsift::segment::DescriptorMode::Long,
        &AnalysisConfig::new(),
    )
    .unwrap();
    for (a, b) in [(0, 1), (0, 2), (1, 2)] {
        let sim = cosine_similarity(&long.row(a).to_vec(), &long.row(b).to_vec()).unwrap();
        assert!(sim < 0.85, "tones {a} and {b} have similarity {sim}");
    }
}

#[test]
fn partition_reduce_never_grows() {
    let source = tones(&[Some(220.0), Some(230.0), Some(1500.0), Some(1480.0), Some(6000.0)]);
    let candidates = seconds(5);
    for k in 1..=7 {
        let config = PartitionConfig::new(k);
        let reps = partition_reduce(&source, &candidates, &config, &AnalysisConfig::new()).unwrap();
        assert!(reps.len() <= candidates.len());
        assert!(reps.len() <= k);
        assert!(reps.windows(2).all(|w| w[0].start() < w[1].start()));
    }
}

#[test]
fn variance_decides_between_similar_segments() {
    let b1 = (1.0f32 - 0.81).sqrt();
    // row 0 has variance 0.25, row 1 about 0.054, cosine 0.9
    let long = array![[1.0, 0.0], [0.9, b1]];
    assert!(variance(&[1.0, 0.0]) > variance(&[0.9, b1]));
    let sim = cosine_similarity(&[1.0, 0.0], &[0.9, b1]).unwrap();
    assert!((sim - 0.9).abs() < 1e-5);

    assert_eq!(similarity_sweep(&[0, 1], &long, 0.85), vec![0]);
    assert_eq!(similarity_sweep(&[1, 0], &long, 0.85), vec![0]);
}

#[test]
fn representatives_are_nearest_to_centroids() {
    // two tight groups; the middle member of each is nearest its centroid
    let short = array![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0], [20.0, 0.0], [21.0, 0.0], [22.0, 0.0]];
    let long = array![[1.0, 0.0], [1.0, 0.0], [1.0, 0.0], [0.0, 1.0], [0.0, 1.0], [0.0, 1.0]];
    let mut kept = select_representatives(&short, &long, &PartitionConfig::new(2));
    kept.sort_unstable();
    assert_eq!(kept, vec![1, 4]);
}

#[test]
fn zero_candidates_give_empty_results() {
    let source = tones(&[Some(440.0)]);
    let analysis = AnalysisConfig::new();
    assert!(partition_reduce(&source, &[], &PartitionConfig::new(3), &analysis).unwrap().is_empty());
    assert!(density_reduce(&source, &[], 0.5, 1, &analysis).unwrap().is_empty());
    assert_eq!(
        organize(&source, &[], 3, &analysis).unwrap(),
        ClusterAssignment::Clustered(vec![])
    );
}

#[test]
fn density_reduce_merges_similar_segments() {
    let source = tones(&[Some(300.0), Some(300.0), Some(4000.0)]);
    let candidates = seconds(3);
    let merged = density_reduce(&source, &candidates, 0.5, 1, &AnalysisConfig::new()).unwrap();
    let bounds: Vec<(f64, f64)> = merged.iter().map(|iv| (iv.start(), iv.end())).collect();
    assert_eq!(bounds, vec![(0.0, 2.0), (2.0, 3.0)]);
}

#[test]
fn density_noise_points_stay_singletons() {
    let source = tones(&[Some(300.0), Some(1200.0), Some(4000.0)]);
    let candidates = seconds(3);
    let merged = density_reduce(&source, &candidates, 0.01, 2, &AnalysisConfig::new()).unwrap();
    assert_eq!(merged, candidates);
}

#[test]
fn organize_labels_every_candidate() {
    let source = tones(&[Some(250.0), Some(260.0), Some(5000.0), Some(5100.0)]);
    let candidates = seconds(4);
    let assignment = organize(&source, &candidates, 2, &AnalysisConfig::new()).unwrap();
    let ClusterAssignment::Clustered(labels) = assignment else {
        panic!("expected labels");
    };
    assert_eq!(labels.len(), 4);
    assert_eq!(labels[0], labels[1]);
    assert_eq!(labels[2], labels[3]);
    assert_ne!(labels[0], labels[2]);
}
