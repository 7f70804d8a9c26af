use segsift::source::{InMemorySource, Signal};
use segsift::convert::hz_to_note_name;
use segsift::store::SegmentStore;
use segsift::{ClusterAssignment, Error, Interval, io};
use std::path::{Path, PathBuf};

fn temp_root(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("segsift_store_{}_{}", name, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    dir
}

fn wav_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .map(|e| e.file_name().to_string_lossy().into_owned())
                .collect()
        })
        .unwrap_or_default();
    names.sort();
    names
}

fn a_then_c() -> InMemorySource {
    let mut y = io::tone(440.0, 22050, 1.0);
    y.extend(io::tone(262.0, 22050, 1.0));
    InMemorySource::new("take1", Signal::new(y, 22050))
}

#[test]
fn clustered_layout() {
    let root = temp_root("clustered");
    let intervals = [Interval::new(0.0, 1.0).unwrap(), Interval::new(1.0, 2.0).unwrap()];
    let store = SegmentStore::new(&root);
    let count = store
        .save(&a_then_c(), &intervals, &ClusterAssignment::Clustered(vec![0, 1]))
        .unwrap();
    assert_eq!(count, 2);

    let base = root.join("take1_segmented");
    assert_eq!(wav_files(&base), vec!["cluster_0", "cluster_1"]);
    let c0 = wav_files(&base.join("cluster_0"));
    let c1 = wav_files(&base.join("cluster_1"));
    assert_eq!(c0.len(), 1);
    assert_eq!(c1.len(), 1);
    assert!(c0[0].starts_with("seg1_freq") && c0[0].ends_with(".wav"), "{}", c0[0]);
    assert!(c1[0].starts_with("seg2_freq") && c1[0].ends_with(".wav"), "{}", c1[0]);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn unclustered_layout_and_records() {
    let root = temp_root("flat");
    let intervals = [Interval::new(0.25, 0.75).unwrap()];
    let records = SegmentStore::new(&root)
        .save_records(&a_then_c(), &intervals, &ClusterAssignment::Unclustered)
        .unwrap();
    assert_eq!(records.len(), 1);
    let record = &records[0];
    assert_eq!(record.index, 1);
    assert_eq!(record.cluster, None);
    assert!(record.dominant_frequency_hz > 300.0 && record.dominant_frequency_hz < 1500.0);
    assert_eq!(record.note_name, hz_to_note_name(record.dominant_frequency_hz));
    let expected = format!(
        "seg1_freq{}_note{}.wav",
        record.dominant_frequency_hz as u64, record.note_name
    );
    assert!(record.path.ends_with(&expected));
    assert_eq!(
        record.path.parent().unwrap(),
        root.join("take1_segmented").join("unclustered")
    );

    let reader = hound::WavReader::open(&record.path).unwrap();
    assert_eq!(reader.spec().sample_rate, 22050);
    assert_eq!(reader.len() as usize, 11025);
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn labels_follow_intervals_into_start_order() {
    let root = temp_root("order");
    let intervals = [Interval::new(1.0, 2.0).unwrap(), Interval::new(0.0, 1.0).unwrap()];
    let assignment = ClusterAssignment::Clustered(vec![7, 3]);
    let records = SegmentStore::new(&root)
        .save_records(&a_then_c(), &intervals, &assignment)
        .unwrap();
    assert_eq!(records[0].interval.start(), 0.0);
    assert_eq!(records[0].cluster, Some(3));
    assert_eq!(records[0].index, 1);
    assert_eq!(records[1].cluster, Some(7));
    assert!(records[1].dominant_frequency_hz < records[0].dominant_frequency_hz);
    // inputs untouched
    assert_eq!(intervals[0].start(), 1.0);
    assert_eq!(assignment, ClusterAssignment::Clustered(vec![7, 3]));
    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn label_count_mismatch_is_rejected() {
    let root = temp_root("mismatch");
    let intervals = [Interval::new(0.0, 1.0).unwrap(), Interval::new(1.0, 2.0).unwrap()];
    let err = SegmentStore::new(&root)
        .save(&a_then_c(), &intervals, &ClusterAssignment::Clustered(vec![0]))
        .unwrap_err();
    assert!(matches!(err, Error::ShapeMismatch { .. }));
    assert!(!root.exists());
}

#[test]
fn empty_slice_is_saved_with_unknown_note() {
    let root = temp_root("empty");
    let intervals = [Interval::new(5.0, 6.0).unwrap()];
    let records = SegmentStore::new(&root)
        .save_records(&a_then_c(), &intervals, &ClusterAssignment::Unclustered)
        .unwrap();
    assert_eq!(records[0].note_name, "Unknown");
    assert!(records[0].path.ends_with("seg1_freq0_noteUnknown.wav"));
    let _ = std::fs::remove_dir_all(&root);
}
