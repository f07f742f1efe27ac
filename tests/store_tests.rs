// Segment store: originals, derivatives and duration lookups on disk.

mod common;

use approx::assert_relative_eq;
use common::{tone, RATE};
use deck_pacer::audio::{write_wav, AudioFile};
use deck_pacer::error::StoreError;
use deck_pacer::store::{DurationKind, SegmentStore};
use tempfile::TempDir;

fn store() -> (TempDir, SegmentStore) {
    let dir = TempDir::new().unwrap();
    let store = SegmentStore::new(dir.path().join("recordings"), RATE);
    (dir, store)
}

#[test]
fn test_commit_original_creates_directory_and_file() {
    let (_dir, mut store) = store();

    let path = store.commit_original(2, &tone(1.5)).unwrap();

    assert!(path.ends_with("segment_2.wav"));
    assert!(path.exists());
    assert!(store.has_recording(2));
    assert!(!store.has_recording(1));
    assert_relative_eq!(store.original_duration(2), 1.5, epsilon = 1e-3);
    assert_eq!(store.effective_path(2), Some(path.as_path()));
}

#[test]
fn test_processed_needs_original() {
    let (_dir, mut store) = store();

    let result = store.commit_processed(1, &tone(1.0), RATE);

    assert!(matches!(result, Err(StoreError::NotRecorded(1))));
    assert!(store.processed_path(1).is_none());
}

#[test]
fn test_effective_prefers_processed() {
    let (_dir, mut store) = store();
    store.commit_original(1, &tone(2.0)).unwrap();
    let processed = store.commit_processed(1, &tone(1.0), RATE).unwrap();

    assert!(processed.ends_with("segment_1_proc.wav"));
    assert_eq!(store.effective_path(1), Some(processed.as_path()));
    assert_relative_eq!(store.original_duration(1), 2.0, epsilon = 1e-3);
    assert_relative_eq!(store.effective_duration(1), 1.0, epsilon = 1e-3);
}

#[test]
fn test_rerecord_invalidates_derivative() {
    let (_dir, mut store) = store();
    store.commit_original(1, &tone(2.0)).unwrap();
    let processed = store.commit_processed(1, &tone(1.0), RATE).unwrap();

    store.commit_original(1, &tone(3.0)).unwrap();

    assert!(!processed.exists());
    assert!(store.processed_path(1).is_none());
    assert_relative_eq!(store.effective_duration(1), 3.0, epsilon = 1e-3);
}

#[test]
fn test_clear_processed_and_remove() {
    let (_dir, mut store) = store();
    let original = store.commit_original(1, &tone(1.0)).unwrap();
    store.commit_processed(1, &tone(0.5), RATE).unwrap();

    assert!(store.clear_processed(1));
    assert!(!store.clear_processed(1));
    assert_relative_eq!(store.effective_duration(1), 1.0, epsilon = 1e-3);

    assert!(store.remove(1));
    assert!(!original.exists());
    assert!(!store.has_recording(1));
    assert_eq!(store.effective_duration(1), 0.0);
    assert!(!store.remove(1));
}

#[test]
fn test_missing_file_counts_as_unrecorded() {
    let (_dir, mut store) = store();
    let path = store.commit_original(1, &tone(1.0)).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert!(!store.has_recording(1));
    assert_eq!(store.original_duration(1), 0.0);
    assert!(matches!(store.load_effective(1), Err(StoreError::NotRecorded(1))));
}

#[test]
fn test_durations_cover_every_index() {
    let (_dir, mut store) = store();
    store.commit_original(1, &tone(1.0)).unwrap();
    store.commit_original(3, &tone(2.0)).unwrap();
    store.commit_processed(3, &tone(1.0), RATE).unwrap();

    let originals = store.durations(4, DurationKind::Original);
    let effective = store.durations(4, DurationKind::Effective);

    assert_eq!(originals.len(), 4);
    assert_relative_eq!(originals[0], 1.0, epsilon = 1e-3);
    assert_eq!(originals[1], 0.0);
    assert_relative_eq!(originals[2], 2.0, epsilon = 1e-3);
    assert_relative_eq!(effective[2], 1.0, epsilon = 1e-3);
    assert_eq!(store.recorded_indices(4), vec![1, 3]);
    assert_eq!(store.recorded_indices(2), vec![1]);
}

#[test]
fn test_wav_round_trip_is_mono_pcm() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("clip.wav");
    write_wav(&path, &[0.0, 0.5, -0.5, 2.0], RATE).unwrap();

    let audio = AudioFile::open(&path).unwrap();

    assert_eq!(audio.sample_rate, RATE);
    assert_eq!(audio.samples.len(), 4);
    assert_relative_eq!(audio.samples[1], 0.5, epsilon = 1e-3);
    assert_relative_eq!(audio.samples[3], 1.0, epsilon = 1e-3);
}

#[test]
fn test_stereo_file_is_downmixed() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("stereo.wav");
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    for _ in 0..10 {
        writer.write_sample(0.2f32).unwrap();
        writer.write_sample(0.6f32).unwrap();
    }
    writer.finalize().unwrap();

    let audio = AudioFile::open(&path).unwrap();

    assert_eq!(audio.samples.len(), 10);
    assert_relative_eq!(audio.samples[0], 0.4, epsilon = 1e-6);
}
