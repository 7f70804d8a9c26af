//! Audio segmentation and segment deduplication for Rust.
//!
//! segsift cuts a recording into candidate segments at beats, transients,
//! onsets or spectral-centroid bands, reduces the candidates to a small set
//! of representatives with k-means or DBSCAN plus cosine-similarity
//! deduplication, and exports each representative as a WAV file named after
//! its dominant frequency and nearest note.
//!
//! # Quick Start
//!
//! ```rust
//! use segsift::events::{AnalysisConfig, detect_events};
//! use segsift::segment::{Policy, select_boundaries};
//! use segsift::{Signal, io};
//!
//! // Three clicks in two seconds of audio
//! let y = io::clicks(&[0.5, 1.0, 1.5], 22050, 44100);
//! let signal = Signal::new(y, 22050);
//!
//! let events = detect_events(&signal, &AnalysisConfig::new()).unwrap();
//! let candidates = select_boundaries(&events, &Policy::Transients, 0.1, None).unwrap();
//! assert!(!candidates.is_empty());
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`io`] | Audio decoding with offset/duration, resampling, WAV export, test signals |
//! | [`source`] | [`Signal`] and the per-interval [`SignalSource`] trait |
//! | [`events`] | Transients, onsets, beats and spectral descriptor series |
//! | [`segment`] | Boundary policies and segment descriptors |
//! | [`cluster`] | Standardization, k-means, DBSCAN and the reduction strategies |
//! | [`store`] | Output layout and WAV export of segments |
//! | [`pipeline`] | [`pipeline::PipelineConfig`] and the end-to-end run |
//! | [`feature`] | Spectral centroid/rolloff/bandwidth, mel, MFCC, chroma, contrast |
//! | [`onset`] | Onset strength, peak picking and backtracking |
//! | [`beat`] | Tempo estimation and beat picking |
//! | [`spectrum`] | STFT and dB conversion |
//! | [`convert`] | Frame/time and frequency/note conversions |
//!
//! # Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. Only input problems are errors: too few
//! events, empty candidate sets and empty slices produce empty results or
//! zero vectors and a log message.
//!
//! # Logging
//!
//! The library logs through the [`log`] facade; install any logger (the
//! `segsift` binary uses `env_logger`) to see stage summaries.
//!
//! # Safety
//!
//! This crate uses `#![forbid(unsafe_code)]`.

#![forbid(unsafe_code)]

pub mod error;
pub use error::{Error, Result};

pub mod beat;
pub mod cluster;
pub mod convert;
pub mod events;
pub mod feature;
pub mod fft;
pub mod interval;
pub mod io;
pub mod onset;
pub mod pipeline;
pub mod segment;
pub mod source;
pub mod spectrum;
pub mod store;
pub mod window;

pub use interval::{ClusterAssignment, Interval};
pub use source::{AudioFile, InMemorySource, Signal, SignalSource};
