//! Turning events into candidate intervals and intervals into descriptors.

pub mod boundary;
pub mod descriptor;

pub use boundary::{Policy, SilenceCheck, meets_min_length, segment_all, select_boundaries};
pub use descriptor::{DescriptorMode, extract, extract_batch};
