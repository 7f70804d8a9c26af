use crate::events::{EventSet, Series};
use crate::interval::Interval;
use serde::{Deserialize, Serialize};

/// Slack allowed when comparing a duration against the minimum length, so
/// that spans such as `0.6 - 0.5` still count as `0.1`.
pub const TIME_EPSILON: f64 = 1e-9;

/// Reports whether an interval of the signal is silent.
pub type SilenceCheck<'a> = &'a dyn Fn(&Interval) -> crate::Result<bool>;

/// Boundary detection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    /// Adjacent beat pairs, falling back to transients.
    Beats,
    /// Adjacent transient pairs.
    Transients,
    /// Spans where the spectral centroid stays inside `[min_hz, max_hz]`.
    FrequencyRange { min_hz: f32, max_hz: f32 },
    /// Adjacent backtracked onset pairs.
    Onsets,
}

impl Policy {
    /// Parse a policy name. `frequency` takes its band from `freq_range`.
    ///
    /// # Errors
    /// Returns `Error::UnknownPolicy` for any other name.
    ///
    /// # Example
    /// ```
    /// use segsift::segment::Policy;
    ///
    /// assert_eq!(Policy::parse("beats", (200.0, 2000.0)).unwrap(), Policy::Beats);
    /// assert!(Policy::parse("bars", (200.0, 2000.0)).is_err());
    /// ```
    pub fn parse(name: &str, freq_range: (f32, f32)) -> crate::Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "beats" => Ok(Policy::Beats),
            "transients" => Ok(Policy::Transients),
            "frequency" => Ok(Policy::FrequencyRange {
                min_hz: freq_range.0,
                max_hz: freq_range.1,
            }),
            "onsets" => Ok(Policy::Onsets),
            _ => Err(crate::Error::UnknownPolicy(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Policy::Beats => "beats",
            Policy::Transients => "transients",
            Policy::FrequencyRange { .. } => "frequency",
            Policy::Onsets => "onsets",
        }
    }
}

impl std::fmt::Display for Policy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Policy::FrequencyRange { min_hz, max_hz } => write!(f, "frequency {min_hz}-{max_hz} Hz"),
            other => f.write_str(other.name()),
        }
    }
}

/// Whether `interval` is at least `min_length` seconds long (ties count).
pub fn meets_min_length(interval: &Interval, min_length: f64) -> bool {
    interval.duration() + TIME_EPSILON >= min_length
}

/// Select candidate intervals from `events` under `policy`.
///
/// Output intervals are strictly increasing and non-overlapping, each at
/// least `min_segment_length` long and, when `silence` is given, not silent.
/// `Beats` falls back to `Transients` when fewer than two beats exist or no
/// beat pair survives filtering.
///
/// # Errors
/// Only errors raised by the silence check are returned.
///
/// # Example
/// ```
/// use segsift::events::EventSet;
/// use segsift::segment::{Policy, select_boundaries};
///
/// let mut events = EventSet::empty(3.0);
/// events.beats = vec![0.0, 0.5, 1.2, 3.0];
/// let intervals = select_boundaries(&events, &Policy::Beats, 0.1, None).unwrap();
/// assert_eq!(intervals.len(), 3);
/// ```
pub fn select_boundaries(
    events: &EventSet,
    policy: &Policy,
    min_segment_length: f64,
    silence: Option<SilenceCheck<'_>>,
) -> crate::Result<Vec<Interval>> {
    let intervals = match *policy {
        Policy::Beats => {
            let beats = timeline(&events.beats, events.duration);
            if beats.len() < 2 {
                log::warn!("{} beats detected, falling back to transients", beats.len());
                return select_boundaries(events, &Policy::Transients, min_segment_length, silence);
            }
            let kept = pair_adjacent(&beats, min_segment_length, silence)?;
            if kept.is_empty() {
                log::warn!("no beat interval survived filtering, falling back to transients");
                return select_boundaries(events, &Policy::Transients, min_segment_length, silence);
            }
            kept
        }
        Policy::Transients => {
            pair_adjacent(&timeline(&events.transients, events.duration), min_segment_length, silence)?
        }
        Policy::Onsets => {
            pair_adjacent(&timeline(&events.onsets, events.duration), min_segment_length, silence)?
        }
        Policy::FrequencyRange { min_hz, max_hz } => frequency_spans(
            &events.spectral_centroid,
            events.duration,
            (min_hz, max_hz),
            min_segment_length,
            silence,
        )?,
    };
    log::debug!("policy {} selected {} intervals", policy, intervals.len());
    Ok(intervals)
}

/// Segment everything: merge transients, beats and spectral-centroid jumps
/// into one timeline and pair adjacent boundaries.
///
/// A centroid jump is a frame whose successor's centroid is more than
/// `jump_threshold` Hz higher; the boundary sits at the earlier frame. Pairs
/// shorter than `min_segment_length` are accumulated until the minimum is
/// reached and a short trailing remainder is absorbed into the last interval.
/// When no accumulated span reaches the minimum, the whole timeline becomes a
/// single interval even though it is shorter than the minimum.
pub fn segment_all(events: &EventSet, jump_threshold: f32, min_segment_length: f64) -> Vec<Interval> {
    let centroid = &events.spectral_centroid;
    let jumps = centroid
        .values
        .windows(2)
        .zip(&centroid.times)
        .filter(|(pair, _)| pair[1] - pair[0] > jump_threshold)
        .map(|(_, &t)| t);

    let merged: Vec<f64> = events
        .transients
        .iter()
        .chain(&events.beats)
        .copied()
        .chain(jumps)
        .collect();
    let boundaries = timeline(&merged, events.duration);

    let mut intervals: Vec<Interval> = Vec::new();
    let Some((&first, rest)) = boundaries.split_first() else {
        return intervals;
    };
    let mut start = first;
    for &b in rest {
        if let Ok(iv) = Interval::new(start, b)
            && meets_min_length(&iv, min_segment_length)
        {
            intervals.push(iv);
            start = b;
        }
    }

    let last = boundaries[boundaries.len() - 1];
    if start < last {
        match intervals.last_mut() {
            Some(tail) => {
                if let Ok(extended) = Interval::new(tail.start(), last) {
                    *tail = extended;
                }
            }
            None => {
                log::debug!("no span reached the minimum length, emitting the whole timeline");
                intervals.extend(Interval::new(start, last).ok());
            }
        }
    }
    log::debug!("event merge produced {} intervals from {} boundaries", intervals.len(), boundaries.len());
    intervals
}

/// Finite event times within `[0, duration]`, sorted and de-duplicated.
///
/// A non-positive duration leaves times unbounded above.
fn timeline(times: &[f64], duration: f64) -> Vec<f64> {
    let mut out: Vec<f64> = times
        .iter()
        .copied()
        .filter(|t| t.is_finite() && *t >= 0.0 && (duration <= 0.0 || *t <= duration))
        .collect();
    let dropped = times.len() - out.len();
    if dropped > 0 {
        log::debug!("dropped {dropped} event times outside the signal");
    }
    out.sort_by(f64::total_cmp);
    out.dedup();
    out
}

/// Keep `interval` unless it is too short or silent.
fn admit(interval: &Interval, min_length: f64, silence: Option<SilenceCheck<'_>>) -> crate::Result<bool> {
    if !meets_min_length(interval, min_length) {
        return Ok(false);
    }
    match silence {
        Some(is_silent) => Ok(!is_silent(interval)?),
        None => Ok(true),
    }
}

fn pair_adjacent(
    boundaries: &[f64],
    min_length: f64,
    silence: Option<SilenceCheck<'_>>,
) -> crate::Result<Vec<Interval>> {
    let mut out = Vec::new();
    for pair in boundaries.windows(2) {
        let Ok(iv) = Interval::new(pair[0], pair[1]) else {
            continue;
        };
        if admit(&iv, min_length, silence)? {
            out.push(iv);
        }
    }
    Ok(out)
}

/// Spans where the centroid series stays inside `range`; a span still open at
/// the end of the series closes at the signal duration.
fn frequency_spans(
    centroid: &Series,
    duration: f64,
    (min_hz, max_hz): (f32, f32),
    min_length: f64,
    silence: Option<SilenceCheck<'_>>,
) -> crate::Result<Vec<Interval>> {
    let mut spans = Vec::new();
    let mut open: Option<f64> = None;
    let mut last_time = 0.0f64;

    for (t, v) in centroid.iter() {
        if !t.is_finite() || t < 0.0 || (duration > 0.0 && t > duration) {
            continue;
        }
        last_time = t;
        let inside = v >= min_hz && v <= max_hz;
        match (open, inside) {
            (None, true) => open = Some(t),
            (Some(start), false) => {
                spans.extend(Interval::new(start, t).ok());
                open = None;
            }
            _ => {}
        }
    }
    if let Some(start) = open {
        let end = if duration > 0.0 { duration } else { last_time };
        spans.extend(Interval::new(start, end).ok());
    }

    let mut out = Vec::with_capacity(spans.len());
    for iv in spans {
        if admit(&iv, min_length, silence)? {
            out.push(iv);
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn events_with(beats: &[f64], transients: &[f64]) -> EventSet {
        let mut events = EventSet::empty(10.0);
        events.beats = beats.to_vec();
        events.transients = transients.to_vec();
        events
    }

    fn bounds(intervals: &[Interval]) -> Vec<(f64, f64)> {
        intervals.iter().map(|iv| (iv.start(), iv.end())).collect()
    }

    #[test]
    fn test_beats_scenario() {
        let events = events_with(&[0.0, 0.5, 1.2, 3.0], &[]);
        let out = select_boundaries(&events, &Policy::Beats, 0.1, None).unwrap();
        assert_eq!(bounds(&out), vec![(0.0, 0.5), (0.5, 1.2), (1.2, 3.0)]);
    }

    #[test]
    fn test_beats_unsorted_and_duplicated() {
        let events = events_with(&[1.2, 0.0, 0.5, 0.5, f64::NAN, 3.0], &[]);
        let out = select_boundaries(&events, &Policy::Beats, 0.1, None).unwrap();
        assert_eq!(bounds(&out), vec![(0.0, 0.5), (0.5, 1.2), (1.2, 3.0)]);
    }

    #[test]
    fn test_min_length_tie_counts() {
        let events = events_with(&[0.5, 0.6, 0.65], &[]);
        let out = select_boundaries(&events, &Policy::Beats, 0.1, None).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].start(), 0.5);
    }

    #[test]
    fn test_beats_fall_back_to_transients() {
        let events = events_with(&[1.0], &[0.0, 1.0, 2.0]);
        let beats = select_boundaries(&events, &Policy::Beats, 0.1, None).unwrap();
        let transients = select_boundaries(&events, &Policy::Transients, 0.1, None).unwrap();
        assert_eq!(beats, transients);
        assert_eq!(beats.len(), 2);
    }

    #[test]
    fn test_beats_fall_back_when_all_filtered() {
        let events = events_with(&[0.0, 0.05, 0.08], &[0.0, 1.0]);
        let out = select_boundaries(&events, &Policy::Beats, 0.1, None).unwrap();
        assert_eq!(bounds(&out), vec![(0.0, 1.0)]);
    }

    #[test]
    fn test_transients_do_not_fall_back() {
        let events = events_with(&[0.0, 1.0, 2.0], &[0.5]);
        assert!(select_boundaries(&events, &Policy::Transients, 0.1, None).unwrap().is_empty());
    }

    #[test]
    fn test_onsets_policy() {
        let mut events = EventSet::empty(2.0);
        events.onsets = vec![0.2, 0.9, 1.5];
        let out = select_boundaries(&events, &Policy::Onsets, 0.1, None).unwrap();
        assert_eq!(bounds(&out), vec![(0.2, 0.9), (0.9, 1.5)]);
    }

    #[test]
    fn test_events_outside_signal_dropped() {
        let mut events = events_with(&[-1.0, 0.0, 1.0, 12.0], &[]);
        events.duration = 10.0;
        let out = select_boundaries(&events, &Policy::Beats, 0.1, None).unwrap();
        assert_eq!(bounds(&out), vec![(0.0, 1.0)]);
    }

    #[test]
    fn test_silence_check_filters() {
        let events = events_with(&[0.0, 1.0, 2.0, 3.0], &[]);
        let silent_middle = |iv: &Interval| -> crate::Result<bool> { Ok(iv.start() == 1.0) };
        let out = select_boundaries(&events, &Policy::Beats, 0.1, Some(&silent_middle)).unwrap();
        assert_eq!(bounds(&out), vec![(0.0, 1.0), (2.0, 3.0)]);
    }

    #[test]
    fn test_silence_errors_propagate() {
        let events = events_with(&[0.0, 1.0], &[]);
        let failing = |_: &Interval| -> crate::Result<bool> { Err(crate::Error::EmptyAudio) };
        assert!(select_boundaries(&events, &Policy::Beats, 0.1, Some(&failing)).is_err());
    }

    #[test]
    fn test_frequency_spans() {
        let mut events = EventSet::empty(1.0);
        events.spectral_centroid = Series::new(
            vec![0.0, 0.2, 0.4, 0.6, 0.8],
            vec![100.0, 500.0, 600.0, 3000.0, 800.0],
        );
        let policy = Policy::FrequencyRange { min_hz: 200.0, max_hz: 2000.0 };
        let out = select_boundaries(&events, &policy, 0.1, None).unwrap();
        assert_eq!(bounds(&out), vec![(0.2, 0.6), (0.8, 1.0)]);

        let out = select_boundaries(&events, &policy, 0.3, None).unwrap();
        assert_eq!(bounds(&out), vec![(0.2, 0.6)]);
    }

    #[test]
    fn test_parse_policies() {
        let range = (100.0, 900.0);
        assert_eq!(Policy::parse("Onsets", range).unwrap(), Policy::Onsets);
        assert_eq!(
            Policy::parse("frequency", range).unwrap(),
            Policy::FrequencyRange { min_hz: 100.0, max_hz: 900.0 }
        );
        assert!(matches!(
            Policy::parse("bars", range),
            Err(crate::Error::UnknownPolicy(name)) if name == "bars"
        ));
    }

    #[test]
    fn test_segment_all_pairs_with_zero_minimum() {
        let events = events_with(&[0.0, 1.0], &[0.5, 1.0, 1.5]);
        let out = segment_all(&events, 0.1, 0.0);
        assert_eq!(bounds(&out), vec![(0.0, 0.5), (0.5, 1.0), (1.0, 1.5)]);
    }

    #[test]
    fn test_segment_all_centroid_jumps() {
        let mut events = EventSet::empty(2.0);
        events.spectral_centroid = Series::new(
            vec![0.0, 0.5, 1.0, 1.5],
            vec![100.0, 100.05, 900.0, 200.0],
        );
        // only 0.5 -> 1.0 rises by more than 0.1 Hz, marked at the earlier frame
        events.transients = vec![0.0, 2.0];
        let out = segment_all(&events, 0.1, 0.0);
        assert_eq!(bounds(&out), vec![(0.0, 0.5), (0.5, 2.0)]);
    }

    #[test]
    fn test_segment_all_accumulates_short_pairs() {
        let events = events_with(&[], &[0.0, 0.05, 0.1, 0.3, 0.32]);
        let out = segment_all(&events, 0.1, 0.1);
        // 0.0..0.1 reaches the minimum; 0.1..0.3 too; 0.3..0.32 is absorbed
        assert_eq!(bounds(&out), vec![(0.0, 0.1), (0.1, 0.32)]);
    }

    #[test]
    fn test_segment_all_leftover_exception() {
        let events = events_with(&[], &[0.0, 0.02, 0.04]);
        let out = segment_all(&events, 0.1, 0.5);
        assert_eq!(bounds(&out), vec![(0.0, 0.04)]);
        assert!(!meets_min_length(&out[0], 0.5));
    }

    #[test]
    fn test_empty_events() {
        let events = EventSet::empty(1.0);
        assert!(select_boundaries(&events, &Policy::Beats, 0.1, None).unwrap().is_empty());
        assert!(segment_all(&events, 0.1, 0.1).is_empty());
        let one = events_with(&[], &[0.5]);
        assert!(segment_all(&one, 0.1, 0.1).is_empty());
    }
}
