//! Frame/time and frequency/note conversions.

/// Reference pitch for note naming.
pub const A4_HZ: f32 = 440.0;

/// Pitch-class names indexed by semitone distance from A.
pub const NOTE_NAMES: [&str; 12] = [
    "A", "A#", "B", "C", "C#", "D", "D#", "E", "F", "F#", "G", "G#",
];

/// Name reported for frequencies without a pitch.
pub const UNKNOWN_NOTE: &str = "Unknown";

/// Convert frame indices to time in seconds.
pub fn frames_to_time(frames: &[usize], sr: u32, hop_length: usize) -> Vec<f64> {
    frames
        .iter()
        .map(|&f| (f * hop_length) as f64 / sr as f64)
        .collect()
}

/// Nearest equal-tempered pitch class of `frequency`, ignoring octave.
///
/// Non-positive and non-finite frequencies map to [`UNKNOWN_NOTE`].
///
/// # Example
/// ```
/// use segsift::convert::hz_to_note_name;
///
/// assert_eq!(hz_to_note_name(440.0), "A");
/// assert_eq!(hz_to_note_name(261.63), "C");
/// assert_eq!(hz_to_note_name(0.0), "Unknown");
/// ```
pub fn hz_to_note_name(frequency: f32) -> &'static str {
    if !(frequency > 0.0) || !frequency.is_finite() {
        return UNKNOWN_NOTE;
    }
    let semitones = (12.0 * (frequency / A4_HZ).log2()).round() as i64;
    NOTE_NAMES[semitones.rem_euclid(12) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_to_time() {
        assert_eq!(frames_to_time(&[0, 1, 43], 22050, 512)[1], 512.0 / 22050.0);
        assert!(frames_to_time(&[], 22050, 512).is_empty());
    }

    #[test]
    fn test_note_names() {
        assert_eq!(hz_to_note_name(440.0), "A");
        assert_eq!(hz_to_note_name(880.0), "A");
        assert_eq!(hz_to_note_name(220.0), "A");
        assert_eq!(hz_to_note_name(466.16), "A#");
        assert_eq!(hz_to_note_name(415.3), "G#");
        assert_eq!(hz_to_note_name(329.63), "E");
    }

    #[test]
    fn test_unknown_note() {
        assert_eq!(hz_to_note_name(0.0), UNKNOWN_NOTE);
        assert_eq!(hz_to_note_name(-12.0), UNKNOWN_NOTE);
        assert_eq!(hz_to_note_name(f32::NAN), UNKNOWN_NOTE);
        assert_eq!(hz_to_note_name(f32::INFINITY), UNKNOWN_NOTE);
    }
}
