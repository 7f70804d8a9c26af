use crate::source::Signal;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use ndarray::Array2;
use rubato::{
    Resampler, SincFixedIn, SincInterpolationParameters, SincInterpolationType, WindowFunction,
};
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, SeekMode, SeekTo};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::units::Time;

/// Sample rate used for analysis when none is requested.
pub const DEFAULT_SAMPLE_RATE: u32 = 22050;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioSpec {
    pub sample_rate: u32,
    pub channels: u16,
}

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("hound error: {0}")]
    Hound(#[from] hound::Error),
    #[error("symphonia error: {0}")]
    Symphonia(SymphoniaError),
    #[error("no audio track found")]
    NoAudioTrack,
    #[error("unsupported number of channels")]
    UnsupportedChannels,
    #[error("resampling error: {0}")]
    Resample(String),
}

impl From<SymphoniaError> for AudioError {
    fn from(err: SymphoniaError) -> Self {
        Self::Symphonia(err)
    }
}

/// Frame range `[start, end)` selected by an optional offset and duration.
fn frame_window(
    offset: Option<f64>,
    duration: Option<f64>,
    sample_rate: u32,
    total_frames: usize,
) -> (usize, usize) {
    let start = offset
        .map(|off| ((off.max(0.0) * sample_rate as f64) as usize).min(total_frames))
        .unwrap_or(0);
    let end = duration
        .map(|dur| {
            let dur_frames = (dur.max(0.0) * sample_rate as f64) as usize;
            (start + dur_frames).min(total_frames)
        })
        .unwrap_or(total_frames);
    (start, end.max(start))
}

fn deinterleave(samples: &[f32], channels: usize, start: usize, end: usize) -> Array2<f32> {
    let frames = end - start;
    let mut data = Array2::<f32>::zeros((channels, frames));
    for frame in 0..frames {
        let src = (start + frame) * channels;
        for ch in 0..channels {
            data[(ch, frame)] = samples[src + ch];
        }
    }
    data
}

/// Load a WAV file with optional offset and duration.
///
/// Only the requested frames are decoded: the reader seeks to the offset
/// before pulling samples.
///
/// # Arguments
/// * `path` - Path to the WAV file
/// * `offset` - Start reading from this position (in seconds)
/// * `duration` - Read this many seconds of audio (None for all)
///
/// # Returns
/// Audio data of shape (channels, frames) and its WAV format
///
/// # Errors
/// Returns `AudioError::Hound` if the file cannot be read or is invalid
pub fn load_wav<P: AsRef<Path>>(
    path: P,
    offset: Option<f64>,
    duration: Option<f64>,
) -> Result<(Array2<f32>, AudioSpec), AudioError> {
    let mut reader = WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 {
        return Err(AudioError::UnsupportedChannels);
    }

    let total_frames = reader.duration() as usize;
    let (start, end) = frame_window(offset, duration, spec.sample_rate, total_frames);
    if start > 0 {
        reader.seek(start as u32).map_err(hound::Error::IoError)?;
    }

    let wanted = (end - start) * channels;
    let mut samples: Vec<f32> = Vec::with_capacity(wanted);
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => {
            for s in reader.samples::<f32>().take(wanted) {
                samples.push(s?);
            }
        }
        (SampleFormat::Int, bits) if bits <= 16 => {
            let scale = (1i32 << (bits - 1)) as f32;
            for s in reader.samples::<i16>().take(wanted) {
                samples.push(s? as f32 / scale);
            }
        }
        (SampleFormat::Int, bits) => {
            let scale = (1i64 << (bits - 1)) as f32;
            for s in reader.samples::<i32>().take(wanted) {
                samples.push(s? as f32 / scale);
            }
        }
    }

    let frames = samples.len() / channels;
    let data = deinterleave(&samples, channels, 0, frames);
    Ok((
        data,
        AudioSpec {
            sample_rate: spec.sample_rate,
            channels: spec.channels,
        },
    ))
}

/// Load audio from any format symphonia can probe.
///
/// # Arguments
/// * `path` - Path to audio file
/// * `sr` - Target sample rate (None to keep original)
/// * `mono` - Convert to mono (average channels)
/// * `offset` - Start time in seconds (None for beginning)
/// * `duration` - Length to load in seconds (None for all)
///
/// # Returns
/// Tuple of (audio_data, audio_spec) where audio_data is shape (channels, frames)
///
/// # Example
/// ```no_run
/// use segsift::io;
/// // Load 1 second starting at 0.5s, convert to mono at 22050 Hz
/// let (data, spec) = io::load("audio.flac", Some(22050), true, Some(0.5), Some(1.0)).unwrap();
/// ```
pub fn load<P: AsRef<Path>>(
    path: P,
    sr: Option<u32>,
    mono: bool,
    offset: Option<f64>,
    duration: Option<f64>,
) -> Result<(Array2<f32>, AudioSpec), AudioError> {
    let path_ref = path.as_ref();
    let mut hint = Hint::new();
    if let Some(ext) = path_ref.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let file = std::fs::File::open(path_ref).map_err(SymphoniaError::IoError)?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());
    let probed = symphonia::default::get_probe().format(
        &hint,
        mss,
        &FormatOptions::default(),
        &MetadataOptions::default(),
    )?;

    let mut format = probed.format;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.sample_rate.is_some())
        .ok_or(AudioError::NoAudioTrack)?
        .clone();

    let sample_rate = track.codec_params.sample_rate.unwrap_or(0);
    let channels = track
        .codec_params
        .channels
        .map(|c| c.count())
        .unwrap_or(0);
    if channels == 0 {
        return Err(AudioError::UnsupportedChannels);
    }

    let mut decoder =
        symphonia::default::get_codecs().make(&track.codec_params, &DecoderOptions::default())?;

    // Seek near the window start; `lead` frames still precede it afterwards.
    let mut window_offset = offset;
    let mut lead = 0usize;
    if let Some(secs) = offset.filter(|&s| s > 0.0) {
        let target = SeekTo::Time {
            time: Time::from(secs),
            track_id: Some(track.id),
        };
        match format.seek(SeekMode::Accurate, target) {
            Ok(seeked) => {
                decoder.reset();
                let ts = seeked.required_ts.saturating_sub(seeked.actual_ts);
                lead = match track.codec_params.time_base {
                    Some(tb) => {
                        let t = tb.calc_time(ts);
                        ((t.seconds as f64 + t.frac) * sample_rate as f64).round() as usize
                    }
                    None => ts as usize,
                };
                window_offset = None;
            }
            Err(e) => log::debug!("seek to {secs:.3}s failed ({e}), decoding from the start"),
        }
    }
    let wanted = duration.map(|d| {
        let skipped = window_offset.map_or(0.0, |o| o.max(0.0));
        lead + ((skipped + d.max(0.0)) * sample_rate as f64).ceil() as usize
    });

    let mut samples: Vec<f32> = Vec::new();
    loop {
        if let Some(frames) = wanted
            && samples.len() / channels >= frames
        {
            break;
        }

        let packet = match format.next_packet() {
            Ok(packet) => packet,
            Err(SymphoniaError::ResetRequired) => {
                decoder.reset();
                continue;
            }
            Err(SymphoniaError::IoError(_)) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track.id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(audio) => audio,
            Err(SymphoniaError::IoError(_)) => break,
            Err(SymphoniaError::DecodeError(_)) => continue,
            Err(e) => return Err(e.into()),
        };

        let mut sb = SampleBuffer::<f32>::new(decoded.capacity() as u64, *decoded.spec());
        sb.copy_interleaved_ref(decoded);
        samples.extend_from_slice(sb.samples());
    }

    samples.drain(..(lead * channels).min(samples.len()));
    let total_frames = samples.len() / channels;
    let (start, end) = frame_window(window_offset, duration, sample_rate, total_frames);
    let mut data = deinterleave(&samples, channels, start, end);
    if mono && channels > 1 {
        data = to_mono(&data);
    }

    let mut spec = AudioSpec {
        sample_rate,
        channels: data.shape()[0] as u16,
    };
    if let Some(target) = sr
        && target != sample_rate
        && sample_rate > 0
    {
        let mut resampled = Array2::<f32>::zeros((data.shape()[0], 0));
        for (ch, row) in data.rows().into_iter().enumerate() {
            let out = resample(&row.to_vec(), sample_rate, target)?;
            if ch == 0 {
                resampled = Array2::<f32>::zeros((data.shape()[0], out.len()));
            }
            for (i, v) in out.into_iter().enumerate().take(resampled.shape()[1]) {
                resampled[(ch, i)] = v;
            }
        }
        spec.sample_rate = target;
        data = resampled;
    }

    Ok((data, spec))
}

/// Load a mono [`Signal`] at `sr`, decoding only `[offset, offset + duration)`.
///
/// WAV files take the hound path; everything else goes through symphonia,
/// which seeks to `offset` and stops decoding once the window is filled.
pub fn load_signal<P: AsRef<Path>>(
    path: P,
    sr: Option<u32>,
    offset: Option<f64>,
    duration: Option<f64>,
) -> crate::Result<Signal> {
    let path = path.as_ref();
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("wav"));

    let (samples, sample_rate) = if is_wav {
        let (data, spec) = load_wav(path, offset, duration)?;
        let mono = to_mono(&data).row(0).to_vec();
        match sr {
            Some(target) if target != spec.sample_rate => {
                (resample(&mono, spec.sample_rate, target)?, target)
            }
            _ => (mono, spec.sample_rate),
        }
    } else {
        let (data, spec) = load(path, sr, true, offset, duration)?;
        (data.row(0).to_vec(), spec.sample_rate)
    };

    log::debug!(
        "decoded {} samples at {} Hz from {} (offset {:?}, duration {:?})",
        samples.len(),
        sample_rate,
        path.display(),
        offset,
        duration
    );
    Ok(Signal::new(samples, sample_rate))
}

/// Resample a mono signal from `src_sr` to `dst_sr` with a windowed-sinc filter.
pub fn resample(y: &[f32], src_sr: u32, dst_sr: u32) -> Result<Vec<f32>, AudioError> {
    if src_sr == dst_sr || y.is_empty() {
        return Ok(y.to_vec());
    }

    let chunk_size = 1024usize;
    let params = SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    };
    let ratio = dst_sr as f64 / src_sr as f64;
    let mut resampler = SincFixedIn::<f32>::new(ratio, 2.0, params, chunk_size, 1)
        .map_err(|e| AudioError::Resample(e.to_string()))?;

    let mut output = Vec::with_capacity((y.len() as f64 * ratio) as usize + chunk_size);
    for chunk in y.chunks(chunk_size) {
        let mut buf = vec![0.0f32; chunk_size];
        buf[..chunk.len()].copy_from_slice(chunk);
        let out = resampler
            .process(&[buf], None)
            .map_err(|e| AudioError::Resample(e.to_string()))?;
        output.extend_from_slice(&out[0]);
    }

    let expected = (y.len() as f64 * ratio).round() as usize;
    output.truncate(expected);
    Ok(output)
}

/// Convert multi-channel audio to mono by averaging channels.
pub fn to_mono(data: &Array2<f32>) -> Array2<f32> {
    let (channels, frames) = (data.shape()[0], data.shape()[1]);
    if channels <= 1 {
        return data.clone();
    }

    let mut mono = Array2::<f32>::zeros((1, frames));
    for frame in 0..frames {
        let sum: f32 = (0..channels).map(|ch| data[(ch, frame)]).sum();
        mono[(0, frame)] = sum / channels as f32;
    }
    mono
}

/// Save a mono signal as a 16-bit PCM WAV file.
///
/// Samples are clipped to [-1.0, 1.0] before quantization.
///
/// # Errors
/// Returns `Error::Audio` if the file cannot be written
pub fn save_wav<P: AsRef<Path>>(path: P, samples: &[f32], sample_rate: u32) -> crate::Result<()> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = WavWriter::create(path, spec).map_err(AudioError::Hound)?;
    for &sample in samples {
        let s = (sample.clamp(-1.0, 1.0) * i16::MAX as f32) as i16;
        writer.write_sample(s).map_err(AudioError::Hound)?;
    }
    writer.finalize().map_err(AudioError::Hound)?;
    Ok(())
}

/// Generate a sine tone.
pub fn tone(frequency: f32, sr: u32, duration: f32) -> Vec<f32> {
    let n = (duration * sr as f32) as usize;
    (0..n)
        .map(|i| 0.5 * (2.0 * std::f32::consts::PI * frequency * i as f32 / sr as f32).sin())
        .collect()
}

/// Generate a click track: short decaying 1 kHz bursts at the given times.
///
/// # Arguments
/// * `times` - Click positions in seconds
/// * `sr` - Sample rate
/// * `length` - Output length in samples
pub fn clicks(times: &[f32], sr: u32, length: usize) -> Vec<f32> {
    let mut y = vec![0.0f32; length];
    let click_len = (0.1 * sr as f32) as usize;
    for &t in times {
        let start = (t.max(0.0) * sr as f32) as usize;
        for i in 0..click_len {
            let Some(slot) = y.get_mut(start + i) else {
                break;
            };
            let decay = (-(i as f32) / (click_len as f32 / 8.0)).exp();
            *slot += decay * (2.0 * std::f32::consts::PI * 1000.0 * i as f32 / sr as f32).sin();
        }
    }
    y
}
