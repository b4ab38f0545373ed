//! Decoded audio clips.
//!
//! A clip is the fully decoded sample data of one asset, held in memory so
//! a channel can start it without touching disk. Clips are cheap to clone:
//! the sample buffer is shared.

use std::fs::File;
use std::io::{BufReader, Cursor};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use rodio::{Decoder, Source};
use tracing::debug;

use crate::mixer::{AudioError, AudioResult};

/// Decoded, interleaved f32 sample data.
#[derive(Debug, Clone)]
pub struct AudioClip {
    /// Interleaved sample data.
    samples: Arc<Vec<f32>>,
    /// Sample rate in Hz.
    sample_rate: u32,
    /// Number of channels (1 = mono, 2 = stereo).
    channels: u16,
    /// Duration of a single pass.
    duration: Duration,
    /// Original file path (if loaded from file).
    source_path: Option<PathBuf>,
}

impl AudioClip {
    /// Create a clip from already decoded samples.
    #[must_use]
    pub fn new(samples: Vec<f32>, sample_rate: u32, channels: u16) -> Self {
        let frames = if channels == 0 {
            0
        } else {
            samples.len() / channels as usize
        };
        let duration = if sample_rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(frames as f64 / f64::from(sample_rate))
        };

        Self {
            samples: Arc::new(samples),
            sample_rate,
            channels,
            duration,
            source_path: None,
        }
    }

    /// Create a silent clip of the given length. Useful for headless runs.
    #[must_use]
    pub fn silence(duration: Duration, sample_rate: u32, channels: u16) -> Self {
        let frames = (duration.as_secs_f64() * f64::from(sample_rate)).round() as usize;
        Self::new(vec![0.0; frames * channels as usize], sample_rate, channels)
    }

    /// Decode an audio file (wav, ogg, flac, mp3).
    pub fn from_file(path: impl AsRef<Path>) -> AudioResult<Self> {
        let path = path.as_ref();
        let load_failed = |message: String| AudioError::IoLoad {
            path: path.to_path_buf(),
            message,
        };

        let file = File::open(path).map_err(|e| load_failed(e.to_string()))?;
        let decoder = Decoder::new(BufReader::new(file)).map_err(|e| load_failed(e.to_string()))?;
        let clip = Self::from_decoder(decoder).map_err(|e| load_failed(e.to_string()))?;

        debug!("Decoded {:?} ({:?})", path, clip.duration);
        Ok(clip.with_source_path(path))
    }

    /// Decode an in-memory audio file.
    pub fn from_bytes(data: Vec<u8>) -> AudioResult<Self> {
        let decoder =
            Decoder::new(Cursor::new(data)).map_err(|e| AudioError::DecodeFailed(e.to_string()))?;
        Self::from_decoder(decoder)
    }

    fn from_decoder<R>(decoder: Decoder<R>) -> AudioResult<Self>
    where
        R: std::io::Read + std::io::Seek + Send + Sync + 'static,
    {
        let sample_rate = decoder.sample_rate();
        let channels = decoder.channels();
        if sample_rate == 0 || channels == 0 {
            return Err(AudioError::DecodeFailed(format!(
                "unsupported stream layout ({channels} channels @ {sample_rate} Hz)"
            )));
        }

        let samples: Vec<f32> = decoder.convert_samples::<f32>().collect();
        Ok(Self::new(samples, sample_rate, channels))
    }

    /// Attach the path the clip was decoded from.
    #[must_use]
    pub fn with_source_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Get the sample rate in Hz.
    #[must_use]
    pub const fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Get the channel count.
    #[must_use]
    pub const fn channels(&self) -> u16 {
        self.channels
    }

    /// Get the duration of one pass through the clip.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Get the path the clip was decoded from.
    #[must_use]
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }

    /// Get the size in bytes.
    #[must_use]
    pub fn size_bytes(&self) -> usize {
        self.samples.len() * std::mem::size_of::<f32>()
    }

    /// Build a rodio source over the shared samples.
    ///
    /// `passes` is the number of times the clip plays; `None` loops until
    /// the sink is stopped. The sample buffer is not copied.
    #[must_use]
    pub fn source(&self, passes: Option<u32>) -> ClipSource {
        ClipSource {
            samples: Arc::clone(&self.samples),
            position: 0,
            passes,
            sample_rate: self.sample_rate,
            channels: self.channels,
            duration: self.duration,
        }
    }
}

/// Playback cursor over an [`AudioClip`]'s shared samples.
#[derive(Debug, Clone)]
pub struct ClipSource {
    samples: Arc<Vec<f32>>,
    position: usize,
    /// Passes left including the current one; `None` loops forever.
    passes: Option<u32>,
    sample_rate: u32,
    channels: u16,
    duration: Duration,
}

impl Iterator for ClipSource {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        if self.position >= self.samples.len() {
            if self.samples.is_empty() {
                return None;
            }
            match &mut self.passes {
                Some(left) if *left <= 1 => return None,
                Some(left) => *left -= 1,
                None => {},
            }
            self.position = 0;
        }
        let sample = *self.samples.get(self.position)?;
        self.position += 1;
        Some(sample)
    }
}

impl Source for ClipSource {
    fn current_frame_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        self.passes.map(|passes| self.duration * passes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clip_duration() {
        let clip = AudioClip::new(vec![0.0f32; 44100 * 2], 44100, 2); // 1 second stereo
        assert!(clip.duration() >= Duration::from_millis(999));
        assert!(clip.duration() <= Duration::from_millis(1001));
        assert_eq!(clip.size_bytes(), 44100 * 2 * 4);
    }

    #[test]
    fn test_silence() {
        let clip = AudioClip::silence(Duration::from_millis(500), 22050, 1);
        assert_eq!(clip.channels(), 1);
        assert!(clip.duration() >= Duration::from_millis(499));
    }

    #[test]
    fn test_degenerate_layout_has_zero_duration() {
        let clip = AudioClip::new(vec![0.0f32; 10], 0, 0);
        assert_eq!(clip.duration(), Duration::ZERO);
    }

    #[test]
    fn test_source_shares_samples() {
        let clip = AudioClip::new(vec![0.25f32; 10], 10, 1);
        let source = clip.source(Some(3));
        assert_eq!(Arc::strong_count(&clip.samples), 2);
        assert_eq!(source.total_duration(), Some(clip.duration() * 3));

        let played: Vec<f32> = source.collect();
        assert_eq!(played.len(), 30);
        assert!(played.iter().all(|s| (*s - 0.25).abs() < f32::EPSILON));
    }

    #[test]
    fn test_looping_source_keeps_going() {
        let clip = AudioClip::new(vec![1.0, 2.0], 10, 1);
        let looped: Vec<f32> = clip.source(None).take(5).collect();
        assert_eq!(looped, vec![1.0, 2.0, 1.0, 2.0, 1.0]);
        assert_eq!(clip.source(None).total_duration(), None);
        assert_eq!(AudioClip::new(Vec::new(), 10, 1).source(None).next(), None);
    }

    #[test]
    fn test_missing_file_is_io_load() {
        let err = AudioClip::from_file("/nonexistent/track.ogg").expect_err("must fail");
        assert!(matches!(err, AudioError::IoLoad { .. }));
    }

    #[test]
    fn test_garbage_bytes_rejected() {
        let err = AudioClip::from_bytes(b"definitely not audio".to_vec()).expect_err("must fail");
        assert!(matches!(err, AudioError::DecodeFailed(_)));
    }
}
