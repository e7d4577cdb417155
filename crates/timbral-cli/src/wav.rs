//! WAV file reading and writing.

use anyhow::Context;
use hound::{SampleFormat, WavReader, WavWriter};
use std::path::Path;

/// WAV audio encoding format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WavFormat {
    /// Linear PCM (integer samples).
    Pcm,
    /// IEEE 754 floating-point samples.
    IeeeFloat,
}

impl WavFormat {
    pub fn label(&self) -> &'static str {
        match self {
            WavFormat::Pcm => "PCM",
            WavFormat::IeeeFloat => "IEEE Float",
        }
    }
}

/// WAV header details.
#[derive(Debug, Clone)]
pub struct WavInfo {
    /// Number of audio channels.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Bit depth per sample.
    pub bits_per_sample: u16,
    /// Sample frames (samples per channel).
    pub num_frames: u64,
    /// Duration in seconds.
    pub duration_secs: f64,
    /// Audio encoding format.
    pub format: WavFormat,
}

/// Read WAV metadata without loading sample data.
pub fn read_wav_info(path: &Path) -> anyhow::Result<WavInfo> {
    let reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let num_frames = u64::from(reader.len()) / u64::from(spec.channels.max(1));

    Ok(WavInfo {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: spec.bits_per_sample,
        num_frames,
        duration_secs: num_frames as f64 / f64::from(spec.sample_rate),
        format: match spec.sample_format {
            SampleFormat::Float => WavFormat::IeeeFloat,
            SampleFormat::Int => WavFormat::Pcm,
        },
    })
}

/// Read a WAV file as mono `f32` samples and its sample rate.
///
/// Multi-channel files are mixed down by averaging channels. Integer samples
/// are scaled to `[-1, 1)`.
pub fn read_wav(path: &Path) -> anyhow::Result<(Vec<f32>, u32)> {
    let reader =
        WavReader::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let spec = reader.spec();
    let channels = usize::from(spec.channels.max(1));

    let samples: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()?,
        SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / max_val))
                .collect::<Result<Vec<_>, _>>()?
        }
    };

    let mono = if channels > 1 {
        samples
            .chunks(channels)
            .map(|chunk| chunk.iter().sum::<f32>() / channels as f32)
            .collect()
    } else {
        samples
    };

    tracing::debug!(
        path = %path.display(),
        channels,
        sample_rate = spec.sample_rate,
        samples = mono.len(),
        "read wav"
    );

    Ok((mono, spec.sample_rate))
}

/// Write mono 32-bit float samples.
pub fn write_wav(path: &Path, samples: &[f32], sample_rate: u32) -> anyhow::Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_float_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tone.wav");
        let samples: Vec<f32> = (0..100).map(|i| (i as f32 * 0.1).sin() * 0.5).collect();

        write_wav(&path, &samples, 22050).unwrap();
        let (read, sample_rate) = read_wav(&path).unwrap();
        assert_eq!(sample_rate, 22050);
        assert_eq!(read, samples);

        let info = read_wav_info(&path).unwrap();
        assert_eq!(info.channels, 1);
        assert_eq!(info.num_frames, 100);
        assert_eq!(info.format, WavFormat::IeeeFloat);
    }

    #[test]
    fn test_stereo_int_mixdown() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        for _ in 0..10 {
            writer.write_sample(16384i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let (read, _) = read_wav(&path).unwrap();
        assert_eq!(read.len(), 10);
        assert!(read.iter().all(|&s| (s - 0.25).abs() < 1e-6));
        assert_eq!(read_wav_info(&path).unwrap().format.label(), "PCM");
    }

    #[test]
    fn test_missing_file_names_path() {
        let err = read_wav(Path::new("/nonexistent/input.wav")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/input.wav"));
    }
}
