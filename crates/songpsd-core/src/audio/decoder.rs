//! WAV decoding

use super::AudioTrack;
use crate::error::{PsdError, Result};
use std::path::Path;

/// Decode a WAV file into a mono track.
///
/// Integer samples are scaled to [-1, 1); multichannel audio is averaged
/// down to one channel.
pub fn decode_wav(path: &Path) -> Result<AudioTrack> {
    let mut reader = hound::WavReader::open(path)?;

    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 || spec.sample_rate == 0 {
        return Err(PsdError::DataFormat(format!(
            "{}: invalid WAV header ({} channels @ {} Hz)",
            path.display(),
            channels,
            spec.sample_rate
        )));
    }

    // Read samples and convert to f64
    let interleaved: Vec<f64> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .map(|s| s.map(f64::from))
            .collect::<std::result::Result<Vec<_>, _>>()?,
        hound::SampleFormat::Int => {
            let max_val = (1i64 << (spec.bits_per_sample - 1)) as f64;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f64 / max_val))
                .collect::<std::result::Result<Vec<_>, _>>()?
        }
    };

    let samples = if channels == 1 {
        interleaved
    } else {
        to_mono(&interleaved, channels)
    };

    log::debug!(
        "Decoded {}: {} samples @ {}Hz ({} channel(s))",
        path.display(),
        samples.len(),
        spec.sample_rate,
        channels
    );

    Ok(AudioTrack::new(spec.sample_rate, samples))
}

/// Average interleaved channels
fn to_mono(interleaved: &[f64], channels: usize) -> Vec<f64> {
    interleaved
        .chunks(channels)
        .map(|frame| frame.iter().sum::<f64>() / frame.len() as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn write_wav(path: &Path, channels: u16, samples: &[i16]) {
        let spec = hound::WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    #[test]
    fn test_decode_mono_int16() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, 1, &[0, 16384, -16384, -32768]);

        let track = decode_wav(&path).unwrap();
        assert_eq!(track.sample_rate, 8000);
        assert_eq!(track.samples, vec![0.0, 0.5, -0.5, -1.0]);
    }

    #[test]
    fn test_decode_stereo_downmix() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, 2, &[16384, 0, -16384, -16384]);

        let track = decode_wav(&path).unwrap();
        assert_eq!(track.samples.len(), 2);
        assert_relative_eq!(track.samples[0], 0.25);
        assert_relative_eq!(track.samples[1], -0.5);
    }

    #[test]
    fn test_missing_file_is_wav_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = decode_wav(&dir.path().join("missing.wav"));
        assert!(matches!(result, Err(PsdError::Wav(_))));
    }
}
