//! Shared helpers for remix-audio integration tests
#![allow(dead_code)]

use remix_core::{PcmBuffer, SampleRate};

/// Build a PCM WAV file in memory
///
/// `samples` are interleaved and written with `bits_per_sample / 8` bytes
/// each (8-bit samples are unsigned, wider ones signed).
pub fn wav_bytes(
    sample_rate: u32,
    channels: u16,
    bits_per_sample: u16,
    samples: &[i32],
) -> Vec<u8> {
    let bytes_per_sample = bits_per_sample / 8;
    let block_align = channels * bytes_per_sample;
    let byte_rate = sample_rate * u32::from(block_align);
    let data_size = samples.len() as u32 * u32::from(bytes_per_sample);

    let mut bytes = Vec::with_capacity(44 + data_size as usize);

    // RIFF header
    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(36 + data_size).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    // fmt chunk
    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&bits_per_sample.to_le_bytes());

    // data chunk
    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        match bits_per_sample {
            8 => bytes.push(sample as u8),
            16 => bytes.extend_from_slice(&(sample as i16).to_le_bytes()),
            24 => bytes.extend_from_slice(&sample.to_le_bytes()[..3]),
            32 => bytes.extend_from_slice(&sample.to_le_bytes()),
            other => panic!("unsupported bit depth {other}"),
        }
    }

    bytes
}

/// 16-bit sine wave WAV, same signal on every channel
pub fn sine_wav(sample_rate: u32, channels: u16, frames: usize, frequency: f32) -> Vec<u8> {
    let mut samples = Vec::with_capacity(frames * usize::from(channels));
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let value = (2.0 * std::f32::consts::PI * frequency * t).sin();
        let sample = (value * 0.5 * i16::MAX as f32) as i32;
        for _ in 0..channels {
            samples.push(sample);
        }
    }
    wav_bytes(sample_rate, channels, 16, &samples)
}

/// Sine wave buffer
pub fn sine_buffer(sample_rate: u32, channels: usize, frames: usize, frequency: f32) -> PcmBuffer {
    let samples: Vec<f32> = (0..frames)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            (2.0 * std::f32::consts::PI * frequency * t).sin() * 0.5
        })
        .collect();
    PcmBuffer::new(vec![samples; channels], SampleRate::new(sample_rate)).unwrap()
}

/// Root-mean-square level of a slice
pub fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

/// Decode the data section of a 16-bit WAV produced by the encoder
pub fn pcm16_samples(container: &[u8]) -> Vec<i16> {
    container[44..]
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect()
}
