//! WAV encoding for 16-bit PCM
//!
//! Produces a canonical 44-byte-header RIFF/WAVE container with interleaved
//! little-endian signed 16-bit samples. The output is byte-exact: its length
//! is always `44 + frames * channels * 2`.

use remix_core::{PcmBuffer, RemixError, Result};
use std::io::Write;

/// Size of the RIFF, fmt and data headers
pub const HEADER_LEN: usize = 44;

const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;

/// Quantize one sample to signed 16-bit
///
/// Clamps to [-1.0, 1.0], scales negative values by 32768 and non-negative
/// values by 32767, then truncates toward zero. NaN becomes 0.
pub fn quantize(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    let s = sample.clamp(-1.0, 1.0);
    if s < 0.0 {
        (s * 32_768.0) as i16
    } else {
        (s * 32_767.0) as i16
    }
}

/// Encode a buffer as a complete WAV file
///
/// An empty buffer yields a valid 44-byte file.
///
/// # Errors
/// Returns `Encode` if the data section would not fit the 32-bit RIFF size
/// fields or the channel count exceeds 65535.
pub fn encode(buffer: &PcmBuffer) -> Result<Vec<u8>> {
    let data_size = data_size(buffer)?;
    let mut bytes = Vec::with_capacity(HEADER_LEN + data_size as usize);
    write_wav(&mut bytes, buffer)?;
    Ok(bytes)
}

/// Write a buffer as a WAV file to any writer
///
/// # Errors
/// Returns `Encode` for buffers that cannot be framed and `Io` if the writer
/// fails.
pub fn write_wav(w: &mut impl Write, buffer: &PcmBuffer) -> Result<()> {
    let num_channels = u16::try_from(buffer.channel_count()).map_err(|_| {
        RemixError::encode(format!(
            "{} channels exceed the WAV channel limit",
            buffer.channel_count()
        ))
    })?;
    let sample_rate = buffer.sample_rate().as_hz();
    let block_align = num_channels
        .checked_mul(BYTES_PER_SAMPLE)
        .ok_or_else(|| RemixError::encode("block alignment overflows 16 bits"))?;
    let byte_rate = sample_rate
        .checked_mul(u32::from(block_align))
        .ok_or_else(|| RemixError::encode("byte rate overflows 32 bits"))?;
    let data_size = data_size(buffer)?;

    write_riff_header(w, data_size)?;
    write_fmt_chunk(w, num_channels, sample_rate, byte_rate, block_align)?;
    write_data_chunk(w, buffer, data_size)
}

/// Size of the data section, checked against the 32-bit RIFF size fields
fn data_size(buffer: &PcmBuffer) -> Result<u32> {
    let bytes = buffer.frame_count() as u64
        * buffer.channel_count() as u64
        * u64::from(BYTES_PER_SAMPLE);

    // ChunkSize is 36 + data size and must fit as well
    u32::try_from(bytes)
        .ok()
        .filter(|size| size.checked_add(36).is_some())
        .ok_or_else(|| {
            RemixError::encode(format!(
                "{} bytes of audio exceed the 4 GiB WAV limit",
                bytes
            ))
        })
}

fn write_riff_header(w: &mut impl Write, data_size: u32) -> Result<()> {
    w.write_all(b"RIFF")?;
    w.write_all(&(36 + data_size).to_le_bytes())?;
    w.write_all(b"WAVE")?;
    Ok(())
}

fn write_fmt_chunk(
    w: &mut impl Write,
    num_channels: u16,
    sample_rate: u32,
    byte_rate: u32,
    block_align: u16,
) -> Result<()> {
    w.write_all(b"fmt ")?;
    w.write_all(&16u32.to_le_bytes())?; // fmt chunk size
    w.write_all(&1u16.to_le_bytes())?; // PCM format
    w.write_all(&num_channels.to_le_bytes())?;
    w.write_all(&sample_rate.to_le_bytes())?;
    w.write_all(&byte_rate.to_le_bytes())?;
    w.write_all(&block_align.to_le_bytes())?;
    w.write_all(&BITS_PER_SAMPLE.to_le_bytes())?;
    Ok(())
}

fn write_data_chunk(w: &mut impl Write, buffer: &PcmBuffer, data_size: u32) -> Result<()> {
    w.write_all(b"data")?;
    w.write_all(&data_size.to_le_bytes())?;

    let channels = buffer.channels();
    let mut frame_bytes = Vec::with_capacity(channels.len() * usize::from(BYTES_PER_SAMPLE));
    for frame in 0..buffer.frame_count() {
        frame_bytes.clear();
        for channel in channels {
            frame_bytes.extend_from_slice(&quantize(channel[frame]).to_le_bytes());
        }
        w.write_all(&frame_bytes)?;
    }
    Ok(())
}
