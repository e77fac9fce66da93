/// Audio decoder implementation using Symphonia
use remix_core::{AudioDecoder, PcmBuffer, RemixError, Result, SampleRate, SourceFormat};
use std::io::Cursor;
use symphonia::core::audio::{AudioBuffer, AudioBufferRef, Signal};
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use symphonia::core::sample::Sample;

/// Audio decoder using Symphonia
///
/// Supports the accepted upload formats: MP3, OGG (Vorbis), WAV.
///
/// Decodes the whole in-memory file into a planar `PcmBuffer`, keeping the
/// source channel count. Packets that fail with a recoverable decode error are
/// skipped (the usual behavior for damaged MP3 frames); a file that yields no
/// audio at all is a `Decode` error.
#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaDecoder;

impl SymphoniaDecoder {
    /// Create a new decoder
    pub fn new() -> Self {
        Self
    }

    /// Append one decoded packet to the planar output
    ///
    /// Signed integers use symmetric scaling (divide by 2^(N-1)), unsigned
    /// integers are centred first.
    fn append_packet(decoded: &AudioBufferRef<'_>, channels: &mut [Vec<f32>]) -> Result<()> {
        let packet_channels = decoded.spec().channels.count();
        if packet_channels != channels.len() {
            return Err(RemixError::decode(format!(
                "channel count changed mid-stream: {} -> {}",
                channels.len(),
                packet_channels
            )));
        }

        match decoded {
            AudioBufferRef::F32(buf) => Self::append_planar(buf, channels, |s| s),
            AudioBufferRef::F64(buf) => Self::append_planar(buf, channels, |s| s as f32),
            AudioBufferRef::S32(buf) => {
                Self::append_planar(buf, channels, |s| (f64::from(s) / 2_147_483_648.0) as f32)
            }
            AudioBufferRef::S24(buf) => {
                Self::append_planar(buf, channels, |s| s.inner() as f32 / 8_388_608.0)
            }
            AudioBufferRef::S16(buf) => {
                Self::append_planar(buf, channels, |s| f32::from(s) / 32_768.0)
            }
            AudioBufferRef::S8(buf) => Self::append_planar(buf, channels, |s| f32::from(s) / 128.0),
            AudioBufferRef::U32(buf) => Self::append_planar(buf, channels, |s| {
                ((f64::from(s) - 2_147_483_648.0) / 2_147_483_648.0) as f32
            }),
            AudioBufferRef::U24(buf) => Self::append_planar(buf, channels, |s| {
                (s.inner() as f32 - 8_388_608.0) / 8_388_608.0
            }),
            AudioBufferRef::U16(buf) => {
                Self::append_planar(buf, channels, |s| (f32::from(s) - 32_768.0) / 32_768.0)
            }
            AudioBufferRef::U8(buf) => {
                Self::append_planar(buf, channels, |s| (f32::from(s) - 128.0) / 128.0)
            }
        }

        Ok(())
    }

    fn append_planar<T, F>(buf: &AudioBuffer<T>, channels: &mut [Vec<f32>], normalize: F)
    where
        T: Sample + Copy,
        F: Fn(T) -> f32,
    {
        for (index, channel) in channels.iter_mut().enumerate() {
            channel.extend(buf.chan(index).iter().map(|&s| normalize(s)));
        }
    }
}

impl AudioDecoder for SymphoniaDecoder {
    fn decode(&self, bytes: &[u8], format: SourceFormat) -> Result<PcmBuffer> {
        if bytes.is_empty() {
            return Err(RemixError::decode("input is empty"));
        }

        // Create media source over an owned copy of the bytes
        let mss = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());

        // The extension hint steers the probe; the probe still sniffs the content
        let mut hint = Hint::new();
        hint.with_extension(format.extension());
        hint.mime_type(format.mime_type());

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| RemixError::decode(format!("Failed to probe {} data: {}", format, e)))?;

        let mut reader = probed.format;

        let track = reader
            .default_track()
            .ok_or_else(|| RemixError::decode("No audio tracks found"))?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| RemixError::decode("Stream does not declare a sample rate"))?;

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| RemixError::decode(format!("Failed to create decoder: {}", e)))?;

        let mut channels: Vec<Vec<f32>> = Vec::new();
        let mut skipped_packets = 0usize;

        loop {
            let packet = match reader.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    break;
                }
                Err(SymphoniaError::ResetRequired) => {
                    decoder.reset();
                    continue;
                }
                Err(e) => {
                    return Err(RemixError::decode(format!("Error reading packet: {}", e)));
                }
            };

            // Skip packets that are not for the default track
            if packet.track_id() != track_id {
                continue;
            }

            let decoded = match decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(SymphoniaError::DecodeError(e)) => {
                    tracing::warn!("Skipping undecodable {} packet: {}", format, e);
                    skipped_packets += 1;
                    continue;
                }
                Err(e) => return Err(RemixError::decode(format!("Decode error: {}", e))),
            };

            if channels.is_empty() {
                channels = vec![Vec::new(); decoded.spec().channels.count()];
                if channels.is_empty() {
                    return Err(RemixError::decode("Stream has no channels"));
                }
            }

            Self::append_packet(&decoded, &mut channels)?;
        }

        if channels.is_empty() || channels[0].is_empty() {
            return Err(RemixError::decode(format!(
                "No audio frames decoded ({} packets skipped)",
                skipped_packets
            )));
        }

        tracing::debug!(
            "Decoded {}: {} channels, {} frames at {} Hz",
            format,
            channels.len(),
            channels[0].len(),
            sample_rate
        );

        PcmBuffer::new(channels, SampleRate::new(sample_rate))
    }
}
