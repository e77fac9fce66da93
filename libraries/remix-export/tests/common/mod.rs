//! Shared fixtures for export tests
#![allow(dead_code)]

use remix_audio::{wav, SymphoniaDecoder};
use remix_core::{AudioDecoder, PcmBuffer, Result, SampleRate, SourceFormat};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Mutex};
use tokio::sync::Notify;

/// WAV file holding a sine at half scale on every channel
pub fn sine_wav(sample_rate: u32, channels: usize, frames: usize, frequency: f32) -> Vec<u8> {
    let tone: Vec<f32> = (0..frames)
        .map(|i| {
            0.5 * (2.0 * std::f32::consts::PI * frequency * i as f32 / sample_rate as f32).sin()
        })
        .collect();
    let buffer = PcmBuffer::new(vec![tone; channels], SampleRate::new(sample_rate)).unwrap();
    wav::encode(&buffer).unwrap()
}

/// Short decaying mono impulse response as a WAV file
pub fn impulse_wav(sample_rate: u32) -> Vec<u8> {
    let tail: Vec<f32> = (0..400)
        .map(|i| (-(i as f32) / 60.0).exp() * if i % 3 == 0 { 0.9 } else { -0.4 })
        .collect();
    let buffer = PcmBuffer::new(vec![tail], SampleRate::new(sample_rate)).unwrap();
    wav::encode(&buffer).unwrap()
}

/// Decoder that counts its calls
#[derive(Default)]
pub struct CountingDecoder {
    calls: AtomicUsize,
}

impl CountingDecoder {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl AudioDecoder for CountingDecoder {
    fn decode(&self, bytes: &[u8], format: SourceFormat) -> Result<PcmBuffer> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        SymphoniaDecoder::new().decode(bytes, format)
    }
}

/// Decoder that blocks until the test releases it
pub struct GatedDecoder {
    started: std::sync::Arc<Notify>,
    release: Mutex<mpsc::Receiver<()>>,
}

impl GatedDecoder {
    pub fn new() -> (Self, std::sync::Arc<Notify>, mpsc::Sender<()>) {
        let started = std::sync::Arc::new(Notify::new());
        let (tx, rx) = mpsc::channel();
        let decoder = Self {
            started: std::sync::Arc::clone(&started),
            release: Mutex::new(rx),
        };
        (decoder, started, tx)
    }
}

impl AudioDecoder for GatedDecoder {
    fn decode(&self, bytes: &[u8], format: SourceFormat) -> Result<PcmBuffer> {
        self.started.notify_one();
        let _ = self.release.lock().unwrap().recv();
        SymphoniaDecoder::new().decode(bytes, format)
    }
}
