//! Audio backends for [`SoundEvent`]s.
//!
//! * [`CpalSynth`]: sine voices with the attack/decay envelope, mixed on the
//!   default output device.
//! * [`MidiSink`]: note on/off to the first MIDI output port, preferring a
//!   soft synth.
//! * [`NullSink`]: silence.
//!
//! Opening a device is deferred until the user first starts detection and
//! never fails the app: [`open_sink`] logs the reason and falls back to
//! [`NullSink`].

use std::f32::consts::TAU;
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use thiserror::Error;

use finger_count::sound::midi_note_for;
use finger_count::SoundEvent;

use crate::config::AudioKind;

const MIDI_CHANNEL: u8 = 0;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("no default output device")]
    NoDevice,

    #[error("unsupported sample format {0}")]
    UnsupportedFormat(String),

    #[error("audio init failed: {0}")]
    Init(String),

    #[error("MIDI: {0}")]
    Midi(String),
}

// ════════════════════════════════════════════════════════════════════════════
// AudioSink
// ════════════════════════════════════════════════════════════════════════════

pub trait AudioSink {
    fn play(&mut self, event: &SoundEvent);

    /// Called once per frame; backends with deferred work flush it here.
    fn tick(&mut self, _now_ms: u64) {}

    fn name(&self) -> &'static str;
}

pub struct NullSink;

impl AudioSink for NullSink {
    fn play(&mut self, _event: &SoundEvent) {}
    fn name(&self) -> &'static str { "none" }
}

/// Open the configured backend, falling back to [`NullSink`].
pub fn open_sink(kind: AudioKind, midi_program: u8) -> Box<dyn AudioSink> {
    let opened: Result<Box<dyn AudioSink>, AudioError> = match kind {
        AudioKind::Synth => CpalSynth::open().map(|s| Box::new(s) as Box<dyn AudioSink>),
        AudioKind::Midi  => MidiSink::open(midi_program).map(|s| Box::new(s) as Box<dyn AudioSink>),
        AudioKind::None  => Ok(Box::new(NullSink)),
    };
    match opened {
        Ok(sink) => {
            tracing::info!(sink = sink.name(), "audio ready");
            sink
        }
        Err(e) => {
            tracing::warn!(error = %e, "audio unavailable, continuing silently");
            Box::new(NullSink)
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Voice mixing
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Debug)]
struct Voice {
    event:    SoundEvent,
    /// Samples rendered so far.
    position: u64,
    length:   u64,
}

impl Voice {
    fn new(event: &SoundEvent, sample_rate: f32) -> Self {
        Voice {
            event:    *event,
            position: 0,
            length:   (event.duration_ms as f32 * sample_rate / 1000.0) as u64,
        }
    }

    fn done(&self) -> bool {
        self.position >= self.length
    }
}

/// Render interleaved frames of `channels` samples into `out`, advancing and
/// retiring voices.
fn mix_into(out: &mut [f32], channels: usize, voices: &mut Vec<Voice>, sample_rate: f32) {
    for frame in out.chunks_mut(channels.max(1)) {
        let mut sample = 0.0f32;
        for v in voices.iter_mut().filter(|v| !v.done()) {
            let t = v.position as f32 / sample_rate;
            sample += (TAU * v.event.frequency_hz * t).sin() * v.event.gain_at(t * 1000.0);
            v.position += 1;
        }
        let sample = sample.clamp(-1.0, 1.0);
        for s in frame.iter_mut() { *s = sample; }
    }
    voices.retain(|v| !v.done());
}

// ════════════════════════════════════════════════════════════════════════════
// CpalSynth
// ════════════════════════════════════════════════════════════════════════════

pub struct CpalSynth {
    _stream:     cpal::Stream,
    voices:      Arc<Mutex<Vec<Voice>>>,
    sample_rate: f32,
}

impl CpalSynth {
    pub fn open() -> Result<Self, AudioError> {
        let host   = cpal::default_host();
        let device = host.default_output_device().ok_or(AudioError::NoDevice)?;
        let supported = device.default_output_config()
            .map_err(|e| AudioError::Init(e.to_string()))?;

        if supported.sample_format() != cpal::SampleFormat::F32 {
            return Err(AudioError::UnsupportedFormat(format!("{:?}", supported.sample_format())));
        }

        let config: cpal::StreamConfig = supported.into();
        let sample_rate = config.sample_rate.0 as f32;
        let channels    = config.channels as usize;
        let voices      = Arc::new(Mutex::new(Vec::<Voice>::new()));

        let cb_voices = Arc::clone(&voices);
        let stream = device.build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                match cb_voices.lock() {
                    Ok(mut v) => mix_into(data, channels, &mut v, sample_rate),
                    Err(_)    => data.fill(0.0),
                }
            },
            |err| tracing::warn!(error = %err, "audio stream error"),
            None,
        ).map_err(|e| AudioError::Init(e.to_string()))?;

        stream.play().map_err(|e| AudioError::Init(e.to_string()))?;

        if let Ok(name) = device.name() {
            tracing::info!(device = %name, sample_rate, channels, "output stream open");
        }
        Ok(CpalSynth { _stream: stream, voices, sample_rate })
    }
}

impl AudioSink for CpalSynth {
    fn play(&mut self, event: &SoundEvent) {
        if let Ok(mut v) = self.voices.lock() {
            v.push(Voice::new(event, self.sample_rate));
        }
    }

    fn name(&self) -> &'static str { "synth" }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiSink
// ════════════════════════════════════════════════════════════════════════════

/// Sends each tone as a MIDI note; note-offs are released from `tick`.
pub struct MidiSink {
    conn:    midir::MidiOutputConnection,
    pending: PendingNotes,
}

impl MidiSink {
    pub fn open(program: u8) -> Result<Self, AudioError> {
        let midi_out = midir::MidiOutput::new("finger_tone")
            .map_err(|e| AudioError::Midi(e.to_string()))?;

        let ports = midi_out.ports();
        if ports.is_empty() {
            return Err(AudioError::Midi("no output ports".to_string()));
        }

        // Prefer a softsynth if visible
        let port_idx = ports.iter()
            .position(|p| midi_out.port_name(p).map(|n| {
                let n = n.to_lowercase();
                n.contains("fluid") || n.contains("timidity") || n.contains("synth") || n.contains("microsoft")
            }).unwrap_or(false))
            .unwrap_or(0);
        let port = &ports[port_idx];
        let name = midi_out.port_name(port).unwrap_or_else(|_| "unknown".to_string());
        tracing::info!(port = %name, "opening MIDI port");

        let mut conn = midi_out.connect(port, "finger-tone-out")
            .map_err(|e| AudioError::Midi(e.to_string()))?;
        let _ = conn.send(&[0xC0 | MIDI_CHANNEL, program & 0x7F]);

        Ok(MidiSink { conn, pending: PendingNotes::default() })
    }
}

impl AudioSink for MidiSink {
    fn play(&mut self, event: &SoundEvent) {
        let note     = midi_note_for(event.frequency_hz);
        let velocity = velocity_for(event.volume);
        let _ = self.conn.send(&[0x90 | MIDI_CHANNEL, note, velocity]);
        self.pending.push(event.end_ms(), note);
    }

    fn tick(&mut self, now_ms: u64) {
        for note in self.pending.due(now_ms) {
            let _ = self.conn.send(&[0x80 | MIDI_CHANNEL, note, 0]);
        }
    }

    fn name(&self) -> &'static str { "midi" }
}

impl Drop for MidiSink {
    fn drop(&mut self) {
        for note in self.pending.due(u64::MAX) {
            let _ = self.conn.send(&[0x80 | MIDI_CHANNEL, note, 0]);
        }
    }
}

fn velocity_for(volume: f32) -> u8 {
    (volume * 127.0).round().clamp(1.0, 127.0) as u8
}

/// Note-offs waiting for their deadline.
#[derive(Debug, Default)]
struct PendingNotes {
    offs: Vec<(u64, u8)>,
}

impl PendingNotes {
    /// Queue a note-off.  A re-struck note keeps only its latest deadline.
    fn push(&mut self, off_at_ms: u64, note: u8) {
        self.offs.retain(|&(_, n)| n != note);
        self.offs.push((off_at_ms, note));
    }

    /// Remove and return every note whose deadline is at or before `now_ms`.
    fn due(&mut self, now_ms: u64) -> Vec<u8> {
        let mut out = Vec::new();
        self.offs.retain(|&(at, note)| {
            if at <= now_ms { out.push(note); false } else { true }
        });
        out
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
