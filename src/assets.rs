use anyhow::{Context, Result};
use std::f32::consts::TAU;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// The three knock clips a click can trigger
pub const CLIP_FILES: [&str; 3] = ["knock1.wav", "knock2.wav", "knock3.wav"];

/// Fundamental frequency of each synthesized fallback knock, in hertz
const FALLBACK_TONES: [f32; 3] = [180.0, 150.0, 210.0];

const SAMPLE_RATE: u32 = 44_100;

/// Immutable clip bytes, shared with the mixer per play
#[derive(Debug, Clone)]
pub struct SoundSet {
    clips: Vec<Arc<Vec<u8>>>,
}

impl SoundSet {
    /// Load the clip files from `dir`. A clip that cannot be read, or that
    /// is not a RIFF wave payload, is replaced by a synthesized knock, so
    /// the returned set always has one playable entry per file name and
    /// loading never blocks startup on missing audio.
    pub fn load(dir: &Path) -> Self {
        let clips = CLIP_FILES
            .iter()
            .enumerate()
            .map(|(i, name)| {
                let path = dir.join(name);
                match read_clip(&path) {
                    Ok(bytes) => {
                        log::info!("loaded {} ({} bytes)", path.display(), bytes.len());
                        Arc::new(bytes)
                    }
                    Err(err) => {
                        log::warn!("{err:#}; using synthesized knock");
                        Arc::new(synth_knock(FALLBACK_TONES[i]))
                    }
                }
            })
            .collect();
        Self { clips }
    }

    /// Three synthesized knocks, no disk access
    pub fn synthesized() -> Self {
        let clips = FALLBACK_TONES
            .iter()
            .map(|&tone| Arc::new(synth_knock(tone)))
            .collect();
        Self { clips }
    }

    /// A set of near-empty clips, for tests and muted runs
    pub fn silent() -> Self {
        let clips = CLIP_FILES
            .iter()
            .map(|_| Arc::new(encode_wav(&[0i16; 4])))
            .collect();
        Self { clips }
    }

    pub fn clip(&self, index: usize) -> Option<&Arc<Vec<u8>>> {
        self.clips.get(index)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

fn read_clip(path: &Path) -> Result<Vec<u8>> {
    let bytes = fs::read(path).context(format!("Failed to read sound clip {:?}", path))?;
    // 44 bytes is the smallest PCM wave container encode_wav emits
    if bytes.len() < 44 || &bytes[..4] != b"RIFF" {
        anyhow::bail!("{:?} is not a RIFF wave payload", path);
    }
    Ok(bytes)
}

/// Synthesize a short percussive knock: a decaying sine with a softer
/// octave overtone, 180 ms long
pub fn synth_knock(frequency: f32) -> Vec<u8> {
    let duration = 0.18;
    let count = (SAMPLE_RATE as f32 * duration) as usize;
    let samples: Vec<i16> = (0..count)
        .map(|i| {
            let t = i as f32 / SAMPLE_RATE as f32;
            let envelope = (-t * 28.0).exp();
            let tone = (TAU * frequency * t).sin() + 0.35 * (TAU * frequency * 2.0 * t).sin();
            (tone * envelope * 0.55 * i16::MAX as f32) as i16
        })
        .collect();
    encode_wav(&samples)
}

/// Mono 16-bit PCM RIFF container
fn encode_wav(samples: &[i16]) -> Vec<u8> {
    let data_len = (samples.len() * 2) as u32;
    let mut out = Vec::with_capacity(44 + data_len as usize);

    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    for sample in samples {
        out.extend_from_slice(&sample.to_le_bytes());
    }

    out
}
