use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::Cursor;
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum AudioError {
    #[error("no audio output device available")]
    NoDevice,
    #[error("output sink failed: {0}")]
    Sink(#[from] rodio::PlayError),
    #[error("clip decode failed: {0}")]
    Decode(#[from] rodio::decoder::DecoderError),
}

/// Fire-and-forget clip playback over the default output device.
///
/// Rapid clicks overlap: every play gets its own sink, and [`AudioMixer::update`]
/// reaps the ones that have drained. When no device is available the mixer
/// runs disabled and playback requests are logged no-ops, so the rest of the
/// app never has to care.
pub struct AudioMixer {
    // Held purely to keep the output stream alive
    _stream: Option<OutputStream>,
    handle: Option<OutputStreamHandle>,
    active: Vec<Sink>,
    volume: f32,
}

impl AudioMixer {
    /// Open the default output device, or fall back to a disabled mixer
    pub fn new() -> Self {
        match OutputStream::try_default() {
            Ok((stream, handle)) => {
                log::info!("audio output ready");
                Self {
                    _stream: Some(stream),
                    handle: Some(handle),
                    active: Vec::new(),
                    volume: 1.0,
                }
            }
            Err(err) => {
                log::warn!("no audio output: {err}; running silent");
                Self::disabled()
            }
        }
    }

    /// A mixer that accepts and discards every request
    pub fn disabled() -> Self {
        Self {
            _stream: None,
            handle: None,
            active: Vec::new(),
            volume: 1.0,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.handle.is_some()
    }

    /// Start `clip` on a fresh sink. Failures are logged, never surfaced.
    pub fn play(&mut self, clip: &Arc<Vec<u8>>) {
        if let Err(err) = self.try_play(clip) {
            match err {
                AudioError::NoDevice => log::debug!("playback skipped: {err}"),
                other => log::warn!("playback failed: {other}"),
            }
        }
    }

    fn try_play(&mut self, clip: &Arc<Vec<u8>>) -> Result<(), AudioError> {
        let handle = self.handle.as_ref().ok_or(AudioError::NoDevice)?;
        let sink = Sink::try_new(handle)?;
        let source = Decoder::new(Cursor::new(clip.as_ref().clone()))?;
        sink.set_volume(self.volume);
        sink.append(source);
        self.active.push(sink);
        Ok(())
    }

    /// Drop sinks that have finished playing
    pub fn update(&mut self) {
        self.active.retain(|sink| !sink.empty());
    }

    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        for sink in &self.active {
            sink.set_volume(self.volume);
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Cut every live playback short.
    pub fn stop_all(&mut self) {
        for sink in self.active.drain(..) {
            sink.stop();
        }
    }
}

impl Drop for AudioMixer {
    fn drop(&mut self) {
        self.stop_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::synth_knock;

    #[test]
    fn disabled_mixer_swallows_requests() {
        let mut mixer = AudioMixer::disabled();
        assert!(!mixer.is_enabled());

        let clip = Arc::new(synth_knock(180.0));
        mixer.play(&clip);
        mixer.update();
        assert_eq!(mixer.active_count(), 0);
    }

    #[test]
    fn volume_is_clamped() {
        let mut mixer = AudioMixer::disabled();
        mixer.set_volume(3.0);
        assert_eq!(mixer.volume(), 1.0);
        mixer.set_volume(-1.0);
        assert_eq!(mixer.volume(), 0.0);
    }

    #[test]
    fn plays_overlap_when_a_device_exists() {
        // Headless machines have no output device; the mixer must still
        // construct without panicking there.
        let mut mixer = AudioMixer::new();
        if !mixer.is_enabled() {
            return;
        }

        let clip = Arc::new(synth_knock(180.0));
        mixer.play(&clip);
        mixer.play(&clip);
        assert_eq!(mixer.active_count(), 2);
    }

    #[test]
    fn garbage_bytes_do_not_panic() {
        let mut mixer = AudioMixer::new();
        let clip = Arc::new(vec![0u8; 16]);
        mixer.play(&clip);
        mixer.update();
    }
}
