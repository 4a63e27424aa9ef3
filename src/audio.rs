//! Fire-and-forget audio dispatch
//!
//! The frame loop never waits on audio. [`AudioDispatcher`] forwards requests
//! over a bounded channel to a worker thread that owns the actual backend;
//! when the queue is full the request is dropped.

use std::thread::JoinHandle;

use crossbeam_channel::{Sender, TrySendError, bounded};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundEffect {
    /// Target destroyed
    Explosion,
    /// Misclick cracked the glass
    GlassCrack,
    /// Tapped something that is not the target
    WrongTarget,
    /// Colors mode target color changed
    ColorSwitch,
    /// Checkpoint screen about to show
    Checkpoint,
    /// Glass fully shattered
    GameOver,
}

/// Audio collaborator seen by the simulation. Never fails.
pub trait AudioSink {
    /// Speak the word for a destroyed target
    fn play_target_sound(&mut self, word: &str);

    fn play_destruction_sound(&mut self, effect: SoundEffect);
}

/// No-op sink
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play_target_sound(&mut self, _word: &str) {}

    fn play_destruction_sound(&mut self, _effect: SoundEffect) {}
}

/// Something that actually makes noise; runs on the audio worker thread
pub trait AudioBackend: Send + 'static {
    fn speak(&mut self, word: &str, volume: f32);

    fn effect(&mut self, effect: SoundEffect, volume: f32);
}

/// Backend that only logs what it would play
#[derive(Debug, Default)]
pub struct LogBackend;

impl AudioBackend for LogBackend {
    fn speak(&mut self, word: &str, volume: f32) {
        log::debug!("speak {:?} at {:.2}", word, volume);
    }

    fn effect(&mut self, effect: SoundEffect, volume: f32) {
        log::debug!("effect {:?} at {:.2}", effect, volume);
    }
}

#[derive(Debug)]
enum AudioCommand {
    Speak(String, f32),
    Effect(SoundEffect, f32),
}

/// Queue depth before requests are dropped
const QUEUE_DEPTH: usize = 32;

/// Channel-fed audio worker
pub struct AudioDispatcher {
    tx: Option<Sender<AudioCommand>>,
    worker: Option<JoinHandle<()>>,
    master_volume: f32,
    sfx_volume: f32,
    voice_volume: f32,
    muted: bool,
}

impl AudioDispatcher {
    /// Start a worker thread that owns `backend`.
    ///
    /// If the thread cannot be spawned the dispatcher stays silent.
    pub fn spawn<B: AudioBackend>(mut backend: B) -> Self {
        let (tx, rx) = bounded::<AudioCommand>(QUEUE_DEPTH);
        let worker = std::thread::Builder::new()
            .name("audio".into())
            .spawn(move || {
                for command in rx {
                    match command {
                        AudioCommand::Speak(word, volume) => backend.speak(&word, volume),
                        AudioCommand::Effect(effect, volume) => backend.effect(effect, volume),
                    }
                }
            });

        let (tx, worker) = match worker {
            Ok(handle) => (Some(tx), Some(handle)),
            Err(e) => {
                log::warn!("Failed to start audio worker - audio disabled: {}", e);
                (None, None)
            }
        };

        Self {
            tx,
            worker,
            master_volume: 0.8,
            sfx_volume: 1.0,
            voice_volume: 1.0,
            muted: false,
        }
    }

    /// Set master volume (0.0 - 1.0)
    pub fn set_master_volume(&mut self, vol: f32) {
        self.master_volume = vol.clamp(0.0, 1.0);
    }

    /// Set SFX volume (0.0 - 1.0)
    pub fn set_sfx_volume(&mut self, vol: f32) {
        self.sfx_volume = vol.clamp(0.0, 1.0);
    }

    /// Set spoken word volume (0.0 - 1.0)
    pub fn set_voice_volume(&mut self, vol: f32) {
        self.voice_volume = vol.clamp(0.0, 1.0);
    }

    /// Mute/unmute all audio
    pub fn set_muted(&mut self, muted: bool) {
        self.muted = muted;
    }

    pub fn is_running(&self) -> bool {
        self.tx.is_some()
    }

    fn effective_volume(&self, channel: f32) -> f32 {
        if self.muted {
            0.0
        } else {
            self.master_volume * channel
        }
    }

    fn send(&mut self, command: AudioCommand) {
        let Some(tx) = &self.tx else { return };
        match tx.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(dropped)) => {
                log::debug!("Audio queue full, dropped {:?}", dropped);
            }
            Err(TrySendError::Disconnected(_)) => {
                log::warn!("Audio worker stopped - audio disabled");
                self.tx = None;
            }
        }
    }
}

impl AudioSink for AudioDispatcher {
    fn play_target_sound(&mut self, word: &str) {
        let vol = self.effective_volume(self.voice_volume);
        if vol > 0.0 {
            self.send(AudioCommand::Speak(word.to_string(), vol));
        }
    }

    fn play_destruction_sound(&mut self, effect: SoundEffect) {
        let vol = self.effective_volume(self.sfx_volume);
        if vol > 0.0 {
            self.send(AudioCommand::Effect(effect, vol));
        }
    }
}

impl Drop for AudioDispatcher {
    fn drop(&mut self) {
        // Closing the channel ends the worker loop
        self.tx = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}
