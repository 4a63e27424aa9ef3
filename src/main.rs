//! Super Student entry point
//!
//! Runs a headless autoplay session: a scripted player works through every
//! mode (or the one named on the command line) while frames are tessellated
//! into a vertex batch and progress is logged.
//!
//! Usage: `super-student [--realtime] [mode]`

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use glam::Vec2;

use super_student::Settings;
use super_student::audio::{AudioDispatcher, LogBackend};
use super_student::persistence::{PROGRESS_FILE, ProgressMarker};
use super_student::renderer::vertex::colors;
use super_student::renderer::{BlockGlyphs, VertexBatch};
use super_student::session::{AutoPlayer, LevelOutcome, Session};
use super_student::sim::{GameMode, NoHud, ScriptedScreens, Services};

const SCREEN: Vec2 = Vec2::new(1920.0, 1080.0);

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Super Student (headless) starting...");

    let mut realtime = false;
    let mut modes = Vec::new();
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--realtime" => realtime = true,
            other => match GameMode::from_str(other) {
                Some(mode) => modes.push(mode),
                None => log::warn!("Ignoring unknown argument {:?}", other),
            },
        }
    }
    if modes.is_empty() {
        modes.extend(GameMode::ALL);
    }

    let settings = Settings::load(Path::new(Settings::FILE_NAME));
    let seed = settings.seed.unwrap_or_else(|| {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0)
    });
    log::info!(
        "Display mode {} with seed {}",
        settings.display_mode.as_str(),
        seed
    );

    let mut make_services = {
        let settings = settings.clone();
        move |mode: GameMode| {
            let mut audio = AudioDispatcher::spawn(LogBackend);
            audio.set_master_volume(settings.master_volume);
            audio.set_sfx_volume(settings.sfx_volume);
            audio.set_voice_volume(settings.voice_volume);
            let mut text = BlockGlyphs::new(settings.display_mode.font_size_large());
            text.preload(mode, &mode.sequence(), &[colors::TARGET, colors::NON_TARGET]);
            Services {
                audio: Box::new(audio),
                text: Box::new(text),
                screens: Box::new(ScriptedScreens::new(1, false)),
                hud: Box::new(NoHud),
            }
        }
    };

    let mut session = Session::new(settings, SCREEN, ProgressMarker::new(PROGRESS_FILE), seed)
        .with_realtime(realtime);
    let mut player = AutoPlayer::new(SCREEN, seed);
    let mut surface = VertexBatch::new(SCREEN);

    for mode in modes {
        let outcome = session.play(mode, &mut make_services, &mut player, &mut surface);
        match outcome {
            LevelOutcome::Completed { completion, score } => {
                log::info!("{}: {:?} with score {}", mode.as_str(), completion, score)
            }
            LevelOutcome::TimedOut { score } => {
                log::info!("{}: out of frames with score {}", mode.as_str(), score)
            }
            LevelOutcome::Failed(e) => log::warn!("{}: {}", mode.as_str(), e),
            LevelOutcome::Shutdown => break,
        }
    }
    log::info!("Session finished with {} errors", session.errors().count());
}

#[cfg(target_arch = "wasm32")]
fn main() {}
