//! Sound cues for operator feedback.
//!
//! Playback shells out to an external player, fire and forget, so the
//! panel never blocks on audio. Spawn failures are reported back for the
//! caller to log; they never affect command flow.

use crate::config::SfxConfig;
use std::io;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Trigger points for the cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cue {
    Startup,
    KeyStored,
    KeyDeleted,
    ManualSend,
}

/// Player binary used when the config does not name one.
#[cfg(target_os = "macos")]
const DEFAULT_PLAYER: &str = "afplay";
#[cfg(not(target_os = "macos"))]
const DEFAULT_PLAYER: &str = "paplay";

pub struct SfxPlayer {
    player: String,
    startup: Option<PathBuf>,
    key_stored: Option<PathBuf>,
    key_deleted: Option<PathBuf>,
    manual_send: Option<PathBuf>,
}

impl SfxPlayer {
    pub fn new(config: &SfxConfig) -> SfxPlayer {
        SfxPlayer {
            player: config
                .player
                .clone()
                .unwrap_or_else(|| DEFAULT_PLAYER.to_string()),
            startup: config.startup.clone(),
            key_stored: config.key_stored.clone(),
            key_deleted: config.key_deleted.clone(),
            manual_send: config.manual_send.clone(),
        }
    }

    fn file_for(&self, cue: Cue) -> Option<&PathBuf> {
        match cue {
            Cue::Startup => self.startup.as_ref(),
            Cue::KeyStored => self.key_stored.as_ref(),
            Cue::KeyDeleted => self.key_deleted.as_ref(),
            Cue::ManualSend => self.manual_send.as_ref(),
        }
    }

    /// Fires off playback of a cue. `Ok(false)` means no file is
    /// configured for it and nothing was played.
    pub fn play(&self, cue: Cue) -> Result<bool, io::Error> {
        let file = match self.file_for(cue) {
            Some(f) => f,
            None => return Ok(false),
        };
        Command::new(&self.player)
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;
        Ok(true)
    }
}
