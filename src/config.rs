use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::audio::StreamSettings;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub audio: AudioConfig,
    pub session: SessionConfig,
    pub deck: DeckConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub recordings_path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub progress_interval_ms: u64,
    pub playback_poll_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeckConfig {
    pub slide_count: u32,
    /// mm:ss
    pub target_total: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig {
                sample_rate: 44100,
                channels: 1,
                recordings_path: "recordings".to_string(),
            },
            session: SessionConfig {
                progress_interval_ms: 100,
                playback_poll_ms: 50,
            },
            deck: DeckConfig {
                slide_count: 5,
                target_total: "05:00".to_string(),
            },
        }
    }
}

impl Config {
    /// Defaults, then `<path>.toml` if present, then `DECK_PACER__SECTION__KEY`
    /// environment variables.
    pub fn load(path: &str) -> Result<Self> {
        let defaults = Self::default();

        let settings = config::Config::builder()
            .set_default("audio.sample_rate", defaults.audio.sample_rate as i64)?
            .set_default("audio.channels", defaults.audio.channels as i64)?
            .set_default("audio.recordings_path", defaults.audio.recordings_path)?
            .set_default(
                "session.progress_interval_ms",
                defaults.session.progress_interval_ms as i64,
            )?
            .set_default("session.playback_poll_ms", defaults.session.playback_poll_ms as i64)?
            .set_default("deck.slide_count", defaults.deck.slide_count as i64)?
            .set_default("deck.target_total", defaults.deck.target_total)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("DECK_PACER").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn stream_settings(&self) -> StreamSettings {
        StreamSettings {
            sample_rate: self.audio.sample_rate,
            channels: self.audio.channels,
        }
    }

    pub fn recordings_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&self.audio.recordings_path).into_owned())
    }

    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.session.progress_interval_ms)
    }

    pub fn playback_poll(&self) -> Duration {
        Duration::from_millis(self.session.playback_poll_ms)
    }
}
