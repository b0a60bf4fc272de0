//! Command-line and environment configuration for the desktop client.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use directories::ProjectDirs;
use tactics_core::{ContentPack, EngineConfig, MapConfig, SessionSnapshot};
use tracing::warn;

use crate::APP_NAME;
use crate::camera_file::CameraFile;
use crate::session_store::{FileSessionStore, HttpSessionStore, SessionBackend};

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(author, version, about = "Turn-based tactical map client", long_about = None)]
pub struct AppConfig {
    /// Session to load and keep in sync
    #[arg(short, long, env = "TACTICS_SESSION", default_value = "skirmish")]
    pub session: String,

    /// Session server base URL; sessions are kept on disk when unset
    #[arg(long, env = "TACTICS_SERVER_URL")]
    pub server_url: Option<String>,

    /// TOML map used when the session has no stored state
    #[arg(long, env = "TACTICS_MAP")]
    pub map: Option<PathBuf>,

    /// JSON combat content pack (entities and skills)
    #[arg(long, env = "TACTICS_CONTENT")]
    pub content: Option<PathBuf>,

    /// JSON engine tuning (move speeds, camera easing, timings)
    #[arg(long)]
    pub engine: Option<PathBuf>,

    /// Directory for sessions and camera storage
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Show cell coordinates under the cursor
    #[arg(long)]
    pub debug: bool,
}

impl AppConfig {
    pub fn data_dir(&self) -> Option<PathBuf> {
        self.data_dir.clone().or_else(|| {
            ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.data_dir().to_path_buf())
        })
    }

    pub fn camera_path(&self) -> Option<PathBuf> {
        self.data_dir().map(|dir| CameraFile::path_in(&dir))
    }

    pub fn backend(&self) -> Result<SessionBackend> {
        if let Some(url) = &self.server_url {
            let store = HttpSessionStore::new(url)
                .with_context(|| format!("failed to build HTTP client for {url}"))?;
            return Ok(SessionBackend::Http(store));
        }
        let dir = self.data_dir().context("no per-user data directory; pass --data-dir")?;
        Ok(SessionBackend::File(FileSessionStore::new(dir.join("sessions"))))
    }

    pub fn engine_config(&self) -> Result<EngineConfig> {
        let Some(path) = &self.engine else {
            return Ok(EngineConfig::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read engine config {}", path.display()))?;
        EngineConfig::from_json_str(&text)
            .with_context(|| format!("failed to parse engine config {}", path.display()))
    }

    pub fn content_pack(&self) -> Result<ContentPack> {
        let Some(path) = &self.content else {
            return Ok(ContentPack::build_default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read content pack {}", path.display()))?;
        ContentPack::from_json_str(&text)
            .with_context(|| format!("failed to load content pack {}", path.display()))
    }

    /// Starting state for a session with nothing stored. A map that fails to load is
    /// reported and replaced by the built-in skirmish.
    pub fn fallback_snapshot(&self) -> SessionSnapshot {
        let map = match &self.map {
            None => MapConfig::default_skirmish(),
            Some(path) => match load_map(path) {
                Ok(map) => map,
                Err(err) => {
                    warn!(path = %path.display(), "{err:#}; using the built-in map");
                    MapConfig::default_skirmish()
                }
            },
        };
        map.into_snapshot(&self.session)
    }
}

pub fn load_map(path: &Path) -> Result<MapConfig> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read map {}", path.display()))?;
    MapConfig::from_toml_str(&text).with_context(|| format!("invalid map {}", path.display()))
}
