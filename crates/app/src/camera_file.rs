//! Per-session camera storage.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tactics_core::CameraState;

pub const CAMERA_FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CameraFile {
    pub format_version: u32,
    #[serde(default)]
    pub sessions: BTreeMap<String, CameraState>,
}

impl Default for CameraFile {
    fn default() -> Self {
        Self { format_version: CAMERA_FORMAT_VERSION, sessions: BTreeMap::new() }
    }
}

impl CameraFile {
    /// Where the camera file lives inside a data directory.
    pub fn path_in(data_dir: &Path) -> PathBuf {
        data_dir.join("camera.json")
    }

    /// A missing file is an empty store, not an error.
    pub fn load_or_default(path: &Path) -> io::Result<Self> {
        match Self::load(path) {
            Ok(file) => Ok(file),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err),
        }
    }

    pub fn load(path: &Path) -> io::Result<Self> {
        let content = fs::read_to_string(path)?;
        let file: Self = serde_json::from_str(&content)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        Ok(file)
    }

    pub fn write_atomic(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = path.with_extension("json.tmp");
        let json = serde_json::to_string_pretty(self).map_err(io::Error::other)?;
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn get(&self, session_id: &str) -> Option<CameraState> {
        self.sessions.get(session_id).copied()
    }

    /// Returns false when the stored value was already identical.
    pub fn set(&mut self, session_id: &str, state: CameraState) -> bool {
        self.sessions.insert(session_id.to_string(), state) != Some(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn camera_file_atomic_write_and_load() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("camera.json");
        let mut file = CameraFile::default();
        file.set("skirmish", CameraState { x: -120.0, y: 48.5, scale: 1.5 });

        file.write_atomic(&path).expect("write");
        let loaded = CameraFile::load(&path).expect("load");
        assert_eq!(file, loaded);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn sessions_are_kept_apart() {
        let mut file = CameraFile::default();
        file.set("a", CameraState { x: 1.0, y: 2.0, scale: 1.0 });
        file.set("b", CameraState { x: 9.0, y: 9.0, scale: 2.0 });
        assert_eq!(file.get("a"), Some(CameraState { x: 1.0, y: 2.0, scale: 1.0 }));
        assert_eq!(file.get("missing"), None);
    }

    #[test]
    fn set_reports_unchanged_values() {
        let mut file = CameraFile::default();
        let state = CameraState { x: 3.0, y: 4.0, scale: 1.25 };
        assert!(file.set("s", state));
        assert!(!file.set("s", state));
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempdir().expect("tempdir");
        let file = CameraFile::load_or_default(&dir.path().join("none.json")).expect("default");
        assert!(file.sessions.is_empty());
    }

    #[test]
    fn corrupt_file_is_invalid_data() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("camera.json");
        fs::write(&path, "{not json").expect("write");
        let err = CameraFile::load_or_default(&path).expect_err("corrupt");
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
