//! Durable per-user settings. The only persisted value today is the
//! remembered built-in display handle, written whenever a built-in handle is
//! observed so the panel stays addressable across launches while disabled.

use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::screen::DisplayId;

pub trait SettingsStore {
    fn remembered_builtin(&self) -> Option<DisplayId>;
    /// Overwrite-on-observe; never cleared.
    fn remember_builtin(&self, id: DisplayId);
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(default)]
struct PersistedSettings {
    builtin_display: Option<DisplayId>,
}

/// JSON-file backed store. Reads once at construction; writes through on
/// every change. Write failures are logged and do not bubble up, since
/// losing the remembered handle only costs a probe on the next launch.
pub struct JsonSettings {
    path: PathBuf,
    state: Mutex<PersistedSettings>,
}

impl JsonSettings {
    pub fn open(path: PathBuf) -> Self {
        let state = Self::read(&path).unwrap_or_default();
        JsonSettings {
            path,
            state: Mutex::new(state),
        }
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("monoff").join("state.json"))
    }

    fn read(path: &Path) -> Option<PersistedSettings> {
        let contents = std::fs::read_to_string(path).ok()?;
        match serde_json::from_str(&contents) {
            Ok(settings) => Some(settings),
            Err(err) => {
                warn!("Ignoring unreadable settings at {}: {err}", path.display());
                None
            }
        }
    }

    fn write(&self, state: &PersistedSettings) {
        let result = (|| -> anyhow::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let contents = serde_json::to_string_pretty(state)?;
            std::fs::write(&self.path, contents)?;
            Ok(())
        })();
        if let Err(err) = result {
            warn!("Failed to persist settings to {}: {err:#}", self.path.display());
        }
    }
}

impl SettingsStore for JsonSettings {
    fn remembered_builtin(&self) -> Option<DisplayId> {
        self.state.lock().builtin_display
    }

    fn remember_builtin(&self, id: DisplayId) {
        let mut state = self.state.lock();
        if state.builtin_display == Some(id) {
            return;
        }
        state.builtin_display = Some(id);
        self.write(&state);
    }
}
