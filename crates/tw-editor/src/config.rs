//! Editor configuration.
//!
//! Defaults live in the embedded `config.toml`; user text is layered on top
//! key by key.

use serde::Deserialize;

use crate::error::EditError;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

/// Smallest usable undo depth: one before/after pair.
pub const MIN_UNDO_DEPTH: usize = 2;

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    undo: UndoConfig,
    #[serde(default)]
    generators: GeneratorConfig,
}

#[derive(Deserialize, Default)]
struct UndoConfig {
    enabled: Option<bool>,
    depth: Option<usize>,
    history: Option<usize>,
}

#[derive(Deserialize, Default)]
struct GeneratorConfig {
    noise_seed: Option<u64>,
}

/// Resolved editor settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EditorConfig {
    /// Record undo history at all
    pub undo_enabled: bool,
    /// Maximum entries per undo stack
    pub undo_depth: usize,
    /// Detached samples whose stacks are kept
    pub history_size: usize,
    /// Fixed noise seed; `None` seeds from entropy
    pub noise_seed: Option<u64>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let mut config = Self::fallback();
        match toml::from_str::<ConfigFile>(DEFAULT_CONFIG) {
            Ok(file) => config.merge(file),
            Err(e) => log::warn!(target: "config", "embedded config.toml is malformed: {e}"),
        }
        config
    }
}

impl EditorConfig {
    fn fallback() -> Self {
        Self {
            undo_enabled: true,
            undo_depth: 32,
            history_size: 16,
            noise_seed: None,
        }
    }

    /// Defaults overlaid with the settings in `text`.
    pub fn from_toml_str(text: &str) -> Result<Self, EditError> {
        let user: ConfigFile = toml::from_str(text)?;
        let mut config = Self::default();
        config.merge(user);
        Ok(config)
    }

    fn merge(&mut self, file: ConfigFile) {
        if let Some(enabled) = file.undo.enabled {
            self.undo_enabled = enabled;
        }
        if let Some(depth) = file.undo.depth {
            if depth < MIN_UNDO_DEPTH {
                log::warn!(target: "config", "undo depth {depth} too small, using {MIN_UNDO_DEPTH}");
            }
            self.undo_depth = depth.max(MIN_UNDO_DEPTH);
        }
        if let Some(history) = file.undo.history {
            self.history_size = history;
        }
        if file.generators.noise_seed.is_some() {
            self.noise_seed = file.generators.noise_seed;
        }
    }
}
