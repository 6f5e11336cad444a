//! Runtime configuration for the loaders and the Quetzal encoder.
//!
//! Loaded from TOML via `serde`/`toml`, mirroring the dependency stack
//! `gruesome`'s own `Cargo.toml` already carries for this purpose. None of
//! these knobs change the wire formats in spec — they only adjust
//! tolerance and safety ceilings around them.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// When `true` (the default), a truncated final object record during
    /// `ObjectTable::load` raises `CorruptStory`. When `false`, the final
    /// record is zero-padded and loading continues — useful for tools that
    /// probe malformed or hand-edited story files.
    pub strict_story_validation: bool,

    /// Upper bound in bytes on an encoded Quetzal container. `write_save`
    /// raises `QuetzalCorrupted` rather than silently producing an
    /// oversized save, guarding against runaway delta expansion if the
    /// "current memory" buffer passed in is not actually derived from the
    /// pristine baseline.
    pub max_save_bytes: u32,

    /// Whether `write_save` re-emits a previously-read `IntD` chunk
    /// verbatim on the next save.
    pub preserve_interpreter_chunk: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            strict_story_validation: true,
            max_save_bytes: 65536,
            preserve_interpreter_chunk: true,
        }
    }
}

impl Config {
    /// Parse a `Config` from a TOML document. Missing fields fall back to
    /// `Config::default()`'s values.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
