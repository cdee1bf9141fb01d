use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{anyhow, Context, Result};
use libmultimenu::{game::GameEntry, geometry::CartridgeType};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

const ROM_EXTENSION: &str = "gba";

const BYTE_ORDER_MARK: char = '\u{feff}';

/// Cartridge used for generated configurations.
const DEFAULT_CARTRIDGE_TYPE: CartridgeType = CartridgeType::S6600m0u0be;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub cartridge: CartridgeConfig,
    pub games: Vec<GameConfig>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartridgeConfig {
    #[serde(rename = "type")]
    pub kind: u8,
    pub battery_present: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Relative to the ROM directory.
    pub file: PathBuf,
    pub title: String,
    /// 1-based.
    #[serde(default = "default_title_font")]
    pub title_font: u8,
    #[serde(default)]
    pub save_slot: Option<u8>,
    #[serde(default)]
    pub map_256m: bool,
}

fn default_title_font() -> u8 {
    1
}

impl Config {
    /// # Errors
    ///
    /// Returns an error if `text` is not a valid configuration.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text.trim_start_matches(BYTE_ORDER_MARK))
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file {path:?}"))?;

        Self::from_json(&text).with_context(|| {
            format!(
                "The configuration file ({}) is malformed and could not be loaded",
                path.display()
            )
        })
    }

    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text =
            serde_json::to_string_pretty(self).context("failed to serialize configuration")?;

        fs::write(path, text)
            .with_context(|| format!("failed to write configuration file {path:?}"))
    }

    /// A configuration enabling every file in `files`, each with its own save slot.
    #[must_use]
    pub fn generate(files: &[PathBuf]) -> Self {
        let games = files
            .iter()
            .enumerate()
            .map(|(i, file)| GameConfig {
                enabled: true,
                file: file.clone(),
                title: file
                    .file_stem()
                    .map(|stem| stem.to_string_lossy().into_owned())
                    .unwrap_or_default(),
                title_font: default_title_font(),
                save_slot: u8::try_from(i + 1).ok(),
                map_256m: false,
            })
            .collect();

        Self {
            cartridge: CartridgeConfig {
                kind: DEFAULT_CARTRIDGE_TYPE.number(),
                battery_present: false,
            },
            games,
        }
    }

    /// # Errors
    ///
    /// Returns an error if the configured type is unknown.
    pub fn cartridge_type(&self) -> Result<CartridgeType> {
        CartridgeType::from_repr(self.cartridge.kind).ok_or_else(|| {
            let known: Vec<_> = CartridgeType::iter().map(|t| t.to_string()).collect();
            anyhow!(
                "Unknown cartridge type {}; expected one of: {}",
                self.cartridge.kind,
                known.join(", ")
            )
        })
    }

    /// The games to build, with files resolved against `rom_dir`.
    #[must_use]
    pub fn entries(&self, rom_dir: &Path) -> Vec<GameEntry> {
        self.games
            .iter()
            .map(|game| GameEntry {
                file: rom_dir.join(&game.file),
                title: game.title.clone(),
                title_font: game.title_font.saturating_sub(1),
                save_slot: game.save_slot,
                enabled: game.enabled,
                map_256m: game.map_256m,
            })
            .collect()
    }
}

/// Names of the ROM files directly inside `dir`, sorted case-insensitively. A missing directory
/// holds no ROMs.
///
/// # Errors
///
/// Returns an error if the directory exists but cannot be listed.
pub fn scan_roms(dir: &Path) -> Result<Vec<PathBuf>> {
    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e).with_context(|| format!("failed to list ROM directory {dir:?}")),
    };

    let mut files = Vec::new();
    for dir_entry in read_dir {
        let path = dir_entry
            .with_context(|| format!("failed to list ROM directory {dir:?}"))?
            .path();
        let is_rom = path
            .extension()
            .map_or(false, |ext| ext.eq_ignore_ascii_case(ROM_EXTENSION));
        if is_rom && path.is_file() {
            if let Some(name) = path.file_name() {
                files.push(PathBuf::from(name));
            }
        }
    }
    files.sort_by_key(|file| file.to_string_lossy().to_lowercase());

    Ok(files)
}
