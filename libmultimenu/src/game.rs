use std::path::PathBuf;

use strum_macros::FromRepr;

use crate::{
    geometry::CartridgeGeometry,
    placement::WIDE_MAP_SIZE,
    rom::Rom,
    save::SAVE_FILE_EXTENSION,
    util::fit_text,
};

/// Longest title the menu can display, in characters.
pub const MAX_TITLE_LEN: usize = 48;

/// A game as listed in the build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameEntry {
    pub file: PathBuf,
    pub title: String,
    /// 0-based index of the menu font used for the title.
    pub title_font: u8,
    /// 1-based, as written in the configuration.
    pub save_slot: Option<u8>,
    pub enabled: bool,
    /// Map the game as a 32 MiB ROM even if it is smaller. Some games need this to boot.
    pub map_256m: bool,
}

impl GameEntry {
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            title: title.into(),
            title_font: 0,
            save_slot: None,
            enabled: true,
            map_256m: false,
        }
    }

    /// The save file that seeds this game's save slot.
    #[must_use]
    pub fn save_file(&self) -> PathBuf {
        self.file.with_extension(SAVE_FILE_EXTENSION)
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq, FromRepr)]
#[repr(u8)]
pub enum SaveType {
    #[default]
    None = 0,
    /// Battery-backed 64 KiB SRAM.
    Battery = 2,
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct SaveAssignment {
    pub save_type: SaveType,
    /// 0-based.
    pub slot: u8,
}

/// Where a game ended up in the flash.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Placement {
    pub sector_offset: usize,
    /// Sectors occupied by the game.
    pub sector_count: usize,
    /// Sectors of the region the bootloader maps the game into; may exceed `sector_count`.
    pub map_sectors: usize,
}

impl Placement {
    #[must_use]
    pub fn block_offset(&self, geometry: &CartridgeGeometry) -> usize {
        geometry.sectors_to_blocks(self.sector_offset)
    }

    #[must_use]
    pub fn block_count(&self, geometry: &CartridgeGeometry) -> usize {
        geometry.sectors_to_blocks(self.map_sectors)
    }
}

/// A game whose image has been read.
#[derive(Debug, Clone)]
pub struct Game {
    /// Position among the loaded games, in configuration order.
    pub index: usize,
    pub entry: GameEntry,
    pub rom: Rom,
    pub save: SaveAssignment,
    pub placement: Option<Placement>,
}

impl Game {
    #[must_use]
    pub fn new(index: usize, entry: GameEntry, rom: Rom) -> Self {
        Self {
            index,
            entry,
            rom,
            save: SaveAssignment::default(),
            placement: None,
        }
    }

    /// The title as shown by the menu.
    #[must_use]
    pub fn title(&self) -> String {
        fit_text(&self.entry.title, MAX_TITLE_LEN)
    }

    #[must_use]
    pub fn map_size(&self) -> usize {
        self.rom.map_size()
    }

    #[must_use]
    pub fn sector_count(&self, geometry: &CartridgeGeometry) -> usize {
        geometry.sectors_for(self.map_size())
    }

    /// The game's placement must start on a multiple of this many sectors.
    #[must_use]
    pub fn alignment_sectors(&self, geometry: &CartridgeGeometry) -> usize {
        let sectors = self.sector_count(geometry);
        if self.entry.map_256m {
            sectors.max(geometry.sectors_for(WIDE_MAP_SIZE))
        } else {
            sectors
        }
    }
}
