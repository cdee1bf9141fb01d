use std::{
    collections::BTreeSet,
    error::Error,
    fmt::{self, Display, Formatter},
    fs, io,
    path::PathBuf,
};

use log::debug;

use crate::{
    game::{Game, SaveAssignment, SaveType},
    image::CompositeImage,
    sector::{SectorMap, SectorTag},
    util::fit_bytes,
};

pub const SAVE_FILE_EXTENSION: &str = "sav";

/// Save sectors, one per distinct save slot, laid out from `start` by slot index.
#[derive(Debug, Clone)]
pub struct SaveSlots {
    start: usize,
    materialized: BTreeSet<u8>,
}

impl SaveSlots {
    #[must_use]
    pub fn new(start: usize) -> Self {
        Self {
            start,
            materialized: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    #[must_use]
    pub fn sector_of(&self, slot: u8) -> usize {
        self.start + usize::from(slot)
    }

    #[must_use]
    pub fn is_materialized(&self, slot: u8) -> bool {
        self.materialized.contains(&slot)
    }

    /// Number of save sectors reserved so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.materialized.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.materialized.is_empty()
    }

    /// The sector after the highest reserved save sector. Games are placed from here on.
    #[must_use]
    pub fn end(&self) -> usize {
        self.materialized
            .last()
            .map_or(self.start, |&slot| self.sector_of(slot) + 1)
    }

    /// Gives `game` battery-backed saves in its configured slot, reserving and filling the slot's
    /// sector if no game has used it before. Games without a configured slot are left alone.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot is 0 or lies past the end of the flash, or if an existing save
    /// file cannot be read.
    pub fn assign(
        &mut self,
        game: &mut Game,
        map: &mut SectorMap,
        image: &mut CompositeImage,
    ) -> Result<(), SaveError> {
        let Some(declared) = game.entry.save_slot else {
            return Ok(());
        };
        let slot = declared
            .checked_sub(1)
            .filter(|&slot| self.sector_of(slot) < map.len())
            .ok_or(SaveError::InvalidSlot(declared))?;

        if !self.is_materialized(slot) {
            let sector_size = image.geometry().sector_size();
            let path = game.entry.save_file();
            let data = match fs::read(&path) {
                Ok(buf) => {
                    debug!("importing {} bytes of save data from {path:?}", buf.len());
                    fit_bytes(&buf, sector_size)
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => vec![0; sector_size],
                Err(e) => return Err(SaveError::Io(path, e)),
            };

            let sector = self.sector_of(slot);
            map.reserve(sector, 1, SectorTag::Save);
            image.write_sector(sector, &data);
            self.materialized.insert(slot);
        }

        game.save = SaveAssignment {
            save_type: SaveType::Battery,
            slot,
        };

        Ok(())
    }
}

#[derive(Debug)]
pub enum SaveError {
    /// The configured, 1-based slot.
    InvalidSlot(u8),
    Io(PathBuf, io::Error),
}

impl Display for SaveError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSlot(slot) => write!(f, "Invalid save slot {slot}"),
            Self::Io(path, e) => write!(f, "Failed to read save file {path:?}: {e}"),
        }
    }
}

impl Error for SaveError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidSlot(_) => None,
            Self::Io(_, e) => Some(e),
        }
    }
}
