use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
    path::PathBuf,
};

use log::{debug, info, warn};

use crate::{
    descriptor::{self, DescriptorEntry, ENTRY_LEN},
    game::{Game, GameEntry, SaveType},
    geometry::CartridgeGeometry,
    image::{status_block, CartridgeCode, CompositeImage, LogoPatch},
    layout::FixedRegions,
    placement,
    report::{BuildReport, GameRow},
    rom::{MenuRom, Rom, BOOT_LOGO_SHA1},
    save::{SaveError, SaveSlots},
    sector::SectorMap,
};

/// A finished build.
#[derive(Debug, Clone)]
pub struct Compilation {
    /// The flash contents up to the end of the last used sector.
    pub image: Box<[u8]>,
    pub code: CartridgeCode,
    /// Placed games, in configuration order.
    pub games: Vec<Game>,
    pub report: BuildReport,
}

/// Assembles a flash image from a menu ROM and a list of games.
#[derive(Debug, Clone)]
pub struct Builder<'m> {
    geometry: CartridgeGeometry,
    battery_present: bool,
    menu: &'m MenuRom,
    logo_digest: [u8; 20],
}

impl<'m> Builder<'m> {
    #[must_use]
    pub fn new(geometry: CartridgeGeometry, battery_present: bool, menu: &'m MenuRom) -> Self {
        Self {
            geometry,
            battery_present,
            menu,
            logo_digest: BOOT_LOGO_SHA1,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_logo_digest(mut self, digest: [u8; 20]) -> Self {
        self.logo_digest = digest;
        self
    }

    /// Builds an image containing the enabled games of `entries`.
    ///
    /// Games whose files are missing are skipped and listed in the report, as are games that do not
    /// fit; neither is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the menu does not fit, no enabled game could be read, a game or save file
    /// cannot be read for a reason other than not existing, or the game list outgrows its sector.
    #[allow(clippy::too_many_lines)]
    pub fn build(&self, entries: &[GameEntry]) -> Result<Compilation, BuildError> {
        let geometry = self.geometry;
        let menu = self.menu.payload();
        let regions = FixedRegions::new(menu.len(), &geometry);
        if !regions.fits(geometry.sector_count()) {
            return Err(BuildError::MenuTooLarge(menu.len()));
        }

        let (mut games, missing) = load_games(entries)?;
        if games.is_empty() {
            return Err(BuildError::NoGames);
        }
        info!("loaded {} game(s), {} missing", games.len(), missing.len());

        let mut map = SectorMap::new(geometry.sector_count());
        let mut image = CompositeImage::new(geometry);
        regions.reserve(&mut map);
        image.write(0, menu);
        let status = status_block(self.battery_present);
        image.write_sector(regions.status, &status);

        let mut warnings = Vec::new();
        let mut saves = SaveSlots::new(regions.save_start());
        if self.battery_present {
            for game in &mut games {
                match saves.assign(game, &mut map, &mut image) {
                    Ok(()) => {}
                    Err(SaveError::InvalidSlot(slot)) => {
                        warn!("invalid save slot {slot} for \"{}\"", game.entry.title);
                        warnings.push(format!(
                            "“{}” has an invalid save slot ({slot}) and was added without save data.",
                            game.title()
                        ));
                    }
                    Err(SaveError::Io(path, source)) => return Err(BuildError::Io(path, source)),
                }
            }
            info!("reserved {} save sector(s)", saves.len());
        }

        let mut logo = LogoPatch::with_digest(&image, self.logo_digest);
        let unplaced =
            placement::place_games(&mut games, saves.end(), &mut map, &mut image, &mut logo);
        for &i in &unplaced {
            warnings.push(format!(
                "“{}” couldn’t be added because it exceeds the available cartridge space.",
                games[i].title()
            ));
        }
        if !logo.found() {
            warn!("no valid boot logo in the menu or any game");
            warnings.push("Valid boot logo is missing!".to_owned());
        }

        games.retain(|game| game.placement.is_some());
        let descriptors: Vec<_> = games
            .iter()
            .filter_map(|game| DescriptorEntry::from_game(game, &geometry))
            .collect();
        let table = descriptor::encode_table(&descriptors);
        if table.len() > geometry.sector_size() {
            return Err(BuildError::TooManyGames {
                count: descriptors.len(),
                max: descriptor::capacity(geometry.sector_size()),
            });
        }
        image.write_sector(regions.item_list, &table);

        let code = CartridgeCode::from_contents(&status, &table);
        image.stamp_header(code);
        let output_len = geometry.sector_offset(map.end_of_used());
        debug!("output is {output_len:#x} bytes");

        let item_list_start = geometry.sector_offset(regions.item_list);
        let status_start = geometry.sector_offset(regions.status);
        let report = BuildReport {
            games: games
                .iter()
                .zip(&descriptors)
                .enumerate()
                .map(|(i, (game, entry))| GameRow {
                    number: i + 1,
                    offset: usize::from(entry.block_offset) * geometry.block_size(),
                    map_size: usize::from(entry.block_count) * geometry.block_size(),
                    save: (entry.save_type == SaveType::Battery).then(|| {
                        (
                            game.save.slot + 1,
                            geometry.sector_offset(saves.sector_of(game.save.slot)),
                        )
                    }),
                    title: entry.title.clone(),
                })
                .collect(),
            sector_map: map,
            sector_size: geometry.sector_size(),
            battery_present: self.battery_present,
            menu: 0..menu.len(),
            item_list: item_list_start..item_list_start + table.len(),
            status: status_start..status_start + geometry.sector_size(),
            output_len,
            code,
            missing,
            warnings,
        };

        Ok(Compilation {
            image: image.into_trimmed(output_len),
            code,
            games,
            report,
        })
    }
}

/// Reads the enabled games, numbering them in configuration order. Also returns the files that
/// do not exist.
fn load_games(entries: &[GameEntry]) -> Result<(Vec<Game>, Vec<PathBuf>), BuildError> {
    let mut games = Vec::new();
    let mut missing = Vec::new();

    for entry in entries.iter().filter(|entry| entry.enabled) {
        match Rom::from_file(&entry.file) {
            Ok(rom) => games.push(Game::new(games.len(), entry.clone(), rom)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("skipping missing ROM file {:?}", entry.file);
                missing.push(entry.file.clone());
            }
            Err(e) => return Err(BuildError::Io(entry.file.clone(), e)),
        }
    }

    Ok((games, missing))
}

#[derive(Debug)]
pub enum BuildError {
    Io(PathBuf, io::Error),
    /// Length of the menu payload.
    MenuTooLarge(usize),
    NoGames,
    TooManyGames {
        count: usize,
        max: usize,
    },
}

impl Display for BuildError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(path, e) => write!(f, "Failed to read {path:?}: {e}"),
            Self::MenuTooLarge(len) => {
                write!(f, "The menu ROM ({len:#x} bytes) does not fit the cartridge")
            }
            Self::NoGames => write!(f, "No ROMs found"),
            Self::TooManyGames { count, max } => write!(
                f,
                "Too many games ({count}); the game list holds at most {max} ({ENTRY_LEN} bytes each)"
            ),
        }
    }
}

impl Error for BuildError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(_, e) => Some(e),
            _ => None,
        }
    }
}
