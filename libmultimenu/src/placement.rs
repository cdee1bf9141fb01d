//! Placement of game images into free flash sectors.
//!
//! The bootloader maps a game by shifting its block index, so every game must start on a multiple
//! of its own (power of two) size. Games are placed largest first, each at the lowest free
//! position that satisfies this alignment.

use std::cmp::Reverse;

use log::{debug, info, warn};

use crate::{
    game::{Game, Placement},
    geometry::MIB,
    image::{CompositeImage, LogoPatch},
    sector::{SectorMap, SectorTag},
};

/// Size of the region games flagged with `map_256m` are aligned to.
pub const WIDE_MAP_SIZE: usize = 32 * MIB;

/// Finds the first start sector at or after `scan_start` that is a multiple of `align` and is
/// followed by `len` free sectors.
#[must_use]
pub fn find_free(map: &SectorMap, scan_start: usize, len: usize, align: usize) -> Option<usize> {
    let first = scan_start.checked_next_multiple_of(align)?;

    (first..map.len())
        .step_by(align)
        .find(|&start| map.is_free(start, len))
}

/// Places `games` in descending order of map size, starting the search at `scan_start`, copies
/// their images into `image` and offers each placed image's boot logo to `logo`.
///
/// Returns the indices into `games` of the games that did not fit, in placement order.
pub fn place_games(
    games: &mut [Game],
    scan_start: usize,
    map: &mut SectorMap,
    image: &mut CompositeImage,
    logo: &mut LogoPatch,
) -> Vec<usize> {
    let geometry = *image.geometry();

    // Stable, so equally sized games keep their configuration order.
    let mut order: Vec<_> = (0..games.len()).collect();
    order.sort_by_key(|&i| Reverse(games[i].map_size()));

    let mut unplaced = Vec::new();
    for i in order {
        let game = &mut games[i];
        let sector_count = game.sector_count(&geometry);
        let map_sectors = game.alignment_sectors(&geometry);

        let Some(sector_offset) = find_free(map, scan_start, sector_count, map_sectors) else {
            warn!(
                "no space left for \"{}\" ({:#x} bytes)",
                game.entry.title,
                game.map_size()
            );
            unplaced.push(i);
            continue;
        };

        map.reserve(sector_offset, sector_count, SectorTag::Rom);
        image.write_sector(sector_offset, game.rom.bytes());
        debug!(
            "placed \"{}\" at sector {sector_offset:#x} ({sector_count} sectors, aligned to {map_sectors})",
            game.entry.title
        );

        if logo.offer(image, &game.rom) {
            info!("using the boot logo of \"{}\"", game.entry.title);
        }

        game.placement = Some(Placement {
            sector_offset,
            sector_count,
            map_sectors,
        });
    }

    unplaced
}
