//! The game list the menu reads at runtime: one fixed-size little-endian record per game.
//!
//! | Offset | Size | Field                                   |
//! |--------|------|-----------------------------------------|
//! | 0x00   | 1    | title font                              |
//! | 0x01   | 1    | title length, in UTF-16 code units      |
//! | 0x02   | 2    | offset of the game, in blocks           |
//! | 0x04   | 2    | size of the mapped region, in blocks    |
//! | 0x06   | 1    | save type                               |
//! | 0x07   | 1    | save slot                               |
//! | 0x08   | 8    | reserved                                |
//! | 0x10   | 96   | title, UTF-16LE, NUL padded             |

use crate::{
    bytes::ByteAccess,
    game::{Game, SaveType, MAX_TITLE_LEN},
    geometry::CartridgeGeometry,
    image::ERASED,
};

pub const ENTRY_LEN: usize = 0x70;

const TITLE_OFFSET: usize = 0x10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorEntry {
    pub title_font: u8,
    pub title: String,
    pub block_offset: u16,
    pub block_count: u16,
    pub save_type: SaveType,
    pub save_slot: u8,
}

impl DescriptorEntry {
    /// Returns `None` if the game has not been placed.
    #[must_use]
    pub fn from_game(game: &Game, geometry: &CartridgeGeometry) -> Option<Self> {
        let placement = game.placement?;

        // A valid geometry never has more blocks than fit in 16 bits.
        #[allow(clippy::cast_possible_truncation)]
        let (block_offset, block_count) = (
            placement.block_offset(geometry) as u16,
            placement.block_count(geometry) as u16,
        );

        Some(Self {
            title_font: game.entry.title_font,
            title: game.title(),
            block_offset,
            block_count,
            save_type: game.save.save_type,
            save_slot: game.save.slot,
        })
    }

    fn title_units(&self) -> Vec<u16> {
        self.title.encode_utf16().take(MAX_TITLE_LEN).collect()
    }

    /// # Panics
    ///
    /// Panics if `buf` is shorter than [`ENTRY_LEN`].
    pub fn encode(&self, buf: &mut [u8]) {
        let units = self.title_units();

        buf[..ENTRY_LEN].fill(0);
        buf.write_byte(0, self.title_font);
        #[allow(clippy::cast_possible_truncation)]
        buf.write_byte(1, units.len() as u8);
        buf.write_hword(2, self.block_offset);
        buf.write_hword(4, self.block_count);
        buf.write_byte(6, self.save_type as u8);
        buf.write_byte(7, self.save_slot);
        for (i, &unit) in units.iter().enumerate() {
            buf.write_hword(TITLE_OFFSET + 2 * i, unit);
        }
    }

    /// Returns `None` if `buf` is too short, holds erased flash, or has an unknown save type.
    #[must_use]
    pub fn decode(buf: &[u8]) -> Option<Self> {
        let buf = buf.get(..ENTRY_LEN)?;
        if buf.read_byte(0) == ERASED {
            return None;
        }

        let title_len = usize::from(buf.read_byte(1)).min(MAX_TITLE_LEN);
        let units: Vec<_> = (0..title_len)
            .map(|i| buf.read_hword(TITLE_OFFSET + 2 * i))
            .collect();

        Some(Self {
            title_font: buf.read_byte(0),
            title: String::from_utf16_lossy(&units),
            block_offset: buf.read_hword(2),
            block_count: buf.read_hword(4),
            save_type: SaveType::from_repr(buf.read_byte(6))?,
            save_slot: buf.read_byte(7),
        })
    }
}

#[must_use]
pub fn encode_table(entries: &[DescriptorEntry]) -> Vec<u8> {
    let mut table = vec![0; entries.len() * ENTRY_LEN];
    for (entry, buf) in entries.iter().zip(table.chunks_exact_mut(ENTRY_LEN)) {
        entry.encode(buf);
    }

    table
}

/// Decodes records until the end of `buf` or the first record that is erased or invalid.
#[must_use]
pub fn decode_table(buf: &[u8]) -> Vec<DescriptorEntry> {
    buf.chunks_exact(ENTRY_LEN)
        .map_while(DescriptorEntry::decode)
        .collect()
}

/// Most records a table spanning `len` bytes can hold.
#[must_use]
pub fn capacity(len: usize) -> usize {
    len / ENTRY_LEN
}
