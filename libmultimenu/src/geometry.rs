use std::{
    error::Error,
    fmt::{self, Display, Formatter},
};

use strum_macros::{EnumIter, FromRepr};

pub const MIB: usize = 1024 * 1024;

/// Block offsets and counts are stored as 16-bit values in the descriptor table.
const MAX_BLOCK_COUNT: usize = 0xffff;

/// Sizes of a flash chip's address space and its erase/addressing units.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct CartridgeGeometry {
    flash_size: usize,
    sector_size: usize,
    block_size: usize,
}

impl CartridgeGeometry {
    /// # Errors
    ///
    /// Returns an error if any size is not a power of two, if `block_size` is not a multiple of
    /// `sector_size`, if `flash_size` is not a multiple of `block_size`, or if the flash holds
    /// more blocks than a descriptor entry can address.
    pub fn new(
        flash_size: usize,
        sector_size: usize,
        block_size: usize,
    ) -> Result<Self, InvalidGeometry> {
        let valid = [flash_size, sector_size, block_size]
            .iter()
            .all(|size| size.is_power_of_two())
            && block_size % sector_size == 0
            && flash_size % block_size == 0
            && flash_size / block_size <= MAX_BLOCK_COUNT;

        if !valid {
            return Err(InvalidGeometry {
                flash_size,
                sector_size,
                block_size,
            });
        }

        Ok(Self {
            flash_size,
            sector_size,
            block_size,
        })
    }

    #[must_use]
    pub fn flash_size(&self) -> usize {
        self.flash_size
    }

    #[must_use]
    pub fn sector_size(&self) -> usize {
        self.sector_size
    }

    #[must_use]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    #[must_use]
    pub fn sector_count(&self) -> usize {
        self.flash_size / self.sector_size
    }

    /// Byte offset of the start of `sector`.
    #[must_use]
    pub fn sector_offset(&self, sector: usize) -> usize {
        sector * self.sector_size
    }

    /// Number of sectors needed to hold `len` bytes.
    #[must_use]
    pub fn sectors_for(&self, len: usize) -> usize {
        len.div_ceil(self.sector_size)
    }

    /// Converts a sector index or count into blocks, rounding down.
    #[must_use]
    pub fn sectors_to_blocks(&self, sectors: usize) -> usize {
        sectors * self.sector_size / self.block_size
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct InvalidGeometry {
    pub flash_size: usize,
    pub sector_size: usize,
    pub block_size: usize,
}

impl Display for InvalidGeometry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid cartridge geometry (flash size {:#x}, sector size {:#x}, block size {:#x})",
            self.flash_size, self.sector_size, self.block_size
        )
    }
}

impl Error for InvalidGeometry {}

/// Supported flash cartridge variants, numbered as in the build configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq, FromRepr, EnumIter)]
#[repr(u8)]
pub enum CartridgeType {
    Msp55lv100s = 1,
    S6600m0u0be = 2,
}

impl CartridgeType {
    #[must_use]
    pub fn number(self) -> u8 {
        self as _
    }

    #[must_use]
    pub fn flash_chip(self) -> &'static str {
        match self {
            Self::Msp55lv100s => "MSP55LV100S",
            Self::S6600m0u0be => "6600M0U0BE",
        }
    }

    #[must_use]
    pub fn geometry(self) -> CartridgeGeometry {
        match self {
            Self::Msp55lv100s => CartridgeGeometry {
                flash_size: 64 * MIB,
                sector_size: 0x2_0000,
                block_size: 0x8_0000,
            },
            Self::S6600m0u0be => CartridgeGeometry {
                flash_size: 256 * MIB,
                sector_size: 0x4_0000,
                block_size: 0x8_0000,
            },
        }
    }
}

impl Display for CartridgeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.flash_chip())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use strum::IntoEnumIterator;

    #[test]
    fn known_cartridges_have_valid_geometry() {
        for cart in CartridgeType::iter() {
            let geometry = cart.geometry();
            let checked = CartridgeGeometry::new(
                geometry.flash_size(),
                geometry.sector_size(),
                geometry.block_size(),
            );

            assert_eq!(checked, Ok(geometry), "{cart}");
            assert_eq!(
                geometry.sector_count() * geometry.sector_size(),
                geometry.flash_size()
            );
        }
    }

    #[test]
    fn cartridge_numbers_round_trip() {
        for cart in CartridgeType::iter() {
            assert_eq!(CartridgeType::from_repr(cart.number()), Some(cart));
        }
        assert_eq!(CartridgeType::from_repr(0), None);
        assert_eq!(CartridgeType::from_repr(3), None);
    }

    #[test]
    fn rejects_bad_geometry() {
        // Not a power of two.
        assert!(CartridgeGeometry::new(0x300_0000, 0x2_0000, 0x8_0000).is_err());
        // Block smaller than a sector.
        assert!(CartridgeGeometry::new(0x400_0000, 0x4_0000, 0x2_0000).is_err());
        // Flash smaller than a block.
        assert!(CartridgeGeometry::new(0x4_0000, 0x2_0000, 0x8_0000).is_err());
        // Too many blocks to address.
        assert!(CartridgeGeometry::new(1 << 31, 0x1000, 0x1000).is_err());

        assert!(CartridgeGeometry::new(0x400_0000, 0x2_0000, 0x2_0000).is_ok());
    }

    #[test]
    fn sector_conversions() {
        let geometry = CartridgeType::Msp55lv100s.geometry();

        assert_eq!(geometry.sector_count(), 512);
        assert_eq!(geometry.sectors_for(0), 0);
        assert_eq!(geometry.sectors_for(1), 1);
        assert_eq!(geometry.sectors_for(0x2_0000), 1);
        assert_eq!(geometry.sectors_for(0x2_0001), 2);
        assert_eq!(geometry.sector_offset(3), 0x6_0000);
        assert_eq!(geometry.sectors_to_blocks(8), 2);
        assert_eq!(geometry.sectors_to_blocks(3), 0);
    }
}
