use std::{
    fmt::{self, Display, Formatter},
    ops::Range,
};

use log::debug;
use sha1::{Digest, Sha1};

use crate::{
    bytes::ByteAccess,
    geometry::CartridgeGeometry,
    rom::{self, Rom, BOOT_LOGO_RANGE, BOOT_LOGO_SHA1},
};

/// Value of erased flash.
pub const ERASED: u8 = 0xff;

pub const STATUS_BLOCK_LEN: usize = 16;

const STATUS_MAGIC: &[u8; 4] = b"KUMA";

/// Header bytes covered by the complement check.
pub const CHECKSUM_RANGE: Range<usize> = 0xa0..0xbd;
pub const CHECKSUM_OFFSET: usize = 0xbd;
pub const GAME_CODE_OFFSET: usize = 0xac;

/// Digits of the content hash used in the cartridge code.
const CODE_HASH_DIGITS: usize = 3;

/// The bootloader checks this block to recognize an already initialized cartridge.
#[must_use]
pub fn status_block(battery_present: bool) -> [u8; STATUS_BLOCK_LEN] {
    let mut block = [0; STATUS_BLOCK_LEN];
    block[..STATUS_MAGIC.len()].copy_from_slice(STATUS_MAGIC);
    block[5] = battery_present.into();

    block
}

/// Header complement check computed the same way the BIOS verifies it.
#[must_use]
pub fn header_checksum(header: &[u8]) -> u8 {
    header
        .iter()
        .fold(0u8, |sum, &b| sum.wrapping_sub(b))
        .wrapping_sub(0x19)
}

/// Four character game code derived from the contents of the menu's data regions.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct CartridgeCode([u8; 4]);

impl CartridgeCode {
    #[must_use]
    pub fn from_contents(status: &[u8], item_list: &[u8]) -> Self {
        let mut hasher = Sha1::new();
        hasher.update(status);
        hasher.update(item_list);
        let digest = hasher.finalize();

        let hex: String = digest.iter().take(2).map(|b| format!("{b:02X}")).collect();
        let mut code = [b'L'; 4];
        code[1..].copy_from_slice(&hex.as_bytes()[..CODE_HASH_DIGITS]);

        Self(code)
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8; 4] {
        &self.0
    }
}

impl Display for CartridgeCode {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.0.iter().try_for_each(|&b| write!(f, "{}", char::from(b)))
    }
}

/// The full flash contents being assembled.
#[derive(Debug, Clone)]
pub struct CompositeImage {
    buf: Box<[u8]>,
    geometry: CartridgeGeometry,
}

impl CompositeImage {
    #[must_use]
    pub fn new(geometry: CartridgeGeometry) -> Self {
        Self {
            buf: vec![ERASED; geometry.flash_size()].into_boxed_slice(),
            geometry,
        }
    }

    #[must_use]
    pub fn geometry(&self) -> &CartridgeGeometry {
        &self.geometry
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.buf
    }

    #[must_use]
    pub fn sector(&self, sector: usize) -> &[u8] {
        let start = self.geometry.sector_offset(sector);
        &self.buf[start..start + self.geometry.sector_size()]
    }

    /// # Panics
    ///
    /// Panics if `data` does not fit inside the flash at `offset`.
    pub fn write(&mut self, offset: usize, data: &[u8]) {
        self.buf.write_bytes(offset, data);
    }

    /// See [`Self::write`].
    pub fn write_sector(&mut self, sector: usize, data: &[u8]) {
        self.write(self.geometry.sector_offset(sector), data);
    }

    #[must_use]
    pub fn has_boot_logo(&self) -> bool {
        rom::boot_logo_matches(&self.buf, &BOOT_LOGO_SHA1)
    }

    /// Writes the game code and the header checksum.
    pub fn stamp_header(&mut self, code: CartridgeCode) {
        self.write(GAME_CODE_OFFSET, code.bytes());
        let checksum = header_checksum(&self.buf[CHECKSUM_RANGE]);
        self.buf.write_byte(CHECKSUM_OFFSET, checksum);
        debug!("stamped header: code {code}, checksum {checksum:#04x}");
    }

    /// Drops everything past `len` bytes.
    #[must_use]
    pub fn into_trimmed(self, len: usize) -> Box<[u8]> {
        let mut buf = self.buf.into_vec();
        buf.truncate(len);

        buf.into_boxed_slice()
    }
}

/// Copies a boot logo into the image from the first game that has one, unless the image already
/// carries a valid logo.
#[derive(Debug, Clone)]
pub struct LogoPatch {
    digest: [u8; 20],
    found: bool,
}

impl LogoPatch {
    #[must_use]
    pub fn new(image: &CompositeImage) -> Self {
        Self::with_digest(image, BOOT_LOGO_SHA1)
    }

    pub(crate) fn with_digest(image: &CompositeImage, digest: [u8; 20]) -> Self {
        Self {
            digest,
            found: rom::boot_logo_matches(image.bytes(), &digest),
        }
    }

    #[must_use]
    pub fn found(&self) -> bool {
        self.found
    }

    /// Returns whether `rom`'s logo was copied into `image`.
    pub fn offer(&mut self, image: &mut CompositeImage, rom: &Rom) -> bool {
        if self.found || !rom::boot_logo_matches(rom.bytes(), &self.digest) {
            return false;
        }

        image.write(BOOT_LOGO_RANGE.start, &rom.bytes()[BOOT_LOGO_RANGE]);
        self.found = true;

        true
    }
}
