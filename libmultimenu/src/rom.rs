use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    fs, io,
    ops::Range,
    path::Path,
};

use sha1::{Digest, Sha1};

/// Location of the boot logo within a cartridge header.
pub const BOOT_LOGO_RANGE: Range<usize> = 0x04..0xa0;

/// SHA-1 of the boot logo the BIOS accepts.
pub const BOOT_LOGO_SHA1: [u8; 20] = [
    0x17, 0xda, 0xa0, 0xfe, 0xc0, 0x2f, 0xc3, 0x3c, 0x0f, 0x6a, 0xbb, 0x54, 0x9a, 0x8b, 0x80, 0xb6,
    0x61, 0x3b, 0x48, 0xee,
];

/// Smallest region a game is mapped into.
pub const MIN_MAP_SIZE: usize = 0x8_0000;

/// The menu ROM's payload ends right after this linker marker.
const MENU_PAYLOAD_MARKER: &[u8] = b"dkARM\0\0\0";

/// Size of the region a ROM image of `len` bytes is mapped into: the next power of two, but no
/// less than [`MIN_MAP_SIZE`].
#[must_use]
pub fn map_size(len: usize) -> usize {
    len.next_power_of_two().max(MIN_MAP_SIZE)
}

pub(crate) fn boot_logo_matches(buf: &[u8], digest: &[u8; 20]) -> bool {
    buf.get(BOOT_LOGO_RANGE)
        .map_or(false, |logo| Sha1::digest(logo).as_slice() == digest)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rom(Box<[u8]>);

impl Rom {
    /// # Errors
    ///
    /// Returns an error if reading fails. See [`fs::read`].
    pub fn from_file(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self(fs::read(path)?.into_boxed_slice()))
    }

    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn map_size(&self) -> usize {
        map_size(self.len())
    }

    #[must_use]
    pub fn has_boot_logo(&self) -> bool {
        boot_logo_matches(&self.0, &BOOT_LOGO_SHA1)
    }
}

impl From<Vec<u8>> for Rom {
    fn from(buf: Vec<u8>) -> Self {
        Self(buf.into_boxed_slice())
    }
}

/// The bootloader image that occupies the start of the flash.
#[derive(Debug, Clone)]
pub struct MenuRom {
    rom: Rom,
    payload_len: usize,
}

impl TryFrom<Rom> for MenuRom {
    type Error = InvalidMenuRom;

    /// # Errors
    /// Returns an error if the image does not contain the payload end marker.
    fn try_from(rom: Rom) -> Result<Self, Self::Error> {
        let payload_len = rom
            .bytes()
            .windows(MENU_PAYLOAD_MARKER.len())
            .position(|window| window == MENU_PAYLOAD_MARKER)
            .ok_or(InvalidMenuRom)?
            + MENU_PAYLOAD_MARKER.len();

        Ok(Self { rom, payload_len })
    }
}

impl MenuRom {
    /// See `Self::try_from(Rom)`
    #[allow(clippy::missing_errors_doc)]
    pub fn new(rom: Rom) -> Result<Self, InvalidMenuRom> {
        Self::try_from(rom)
    }

    /// The image up to and including its payload end marker.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.rom.bytes()[..self.payload_len]
    }
}

#[derive(Debug)]
pub struct InvalidMenuRom;

impl Display for InvalidMenuRom {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "Not a menu ROM (payload end marker not found)")
    }
}

impl Error for InvalidMenuRom {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_size_rounds_up() {
        assert_eq!(map_size(0), MIN_MAP_SIZE);
        assert_eq!(map_size(1), MIN_MAP_SIZE);
        assert_eq!(map_size(0x4_0000), MIN_MAP_SIZE);
        assert_eq!(map_size(0x8_0001), 0x10_0000);
        assert_eq!(map_size(0x60_0000), 0x80_0000);
    }

    #[test]
    fn map_size_keeps_powers_of_two() {
        assert_eq!(map_size(0x8_0000), 0x8_0000);
        assert_eq!(map_size(0x100_0000), 0x100_0000);
        assert_eq!(map_size(0x200_0000), 0x200_0000);
    }

    #[test]
    fn menu_payload_ends_after_marker() {
        let mut buf = vec![0xaa; 0x100];
        buf[0x40..0x48].copy_from_slice(MENU_PAYLOAD_MARKER);
        let menu = MenuRom::new(Rom::from(buf)).unwrap();

        assert_eq!(menu.payload().len(), 0x48);
        assert!(menu.payload().ends_with(MENU_PAYLOAD_MARKER));
    }

    #[test]
    fn menu_without_marker_is_rejected() {
        assert!(MenuRom::new(Rom::from(vec![0; 0x1000])).is_err());
        assert!(MenuRom::new(Rom::from(b"dkARM\0\0".to_vec())).is_err());
    }

    #[test]
    fn boot_logo_digest_checked() {
        let mut buf = vec![0; 0xc0];
        buf[BOOT_LOGO_RANGE].fill(0x5a);
        let digest: [u8; 20] = Sha1::digest(&buf[BOOT_LOGO_RANGE])
            .as_slice()
            .try_into()
            .unwrap();

        assert!(boot_logo_matches(&buf, &digest));
        assert!(!boot_logo_matches(&buf, &BOOT_LOGO_SHA1));
        assert!(!boot_logo_matches(&buf[..0x9f], &digest));
        assert!(!Rom::from(buf).has_boot_logo());
    }
}
