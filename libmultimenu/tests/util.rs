use std::{fs, path::Path};

use libmultimenu::{
    game::GameEntry,
    rom::{MenuRom, Rom},
};
use once_cell::sync::Lazy;

/// A 32 KiB menu whose payload fills it completely.
pub static MENU: Lazy<MenuRom> = Lazy::new(|| menu_rom(0x8000));

pub fn menu_rom(len: usize) -> MenuRom {
    let mut buf = vec![0xaa; len];
    buf[len - 8..].copy_from_slice(b"dkARM\0\0\0");
    MenuRom::new(Rom::from(buf)).expect("menu ROM without payload marker")
}

/// Writes a game image of `len` bytes filled with `fill` and returns its configuration entry.
pub fn write_game(dir: &Path, name: &str, len: usize, fill: u8) -> GameEntry {
    let path = dir.join(format!("{name}.gba"));
    fs::write(&path, vec![fill; len]).expect("failed to write test ROM");

    GameEntry::new(path, name)
}

#[allow(unused)]
pub fn write_save(dir: &Path, name: &str, buf: &[u8]) {
    fs::write(dir.join(format!("{name}.sav")), buf).expect("failed to write test save");
}
