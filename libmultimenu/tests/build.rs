//! Builds complete images from game files on disk.

mod util;

use libmultimenu::{
    descriptor::{self, DescriptorEntry},
    game::{GameEntry, SaveType},
    geometry::CartridgeType,
    image::{self, CartridgeCode, CHECKSUM_OFFSET, CHECKSUM_RANGE, ERASED, GAME_CODE_OFFSET},
    rom::{MenuRom, Rom},
    sector::SectorTag,
    Builder, Compilation,
};
use tempfile::TempDir;
use util::{menu_rom, write_game, write_save, MENU};

const SECTOR: usize = 0x2_0000;

fn item_list(compilation: &Compilation, sector: usize) -> Vec<DescriptorEntry> {
    descriptor::decode_table(&compilation.image[sector * SECTOR..(sector + 1) * SECTOR])
}

#[test]
fn two_games_no_battery() {
    let dir = TempDir::new().unwrap();
    let entries = [
        write_game(dir.path(), "one", 0x10_0000, 1),
        write_game(dir.path(), "two", 0x20_0000, 2),
    ];

    let compilation = Builder::new(CartridgeType::Msp55lv100s.geometry(), false, &MENU)
        .build(&entries)
        .unwrap();

    let flash = &compilation.image;
    assert_eq!(flash.len(), 0x40_0000);
    assert_eq!(&flash[0x6_0000..0x6_0010], &image::status_block(false));
    assert!(flash[8 * SECTOR..16 * SECTOR].iter().all(|&b| b == 1));
    assert!(flash[16 * SECTOR..32 * SECTOR].iter().all(|&b| b == 2));
    assert!(flash[4 * SECTOR..8 * SECTOR].iter().all(|&b| b == ERASED));

    let map = compilation.report.sector_map.to_string();
    assert!(map.starts_with("M.LC....Rrrrrrrr"));

    let list = item_list(&compilation, 2);
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].title, "one");
    assert_eq!((list[0].block_offset, list[0].block_count), (2, 2));
    assert_eq!(list[1].title, "two");
    assert_eq!((list[1].block_offset, list[1].block_count), (4, 4));
    assert!(list.iter().all(|e| e.save_type == SaveType::None));
}

#[test]
fn header_stamped() {
    let dir = TempDir::new().unwrap();
    let entries = [write_game(dir.path(), "game", 0x4_0000, 0)];

    let compilation = Builder::new(CartridgeType::Msp55lv100s.geometry(), false, &MENU)
        .build(&entries)
        .unwrap();

    let flash = &compilation.image;
    let table = descriptor::encode_table(&item_list(&compilation, 2));
    let code = CartridgeCode::from_contents(&image::status_block(false), &table);
    assert_eq!(code, compilation.code);
    assert_eq!(&flash[GAME_CODE_OFFSET..GAME_CODE_OFFSET + 4], code.bytes());
    assert_eq!(code.to_string().len(), 4);
    assert!(code.to_string().starts_with('L'));
    assert_eq!(
        flash[CHECKSUM_OFFSET],
        image::header_checksum(&flash[CHECKSUM_RANGE])
    );
}

#[test]
fn rebuild_is_identical() {
    let dir = TempDir::new().unwrap();
    let entries = [
        write_game(dir.path(), "a", 0x3_0000, 3),
        write_game(dir.path(), "b", 0x9_0000, 4),
        write_game(dir.path(), "c", 0x3_0000, 5),
    ];
    let builder = Builder::new(CartridgeType::Msp55lv100s.geometry(), false, &MENU);

    let first = builder.build(&entries).unwrap();
    let second = builder.build(&entries).unwrap();
    assert_eq!(first.image, second.image);
    assert_eq!(first.code, second.code);
}

#[test]
fn only_menu_payload_copied() {
    let dir = TempDir::new().unwrap();
    let mut buf = vec![0x77; 0x1_0000];
    buf[0x100..0x108].copy_from_slice(b"dkARM\0\0\0");
    let menu = MenuRom::new(Rom::from(buf)).unwrap();
    let entries = [write_game(dir.path(), "game", 0x100, 0)];

    let compilation = Builder::new(CartridgeType::Msp55lv100s.geometry(), false, &menu)
        .build(&entries)
        .unwrap();

    assert_eq!(compilation.report.menu, 0..0x108);
    assert_eq!(&compilation.image[0x100..0x108], b"dkARM\0\0\0");
    assert!(compilation.image[0x108..SECTOR].iter().all(|&b| b == ERASED));
}

#[test]
fn large_game_on_16_mib_boundary() {
    let dir = TempDir::new().unwrap();
    let entries = [
        write_game(dir.path(), "big", 0x100_0000, 9),
        write_game(dir.path(), "small", 0x1000, 8),
    ];

    let compilation = Builder::new(CartridgeType::Msp55lv100s.geometry(), false, &MENU)
        .build(&entries)
        .unwrap();

    let list = item_list(&compilation, 2);
    assert_eq!(list[0].block_offset, 32);
    assert_eq!(list[0].block_count, 32);
    assert_eq!(list[1].block_offset, 1);
    assert_eq!(compilation.image.len(), 0x200_0000);
}

#[test]
fn saves_seeded_and_shared() {
    let dir = TempDir::new().unwrap();
    let mut first = write_game(dir.path(), "first", 0x100, 1);
    let mut second = write_game(dir.path(), "second", 0x100, 2);
    let mut third = write_game(dir.path(), "third", 0x100, 3);
    first.save_slot = Some(1);
    second.save_slot = Some(1);
    third.save_slot = Some(3);
    write_save(dir.path(), "first", &[0x5a; 0x10]);
    write_save(dir.path(), "second", &[0xa5; 0x10]);
    write_save(dir.path(), "third", &[0x33; 0x3_0000]);

    let compilation = Builder::new(CartridgeType::Msp55lv100s.geometry(), true, &MENU)
        .build(&[first, second, third])
        .unwrap();

    let flash = &compilation.image;
    assert_eq!(&flash[0x6_0000..0x6_0010], &image::status_block(true));
    // Slot 1 keeps the first game's data; later games sharing it are not imported.
    assert!(flash[4 * SECTOR..4 * SECTOR + 0x10].iter().all(|&b| b == 0x5a));
    assert!(flash[4 * SECTOR + 0x10..5 * SECTOR].iter().all(|&b| b == 0));
    assert!(flash[5 * SECTOR..6 * SECTOR].iter().all(|&b| b == ERASED));
    // Oversized save data is cut to one sector.
    assert!(flash[6 * SECTOR..7 * SECTOR].iter().all(|&b| b == 0x33));

    let map = &compilation.report.sector_map;
    assert_eq!(map.tag(4), SectorTag::Save);
    assert_eq!(map.tag(5), SectorTag::Free);
    assert_eq!(map.last_of(SectorTag::Save), Some(6));

    let list = item_list(&compilation, 2);
    let slots: Vec<_> = list.iter().map(|e| (e.save_type, e.save_slot)).collect();
    assert_eq!(
        slots,
        [
            (SaveType::Battery, 0),
            (SaveType::Battery, 0),
            (SaveType::Battery, 2)
        ]
    );
    // Games are placed after the last save sector.
    assert!(list.iter().all(|e| e.block_offset >= 2));
}

#[test]
fn missing_and_oversized_games_reported() {
    let dir = TempDir::new().unwrap();
    let menu = menu_rom(0x1000);
    let mut entries = vec![write_game(dir.path(), "fits", 0x200_0000, 1)];
    entries.push(write_game(dir.path(), "too big", 0x200_0000, 2));
    entries.push(GameEntry::new(dir.path().join("gone.gba"), "gone"));

    let compilation = Builder::new(CartridgeType::Msp55lv100s.geometry(), false, &menu)
        .build(&entries)
        .unwrap();

    assert_eq!(compilation.games.len(), 1);
    assert_eq!(compilation.games[0].entry.title, "fits");
    let text = compilation.report.to_string();
    assert!(text.contains("Added 1 ROM(s) to the compilation"));
    assert!(text.contains("Missing ROM file: "));
    assert!(text.contains(
        "“too big” couldn’t be added because it exceeds the available cartridge space."
    ));
}
