use crate::{
    geometry::CartridgeGeometry,
    sector::{SectorMap, SectorTag},
};

/// The game list starts on the first multiple of this after the menu.
pub const ITEM_LIST_ALIGN: usize = 0x4_0000;

/// Regions the bootloader finds at fixed offsets, reserved before anything else.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedRegions {
    pub menu_sectors: usize,
    pub item_list: usize,
    pub status: usize,
}

impl FixedRegions {
    #[must_use]
    pub fn new(menu_len: usize, geometry: &CartridgeGeometry) -> Self {
        // Strictly after the menu, even if it ends on an aligned offset.
        let item_list_offset = (menu_len / ITEM_LIST_ALIGN + 1) * ITEM_LIST_ALIGN;
        let item_list = geometry.sectors_for(item_list_offset);

        Self {
            menu_sectors: geometry.sectors_for(menu_len),
            item_list,
            status: item_list + 1,
        }
    }

    /// First sector available for save data.
    #[must_use]
    pub fn save_start(&self) -> usize {
        self.status + 1
    }

    /// Whether all regions lie inside a map of `sector_count` sectors.
    #[must_use]
    pub fn fits(&self, sector_count: usize) -> bool {
        self.status < sector_count
    }

    /// # Panics
    ///
    /// Panics if the regions do not fit inside `map` or were already reserved.
    pub fn reserve(&self, map: &mut SectorMap) {
        map.reserve(0, self.menu_sectors, SectorTag::Menu);
        map.reserve(self.item_list, 1, SectorTag::ItemList);
        map.reserve(self.status, 1, SectorTag::Status);
    }
}
