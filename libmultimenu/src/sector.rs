use std::fmt::{self, Display, Formatter, Write};

/// Characters per line when rendering a [`SectorMap`].
pub const MAP_LINE_LEN: usize = 64;

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub enum SectorTag {
    #[default]
    Free,
    Menu,
    ItemList,
    Status,
    Save,
    Rom,
}

impl SectorTag {
    #[must_use]
    pub fn symbol(self) -> char {
        match self {
            Self::Free => '.',
            Self::Menu => 'm',
            Self::ItemList => 'l',
            Self::Status => 'c',
            Self::Save => 's',
            Self::Rom => 'r',
        }
    }
}

#[derive(Debug, Default, Copy, Clone, Eq, PartialEq)]
pub struct Sector {
    pub tag: SectorTag,
    /// Set for every sector of a region except its first.
    pub continuation: bool,
}

impl Sector {
    #[must_use]
    pub fn is_free(self) -> bool {
        self.tag == SectorTag::Free
    }

    #[must_use]
    pub fn symbol(self) -> char {
        if self.continuation {
            self.tag.symbol()
        } else {
            self.tag.symbol().to_ascii_uppercase()
        }
    }
}

/// Occupancy of every sector in the flash address space.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectorMap(Box<[Sector]>);

impl SectorMap {
    #[must_use]
    pub fn new(sector_count: usize) -> Self {
        Self(vec![Sector::default(); sector_count].into_boxed_slice())
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
    pub fn get(&self, sector: usize) -> Option<Sector> {
        self.0.get(sector).copied()
    }

    #[must_use]
    pub fn tag(&self, sector: usize) -> SectorTag {
        self.get(sector).map_or(SectorTag::Free, |s| s.tag)
    }

    /// Whether all `len` sectors from `start` exist and are free.
    #[must_use]
    pub fn is_free(&self, start: usize, len: usize) -> bool {
        start
            .checked_add(len)
            .and_then(|end| self.0.get(start..end))
            .map_or(false, |sectors| sectors.iter().all(|s| s.is_free()))
    }

    /// # Panics
    ///
    /// Panics if the range is empty, out of bounds, or overlaps a previous reservation. Regions
    /// never legitimately overlap, so this always indicates a layout bug.
    pub fn reserve(&mut self, start: usize, len: usize, tag: SectorTag) {
        assert!(len > 0 && tag != SectorTag::Free, "bad sector reservation");
        assert!(
            self.is_free(start, len),
            "sectors {start:#x}..{:#x} are not free for {tag:?} (map len {:#x})",
            start + len,
            self.len()
        );

        for (i, sector) in self.0[start..start + len].iter_mut().enumerate() {
            *sector = Sector {
                tag,
                continuation: i > 0,
            };
        }
    }

    #[must_use]
    pub fn used_count(&self) -> usize {
        self.0.iter().filter(|s| !s.is_free()).count()
    }

    /// Index one past the last used sector, or 0 if nothing is used.
    #[must_use]
    pub fn end_of_used(&self) -> usize {
        self.0.iter().rposition(|s| !s.is_free()).map_or(0, |i| i + 1)
    }

    #[must_use]
    pub fn last_of(&self, tag: SectorTag) -> Option<usize> {
        self.0.iter().rposition(|s| s.tag == tag)
    }

    /// Iterates over reserved regions as `(start, len, tag)`.
    pub fn regions(&self) -> impl Iterator<Item = (usize, usize, SectorTag)> + '_ {
        let mut i = 0;
        std::iter::from_fn(move || {
            while i < self.0.len() && self.0[i].is_free() {
                i += 1;
            }
            let start = i;
            let tag = self.0.get(start)?.tag;
            i += 1;
            while i < self.0.len() && self.0[i].continuation && self.0[i].tag == tag {
                i += 1;
            }

            Some((start, i - start, tag))
        })
    }
}

impl Display for SectorMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, sector) in self.0.iter().enumerate() {
            if i > 0 && i % MAP_LINE_LEN == 0 {
                f.write_char('\n')?;
            }
            f.write_char(sector.symbol())?;
        }

        Ok(())
    }
}
