use std::{
    fmt::{self, Display, Formatter},
    ops::Range,
    path::PathBuf,
};

use crate::{image::CartridgeCode, sector::SectorMap};

/// Rows between separator lines in the game table.
const ROWS_PER_GROUP: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameRow {
    /// 1-based position in the game list.
    pub number: usize,
    pub offset: usize,
    pub map_size: usize,
    /// 1-based slot and the byte offset of its sector.
    pub save: Option<(u8, usize)>,
    pub title: String,
}

/// Human-readable summary of a build.
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub sector_map: SectorMap,
    pub sector_size: usize,
    pub battery_present: bool,
    pub games: Vec<GameRow>,
    pub menu: Range<usize>,
    pub item_list: Range<usize>,
    pub status: Range<usize>,
    pub output_len: usize,
    pub code: CartridgeCode,
    /// Enabled games whose files do not exist.
    pub missing: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

impl BuildReport {
    fn write_table(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let separator = if self.battery_present {
            writeln!(f, "    | Offset    | Map Size  | Save Slot      | Title")?;
            "----+-----------+-----------+----------------+---------------------------------"
        } else {
            writeln!(f, "    | Offset    | Map Size  | Title")?;
            "----+-----------+-----------+--------------------------------------------------"
        };

        for (i, row) in self.games.iter().enumerate() {
            if i % ROWS_PER_GROUP == 0 {
                writeln!(f, "{separator}")?;
            }

            write!(
                f,
                "{:3} | {:#09X} | {:#09X} | ",
                row.number, row.offset, row.map_size
            )?;
            if self.battery_present {
                match row.save {
                    Some((slot, offset)) => write!(f, "{slot:2} ({offset:#09X}) | ")?,
                    None => write!(f, "               | ")?,
                }
            }
            writeln!(f, "{}", row.title)?;
        }

        Ok(())
    }
}

fn write_range(f: &mut Formatter<'_>, label: &str, range: &Range<usize>) -> fmt::Result {
    writeln!(f, "{label:<17}{:#09X}–{:#09X}", range.start, range.end)
}

impl Display for BuildReport {
    #[allow(clippy::cast_precision_loss)]
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let used = self.sector_map.used_count();
        let total = self.sector_map.len();

        writeln!(f, "Sector map (1 block = {} KiB):", self.sector_size / 1024)?;
        writeln!(f, "{}", self.sector_map)?;
        writeln!(
            f,
            "{:.2}% ({used} of {total} sectors) used\n",
            used as f64 / total as f64 * 100.0
        )?;
        writeln!(f, "Added {} ROM(s) to the compilation\n", self.games.len())?;

        self.write_table(f)?;
        writeln!(f)?;

        write_range(f, "Menu ROM:", &self.menu)?;
        write_range(f, "Game List:", &self.item_list)?;
        write_range(f, "Status Area:", &self.status)?;
        writeln!(f)?;

        writeln!(
            f,
            "Output ROM Size: {:.2} MiB",
            self.output_len as f64 / 1024.0 / 1024.0
        )?;
        write!(f, "Output ROM Code: {}", self.code)?;

        for path in &self.missing {
            write!(f, "\nMissing ROM file: {}", path.display())?;
        }
        for warning in &self.warnings {
            write!(f, "\nWarning: {warning}")?;
        }

        Ok(())
    }
}
