use std::{
    ffi::OsString,
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use libmultimenu::{geometry::MIB, image::CartridgeCode};

/// Size of each file written when splitting the output.
pub const PART_LEN: usize = 32 * MIB;

const CODE_PLACEHOLDER: &str = "<CODE>";

const LOG_SEPARATOR: &str = "################################";

/// Substitutes the cartridge code into an output file name.
#[must_use]
pub fn resolve_output(template: &Path, code: CartridgeCode) -> PathBuf {
    match template.to_str() {
        Some(s) => PathBuf::from(s.replace(CODE_PLACEHOLDER, &code.to_string())),
        None => template.to_path_buf(),
    }
}

/// `dir/name.ext` becomes `dir/name_part<part>.ext`.
#[must_use]
pub fn part_path(path: &Path, part: usize) -> PathBuf {
    let mut name = path.file_stem().map(OsString::from).unwrap_or_default();
    name.push(format!("_part{part}"));
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }

    path.with_file_name(name)
}

/// Writes `image` to `path`, or to consecutive [`PART_LEN`] parts of it if `split` is set.
/// Returns the paths written.
///
/// # Errors
///
/// Returns an error if a file cannot be written.
pub fn write_image(path: &Path, image: &[u8], split: bool) -> Result<Vec<PathBuf>> {
    let parts: Vec<_> = if split {
        image
            .chunks(PART_LEN)
            .enumerate()
            .map(|(i, chunk)| (part_path(path, i + 1), chunk))
            .collect()
    } else {
        vec![(path.to_path_buf(), image)]
    };

    parts
        .into_iter()
        .map(|(part, buf)| {
            fs::write(&part, buf).with_context(|| format!("failed to write output file {part:?}"))?;
            Ok(part)
        })
        .collect()
}

/// Appends a run's output and arguments to the log file.
///
/// # Errors
///
/// Returns an error if the log file cannot be opened or written.
pub fn append_log(path: &Path, text: &str, args: &[String]) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file {path:?}"))?;

    write!(file, "{text}\nArgument List: {args:?}\n\n{LOG_SEPARATOR}\n\n")
        .with_context(|| format!("failed to write log file {path:?}"))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use libmultimenu::image::status_block;

    use super::*;

    #[test]
    fn code_substituted() {
        let code = CartridgeCode::from_contents(&status_block(false), &[]);
        let path = resolve_output(Path::new("out/MULTIMENU_<CODE>.gba"), code);

        assert_eq!(path, PathBuf::from(format!("out/MULTIMENU_{code}.gba")));
        assert_eq!(
            resolve_output(Path::new("fixed.gba"), code),
            PathBuf::from("fixed.gba")
        );
    }

    #[test]
    fn part_names() {
        assert_eq!(
            part_path(Path::new("out/MULTIMENU_L123.gba"), 2),
            PathBuf::from("out/MULTIMENU_L123_part2.gba")
        );
        assert_eq!(part_path(Path::new("image"), 1), PathBuf::from("image_part1"));
    }

    #[test]
    fn split_into_parts() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.gba");
        let image = vec![7; PART_LEN + 0x100];

        let written = write_image(&path, &image, true).unwrap();

        assert_eq!(
            written,
            [dir.path().join("out_part1.gba"), dir.path().join("out_part2.gba")]
        );
        assert_eq!(fs::metadata(&written[0]).unwrap().len(), PART_LEN as u64);
        assert_eq!(fs::metadata(&written[1]).unwrap().len(), 0x100);
        assert!(!path.exists());
    }

    #[test]
    fn unsplit_single_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.gba");

        let written = write_image(&path, &[1, 2, 3], false).unwrap();

        assert_eq!(written, [path.clone()]);
        assert_eq!(fs::read(&path).unwrap(), [1, 2, 3]);
    }

    #[test]
    fn log_appended() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("log.txt");
        let args = vec!["--split".to_owned()];

        append_log(&path, "first run", &args).unwrap();
        append_log(&path, "second run", &[]).unwrap();

        let log = fs::read_to_string(&path).unwrap();
        assert!(log.starts_with("first run\nArgument List: [\"--split\"]\n"));
        assert!(log.contains("second run\nArgument List: []\n"));
        assert_eq!(log.matches(LOG_SEPARATOR).count(), 2);
    }
}
