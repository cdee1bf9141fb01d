#![warn(clippy::pedantic)]

use std::{
    env,
    fmt::Display,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use clap::{arg, command, crate_version, Arg, ArgMatches};
use libmultimenu::{
    rom::{MenuRom, Rom},
    BuildError, Builder,
};
use log::info;

use crate::config::Config;

mod config;
mod output;

const LOG_FILE: &str = "log.txt";

/// Prints to stdout and keeps a copy for the log file.
#[derive(Default)]
struct Console {
    log: String,
}

impl Console {
    fn print(&mut self, text: impl Display) {
        let text = text.to_string();
        println!("{text}");
        self.log.push_str(&text);
        self.log.push('\n');
    }
}

fn path_arg(matches: &ArgMatches, name: &str) -> PathBuf {
    matches.value_of_os(name).map(PathBuf::from).unwrap_or_default()
}

fn generate_config(config_file: &Path, rom_dir: &Path) -> Result<()> {
    let files = config::scan_roms(rom_dir)?;
    if files.is_empty() {
        bail!(
            "No usable ROM files were found in the “{}” folder",
            rom_dir.display()
        );
    }

    Config::generate(&files).save(config_file)?;
    println!(
        "A new configuration file ({}) was created based on the files inside the “{}” folder.\n\
         Please edit the file to your liking in a text editor, then run this tool again.",
        config_file.display(),
        rom_dir.display()
    );

    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();

    let matches = command!()
        .arg(arg!(--split "Split the output into 32 MiB parts"))
        .arg(
            Arg::new("no-log")
                .long("no-log")
                .help("Don't append to the log file"),
        )
        .arg(
            arg!(--config <FILE> "Configuration file to use")
                .required(false)
                .default_value("config.json")
                .allow_invalid_utf8(true),
        )
        .arg(
            arg!(--output <FILE> "Output file; <CODE> is replaced with the cartridge code")
                .required(false)
                .default_value("MULTIMENU_<CODE>.gba")
                .allow_invalid_utf8(true),
        )
        .arg(
            arg!(--menu <FILE> "Menu ROM file")
                .required(false)
                .default_value("lk_multimenu.gba")
                .allow_invalid_utf8(true),
        )
        .arg(
            arg!(--roms <DIR> "Directory containing the game ROM files")
                .required(false)
                .default_value("roms")
                .allow_invalid_utf8(true),
        )
        .get_matches();

    let split = matches.is_present("split");
    let no_log = matches.is_present("no-log");
    let config_file = path_arg(&matches, "config");
    let output_template = path_arg(&matches, "output");
    let menu_file = path_arg(&matches, "menu");
    let rom_dir = path_arg(&matches, "roms");

    let mut console = Console::default();
    console.print(format_args!(
        "GBA Multi Game Menu ROM Builder v{}\n",
        crate_version!()
    ));

    if !menu_file.exists() {
        bail!(
            "The menu ROM is missing; expected it at “{}”",
            menu_file.display()
        );
    }
    if !config_file.exists() {
        return generate_config(&config_file, &rom_dir);
    }

    let config = Config::load(&config_file)?;
    let cartridge = config.cartridge_type()?;
    let battery_present = config.cartridge.battery_present;
    let menu_rom = Rom::from_file(&menu_file)
        .with_context(|| format!("failed to read menu ROM file {menu_file:?}"))?;
    let menu = MenuRom::new(menu_rom).with_context(|| format!("bad menu ROM {menu_file:?}"))?;
    info!("menu payload is {:#x} bytes", menu.payload().len());

    let compilation = match Builder::new(cartridge.geometry(), battery_present, &menu)
        .build(&config.entries(&rom_dir))
    {
        Err(BuildError::NoGames) => bail!(
            "No ROMs found. Delete the “{}” file to reset your configuration",
            config_file.display()
        ),
        result => result.context("failed to build the cartridge image")?,
    };

    console.print(&compilation.report);
    console.print(format_args!(
        "Cartridge Type:  {} ({} {})",
        cartridge.number(),
        cartridge.flash_chip(),
        if battery_present {
            "with battery"
        } else {
            "without battery"
        }
    ));

    let output_file = output::resolve_output(&output_template, compilation.code);
    if output_file == menu_file {
        bail!("The output file must not be the menu ROM ({})", menu_file.display());
    }
    for path in output::write_image(&output_file, &compilation.image, split)? {
        console.print(format_args!("Wrote {}", path.display()));
    }

    if !no_log {
        let args: Vec<_> = env::args_os()
            .skip(1)
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        output::append_log(Path::new(LOG_FILE), &console.log, &args)?;
    }

    Ok(())
}
