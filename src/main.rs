//! Deepzone command line entry point.
//!
//! Works on `.zone` maps and sheet atlases without the editor GUI.
//!
//! # Commands
//!
//! - `info <zone>` – print name, size, sheet table and overlay counts
//! - `check <zone>` – store the loaded zone and reload it, reporting any drift
//! - `export <zone> [--out FILE]` – JSON tile map for engine consumption
//! - `new-zone <name> [--width --height --out]` – zone filled from the default sheet
//! - `new-sheet <png> --name --size --author [--uid]` – write a sheet's `.properties`
//! - `sheet-info <png>` – print an atlas's geometry and flagged cells
//!
//! Sheets are loaded from the configured sheets directory (`deepzone.ini`,
//! `[paths] sheets_dir`), or from `--sheets`.
//!
//! # Running
//!
//! ```sh
//! RUST_LOG=debug cargo run -- info zones/cave.zone
//! ```

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::{debug, info, warn};

use deepzone::export::Tilemap;
use deepzone::resources::editorconfig::{DEFAULT_CONFIG_PATH, EditorConfig};
use deepzone::resources::sheetmodel::{DEFAULT_TILE_SIZE, SheetModel};
use deepzone::resources::sheetstore::SheetStore;
use deepzone::resources::zone::Zone;

/// Deepzone tile-map tool
#[derive(Parser)]
#[command(version, about = "Command line tools for Deepzone zone maps and tile sheets.")]
struct Cli {
    /// Configuration file (default: ./deepzone.ini).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Sheet directory, overriding the configuration.
    #[arg(long, value_name = "DIR", global = true)]
    sheets: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a summary of a zone file.
    Info { zone: PathBuf },
    /// Store and reload a zone, failing if anything changes.
    Check { zone: PathBuf },
    /// Export a zone as a JSON tile map.
    Export {
        zone: PathBuf,
        /// Output file (default: stdout).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Create a new zone filled from the default sheet.
    NewZone {
        name: String,
        #[arg(long)]
        width: Option<usize>,
        #[arg(long)]
        height: Option<usize>,
        /// Output file (default: <zones_dir>/<name>.zone).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Write a starter .properties file next to an atlas image.
    NewSheet {
        png: PathBuf,
        #[arg(long)]
        name: String,
        #[arg(long, default_value_t = DEFAULT_TILE_SIZE)]
        size: u32,
        #[arg(long, default_value = "Unknown")]
        author: String,
        /// Sheet uid (default: random).
        #[arg(long)]
        uid: Option<u64>,
    },
    /// Print an atlas's geometry and flagged cells.
    SheetInfo { png: PathBuf },
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    std::process::exit(1);
}

fn load_sheets(dir: &Path) -> SheetStore {
    match SheetStore::load_dir(dir) {
        Ok(store) => store,
        Err(e) => {
            warn!("Cannot read sheets directory {:?}: {}", dir, e);
            SheetStore::new()
        }
    }
}

fn load_zone(game: &SheetStore, path: &Path) -> Zone {
    Zone::load_file(game, path).unwrap_or_else(|e| fail(format!("{}: {}", path.display(), e)))
}

fn print_info(zone: &Zone) {
    println!("name:     {}", zone.name());
    println!("size:     {}x{}", zone.width(), zone.height());
    for (letter, uid) in zone.sorted_sheet_index() {
        println!("sheet:    {} -> {}", letter, uid);
    }
    println!("fixtures: {}", zone.fixtures().len());
    println!("entities: {}", zone.entities().len());
    let flagged = zone
        .base_tiles()
        .iter()
        .filter(|t| !t.flags().is_empty())
        .count();
    println!("flagged base tiles: {}", flagged);
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => EditorConfig::with_path(path),
        None => EditorConfig::new(),
    };
    if let Err(e) = config.load_from_file() {
        if cli.config.is_some() {
            warn!("{}", e);
        } else {
            debug!("No {} ({}), using defaults", DEFAULT_CONFIG_PATH, e);
        }
    }
    let sheets_dir = cli.sheets.clone().unwrap_or_else(|| config.sheets_dir.clone());

    match cli.command {
        Command::Info { zone } => {
            let game = load_sheets(&sheets_dir);
            print_info(&load_zone(&game, &zone));
        }
        Command::Check { zone } => {
            let game = load_sheets(&sheets_dir);
            let loaded = load_zone(&game, &zone);
            let stored = loaded.to_zone_string();
            let reloaded = Zone::load_str(&game, &stored).unwrap_or_else(|e| fail(e));
            if reloaded.to_zone_string() != stored {
                fail(format!("{}: zone changes after a store/load cycle", zone.display()));
            }
            println!("{}: ok", zone.display());
        }
        Command::Export { zone, out } => {
            let game = load_sheets(&sheets_dir);
            let loaded = load_zone(&game, &zone);
            let json = Tilemap::from_zone(&loaded, &game)
                .to_json()
                .unwrap_or_else(|e| fail(e));
            match out {
                Some(path) => {
                    std::fs::write(&path, json).unwrap_or_else(|e| fail(e));
                    info!("Exported {:?} to {:?}", zone, path);
                }
                None => println!("{}", json),
            }
        }
        Command::NewZone {
            name,
            width,
            height,
            out,
        } => {
            let game = load_sheets(&sheets_dir);
            let zone = Zone::new(
                &game,
                &name,
                width.unwrap_or(config.zone_width),
                height.unwrap_or(config.zone_height),
            );
            let path = out.unwrap_or_else(|| config.zones_dir.join(format!("{}.zone", name)));
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).unwrap_or_else(|e| fail(e));
            }
            zone.store_file(&path).unwrap_or_else(|e| fail(e));
            println!("Zone '{}' written to {}", zone.name(), path.display());
        }
        Command::NewSheet {
            png,
            name,
            size,
            author,
            uid,
        } => {
            let uid = uid.unwrap_or_else(|| fastrand::u64(1..));
            let sheet = SheetModel::create_sheet(&png, &name, uid, size, &author)
                .unwrap_or_else(|e| fail(e));
            println!(
                "Sheet '{}' uid:{} is {}x{} tiles",
                sheet.name(),
                sheet.uid(),
                sheet.width(),
                sheet.height()
            );
        }
        Command::SheetInfo { png } => {
            let sheet = SheetModel::from_png(&png).unwrap_or_else(|e| fail(e));
            println!("name:   {}", sheet.name());
            println!("author: {}", sheet.author());
            println!("uid:    {}", sheet.uid());
            println!(
                "tiles:  {}x{} of {}px",
                sheet.width(),
                sheet.height(),
                sheet.size()
            );
            for index in 0..sheet.tile_count() {
                let flags = sheet.props_for(index);
                if flags.is_empty() {
                    continue;
                }
                if let Some(tile) = sheet.tile(index) {
                    let (cx, cy) = sheet.cell_of(index);
                    println!(
                        "  {:03} ({},{}) {:<11} {}",
                        index,
                        cx,
                        cy,
                        tile.variant().name(),
                        flags
                    );
                }
            }
        }
    }
}
