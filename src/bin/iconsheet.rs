//! Command-line front end for editing icon sheet bundles.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use iconsheet::{BatchMode, OversizePolicy, Session, SheetConfig, Tint};

/// Pack icons into a sprite sheet bundle
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    sheet: SheetArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct SheetArgs {
    /// Sheet width budget in pixels (new bundles only)
    #[arg(long, default_value_t = iconsheet::DEFAULT_MAX_WIDTH)]
    max_width: u32,

    /// What to do with icons wider than the sheet (new bundles only)
    #[arg(long, value_enum, default_value_t = OversizePolicy::Reject)]
    oversize: OversizePolicy,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Add images to a bundle, creating it if needed
    Add {
        #[arg(value_name = "BUNDLE")]
        bundle: PathBuf,
        #[arg(value_name = "IMAGE", required = true)]
        images: Vec<PathBuf>,
        /// Fail instead of skipping images that cannot be added
        #[arg(long)]
        strict: bool,
    },
    /// Remove the icon at ROW, COL and repack
    Remove {
        bundle: PathBuf,
        row: usize,
        col: usize,
    },
    /// Recolor the icon at ROW, COL with a hex color such as #ff0000
    Tint {
        bundle: PathBuf,
        row: usize,
        col: usize,
        color: Tint,
    },
    /// List icons with their cell, size, position and tint
    List { bundle: PathBuf },
    /// Print the stylesheet
    Css { bundle: PathBuf },
    /// Write a fresh copy of the bundle, or just the sheet when OUT ends in .png
    Export { bundle: PathBuf, out: PathBuf },
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = SheetConfig::new()
        .with_max_width(cli.sheet.max_width)
        .with_oversize(cli.sheet.oversize);

    match cli.command {
        Command::Add {
            bundle,
            images,
            strict,
        } => {
            let mut session = load(&bundle, config, true)?;
            let inputs = images
                .iter()
                .map(|path| fs::read(path).with_context(|| format!("reading {}", path.display())))
                .collect::<Result<Vec<_>>>()?;
            let mode = if strict {
                BatchMode::Strict
            } else {
                BatchMode::Lenient
            };

            let report = session.add_many(inputs, mode)?;
            for (index, pos) in &report.placed {
                println!("{} -> row {}, col {}", images[*index].display(), pos.row, pos.col);
            }
            for (index, err) in &report.skipped {
                eprintln!("skipped {}: {}", images[*index].display(), err);
            }
            save(&session, &bundle)
        }
        Command::Remove { bundle, row, col } => {
            let mut session = load(&bundle, config, false)?;
            session.remove(row, col)?;
            if session.grid().is_empty() {
                bail!("removing the last icon would leave an empty bundle");
            }
            save(&session, &bundle)
        }
        Command::Tint {
            bundle,
            row,
            col,
            color,
        } => {
            let mut session = load(&bundle, config, false)?;
            session.recolor(row, col, color)?;
            save(&session, &bundle)
        }
        Command::List { bundle } => {
            let session = load(&bundle, config, false)?;
            for (pos, icon) in session.grid().cells() {
                let (x, y) = icon.position();
                println!(
                    "{},{}\t{}x{}\t@{},{}\t{}",
                    pos.row,
                    pos.col,
                    icon.width(),
                    icon.height(),
                    x,
                    y,
                    icon.tint()
                );
            }
            Ok(())
        }
        Command::Css { bundle } => {
            let session = load(&bundle, config, false)?;
            print!("{}", session.stylesheet());
            Ok(())
        }
        Command::Export { bundle, out } => {
            let session = load(&bundle, config, false)?;
            let is_png = out
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("png"));
            if !is_png {
                return save(&session, &out);
            }

            let sheet = session.render()?;
            sheet
                .image
                .save(&out)
                .with_context(|| format!("writing {}", out.display()))
        }
    }
}

fn load(path: &Path, config: SheetConfig, create: bool) -> Result<Session> {
    let mut session = Session::new(config);
    if create && !path.exists() {
        return Ok(session);
    }
    session
        .open_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    Ok(session)
}

fn save(session: &Session, path: &Path) -> Result<()> {
    session
        .export_to_path(path)
        .with_context(|| format!("writing {}", path.display()))
}
