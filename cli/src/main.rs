//! Command-line driver for the posture measurement core: pack photos into
//! bundles, inspect them, export angle CSVs, and batch-render annotated
//! images.

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use stance_core::bundle::{export_bundle, import_bundle};
use stance_core::ledger::AngleLedger;
use stance_core::photo::{PhotoRecord, PlacementRng};
use stance_core::render::{render_batch, RenderOptions, Viewport};

#[derive(Parser)]
#[command(name = "stance", version, about = "Posture angle measurement over patient photos")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pack loose photo files into a fresh bundle with empty charts.
    Pack {
        /// Photo files to include.
        #[arg(required = true)]
        photos: Vec<PathBuf>,
        /// Output bundle path.
        #[arg(short, long, default_value = "photos.zip")]
        output: PathBuf,
    },
    /// Summarize a bundle: photos, activated tools, recorded angles.
    Inspect {
        bundle: PathBuf,
    },
    /// Write the recorded angle values as CSV.
    Csv {
        bundle: PathBuf,
        #[arg(short, long, default_value = "angle_values.csv")]
        output: PathBuf,
    },
    /// Render annotated images for every used angle kind.
    Render {
        bundle: PathBuf,
        /// Output directory for the annotated PNGs.
        #[arg(short, long, default_value = "rendered")]
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Pack { photos, output } => pack(photos, output),
        Command::Inspect { bundle } => inspect(bundle),
        Command::Csv { bundle, output } => csv(bundle, output),
        Command::Render { bundle, output } => render(bundle, output),
    }
}

fn pack(paths: Vec<PathBuf>, output: PathBuf) -> Result<()> {
    let mut photos = Vec::new();
    for path in paths {
        let bytes = fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or("photo.png")
            .to_string();
        photos.push(PhotoRecord::new(name, path.display().to_string(), bytes));
    }
    if photos.is_empty() {
        bail!("no photos to pack");
    }

    let ledger = AngleLedger::with_photos(photos.iter().map(|photo| photo.name.clone()));
    export_bundle(&output, &photos, &ledger)?;
    info!(photos = photos.len(), bundle = %output.display(), "bundle written");
    Ok(())
}

fn inspect(bundle: PathBuf) -> Result<()> {
    let (photos, ledger) = import_bundle(&bundle)?;

    println!("{} photo(s)", photos.len());
    for (index, photo) in photos.iter().enumerate() {
        let used: Vec<&str> = photo.used.iter().map(|kind| kind.code()).collect();
        println!(
            "  {}: flipped={} active={} used=[{}]",
            photo.name,
            photo.is_flipped,
            photo.active_kind.map(|kind| kind.code()).unwrap_or("-"),
            used.join(", "),
        );
        if let Some(angles) = ledger.photo(index) {
            for value in &angles.angles {
                println!("    {} = {:.2}", value.kind, value.value.degrees);
            }
        }
    }
    Ok(())
}

fn csv(bundle: PathBuf, output: PathBuf) -> Result<()> {
    let (_photos, ledger) = import_bundle(&bundle)?;
    if ledger.rows().next().is_none() {
        bail!("bundle has no recorded angle values");
    }

    fs::write(&output, ledger.to_csv())
        .with_context(|| format!("writing {}", output.display()))?;
    info!(csv = %output.display(), "angle values written");
    Ok(())
}

fn render(bundle: PathBuf, output: PathBuf) -> Result<()> {
    let (mut photos, mut ledger) = import_bundle(&bundle)?;
    fs::create_dir_all(&output)?;

    let mut viewport = Viewport::new(1.0, (0.0, 0.0), (0, 0));
    let mut rng = PlacementRng::new(chrono::Utc::now().timestamp_millis() as u64);
    let opts = RenderOptions::default();

    let rendered = render_batch(&mut photos, &mut viewport, &mut ledger, &opts, &mut rng);
    if rendered.is_empty() {
        bail!("no angle tools were used on any photo; nothing to render");
    }

    for (name, bitmap) in rendered {
        let path = output.join(&name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        bitmap
            .save(&path)
            .with_context(|| format!("writing {}", path.display()))?;
        info!(image = %path.display(), "annotated render written");
    }
    Ok(())
}
