//! Bundle archive import/export: photo bitmaps, per-photo sidecar metadata,
//! and recorded angle values packed into one ZIP container.
//!
//! The sidecar schema round-trips the whole data model, so its field names
//! are part of the core's contract. Per-photo failures on import are logged
//! and skip only that photo; container-level failures abort with a single
//! error and leave no partial state behind.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

use crate::chart::{AngleChart, AngleKind, UsedAngles};
use crate::ledger::{AngleLedger, AngleValue};
use crate::photo::PhotoRecord;

/// Schema version written into `appinfo.json`.
pub const BUNDLE_VERSION: &str = "1.0.0";

/// Top-level bundle metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    pub version: String,
    pub date: String,
}

impl AppInfo {
    fn current() -> Self {
        Self {
            version: BUNDLE_VERSION.to_string(),
            date: chrono::Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}

/// Sidecar metadata stored next to each photo. Wire field names are the
/// 1.0.0 format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoSidecar {
    pub angle: AngleChart,
    pub is_flipped: bool,
    pub used_angle: UsedAngles,
    pub last_selected_angle_tool: Option<String>,
    pub original_path: String,
    #[serde(default)]
    pub angle_values: Vec<AngleValue>,
}

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("bundle I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("bundle container: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("bundle metadata: {0}")]
    Metadata(#[from] serde_json::Error),
}

/// Bundle entry stem: folder components of the original path plus the
/// photo's file stem, so imported folder structure survives re-export.
fn entry_stem(photo: &PhotoRecord) -> String {
    match photo.original_path.rsplit_once('/') {
        Some((folder, _)) if !folder.is_empty() => format!("{folder}/{}", photo.stem()),
        _ => photo.stem().to_string(),
    }
}

/// Write `photos` and their recorded values as a bundle at `path`.
///
/// Each photo becomes a `<stem>.png` / `<stem>.json` pair. A photo whose
/// metadata cannot be serialized is logged and skipped; container-level
/// failures abort the export.
pub fn export_bundle(
    path: &Path,
    photos: &[PhotoRecord],
    ledger: &AngleLedger,
) -> Result<(), BundleError> {
    let file = File::create(path)?;
    let mut writer = ZipWriter::new(file);
    let options = SimpleFileOptions::default();

    writer.start_file("appinfo.json", options)?;
    writer.write_all(&serde_json::to_vec_pretty(&AppInfo::current())?)?;

    for (index, photo) in photos.iter().enumerate() {
        let angle_values = ledger
            .photo(index)
            .map(|entry| entry.angles.clone())
            .unwrap_or_default();

        let sidecar = PhotoSidecar {
            angle: photo.chart.clone(),
            is_flipped: photo.is_flipped,
            used_angle: photo.used,
            last_selected_angle_tool: photo.active_kind.map(|kind| kind.code().to_string()),
            original_path: photo.original_path.clone(),
            angle_values,
        };

        let metadata = match serde_json::to_vec_pretty(&sidecar) {
            Ok(metadata) => metadata,
            Err(error) => {
                warn!(photo = %photo.name, %error, "skipping photo with unserializable metadata");
                continue;
            }
        };

        let stem = entry_stem(photo);
        writer.start_file(format!("{stem}.png"), options)?;
        writer.write_all(&photo.image)?;
        writer.start_file(format!("{stem}.json"), options)?;
        writer.write_all(&metadata)?;
    }

    writer.finish()?;
    debug!(photos = photos.len(), path = %path.display(), "bundle written");
    Ok(())
}

/// Read a bundle back into photo records and a ledger.
///
/// A missing or unreadable `appinfo.json`, or an unknown version string,
/// falls back to the 1.0.0 parser. Photos that fail to parse or validate
/// are skipped with a warning; only an invalid container aborts.
pub fn import_bundle(path: &Path) -> Result<(Vec<PhotoRecord>, AngleLedger), BundleError> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(file)?;

    let version = read_version(&mut archive);
    match version.as_str() {
        BUNDLE_VERSION => {}
        other => warn!(version = other, "unknown bundle version, parsing as 1.0.0"),
    }

    parse_v1(&mut archive)
}

fn read_version(archive: &mut ZipArchive<File>) -> String {
    let Ok(mut entry) = archive.by_name("appinfo.json") else {
        return BUNDLE_VERSION.to_string();
    };

    let mut raw = String::new();
    if entry.read_to_string(&mut raw).is_err() {
        return BUNDLE_VERSION.to_string();
    }

    match serde_json::from_str::<AppInfo>(&raw) {
        Ok(info) => info.version,
        Err(error) => {
            warn!(%error, "unreadable appinfo.json, assuming current version");
            BUNDLE_VERSION.to_string()
        }
    }
}

fn parse_v1(archive: &mut ZipArchive<File>) -> Result<(Vec<PhotoRecord>, AngleLedger), BundleError> {
    // Pair every .json sidecar with its sibling .png by shared stem;
    // unpaired entries are ignored.
    let names: BTreeSet<String> = archive.file_names().map(str::to_string).collect();
    let stems: Vec<String> = names
        .iter()
        .filter(|name| name.as_str() != "appinfo.json")
        .filter_map(|name| name.strip_suffix(".json"))
        .filter(|stem| names.contains(&format!("{stem}.png")))
        .map(str::to_string)
        .collect();

    let mut photos = Vec::new();
    let mut recorded: Vec<Vec<AngleValue>> = Vec::new();

    for stem in stems {
        let metadata = match read_entry(archive, &format!("{stem}.json")) {
            Ok(metadata) => metadata,
            Err(error) => {
                warn!(entry = %stem, %error, "skipping unreadable sidecar");
                continue;
            }
        };

        let sidecar: PhotoSidecar = match serde_json::from_slice(&metadata) {
            Ok(sidecar) => sidecar,
            Err(error) => {
                warn!(entry = %stem, %error, "skipping photo with malformed metadata");
                continue;
            }
        };

        let PhotoSidecar {
            angle,
            is_flipped,
            used_angle,
            last_selected_angle_tool,
            original_path,
            angle_values,
        } = sidecar;

        if let Err(error) = angle.validate() {
            warn!(entry = %stem, %error, "skipping photo with invalid angle definitions");
            continue;
        }

        let image = match read_entry(archive, &format!("{stem}.png")) {
            Ok(image) => image,
            Err(error) => {
                warn!(entry = %stem, %error, "skipping photo with unreadable bitmap");
                continue;
            }
        };

        let active_kind = match last_selected_angle_tool.as_deref() {
            None => None,
            Some(code) => match AngleKind::from_code(code) {
                Some(kind) => Some(kind),
                None => {
                    warn!(entry = %stem, tool = code, "ignoring unknown angle tool tag");
                    None
                }
            },
        };

        let base = match stem.rsplit_once('/') {
            Some((_, base)) => base,
            None => stem.as_str(),
        };
        let name = format!("{base}.png");
        let original_path = if original_path.is_empty() {
            format!("{stem}.png")
        } else {
            original_path
        };

        photos.push(PhotoRecord {
            name,
            original_path,
            image,
            chart: angle,
            is_flipped,
            active_kind,
            used: used_angle,
        });
        recorded.push(angle_values);
    }

    let mut ledger = AngleLedger::with_photos(photos.iter().map(|photo| photo.name.clone()));
    for (index, angle_values) in recorded.into_iter().enumerate() {
        ledger.set_photo_angles(index, angle_values);
    }

    debug!(photos = photos.len(), "bundle imported");
    Ok((photos, ledger))
}

fn read_entry(archive: &mut ZipArchive<File>, name: &str) -> Result<Vec<u8>, BundleError> {
    let mut entry = archive.by_name(name)?;
    let mut bytes = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut bytes)?;
    Ok(bytes)
}
