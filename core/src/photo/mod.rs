//! Per-photo state: the bitmap, the landmark arena, and activation flags.

use crate::chart::{AngleChart, AngleKind, UsedAngles};

pub mod store;
pub use store::{resolve_working_set, update_point, PhotoSize, PlacementRng, ResolvedPoint};

/// One loaded photograph and everything measured on it.
///
/// The landmark arena lives inside `chart` and is owned exclusively by this
/// record; it is read and written only through the store functions.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoRecord {
    /// Display name, usually the file name.
    pub name: String,
    /// Path the photo was originally loaded from; preserved through bundle
    /// round-trips so folder structure survives.
    pub original_path: String,
    /// Encoded bitmap bytes as loaded or imported.
    pub image: Vec<u8>,
    pub chart: AngleChart,
    pub is_flipped: bool,
    /// Most recently activated angle tool, if any.
    pub active_kind: Option<AngleKind>,
    pub used: UsedAngles,
}

impl PhotoRecord {
    /// Fresh record with the standard chart and no placements.
    pub fn new(name: impl Into<String>, original_path: impl Into<String>, image: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            original_path: original_path.into(),
            image,
            chart: AngleChart::standard(),
            is_flipped: false,
            active_kind: None,
            used: UsedAngles::default(),
        }
    }

    /// Select an angle tool: remembers it as the active kind and marks it
    /// as used for batch export.
    pub fn activate(&mut self, kind: AngleKind) {
        self.active_kind = Some(kind);
        self.used.set(kind);
    }

    pub fn toggle_flip(&mut self) {
        self.is_flipped = !self.is_flipped;
    }

    /// File stem used for bundle entry names.
    pub fn stem(&self) -> &str {
        match self.name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => &self.name,
        }
    }
}
