//! Latest computed angle values per photo, across the whole photo set.
//!
//! The ledger backs tabular export: it keeps at most one live value per
//! (photo, angle kind) pair, superseding in place, and only empties on a
//! full photo-set reload.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::chart::AngleKind;
use crate::engine::CalculatedAngle;

/// Latest value for one angle kind on one photo.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AngleValue {
    #[serde(rename = "type")]
    pub kind: AngleKind,
    pub value: CalculatedAngle,
}

/// Recorded values for one photo, in first-record order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoAngles {
    pub name: String,
    pub angles: Vec<AngleValue>,
}

/// The most recent computed value for every (photo, angle kind) pair.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AngleLedger {
    photos: Vec<PhotoAngles>,
}

/// One flattened ledger row for tabular export.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LedgerRow<'a> {
    pub photo: &'a str,
    pub kind: AngleKind,
    pub degrees: f64,
}

impl AngleLedger {
    /// Ledger with one empty slot per photo name.
    pub fn with_photos<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            photos: names
                .into_iter()
                .map(|name| PhotoAngles {
                    name: name.into(),
                    angles: Vec::new(),
                })
                .collect(),
        }
    }

    /// Drop everything and restart for a freshly loaded photo set.
    pub fn reset<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        *self = Self::with_photos(names);
    }

    pub fn len(&self) -> usize {
        self.photos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    pub fn photo(&self, index: usize) -> Option<&PhotoAngles> {
        self.photos.get(index)
    }

    /// Record `value` for `(photo, kind)`, superseding any prior entry for
    /// the pair in place: at most one live value per pair, and the pair
    /// keeps its original position in the row order. Out-of-range photo
    /// indices are ignored.
    pub fn record(&mut self, photo: usize, kind: AngleKind, value: CalculatedAngle) {
        let Some(entry) = self.photos.get_mut(photo) else {
            return;
        };
        match entry.angles.iter_mut().find(|angle| angle.kind == kind) {
            Some(existing) => existing.value = value,
            None => entry.angles.push(AngleValue { kind, value }),
        }
    }

    /// Replace one photo's values wholesale (bundle import).
    pub fn set_photo_angles(&mut self, photo: usize, angles: Vec<AngleValue>) {
        if let Some(entry) = self.photos.get_mut(photo) {
            entry.angles = angles;
        }
    }

    /// Flat rows in ledger insertion order.
    pub fn rows(&self) -> impl Iterator<Item = LedgerRow<'_>> {
        self.photos.iter().flat_map(|photo| {
            photo.angles.iter().map(move |angle| LedgerRow {
                photo: &photo.name,
                kind: angle.kind,
                degrees: angle.value.degrees,
            })
        })
    }

    /// CSV export: one row per recorded (photo, kind) pair, values to two
    /// decimal places.
    pub fn to_csv(&self) -> String {
        let mut csv = String::from("Photo Name,Angle Name,Angle Value\n");
        for row in self.rows() {
            let _ = writeln!(csv, "{},{},{:.2}", row.photo, row.kind, row.degrees);
        }
        csv
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(degrees: f64) -> CalculatedAngle {
        CalculatedAngle {
            x: 1.0,
            y: 2.0,
            degrees,
        }
    }

    #[test]
    fn recording_twice_keeps_only_the_latest_value() {
        let mut ledger = AngleLedger::with_photos(["a.png"]);
        ledger.record(0, AngleKind::Pisa, value(10.0));
        ledger.record(0, AngleKind::Pisa, value(20.0));

        let rows: Vec<_> = ledger.rows().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].degrees, 20.0);
    }

    #[test]
    fn row_count_equals_distinct_pairs() {
        let mut ledger = AngleLedger::with_photos(["a.png", "b.png"]);
        ledger.record(0, AngleKind::Pisa, value(1.0));
        ledger.record(0, AngleKind::Back, value(2.0));
        ledger.record(0, AngleKind::Pisa, value(3.0));
        ledger.record(1, AngleKind::Pisa, value(4.0));
        ledger.record(1, AngleKind::Pisa, value(5.0));

        assert_eq!(ledger.rows().count(), 3);
    }

    #[test]
    fn superseding_preserves_first_record_order() {
        let mut ledger = AngleLedger::with_photos(["a.png"]);
        ledger.record(0, AngleKind::Pisa, value(1.0));
        ledger.record(0, AngleKind::Back, value(2.0));
        ledger.record(0, AngleKind::Pisa, value(3.0));

        let kinds: Vec<_> = ledger.rows().map(|row| row.kind).collect();
        assert_eq!(kinds, vec![AngleKind::Pisa, AngleKind::Back]);
    }

    #[test]
    fn out_of_range_photo_is_ignored() {
        let mut ledger = AngleLedger::with_photos(["a.png"]);
        ledger.record(5, AngleKind::Pisa, value(1.0));
        assert_eq!(ledger.rows().count(), 0);
    }

    #[test]
    fn csv_has_header_and_two_decimal_values() {
        let mut ledger = AngleLedger::with_photos(["front.png", "side.png"]);
        ledger.record(0, AngleKind::TotalCervical, value(90.0));
        ledger.record(1, AngleKind::Pisa, value(12.346));

        let csv = ledger.to_csv();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Photo Name,Angle Name,Angle Value");
        assert_eq!(lines[1], "front.png,totalCC,90.00");
        assert_eq!(lines[2], "side.png,pisa,12.35");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn reset_drops_all_entries() {
        let mut ledger = AngleLedger::with_photos(["a.png"]);
        ledger.record(0, AngleKind::Pisa, value(1.0));
        ledger.reset(["b.png", "c.png"]);

        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.rows().count(), 0);
        assert_eq!(ledger.photo(0).unwrap().name, "b.png");
    }

    #[test]
    fn angle_value_serializes_with_wire_field_names() {
        let entry = AngleValue {
            kind: AngleKind::Back,
            value: value(33.5),
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert_eq!(
            json,
            "{\"type\":\"back\",\"value\":{\"x\":1.0,\"y\":2.0,\"angle\":33.5}}"
        );
    }
}
