//! Static description of the clinical angle chart: which landmark slots
//! exist, how they connect into measurement segments, and which segment
//! pairs produce a reported angle.
//!
//! Everything in this module is configuration, not computed state. It is
//! validated once at load time; index errors here are programming or import
//! bugs and must never reach the recomputation path.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::geometry::Point2;

mod standard;

/// Number of landmark slots shared by all angle kinds on one photo.
pub const LANDMARK_SLOTS: usize = 11;

/// The four clinical angle categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AngleKind {
    #[serde(rename = "totalCC")]
    TotalCervical,
    #[serde(rename = "upperCC")]
    UpperCervical,
    #[serde(rename = "pisa")]
    Pisa,
    #[serde(rename = "back")]
    Back,
}

impl AngleKind {
    pub const ALL: [AngleKind; 4] = [
        AngleKind::TotalCervical,
        AngleKind::UpperCervical,
        AngleKind::Pisa,
        AngleKind::Back,
    ];

    /// Wire tag used in bundle metadata and CSV rows.
    pub fn code(&self) -> &'static str {
        match self {
            Self::TotalCervical => "totalCC",
            Self::UpperCervical => "upperCC",
            Self::Pisa => "pisa",
            Self::Back => "back",
        }
    }

    /// Parse a wire tag. Unknown tags are rejected here, at the boundary,
    /// so every other lookup can match exhaustively.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "totalCC" => Some(Self::TotalCervical),
            "upperCC" => Some(Self::UpperCervical),
            "pisa" => Some(Self::Pisa),
            "back" => Some(Self::Back),
            _ => None,
        }
    }
}

impl fmt::Display for AngleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One landmark slot. Coordinates stay unset until the slot is placed on
/// the photo; the slot's position in the sequence is its identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Landmark {
    pub x: Option<f64>,
    pub y: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl Landmark {
    pub fn unset(info: &str) -> Self {
        Self {
            x: None,
            y: None,
            info: Some(info.to_string()),
        }
    }

    /// Concrete position, if both coordinates are placed.
    pub fn position(&self) -> Option<Point2> {
        match (self.x, self.y) {
            (Some(x), Some(y)) => Some(Point2::new(x, y)),
            _ => None,
        }
    }

    pub fn label(&self) -> &str {
        self.info.as_deref().unwrap_or("")
    }
}

/// Template for one measurement segment between two landmark slots, with
/// optional extension past either end expressed in logical overlap units
/// (scaled to pixels by the current zoom before use).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub start_index: usize,
    pub end_index: usize,
    pub start_overlap: f64,
    pub end_overlap: f64,
}

impl Connection {
    pub const fn plain(start_index: usize, end_index: usize) -> Self {
        Self {
            start_index,
            end_index,
            start_overlap: 0.0,
            end_overlap: 0.0,
        }
    }

    pub const fn end_extended(start_index: usize, end_index: usize, end_overlap: f64) -> Self {
        Self {
            start_index,
            end_index,
            start_overlap: 0.0,
            end_overlap,
        }
    }
}

/// Which end of a connection a shown angle nominally anchors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SegmentEnd {
    #[serde(rename = "start")]
    Start,
    #[serde(rename = "end")]
    End,
}

/// Reference to one connection from a shown-angle declaration.
///
/// `anchor` (wire name `where`) is reserved: it round-trips through the
/// bundle format, but angles are measured on the full carrier lines, not on
/// a sub-segment anchored at the named end.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConnectionRef {
    pub index: usize,
    #[serde(rename = "where")]
    pub anchor: SegmentEnd,
}

/// Declares that the intersection of two (possibly extended) connections is
/// the vertex of an angle to report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShownAngle {
    #[serde(rename = "connectionA")]
    pub a: ConnectionRef,
    #[serde(rename = "connectionB")]
    pub b: ConnectionRef,
}

impl ShownAngle {
    /// Junction between connection `a`'s end and connection `b`'s start.
    pub const fn end_start(a: usize, b: usize) -> Self {
        Self {
            a: ConnectionRef {
                index: a,
                anchor: SegmentEnd::End,
            },
            b: ConnectionRef {
                index: b,
                anchor: SegmentEnd::Start,
            },
        }
    }
}

/// Pins a landmark to a reference connection. Carried for chart
/// compatibility; not enforced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParallelLine {
    pub point: usize,
    pub connection: usize,
}

/// Full schema for one angle kind. Wire field names follow the 1.0.0
/// bundle format, historical spellings included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleDefinition {
    #[serde(rename = "type")]
    pub kind: AngleKind,
    #[serde(rename = "Connections")]
    pub connections: Vec<Connection>,
    #[serde(rename = "ShownedAngles")]
    pub shown_angles: Vec<ShownAngle>,
    #[serde(rename = "ParalelLines", default, skip_serializing_if = "Option::is_none")]
    pub parallel_lines: Option<Vec<ParallelLine>>,
}

impl AngleDefinition {
    /// Landmark slots referenced by this definition's connections,
    /// ascending and deduplicated.
    pub fn landmark_indices(&self) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .connections
            .iter()
            .flat_map(|c| [c.start_index, c.end_index])
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }
}

/// Which angle kinds have been activated on a photo. Wire field order is
/// part of the 1.0.0 format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedAngles {
    #[serde(rename = "totalCC")]
    pub total_cc: bool,
    pub pisa: bool,
    pub back: bool,
    #[serde(rename = "upperCC")]
    pub upper_cc: bool,
}

impl UsedAngles {
    pub fn get(&self, kind: AngleKind) -> bool {
        match kind {
            AngleKind::TotalCervical => self.total_cc,
            AngleKind::UpperCervical => self.upper_cc,
            AngleKind::Pisa => self.pisa,
            AngleKind::Back => self.back,
        }
    }

    pub fn set(&mut self, kind: AngleKind) {
        match kind {
            AngleKind::TotalCervical => self.total_cc = true,
            AngleKind::UpperCervical => self.upper_cc = true,
            AngleKind::Pisa => self.pisa = true,
            AngleKind::Back => self.back = true,
        }
    }

    /// Activated kinds in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = AngleKind> + '_ {
        AngleKind::ALL.into_iter().filter(|kind| self.get(*kind))
    }
}

/// The shared landmark arena plus the definition for every angle kind.
///
/// All four kinds index into the same flat `points` sequence; the arena is
/// the single source of truth and connections hold indices, never copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AngleChart {
    pub points: Vec<Landmark>,
    #[serde(rename = "totalCC")]
    pub total_cc: AngleDefinition,
    #[serde(rename = "upperCC")]
    pub upper_cc: AngleDefinition,
    pub pisa: AngleDefinition,
    pub back: AngleDefinition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl AngleChart {
    pub fn definition(&self, kind: AngleKind) -> &AngleDefinition {
        match kind {
            AngleKind::TotalCervical => &self.total_cc,
            AngleKind::UpperCervical => &self.upper_cc,
            AngleKind::Pisa => &self.pisa,
            AngleKind::Back => &self.back,
        }
    }

    /// One kind's definition plus mutable access to the landmark arena,
    /// split so the resolver can write placements while reading the
    /// definition.
    pub fn definition_and_points_mut(
        &mut self,
        kind: AngleKind,
    ) -> (&AngleDefinition, &mut [Landmark]) {
        match kind {
            AngleKind::TotalCervical => (&self.total_cc, &mut self.points),
            AngleKind::UpperCervical => (&self.upper_cc, &mut self.points),
            AngleKind::Pisa => (&self.pisa, &mut self.points),
            AngleKind::Back => (&self.back, &mut self.points),
        }
    }

    /// Check every index reference against the slot and connection counts.
    pub fn validate(&self) -> Result<(), ChartError> {
        let slots = self.points.len();

        for kind in AngleKind::ALL {
            let def = self.definition(kind);

            for (connection, conn) in def.connections.iter().enumerate() {
                for slot in [conn.start_index, conn.end_index] {
                    if slot >= slots {
                        return Err(ChartError::LandmarkOutOfRange {
                            kind,
                            connection,
                            slot,
                            slots,
                        });
                    }
                }
            }

            let connections = def.connections.len();
            for (shown, angle) in def.shown_angles.iter().enumerate() {
                for link in [angle.a, angle.b] {
                    if link.index >= connections {
                        return Err(ChartError::ShownAngleOutOfRange {
                            kind,
                            shown,
                            connection: link.index,
                            connections,
                        });
                    }
                }
            }

            if let Some(parallels) = &def.parallel_lines {
                for (entry, parallel) in parallels.iter().enumerate() {
                    if parallel.point >= slots {
                        return Err(ChartError::ParallelLandmarkOutOfRange {
                            kind,
                            entry,
                            slot: parallel.point,
                            slots,
                        });
                    }
                    if parallel.connection >= connections {
                        return Err(ChartError::ParallelConnectionOutOfRange {
                            kind,
                            entry,
                            connection: parallel.connection,
                            connections,
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

/// Definition errors are configuration bugs: they fail validation at load
/// time and never reach the recomputation path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChartError {
    #[error("{kind} connection {connection} references landmark slot {slot}, chart has {slots}")]
    LandmarkOutOfRange {
        kind: AngleKind,
        connection: usize,
        slot: usize,
        slots: usize,
    },
    #[error("{kind} shown angle {shown} references connection {connection}, definition has {connections}")]
    ShownAngleOutOfRange {
        kind: AngleKind,
        shown: usize,
        connection: usize,
        connections: usize,
    },
    #[error("{kind} parallel line {entry} references landmark slot {slot}, chart has {slots}")]
    ParallelLandmarkOutOfRange {
        kind: AngleKind,
        entry: usize,
        slot: usize,
        slots: usize,
    },
    #[error("{kind} parallel line {entry} references connection {connection}, definition has {connections}")]
    ParallelConnectionOutOfRange {
        kind: AngleKind,
        entry: usize,
        connection: usize,
        connections: usize,
    },
}
