//! The fixed clinical chart shipped with the application.

use super::{AngleChart, AngleDefinition, AngleKind, Connection, Landmark, ParallelLine, ShownAngle};

impl AngleChart {
    /// The standard posture chart: 11 labelled landmark slots and the four
    /// angle definitions that index into them. Each definition reads a
    /// small subset of the shared arena; the slot assignments are fixed.
    pub fn standard() -> Self {
        Self {
            points: vec![
                Landmark::unset("LM"),
                Landmark::unset("L5"),
                Landmark::unset("C7"),
                Landmark::unset("FC"),
                Landmark::unset("Midpoint feet"),
                Landmark::unset("Symphysis"),
                Landmark::unset("Jugulum"),
                Landmark::unset("C1"),
                Landmark::unset("L5"),
                Landmark::unset("MA"),
                Landmark::unset("C7"),
            ],
            total_cc: AngleDefinition {
                kind: AngleKind::TotalCervical,
                connections: vec![
                    Connection::end_extended(0, 1, 20.0),
                    Connection::plain(1, 2),
                ],
                shown_angles: vec![ShownAngle::end_start(0, 1)],
                parallel_lines: None,
            },
            upper_cc: AngleDefinition {
                kind: AngleKind::UpperCervical,
                connections: vec![
                    Connection::end_extended(1, 3, 20.0),
                    Connection::plain(3, 2),
                    Connection::plain(1, 2),
                ],
                shown_angles: vec![ShownAngle::end_start(0, 1)],
                parallel_lines: Some(vec![ParallelLine {
                    point: 3,
                    connection: 2,
                }]),
            },
            pisa: AngleDefinition {
                kind: AngleKind::Pisa,
                connections: vec![
                    Connection::end_extended(4, 5, 20.0),
                    Connection::plain(5, 6),
                ],
                shown_angles: vec![ShownAngle::end_start(0, 1)],
                parallel_lines: None,
            },
            back: AngleDefinition {
                kind: AngleKind::Back,
                connections: vec![Connection::plain(7, 8), Connection::plain(8, 9)],
                shown_angles: vec![ShownAngle::end_start(0, 1)],
                parallel_lines: None,
            },
            filename: None,
        }
    }
}
