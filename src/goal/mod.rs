// src/goal/mod.rs

use thiserror::Error;
use tracing::warn;

use crate::model::{
    ComethDirection, GoalGrid, ObjectKind, PlacementObject, Position, SoloonColor, TargetObjectSet,
};

pub const POLYANET_LABEL: &str = "POLYANET";
pub const SPACE_LABEL: &str = "SPACE";

/// The one fatal error family of a run: the goal grid could not be obtained
/// or is structurally unusable. Per-object submission failures are never
/// represented here; they stay ordinary result values.
#[derive(Debug, Error)]
pub enum GoalError {
    #[error("goal request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("goal endpoint returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("goal response carried no grid")]
    MissingGrid,

    #[error("goal grid is jagged: row {row} has {actual} columns, expected {expected}")]
    JaggedGrid {
        row: usize,
        expected: usize,
        actual: usize,
    },
}

/// Dimensions and per-kind counts for a goal grid, computed by the same
/// scan `translate` performs. The counts always agree with the sequence
/// lengths in the translated object set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridAnalysis {
    pub rows: usize,
    pub columns: usize,
    pub polyanets: usize,
    pub soloons: usize,
    pub comeths: usize,
    pub empties: usize,
}

impl GridAnalysis {
    pub fn total_cells(&self) -> usize {
        self.rows * self.columns
    }

    pub fn total_objects(&self) -> usize {
        self.polyanets + self.soloons + self.comeths
    }
}

/// What a single cell label means.
enum Cell {
    Object(PlacementObject),
    Space,
    Unknown,
}

fn parse_label(label: &str, position: Position) -> Cell {
    if label == SPACE_LABEL {
        return Cell::Space;
    }
    if label == POLYANET_LABEL {
        return Cell::Object(PlacementObject::Polyanet(position));
    }
    if let Some(fragment) = label.strip_suffix("_SOLOON") {
        if let Some(color) = SoloonColor::from_label(fragment) {
            return Cell::Object(PlacementObject::Soloon(position, color));
        }
    }
    if let Some(fragment) = label.strip_suffix("_COMETH") {
        if let Some(direction) = ComethDirection::from_label(fragment) {
            return Cell::Object(PlacementObject::Cometh(position, direction));
        }
    }
    Cell::Unknown
}

/// Rejects jagged grids up front; returns the common column count.
fn column_count(grid: &GoalGrid) -> Result<usize, GoalError> {
    let expected = grid.first().map(|row| row.len()).unwrap_or(0);
    for (row, cells) in grid.iter().enumerate() {
        if cells.len() != expected {
            return Err(GoalError::JaggedGrid {
                row,
                expected,
                actual: cells.len(),
            });
        }
    }
    Ok(expected)
}

/// Translates a goal grid into a typed object set.
///
/// Every cell is consumed exactly once: recognized labels are bucketed into
/// their kind's sequence in scan order, SPACE and unknown labels land in
/// `empties`. An unknown label is a diagnostic, not a failure.
pub fn translate(grid: &GoalGrid) -> Result<TargetObjectSet, GoalError> {
    column_count(grid)?;

    let mut target = TargetObjectSet::new();
    for (r, row) in grid.iter().enumerate() {
        for (c, label) in row.iter().enumerate() {
            let position = Position::new(r as u32, c as u32);
            match parse_label(label, position) {
                Cell::Object(object) => match object.kind() {
                    ObjectKind::Polyanet => target.polyanets.push(object),
                    ObjectKind::Soloon => target.soloons.push(object),
                    ObjectKind::Cometh => target.comeths.push(object),
                },
                Cell::Space => target.empties.push(position),
                Cell::Unknown => {
                    warn!(%position, %label, "unrecognized cell label, treating as empty");
                    target.empties.push(position);
                }
            }
        }
    }
    Ok(target)
}

/// Computes grid dimensions and per-kind counts without building the
/// object set.
pub fn analyze(grid: &GoalGrid) -> Result<GridAnalysis, GoalError> {
    let columns = column_count(grid)?;

    let mut analysis = GridAnalysis {
        rows: grid.len(),
        columns,
        polyanets: 0,
        soloons: 0,
        comeths: 0,
        empties: 0,
    };
    for (r, row) in grid.iter().enumerate() {
        for (c, label) in row.iter().enumerate() {
            match parse_label(label, Position::new(r as u32, c as u32)) {
                Cell::Object(object) => match object.kind() {
                    ObjectKind::Polyanet => analysis.polyanets += 1,
                    ObjectKind::Soloon => analysis.soloons += 1,
                    ObjectKind::Cometh => analysis.comeths += 1,
                },
                Cell::Space | Cell::Unknown => analysis.empties += 1,
            }
        }
    }
    Ok(analysis)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid(rows: &[&[&str]]) -> GoalGrid {
        rows.iter()
            .map(|row| row.iter().map(|s| s.to_string()).collect())
            .collect()
    }

    #[test]
    fn translates_mixed_grid_in_scan_order() {
        let g = grid(&[
            &["POLYANET", "SPACE"],
            &["SPACE", "RIGHT_COMETH"],
        ]);
        let target = translate(&g).unwrap();

        assert_eq!(
            target.polyanets,
            vec![PlacementObject::Polyanet(Position::new(0, 0))]
        );
        assert_eq!(
            target.comeths,
            vec![PlacementObject::Cometh(Position::new(1, 1), ComethDirection::Right)]
        );
        assert!(target.soloons.is_empty());
        assert_eq!(
            target.empties,
            vec![Position::new(0, 1), Position::new(1, 0)]
        );
    }

    #[test]
    fn every_cell_lands_in_exactly_one_bucket() {
        let g = grid(&[
            &["POLYANET", "BLUE_SOLOON", "UP_COMETH", "SPACE"],
            &["WHITE_SOLOON", "SPACE", "DOWN_COMETH", "POLYANET"],
            &["SPACE", "MYSTERY", "LEFT_COMETH", "RED_SOLOON"],
        ]);
        let target = translate(&g).unwrap();
        let buckets = target.total_objects() + target.empties.len();
        assert_eq!(buckets, 12);
    }

    #[test]
    fn unknown_label_is_empty_not_an_error() {
        let g = grid(&[&["MYSTERY", "POLYANET"]]);
        let target = translate(&g).unwrap();
        assert_eq!(target.empties, vec![Position::new(0, 0)]);
        assert_eq!(target.polyanets.len(), 1);
    }

    #[test]
    fn analysis_counts_agree_with_translation() {
        let g = grid(&[
            &["POLYANET", "PURPLE_SOLOON", "SPACE"],
            &["RIGHT_COMETH", "POLYANET", "WHAT_IS_THIS"],
        ]);
        let target = translate(&g).unwrap();
        let analysis = analyze(&g).unwrap();

        assert_eq!(analysis.rows, 2);
        assert_eq!(analysis.columns, 3);
        assert_eq!(analysis.polyanets, target.polyanets.len());
        assert_eq!(analysis.soloons, target.soloons.len());
        assert_eq!(analysis.comeths, target.comeths.len());
        assert_eq!(analysis.empties, target.empties.len());
        assert_eq!(analysis.total_cells(), 6);
    }

    #[test]
    fn jagged_grid_is_rejected() {
        let g = grid(&[&["SPACE", "SPACE"], &["SPACE"]]);
        let err = translate(&g).unwrap_err();
        match err {
            GoalError::JaggedGrid { row, expected, actual } => {
                assert_eq!(row, 1);
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected JaggedGrid, got {other:?}"),
        }
    }

    #[test]
    fn empty_grid_translates_to_nothing() {
        let target = translate(&Vec::new()).unwrap();
        assert!(target.is_empty());
        assert!(target.empties.is_empty());
    }
}
