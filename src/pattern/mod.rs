// src/pattern/mod.rs

use crate::model::GoalGrid;

const P: &str = "POLYANET";
const S: &str = "SPACE";

/// The fixed 11x11 polyanet cross built by the single-pattern mode.
const CROSS: [[&str; 11]; 11] = [
    [S, S, S, S, S, S, S, S, S, S, S],
    [S, S, S, S, S, S, S, S, S, S, S],
    [S, S, P, S, S, S, S, S, P, S, S],
    [S, S, S, P, S, S, S, P, S, S, S],
    [S, S, S, S, P, S, P, S, S, S, S],
    [S, S, S, S, S, P, S, S, S, S, S],
    [S, S, S, S, P, S, P, S, S, S, S],
    [S, S, S, P, S, S, S, P, S, S, S],
    [S, S, P, S, S, S, S, S, P, S, S],
    [S, S, S, S, S, S, S, S, S, S, S],
    [S, S, S, S, S, S, S, S, S, S, S],
];

pub fn cross_pattern() -> GoalGrid {
    CROSS
        .iter()
        .map(|row| row.iter().map(|label| label.to_string()).collect())
        .collect()
}
