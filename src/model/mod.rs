// src/model/mod.rs

use std::fmt;

/// A grid cell, identified by row and column (both zero-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Position {
    pub row: u32,
    pub column: u32,
}

impl Position {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoloonColor {
    Blue,
    Red,
    Purple,
    White,
}

impl SoloonColor {
    /// Lowercase encoding used in create-call payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            SoloonColor::Blue => "blue",
            SoloonColor::Red => "red",
            SoloonColor::Purple => "purple",
            SoloonColor::White => "white",
        }
    }

    /// Parses the uppercase label fragment (the part before `_SOLOON`).
    pub fn from_label(fragment: &str) -> Option<Self> {
        match fragment {
            "BLUE" => Some(SoloonColor::Blue),
            "RED" => Some(SoloonColor::Red),
            "PURPLE" => Some(SoloonColor::Purple),
            "WHITE" => Some(SoloonColor::White),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComethDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ComethDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComethDirection::Up => "up",
            ComethDirection::Down => "down",
            ComethDirection::Left => "left",
            ComethDirection::Right => "right",
        }
    }

    /// Parses the uppercase label fragment (the part before `_COMETH`).
    pub fn from_label(fragment: &str) -> Option<Self> {
        match fragment {
            "UP" => Some(ComethDirection::Up),
            "DOWN" => Some(ComethDirection::Down),
            "LEFT" => Some(ComethDirection::Left),
            "RIGHT" => Some(ComethDirection::Right),
            _ => None,
        }
    }
}

/// The three creatable entity kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Polyanet,
    Soloon,
    Cometh,
}

impl ObjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectKind::Polyanet => "polyanet",
            ObjectKind::Soloon => "soloon",
            ObjectKind::Cometh => "cometh",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One placement object bound to a grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementObject {
    Polyanet(Position),
    Soloon(Position, SoloonColor),
    Cometh(Position, ComethDirection),
}

impl PlacementObject {
    pub fn position(&self) -> Position {
        match self {
            PlacementObject::Polyanet(pos) => *pos,
            PlacementObject::Soloon(pos, _) => *pos,
            PlacementObject::Cometh(pos, _) => *pos,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            PlacementObject::Polyanet(_) => ObjectKind::Polyanet,
            PlacementObject::Soloon(_, _) => ObjectKind::Soloon,
            PlacementObject::Cometh(_, _) => ObjectKind::Cometh,
        }
    }
}

impl fmt::Display for PlacementObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementObject::Polyanet(pos) => write!(f, "polyanet at {}", pos),
            PlacementObject::Soloon(pos, color) => {
                write!(f, "{} soloon at {}", color.as_str(), pos)
            }
            PlacementObject::Cometh(pos, direction) => {
                write!(f, "{} cometh at {}", direction.as_str(), pos)
            }
        }
    }
}

/// A goal map: rows of cell labels, top to bottom.
pub type GoalGrid = Vec<Vec<String>>;

/// The typed object set a goal grid translates into.
///
/// Each kind keeps its own sequence in scan order (left-to-right, top-to-
/// bottom). That order is the submission order, so it is part of the
/// contract, not an implementation detail.
#[derive(Debug, Clone, Default)]
pub struct TargetObjectSet {
    pub polyanets: Vec<PlacementObject>,
    pub soloons: Vec<PlacementObject>,
    pub comeths: Vec<PlacementObject>,
    /// SPACE cells and unrecognized labels.
    pub empties: Vec<Position>,
}

impl TargetObjectSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of objects that will be submitted.
    pub fn total_objects(&self) -> usize {
        self.polyanets.len() + self.soloons.len() + self.comeths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_objects() == 0
    }

    /// All objects in submission order: polyanets first, then soloons,
    /// then comeths. Soloons and comeths may depend on an adjacent polyanet
    /// existing, so the polyanet phase always goes first.
    pub fn objects(&self) -> impl Iterator<Item = &PlacementObject> {
        self.polyanets
            .iter()
            .chain(self.soloons.iter())
            .chain(self.comeths.iter())
    }
}
