use std::fmt;

use serde::{Deserialize, Serialize};

/// A cell on the board. Boards are 1-indexed: valid cells lie in
/// `[1, width] x [1, height]`.
///
/// Ordering is lexicographic on `(x, y)`, which is the tie-break order used
/// wherever the engine has to pick between equally good cells.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Coordinates {
    pub x: i32,
    pub y: i32,
}

impl Coordinates {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

impl From<(i32, i32)> for Coordinates {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equal_coordinates_hash_to_the_same_key() {
        let mut set = HashSet::new();
        set.insert(Coordinates::new(2, 3));
        assert!(set.contains(&Coordinates::from((2, 3))));
        assert!(!set.contains(&Coordinates::new(3, 2)));
    }

    #[test]
    fn ordering_is_x_then_y() {
        let mut cells = vec![
            Coordinates::new(2, 1),
            Coordinates::new(1, 3),
            Coordinates::new(1, 2),
        ];
        cells.sort();
        assert_eq!(
            cells,
            vec![
                Coordinates::new(1, 2),
                Coordinates::new(1, 3),
                Coordinates::new(2, 1)
            ]
        );
    }

    #[test]
    fn display_matches_log_format() {
        assert_eq!(Coordinates::new(4, 7).to_string(), "(4, 7)");
    }
}
