// Grid distance helpers.

use crate::coordinates::Coordinates;

/// `|dx| + |dy|`.
pub fn manhattan_distance(a: Coordinates, b: Coordinates) -> u32 {
    a.x.abs_diff(b.x) + a.y.abs_diff(b.y)
}

/// Two cells are adjacent when they share an edge (or are the same cell).
pub fn is_adjacent(a: Coordinates, b: Coordinates) -> bool {
    manhattan_distance(a, b) <= 1
}
